use criterion::{Criterion, black_box, criterion_group, criterion_main};
use engram_types::*;
use engram_view::View;

/// Alternating messages and single-call tool exchanges, condensed once.
fn make_log(n: usize) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::with_capacity(n * 3 + 1);
    for i in 0..n {
        events.push(MessageEvent::new(Role::User, format!("turn {i}")).into());
        let action = ActionEvent::new(format!("resp_{i}"), format!("call_{i}"), "bash");
        let observation = ObservationEvent::new(&action, "output line\n".repeat(8));
        events.push(action.into());
        events.push(observation.into());
    }
    let forgotten: Vec<EventId> = events[..n].iter().map(|e| e.id().clone()).collect();
    events.push(Condensation::new(forgotten, Some("earlier work".into()), Some(0), "resp_c").into());
    events
}

fn bench_derive_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_view");
    for n in [10, 100, 1000] {
        let events = make_log(n);
        group.bench_function(format!("{}_events", events.len()), |b| {
            b.iter(|| View::from_events(black_box(&events)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_derive_view);
criterion_main!(benches);
