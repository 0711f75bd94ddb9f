//! Integration tests for event serialization and classification.

use engram_types::*;

fn sample_condensation(forgotten: Vec<EventId>) -> Condensation {
    Condensation::new(forgotten, Some("summary text".into()), Some(2), "resp_7")
}

#[test]
fn condensation_roundtrips_with_all_fields() {
    let forgotten = vec![EventId::new("e1"), EventId::new("e2")];
    let event: Event = sample_condensation(forgotten.clone()).into();

    let json = serde_json::to_string(&event).unwrap();
    let back = Event::from_json(&json).unwrap();

    assert_eq!(event, back);
    let condensation = back.as_condensation().unwrap();
    assert_eq!(condensation.forgotten_event_ids, forgotten);
    assert_eq!(condensation.summary.as_deref(), Some("summary text"));
    assert_eq!(condensation.summary_offset, Some(2));
    assert_eq!(condensation.llm_response_id, LlmResponseId::new("resp_7"));
}

#[test]
fn condensation_forgotten_ids_serialize_as_strings() {
    let event: Event = sample_condensation(vec![EventId::new("e1")]).into();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "Condensation");
    assert_eq!(json["forgotten_event_ids"][0], "e1");
}

#[test]
fn hard_reset_is_offset_zero() {
    let hard = Condensation::new(vec![EventId::new("e1")], Some("s".into()), Some(0), "r");
    let normal = Condensation::new(vec![EventId::new("e1")], Some("s".into()), Some(3), "r");
    assert!(hard.is_hard_reset());
    assert!(!normal.is_hard_reset());
}

#[test]
fn every_variant_keeps_its_kind_tag() {
    let action = ActionEvent::new("resp_1", "call_1", "bash");
    let events: Vec<Event> = vec![
        MessageEvent::new(Role::User, "hi").into(),
        SystemPromptEvent::new("be helpful", vec![]).into(),
        SecurityPromptEvent::new("analyze risk").into(),
        ObservationEvent::new(&action, "ok").into(),
        action.into(),
        AgentErrorEvent::new("boom").into(),
        UserRejectEvent::new("call_1", "no").into(),
        CondensationRequestEvent::new().into(),
        Condensation::new(vec![], None, None, "resp_2").into(),
        CondensationSummaryEvent::new("so far so good").into(),
    ];

    for event in events {
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind(), "kind tag mismatch for {event}");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), event.id());
    }
}

#[test]
fn observation_records_its_action() {
    let action = ActionEvent::new("resp_1", "call_9", "grep");
    let observation = ObservationEvent::new(&action, "3 matches");
    assert_eq!(observation.action_id, action.id);
    assert_eq!(observation.tool_call_id, action.tool_call_id);
}

#[test]
fn system_prompt_carries_tool_schemas() {
    let tool = ToolDefinition {
        name: "bash".into(),
        description: "run a shell command".into(),
        input_schema: serde_json::json!({"type": "object"}),
    };
    let event: Event = SystemPromptEvent::new("you are an agent", vec![tool]).into();
    let json = serde_json::to_string(&event).unwrap();
    let back = Event::from_json(&json).unwrap();
    assert_eq!(event, back);
}

#[test]
fn security_prompt_renders_as_system_role() {
    let event: Event = SecurityPromptEvent::new("flag risky commands").into();
    let message = event.to_llm_message().unwrap();
    assert_eq!(message.role, Role::System);
}

#[test]
fn reject_renders_as_error_tool_result() {
    let event: Event = UserRejectEvent::new("call_1", "touches prod").into();
    let message = event.to_llm_message().unwrap();
    match &message.content[0] {
        ContentBlock::ToolResult { tool_use_id, content, is_error } => {
            assert_eq!(tool_use_id, &ToolCallId::new("call_1"));
            assert!(content.contains("touches prod"));
            assert!(is_error);
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
}
