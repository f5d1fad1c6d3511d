//! Tests for audit sink

use node_usage_admission::core::{AuditAction, AuditSink, InMemoryAuditSink, build_audit_event};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("job1t1", "job1", "job1", AuditAction::Admit, 2);

    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, "job1t1");
    assert_eq!(events[0].action, AuditAction::Admit);
    assert_eq!(events[0].nodes, 2);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("t1", "job1", "job1", AuditAction::Admit, 1));
    sink.record(build_audit_event("t2", "job1", "job1", AuditAction::Admit, 1));
    sink.record(build_audit_event("t3", "job1", "job1", AuditAction::Reject, 1));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, "t2"); // First one popped
    assert_eq!(events[1].task_id, "t3");
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("t1", "job1", "job1", AuditAction::Start, 1));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event("job2t1", "job2", "job1", AuditAction::Start, 3);

    assert_eq!(event.task_id, "job2t1");
    assert_eq!(event.job_id, "job2");
    assert_eq!(event.tree, "job1");
    assert_eq!(event.action.as_str(), "start");
    assert!(event.event_id.starts_with("job2t1-start-"));
    assert!(event.created_at_ms > 0);
}
