// SPDX-License-Identifier: MIT

use super::*;
use crate::id::WorkflowId;

#[test]
fn validation_error_messages_are_stable() {
    let wf = WorkflowId::new();
    let err = ValidationError::NotRoot(wf);
    assert!(err.to_string().contains("not a root"));
}

#[test]
fn workflow_error_display_includes_id_and_message() {
    let wf = WorkflowId::new();
    let err = WorkflowError::new(wf, anyhow::anyhow!("boom"));
    let rendered = err.to_string();
    assert!(rendered.contains("boom"));
    assert!(rendered.contains(wf.as_str()));
}

#[test]
fn workflow_error_source_is_the_original_value() {
    let err = WorkflowError::new(WorkflowId::new(), anyhow::anyhow!("root cause"));
    let source = std::error::Error::source(&err).expect("source present");
    assert_eq!(source.to_string(), "root cause");
}

#[test]
fn retry_hint_reflects_captured_state() {
    let err = WorkflowError::new(WorkflowId::new(), anyhow::anyhow!("boom"));
    assert_eq!(err.retry_hint(), RetryHint::NoState);

    let err = err.with_state(Some(ObservedSnapshot::default()));
    assert_eq!(err.retry_hint(), RetryHint::HasState);
}

#[test]
fn workflow_error_carries_independent_log_copy() {
    let logs = vec![LogEntry {
        id: crate::id::LogId::new(),
        workflow_id: WorkflowId::new(),
        timestamp_ms: 0,
        level: crate::log::LogLevel::Info,
        message: "hi".into(),
        data: None,
        parent_log_id: None,
    }];
    let err = WorkflowError::new(WorkflowId::new(), anyhow::anyhow!("boom")).with_logs(logs.clone());
    assert_eq!(err.logs.len(), logs.len());
}
