// SPDX-License-Identifier: MIT

use super::*;
use crate::clock::FakeClock;
use crate::state::{register_fields, FieldSpec};
use std::collections::HashMap;

#[test]
fn construction_rejects_empty_name() {
    let err = WorkflowBase::new("   ", None).unwrap_err();
    assert!(matches!(err, ValidationError::EmptyName));
}

#[test]
fn construction_rejects_overlong_name() {
    let name = "x".repeat(MAX_NAME_LEN + 1);
    let err = WorkflowBase::new(name, None).unwrap_err();
    assert!(matches!(err, ValidationError::NameTooLong(_)));
}

#[test]
fn construction_trims_whitespace() {
    let base = WorkflowBase::new("  hello  ", None).unwrap();
    assert_eq!(base.name(), "hello");
}

#[test]
fn construction_with_parent_attaches_via_node_path() {
    let parent = WorkflowBase::new("parent", None).unwrap();
    let child = WorkflowBase::new("child", Some(parent.node())).unwrap();

    assert_eq!(child.parent().unwrap().id(), parent.id());
    assert_eq!(parent.children().len(), 1);
}

#[test]
fn attaching_an_ancestor_under_its_own_descendant_fails() {
    let root = WorkflowBase::new("root", None).unwrap();
    let mid = WorkflowBase::new("mid", Some(root.node())).unwrap();

    let cycle_err = mid.attach_child(root.node()).unwrap_err();
    assert!(matches!(cycle_err, ValidationError::WouldCreateCycle { .. }));
}

struct Sample {
    progress: u32,
}

impl crate::state::ObservedState for Sample {
    fn observed_values(&self) -> HashMap<&'static str, serde_json::Value> {
        let mut m = HashMap::new();
        m.insert("progress", serde_json::Value::from(self.progress));
        m
    }
}

#[test]
fn snapshot_state_publishes_onto_the_node() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let base = WorkflowBase::with_clock("root", None, Rc::new(FakeClock::new())).unwrap();
    let sample = Sample { progress: 50 };

    let snap = base.snapshot_state(&sample);
    assert_eq!(snap.get("progress"), Some(&serde_json::Value::from(50)));
    assert_eq!(base.node().state_snapshot(), Some(snap));
}

#[test]
fn emit_custom_event_appends_to_node_events() {
    let base = WorkflowBase::new("root", None).unwrap();
    base.emit_custom_event("custom:thing", serde_json::json!({ "x": 1 }));

    let events = base.node().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "custom:thing");
}
