// SPDX-License-Identifier: MIT

use super::*;
use crate::cache::cache_key;
use crate::clock::SystemClock;
use crate::node::WorkflowNode;
use crate::state::{register_fields, snapshot, FieldSpec, ObservedState};
use crate::workflow::WorkflowBase;
use std::collections::HashMap;
use std::rc::Rc;

fn make_node(name: &str) -> WorkflowNode {
    WorkflowNode::new(WorkflowId::new(), name.to_string(), Rc::new(SystemClock))
}

#[test]
fn inspect_hierarchy_full_tree_includes_ancestors_and_siblings() {
    let root = make_node("root");
    let mid = make_node("mid");
    let sibling = make_node("sibling");
    let leaf = make_node("leaf");
    root.attach_child(&mid).unwrap();
    root.attach_child(&sibling).unwrap();
    mid.attach_child(&leaf).unwrap();

    let view = inspect_hierarchy(&leaf, HierarchyDepth::FullTree);
    assert_eq!(view.current.id, leaf.id());
    assert_eq!(view.parent.unwrap().id, mid.id());
    assert_eq!(view.hierarchy_depth, 2);
    assert_eq!(view.ancestors.len(), 2);
    assert_eq!(view.total_siblings, 0);

    let mid_view = inspect_hierarchy(&mid, HierarchyDepth::FullTree);
    assert_eq!(mid_view.total_siblings, 1);
    assert_eq!(mid_view.siblings[0].id, sibling.id());
}

#[test]
fn inspect_hierarchy_current_only_omits_everything_else() {
    let root = make_node("root");
    let child = make_node("child");
    root.attach_child(&child).unwrap();

    let view = inspect_hierarchy(&child, HierarchyDepth::CurrentOnly);
    assert!(view.parent.is_none());
    assert!(view.ancestors.is_empty());
    assert!(view.siblings.is_empty());
    assert_eq!(view.hierarchy_depth, 1, "depth is still reported even when not expanded");
}

struct Sample {
    progress: u32,
}

impl ObservedState for Sample {
    fn observed_values(&self) -> HashMap<&'static str, serde_json::Value> {
        let mut m = HashMap::new();
        m.insert("progress", serde_json::Value::from(self.progress));
        m
    }
}

#[test]
fn read_ancestor_outputs_returns_snapshots_oldest_excluded_beyond_depth() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let root = make_node("root");
    let mid = make_node("mid");
    let leaf = make_node("leaf");
    root.attach_child(&mid).unwrap();
    mid.attach_child(&leaf).unwrap();

    root.publish_state_snapshot(snapshot(&Sample { progress: 1 }));
    mid.publish_state_snapshot(snapshot(&Sample { progress: 2 }));

    let all = read_ancestor_outputs(&leaf, None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, mid.id());
    assert_eq!(all[0].state_snapshot.as_ref().unwrap().get("progress"), Some(&serde_json::Value::from(2)));
    assert_eq!(all[1].id, root.id());

    let limited = read_ancestor_outputs(&leaf, Some(1));
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, mid.id());
}

#[test]
fn inspect_cache_reads_entries_put_on_a_cache_opted_in_base() {
    let base = WorkflowBase::new("root", None).unwrap().with_cache();
    let key = cache_key(base.id(), "result");
    base.cache().borrow_mut().as_mut().unwrap().put(key.clone(), serde_json::json!({ "v": 1 }));

    let entries = inspect_cache(&base);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, key);
}

#[test]
fn inspect_cache_is_empty_without_opt_in() {
    let base = WorkflowBase::new("root", None).unwrap();
    assert!(inspect_cache(&base).is_empty());
}

#[test]
fn read_event_history_filters_by_type_and_caps_results() {
    let root = make_node("root");
    for _ in 0..5 {
        let child = make_node("child");
        root.attach_child(&child).unwrap();
    }

    let all = read_event_history(&[root.clone()], None, 1_000);
    assert_eq!(all.len(), 10, "5 childAttached + 5 treeUpdated");

    let only_attached = read_event_history(&[root.clone()], Some(&["childAttached"]), 1_000);
    assert_eq!(only_attached.len(), 5);
    assert!(only_attached.iter().all(|e| e.name() == "childAttached"));

    let capped = read_event_history(&[root], Some(&["childAttached"]), 2);
    assert_eq!(capped.len(), 2);
}

#[test]
fn inspect_state_snapshot_reflects_latest_publish() {
    register_fields::<Sample>([("progress", FieldSpec::VISIBLE)]);
    let node = make_node("n");
    assert!(inspect_state_snapshot(&node).is_none());

    node.publish_state_snapshot(snapshot(&Sample { progress: 7 }));
    assert_eq!(
        inspect_state_snapshot(&node).unwrap().get("progress"),
        Some(&serde_json::Value::from(7))
    );
}
