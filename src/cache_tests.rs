// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn cache_key_is_stable_for_same_inputs() {
    let id = WorkflowId::new();
    assert_eq!(cache_key(id, "foo"), cache_key(id, "foo"));
}

#[test]
fn cache_key_differs_by_node_id() {
    let a = WorkflowId::new();
    let b = WorkflowId::new();
    assert_ne!(cache_key(a, "foo"), cache_key(b, "foo"));
}

#[test]
fn cache_index_round_trips_a_value() {
    let mut index = CacheIndex::new();
    let key = cache_key(WorkflowId::new(), "foo");
    index.put(key.clone(), Value::from(42));
    assert_eq!(index.get(&key), Some(&Value::from(42)));
}

#[test]
fn cache_index_lists_all_entries() {
    let mut index = CacheIndex::new();
    let id = WorkflowId::new();
    index.put(cache_key(id, "a"), Value::from(1));
    index.put(cache_key(id, "b"), Value::from(2));
    assert_eq!(index.entries().len(), 2);
}
