// SPDX-License-Identifier: MIT

//! Shared test helpers: small node-tree builders and proptest strategies
//! used by the property-based tests colocated with `node`/`debugger`.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::clock::SystemClock;
use crate::id::WorkflowId;
use crate::node::WorkflowNode;
use std::collections::VecDeque;
use std::rc::Rc;

/// A fresh, unattached node with the given name.
pub fn new_node(name: &str) -> WorkflowNode {
    WorkflowNode::new(WorkflowId::new(), name.to_string(), Rc::new(SystemClock))
}

/// Build a tree of exactly `n` nodes (n >= 1) by breadth-first attachment
/// under a fixed `fan_out`, rooted at a fresh node. Returns `(root,
/// all_nodes)` with `all_nodes[0]` the root, in attachment order.
pub fn build_tree(n: usize, fan_out: usize) -> (WorkflowNode, Vec<WorkflowNode>) {
    let fan_out = fan_out.max(1);
    let root = new_node("root");
    let mut all = vec![root.clone()];
    let mut frontier = VecDeque::new();
    frontier.push_back(root.clone());
    while all.len() < n.max(1) {
        let Some(parent) = frontier.pop_front() else { break };
        for _ in 0..fan_out {
            if all.len() >= n.max(1) {
                break;
            }
            let child = new_node(&format!("n{}", all.len()));
            // A freshly minted, unattached node can never be an ancestor of
            // `parent`, so this attach can only fail on a build-up bug.
            if parent.attach_child(&child).is_err() {
                continue;
            }
            all.push(child.clone());
            frontier.push_back(child);
        }
    }
    (root, all)
}

/// Proptest strategies for tree-shaped property tests.
pub mod strategies {
    use proptest::prelude::*;

    /// A small tree size, biased toward the low end so shrinking stays cheap.
    pub fn arb_tree_size() -> impl Strategy<Value = usize> {
        1usize..64
    }

    /// A small fan-out for [`super::build_tree`].
    pub fn arb_fan_out() -> impl Strategy<Value = usize> {
        1usize..4
    }
}
