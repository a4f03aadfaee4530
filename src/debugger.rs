// SPDX-License-Identifier: MIT

//! Incremental id→node debugger index.
//!
//! Bootstrapped with one BFS walk of the root at attach time. After that,
//! every structural event (`childAttached`/`childDetached`) updates the
//! map by walking only the attached/detached subtree — O(k) where k is
//! the size of that subtree, independent of the tree's total size.

use crate::error::ValidationError;
use crate::event::WorkflowEvent;
use crate::id::WorkflowId;
use crate::node::WorkflowNode;
use crate::observer::Observer;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

struct DebuggerState {
    index: HashMap<WorkflowId, WorkflowNode>,
    root: WorkflowNode,
}

/// Summary statistics over the indexed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub max_depth: usize,
}

/// An observer-based incremental index over a rooted workflow tree, plus
/// string renderers for its shape and logs.
pub struct TreeDebugger {
    state: RefCell<DebuggerState>,
}

impl TreeDebugger {
    /// Build an index over `root`'s tree and register it as an observer
    /// on `root`. Fails (without mutating anything) if `root` is not
    /// currently a root — matching `register_observer`'s own contract.
    pub fn attach(root: &WorkflowNode) -> Result<Rc<TreeDebugger>, ValidationError> {
        let mut index = HashMap::new();
        bfs_insert(root, &mut index);
        let debugger = Rc::new(TreeDebugger {
            state: RefCell::new(DebuggerState { index, root: root.clone() }),
        });
        root.register_observer(debugger.clone() as Rc<dyn Observer>)?;
        Ok(debugger)
    }

    /// O(1) lookup of a node by id.
    pub fn get_node(&self, id: WorkflowId) -> Option<WorkflowNode> {
        self.state.borrow().index.get(&id).cloned()
    }

    pub fn get_stats(&self) -> TreeStats {
        let state = self.state.borrow();
        let total_nodes = state.index.len();
        let mut max_depth = 0;
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back((state.root.clone(), 0usize));
        while let Some((node, depth)) = queue.pop_front() {
            if !visited.insert(node.id()) {
                continue;
            }
            max_depth = max_depth.max(depth);
            for child in node.children() {
                queue.push_back((child, depth + 1));
            }
        }
        TreeStats { total_nodes, max_depth }
    }

    /// Render the tree rooted at `node` (or the debugger's root if
    /// `None`) as indented `name [status] (id)` lines.
    pub fn to_tree_string(&self, node: Option<&WorkflowNode>) -> String {
        let root = node.cloned().unwrap_or_else(|| self.state.borrow().root.clone());
        let mut out = String::new();
        render_tree(&root, 0, &mut out);
        out
    }

    /// Render the logs of `node` (or the debugger's root if `None`) and
    /// all its descendants, depth-first, as `[timestamp] name level:
    /// message` lines.
    pub fn to_log_string(&self, node: Option<&WorkflowNode>) -> String {
        let root = node.cloned().unwrap_or_else(|| self.state.borrow().root.clone());
        let mut out = String::new();
        render_logs(&root, &mut out);
        out
    }
}

impl Observer for TreeDebugger {
    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()> {
        match event {
            WorkflowEvent::ChildAttached { child, .. } => {
                bfs_insert(child, &mut self.state.borrow_mut().index);
            }
            WorkflowEvent::ChildDetached { child, .. } => {
                bfs_remove(child, &mut self.state.borrow_mut().index);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_tree_changed(&self, root: &WorkflowNode) -> anyhow::Result<()> {
        self.state.borrow_mut().root = root.clone();
        Ok(())
    }
}

/// Insert `start` and every node in its subtree into `index`. O(k).
fn bfs_insert(start: &WorkflowNode, index: &mut HashMap<WorkflowId, WorkflowNode>) {
    let mut queue = VecDeque::new();
    queue.push_back(start.clone());
    while let Some(node) = queue.pop_front() {
        index.insert(node.id(), node.clone());
        for child in node.children() {
            queue.push_back(child);
        }
    }
}

/// Remove `start` and every node in its subtree from `index`. O(k).
fn bfs_remove(start: &WorkflowNode, index: &mut HashMap<WorkflowId, WorkflowNode>) {
    let mut queue = VecDeque::new();
    queue.push_back(start.clone());
    while let Some(node) = queue.pop_front() {
        index.remove(&node.id());
        for child in node.children() {
            queue.push_back(child);
        }
    }
}

fn render_tree(node: &WorkflowNode, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&format!("- {} [{}] ({})\n", node.name(), node.status(), node.id()));
    for child in node.children() {
        render_tree(&child, depth + 1, out);
    }
}

fn render_logs(node: &WorkflowNode, out: &mut String) {
    for log in node.logs() {
        out.push_str(&format!(
            "[{}] {} {}: {}\n",
            log.timestamp_ms,
            node.name(),
            log.level,
            log.message
        ));
    }
    for child in node.children() {
        render_logs(&child, out);
    }
}

#[cfg(test)]
#[path = "debugger_tests.rs"]
mod tests;
