// SPDX-License-Identifier: MIT

//! The observable tree node: the serializable twin of a live workflow.
//!
//! Per the design license in `spec.md` §9 ("An implementation MAY collapse
//! these into one aggregate..."), this crate collapses the live
//! workflow/observable node duality into one shared cell, [`NodeInner`].
//! [`WorkflowNode`] is the cheap, cloneable handle to it; every accessor
//! only ever exposes the subset of mutation the invariants allow.

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::event::WorkflowEvent;
use crate::id::WorkflowId;
use crate::log::{LogEntry, LogSink, Logger};
use crate::observer::{
    notify_on_event, notify_on_state_updated, notify_on_tree_changed, Observer,
};
use crate::state::ObservedSnapshot;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

crate::simple_display! {
    WorkflowStatus {
        Idle => "idle",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Lifecycle status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

pub(crate) struct NodeInner {
    pub(crate) id: WorkflowId,
    pub(crate) name: String,
    pub(crate) status: WorkflowStatus,
    pub(crate) parent: Option<Weak<RefCell<NodeInner>>>,
    pub(crate) children: Vec<WorkflowNode>,
    pub(crate) logs: Vec<LogEntry>,
    pub(crate) events: Vec<WorkflowEvent>,
    pub(crate) state_snapshot: Option<ObservedSnapshot>,
    /// Only meaningful when this node is currently a root.
    pub(crate) observers: Vec<Rc<dyn Observer>>,
    pub(crate) clock: Rc<dyn Clock>,
}

/// A cheap, cloneable handle to a node in the workflow tree.
#[derive(Clone)]
pub struct WorkflowNode(pub(crate) Rc<RefCell<NodeInner>>);

/// Shallow, JSON-friendly projection of a node, used anywhere a full,
/// recursive node graph would be unbounded (event payloads, introspection
/// results).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: WorkflowId,
    pub name: String,
    pub status: WorkflowStatus,
    pub parent_id: Option<WorkflowId>,
    pub children_ids: Vec<WorkflowId>,
}

impl WorkflowNode {
    pub(crate) fn new(id: WorkflowId, name: String, clock: Rc<dyn Clock>) -> Self {
        Self(Rc::new(RefCell::new(NodeInner {
            id,
            name,
            status: WorkflowStatus::Idle,
            parent: None,
            children: Vec::new(),
            logs: Vec::new(),
            events: Vec::new(),
            state_snapshot: None,
            observers: Vec::new(),
            clock,
        })))
    }

    pub fn id(&self) -> WorkflowId {
        self.0.borrow().id
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.0.borrow().status
    }

    pub(crate) fn set_status(&self, status: WorkflowStatus) {
        self.0.borrow_mut().status = status;
    }

    pub fn parent(&self) -> Option<WorkflowNode> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(WorkflowNode)
    }

    pub fn children(&self) -> Vec<WorkflowNode> {
        self.0.borrow().children.clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.0.borrow().logs.clone()
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.0.borrow().events.clone()
    }

    pub fn state_snapshot(&self) -> Option<ObservedSnapshot> {
        self.0.borrow().state_snapshot.clone()
    }

    pub(crate) fn set_state_snapshot(&self, snapshot: ObservedSnapshot) {
        self.0.borrow_mut().state_snapshot = Some(snapshot);
    }

    pub fn summary(&self) -> NodeSummary {
        let inner = self.0.borrow();
        NodeSummary {
            id: inner.id,
            name: inner.name.clone(),
            status: inner.status,
            parent_id: inner.parent.as_ref().and_then(|w| w.upgrade()).map(|p| p.borrow().id),
            children_ids: inner.children.iter().map(|c| c.id()).collect(),
        }
    }

    fn ptr_eq(&self, other: &WorkflowNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Walk parent links upward to the root, with a visited set guarding
    /// against cycles. A repeat indicates tree corruption, not a normal
    /// runtime condition, so this panics rather than returning a
    /// recoverable error — matching how the rest of this crate treats
    /// invariant violations.
    pub fn root(&self) -> WorkflowNode {
        let mut current = self.clone();
        let mut visited = HashSet::new();
        visited.insert(current.id());
        while let Some(parent) = current.parent() {
            if !visited.insert(parent.id()) {
                unreachable!("workflow tree corrupted: cycle detected walking to root");
            }
            current = parent;
        }
        current
    }

    /// True iff `ancestor` is encountered walking this node's parent chain
    /// upward. O(depth).
    pub fn is_descendant_of(&self, ancestor: &WorkflowNode) -> bool {
        let mut current = self.clone();
        let mut visited = HashSet::new();
        visited.insert(current.id());
        while let Some(parent) = current.parent() {
            if parent.ptr_eq(ancestor) {
                return true;
            }
            if !visited.insert(parent.id()) {
                unreachable!("workflow tree corrupted: cycle detected during ancestry walk");
            }
            current = parent;
        }
        false
    }

    /// Attach `child` under this node.
    ///
    /// Idempotent no-op if `child` is already attached here. Fatal if
    /// `child` already has a different parent, is this node itself, or is
    /// an ancestor of this node (which would create a cycle). On success,
    /// emits `childAttached` then `treeUpdated`.
    pub fn attach_child(&self, child: &WorkflowNode) -> Result<(), ValidationError> {
        if let Some(existing) = child.parent() {
            if existing.ptr_eq(self) {
                return Ok(());
            }
            return Err(ValidationError::AlreadyHasParent {
                child: child.id(),
                existing: existing.id(),
            });
        }
        if child.ptr_eq(self) || self.is_descendant_of(child) {
            return Err(ValidationError::WouldCreateCycle {
                parent: self.id(),
                child: child.id(),
            });
        }
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().children.push(child.clone());
        self.emit_event(WorkflowEvent::ChildAttached { parent_id: self.id(), child: child.clone() });
        self.emit_event(WorkflowEvent::TreeUpdated { root: self.root() });
        Ok(())
    }

    /// Detach `child` from this node, preserving the order of remaining
    /// siblings. Does not walk into `child`'s own subtree — it stays
    /// internally intact. On success, emits `childDetached` then
    /// `treeUpdated`.
    pub fn detach_child(&self, child: &WorkflowNode) -> Result<(), ValidationError> {
        let position = self
            .0
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(child));
        let Some(position) = position else {
            return Err(ValidationError::NotAChild(child.id(), self.id()));
        };
        self.0.borrow_mut().children.remove(position);
        child.0.borrow_mut().parent = None;
        self.emit_event(WorkflowEvent::ChildDetached { parent_id: self.id(), child: child.clone() });
        self.emit_event(WorkflowEvent::TreeUpdated { root: self.root() });
        Ok(())
    }

    fn current_root_observers(&self) -> Vec<Rc<dyn Observer>> {
        self.root().0.borrow().observers.clone()
    }

    /// Register an observer. Only valid on a root node (`self.parent() ==
    /// None`); registering on a non-root is a fatal, synchronous error.
    pub fn register_observer(&self, observer: Rc<dyn Observer>) -> Result<(), ValidationError> {
        if self.parent().is_some() {
            return Err(ValidationError::NotRoot(self.id()));
        }
        self.0.borrow_mut().observers.push(observer);
        Ok(())
    }

    /// Append `event` to this node's event log and deliver it (plus, for
    /// structural events, an accompanying `treeUpdated`) to every observer
    /// reachable from the current root. A failing observer is isolated:
    /// the failure is structured-logged through this node's own
    /// [`Logger`] (so it flows through the ordinary log/observer fabric,
    /// including the recursion-safe `onLog` fallback) rather than
    /// propagated.
    pub fn emit_event(&self, event: WorkflowEvent) {
        self.0.borrow_mut().events.push(event.clone());
        let observers = self.current_root_observers();
        let event_name = event.name().to_string();
        notify_on_event(&observers, &event, |error| {
            self.logger().error_with(
                "Observer onEvent error",
                serde_json::json!({ "error": error.to_string(), "eventType": event_name.clone() }),
            );
        });
        if event.is_structural() {
            let root = self.root();
            notify_on_tree_changed(&observers, &root, |error| {
                self.logger().error_with(
                    "Observer onTreeChanged error",
                    serde_json::json!({ "error": error.to_string(), "nodeId": root.id().to_string() }),
                );
            });
        }
    }

    /// Assign `snapshot` as this node's latest observed-state record,
    /// notify `onStateUpdated`, then emit `stateSnapshot` and
    /// `treeUpdated`.
    pub fn publish_state_snapshot(&self, snapshot: ObservedSnapshot) {
        self.set_state_snapshot(snapshot);
        let observers = self.current_root_observers();
        notify_on_state_updated(&observers, self, |error| {
            self.logger().error_with(
                "Observer onStateUpdated error",
                serde_json::json!({ "error": error.to_string(), "nodeId": self.id().to_string() }),
            );
        });
        self.emit_event(WorkflowEvent::StateSnapshot { node: self.clone() });
        self.emit_event(WorkflowEvent::TreeUpdated { root: self.root() });
    }

    /// A fresh [`Logger`] bound to this node, used for the observer-failure
    /// fallback log entries above. Cheap: a `Logger` is just a handle plus
    /// a clock reference, not a resource that benefits from being pooled.
    fn logger(&self) -> Logger {
        Logger::new(Rc::new(self.clone()), self.0.borrow().clock.clone())
    }
}

impl LogSink for WorkflowNode {
    fn workflow_id(&self) -> WorkflowId {
        self.id()
    }

    fn append_log(&self, entry: LogEntry) {
        self.0.borrow_mut().logs.push(entry);
    }

    fn root_observers(&self) -> Vec<Rc<dyn Observer>> {
        self.current_root_observers()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
