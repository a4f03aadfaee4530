// SPDX-License-Identifier: MIT

//! Typed lifecycle events emitted onto a node's event log and delivered to
//! root observers.
//!
//! `WorkflowEvent` derives `Serialize` only — not `Deserialize` — since
//! node-carrying variants hold live tree handles that are not meant to be
//! reconstructed from JSON. Serialization of a carried node uses
//! [`crate::node::NodeSummary`], a shallow id/name/status/children-ids
//! projection, rather than the node itself: a node's own event log can
//! contain earlier events that reference the same node, so serializing the
//! live node recursively would walk that cycle.

use crate::error::WorkflowError;
use crate::id::WorkflowId;
use crate::node::{NodeSummary, WorkflowNode};
use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;

/// Lifecycle and structural events appended to a node's event log.
///
/// Any additional event type user code wants to emit must carry its own
/// `type` discriminator and go through [`WorkflowEvent::Custom`].
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    ChildAttached { parent_id: WorkflowId, child: WorkflowNode },
    ChildDetached { parent_id: WorkflowId, child: WorkflowNode },
    StepStart { node: WorkflowNode, step: String },
    StepEnd { node: WorkflowNode, step: String, duration: Duration },
    TaskStart { node: WorkflowNode, task: String },
    TaskEnd { node: WorkflowNode, task: String },
    StateSnapshot { node: WorkflowNode },
    Error { node: WorkflowNode, error: Rc<WorkflowError> },
    TreeUpdated { root: WorkflowNode },
    /// User-defined event; `type_name` is the discriminator and `payload`
    /// is caller-supplied JSON.
    Custom { type_name: String, node: WorkflowNode, payload: serde_json::Value },
}

impl WorkflowEvent {
    /// Stable `type` discriminator, matching the naming the observer fabric
    /// and debugger use in error/log context strings.
    pub fn name(&self) -> &str {
        match self {
            WorkflowEvent::ChildAttached { .. } => "childAttached",
            WorkflowEvent::ChildDetached { .. } => "childDetached",
            WorkflowEvent::StepStart { .. } => "stepStart",
            WorkflowEvent::StepEnd { .. } => "stepEnd",
            WorkflowEvent::TaskStart { .. } => "taskStart",
            WorkflowEvent::TaskEnd { .. } => "taskEnd",
            WorkflowEvent::StateSnapshot { .. } => "stateSnapshot",
            WorkflowEvent::Error { .. } => "error",
            WorkflowEvent::TreeUpdated { .. } => "treeUpdated",
            WorkflowEvent::Custom { type_name, .. } => type_name,
        }
    }

    /// True for the structural events that also trigger `onTreeChanged`.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::ChildAttached { .. }
                | WorkflowEvent::ChildDetached { .. }
                | WorkflowEvent::TreeUpdated { .. }
        )
    }
}

impl Serialize for WorkflowEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        fn summary(node: &WorkflowNode) -> NodeSummary {
            node.summary()
        }

        let mut state = serializer.serialize_struct("WorkflowEvent", 3)?;
        state.serialize_field("type", self.name())?;
        match self {
            WorkflowEvent::ChildAttached { parent_id, child }
            | WorkflowEvent::ChildDetached { parent_id, child } => {
                state.serialize_field("parentId", parent_id)?;
                state.serialize_field("child", &summary(child))?;
            }
            WorkflowEvent::StepStart { node, step } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("step", step)?;
            }
            WorkflowEvent::StepEnd { node, step, duration } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("step", step)?;
                state.serialize_field("durationMs", &(duration.as_millis() as u64))?;
            }
            WorkflowEvent::TaskStart { node, task } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("task", task)?;
            }
            WorkflowEvent::TaskEnd { node, task } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("task", task)?;
            }
            WorkflowEvent::StateSnapshot { node } => {
                state.serialize_field("node", &summary(node))?;
            }
            WorkflowEvent::Error { node, error } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("error", &error.message)?;
            }
            WorkflowEvent::TreeUpdated { root } => {
                state.serialize_field("root", &summary(root))?;
            }
            WorkflowEvent::Custom { node, payload, .. } => {
                state.serialize_field("node", &summary(node))?;
                state.serialize_field("payload", payload)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
