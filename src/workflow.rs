// SPDX-License-Identifier: MIT

//! The `Workflow` trait user subclasses implement, and `WorkflowBase`, the
//! struct a subclass embeds to get identity, tree links, logging, and
//! state-snapshot plumbing for free.

use crate::cache::CacheIndex;
use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::event::WorkflowEvent;
use crate::id::WorkflowId;
use crate::log::Logger;
use crate::node::{WorkflowNode, WorkflowStatus};
use crate::state::{snapshot, ObservedSnapshot, ObservedState};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::WorkflowError;

const MAX_NAME_LEN: usize = 100;

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Live-instance reference type: a trait object so heterogeneous concrete
/// workflow subclasses can share one parent's `children` list.
pub type WorkflowHandle = Rc<RefCell<dyn Workflow>>;

/// The asynchronous entry point every concrete workflow subclass
/// implements. Object-safe via `#[async_trait(?Send)]` so `WorkflowHandle`
/// can hold any concrete implementor.
#[async_trait(?Send)]
pub trait Workflow {
    /// Tree/logging/state plumbing shared by every workflow.
    fn base(&self) -> &WorkflowBase;

    /// Run this workflow to completion. Step/task bodies call
    /// [`crate::step::run_step`]/[`crate::task::run_task`] internally;
    /// this method is what a parent task awaits.
    ///
    /// Errors are `Rc<WorkflowError>`, not an owned `WorkflowError`: the
    /// same value a failing step already emitted as `WorkflowEvent::Error`
    /// onto the node's event log is the one returned here, rather than a
    /// duplicate produced by cloning an `anyhow::Error` payload (which
    /// does not implement `Clone`).
    async fn run(&self) -> Result<serde_json::Value, Rc<WorkflowError>>;
}

/// Tree identity, node handle, and logger shared by every concrete
/// workflow. Embedded (not inherited — Rust has no classes) by user
/// subclasses.
pub struct WorkflowBase {
    node: WorkflowNode,
    logger: Logger,
    clock: Rc<dyn Clock>,
    cache: RefCell<Option<CacheIndex>>,
    /// Nesting depth of in-flight `run_step`/`run_task` calls. Only the
    /// outermost one drives idle→running and running→terminal transitions,
    /// so a multi-step `Workflow::run` body doesn't flip back to
    /// `Completed`/`Running` between its own steps.
    execution_depth: Cell<usize>,
}

impl WorkflowBase {
    /// Construct a new workflow base. If `parent` is given, attaches this
    /// node to it via the same [`WorkflowNode::attach_child`] path an
    /// explicit caller would use, so construction's implicit attach and
    /// later explicit attaches share one cycle-checked code path.
    pub fn new(name: impl AsRef<str>, parent: Option<&WorkflowNode>) -> Result<Self, ValidationError> {
        Self::with_clock(name, parent, Rc::new(SystemClock))
    }

    pub fn with_clock(
        name: impl AsRef<str>,
        parent: Option<&WorkflowNode>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.as_ref())?;
        let node = WorkflowNode::new(WorkflowId::new(), name, clock.clone());
        let logger = Logger::new(Rc::new(node.clone()), clock.clone());
        if let Some(parent) = parent {
            parent.attach_child(&node)?;
        }
        Ok(Self { node, logger, clock, cache: RefCell::new(None), execution_depth: Cell::new(0) })
    }

    /// Opt this workflow into the trivial in-memory cache introspection
    /// reads from.
    pub fn with_cache(self) -> Self {
        *self.cache.borrow_mut() = Some(CacheIndex::new());
        self
    }

    pub fn id(&self) -> WorkflowId {
        self.node.id()
    }

    pub fn name(&self) -> String {
        self.node.name()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.node.status()
    }

    pub(crate) fn set_status(&self, status: WorkflowStatus) {
        self.node.set_status(status);
    }

    /// Entering an outermost `run_step`/`run_task` call moves an idle
    /// workflow to `running`. Nested calls just bump the depth counter.
    pub(crate) fn enter_execution(&self) {
        let depth = self.execution_depth.get();
        self.execution_depth.set(depth + 1);
        if depth == 0 && self.status() == WorkflowStatus::Idle {
            self.set_status(WorkflowStatus::Running);
        }
    }

    /// Exiting the outermost call on a successful path moves `running` to
    /// `completed`. A nested call just decrements the depth counter.
    pub(crate) fn exit_execution_ok(&self) {
        let depth = self.execution_depth.get();
        self.execution_depth.set(depth.saturating_sub(1));
        if depth <= 1 && self.status() == WorkflowStatus::Running {
            self.set_status(WorkflowStatus::Completed);
        }
    }

    /// Exiting on a failing path always moves the workflow to `failed`,
    /// regardless of nesting depth: a thrown step/task failure fails the
    /// workflow it occurred in.
    pub(crate) fn exit_execution_err(&self) {
        let depth = self.execution_depth.get();
        self.execution_depth.set(depth.saturating_sub(1));
        self.set_status(WorkflowStatus::Failed);
    }

    pub fn node(&self) -> &WorkflowNode {
        &self.node
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    pub fn cache(&self) -> &RefCell<Option<CacheIndex>> {
        &self.cache
    }

    pub fn parent(&self) -> Option<WorkflowNode> {
        self.node.parent()
    }

    pub fn children(&self) -> Vec<WorkflowNode> {
        self.node.children()
    }

    pub fn is_descendant_of(&self, ancestor: &WorkflowNode) -> bool {
        self.node.is_descendant_of(ancestor)
    }

    pub fn attach_child(&self, child: &WorkflowNode) -> Result<(), ValidationError> {
        self.node.attach_child(child)
    }

    pub fn detach_child(&self, child: &WorkflowNode) -> Result<(), ValidationError> {
        self.node.detach_child(child)
    }

    /// Emit a user-defined custom event with its own `type` discriminator
    /// and JSON payload.
    pub fn emit_custom_event(&self, type_name: impl Into<String>, payload: serde_json::Value) {
        self.node.emit_event(WorkflowEvent::Custom {
            type_name: type_name.into(),
            node: self.node.clone(),
            payload,
        });
    }

    /// Assemble an observed-state snapshot from `instance`'s registered
    /// fields, publish it on this node, and notify observers.
    pub fn snapshot_state<T: ObservedState>(&self, instance: &T) -> ObservedSnapshot {
        let snap = snapshot(instance);
        self.node.publish_state_snapshot(snap.clone());
        snap
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
