// SPDX-License-Identifier: MIT

//! Error types for workflow construction, tree mutation, and execution.
//!
//! [`ValidationError`] covers the fatal, always-synchronous mistakes a
//! caller can make against the tree (bad names, cycles, detaching the
//! wrong node). [`WorkflowError`] is the richer failure a step or task
//! body produces at runtime: it carries the opaque value the body threw
//! plus a forensic snapshot of the node that failed.

use crate::id::WorkflowId;
use crate::log::LogEntry;
use crate::state::ObservedSnapshot;
use std::fmt;

/// Fatal, synchronous errors from tree construction and mutation.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("workflow name must not be empty")]
    EmptyName,

    #[error("workflow name {0:?} exceeds maximum length")]
    NameTooLong(String),

    #[error("node {child} is already attached to a different parent ({existing})")]
    AlreadyHasParent { child: WorkflowId, existing: WorkflowId },

    #[error("attaching {child} to {parent} would create a cycle")]
    WouldCreateCycle { parent: WorkflowId, child: WorkflowId },

    #[error("{0} is not a child of {1}")]
    NotAChild(WorkflowId, WorkflowId),

    #[error("observers can only be registered on the root of a tree, {0} is not a root")]
    NotRoot(WorkflowId),

    #[error("task body returned a value that is not a workflow")]
    TaskReturnedNonWorkflow,
}

/// What a caller inspecting a [`WorkflowError`] can do next.
///
/// A pure projection over `state`/`logs`; this crate never retries, aborts,
/// or replans on its own — the parent step decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// A state snapshot was captured at failure time; a caller may be able
    /// to resume from it.
    HasState,
    /// No state snapshot is available; resuming would start from scratch.
    NoState,
}

/// A runtime failure from a step or task body.
///
/// Unlike [`ValidationError`], this is not a `thiserror` derive: it must
/// hold an opaque `anyhow::Error` (the "raw thrown value") alongside a
/// forensic snapshot, which doesn't fit a plain enum-of-variants shape.
#[derive(Debug)]
pub struct WorkflowError {
    /// Human-readable summary, independent of `original`'s own formatting.
    pub message: String,
    /// The value the failing body actually produced.
    pub original: anyhow::Error,
    /// The workflow node that was executing when this error was produced.
    pub workflow_id: WorkflowId,
    /// Captured backtrace-ish context, if the failing body supplied one.
    pub stack: Option<String>,
    /// Observed-state snapshot of the node at failure time, if available.
    pub state: Option<ObservedSnapshot>,
    /// Independent copy of the node's logs at failure time.
    pub logs: Vec<LogEntry>,
}

impl WorkflowError {
    pub fn new(workflow_id: WorkflowId, original: anyhow::Error) -> Self {
        let message = original.to_string();
        Self {
            message,
            original,
            workflow_id,
            stack: None,
            state: None,
            logs: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: Option<ObservedSnapshot>) -> Self {
        self.state = state;
        self
    }

    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// What a caller can reasonably do next, based on what was captured.
    pub fn retry_hint(&self) -> RetryHint {
        if self.state.is_some() {
            RetryHint::HasState
        } else {
            RetryHint::NoState
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workflow {} failed: {}", self.workflow_id, self.message)
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.original.as_ref())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
