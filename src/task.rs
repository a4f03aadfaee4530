// SPDX-License-Identifier: MIT

//! Task wrapper: brackets a user method that returns child workflow(s) (or
//! a plain value) with `taskStart`/`taskEnd` events, attaches and runs
//! those children, and full-settlement-joins concurrent children.

use crate::error::{ValidationError, WorkflowError};
use crate::event::WorkflowEvent;
use crate::workflow::{WorkflowBase, WorkflowHandle};
use std::future::Future;
use std::rc::Rc;

/// Options controlling one [`run_task`] invocation.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Await children concurrently (full-settlement join) instead of one
    /// at a time.
    pub concurrent: bool,
}

/// Normalized return shape of a task-wrapped method.
///
/// `spec.md` §4.3 allows a task body to return "a workflow, a sequence of
/// workflows, or a value" and treats any other return shape as a fatal
/// runtime error. In this typed rendition that third case is excluded by
/// construction — there is no fourth variant to construct — so
/// [`ValidationError::TaskReturnedNonWorkflow`] is kept only as the
/// contract-level error the spec names, not as a reachable branch here.
#[derive(Debug, Clone)]
pub enum TaskOutput {
    Workflows(Vec<WorkflowHandle>),
    Value(serde_json::Value),
}

impl From<WorkflowHandle> for TaskOutput {
    fn from(child: WorkflowHandle) -> Self {
        TaskOutput::Workflows(vec![child])
    }
}

impl From<Vec<WorkflowHandle>> for TaskOutput {
    fn from(children: Vec<WorkflowHandle>) -> Self {
        TaskOutput::Workflows(children)
    }
}

impl From<serde_json::Value> for TaskOutput {
    fn from(value: serde_json::Value) -> Self {
        TaskOutput::Value(value)
    }
}

/// Failure from [`run_task`]: either a fatal tree-mutation error while
/// attaching a returned child, or the first child `run()` failure
/// collected by the full-settlement join.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Workflow(Rc<WorkflowError>),
}

/// Run `body` as a task named `name` on `base`.
///
/// 1. Emits `taskStart`.
/// 2. Runs `body`, getting back a [`TaskOutput`].
/// 3. If it carries workflows, attaches each that is not already a child
///    of `base` (a child constructed with `parent = Some(base.node())` is
///    already attached and this is a no-op for it, matching
///    [`crate::node::WorkflowNode::attach_child`]'s idempotence), then
///    awaits their `run()`s — sequentially by default, or with a
///    full-settlement join when `opts.concurrent` is set.
/// 4. Emits `taskEnd` before returning (success) or before propagating the
///    first collected child failure.
pub async fn run_task<F, Fut>(
    base: &WorkflowBase,
    name: impl Into<String>,
    opts: TaskOptions,
    body: F,
) -> Result<TaskOutput, TaskError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = TaskOutput>,
{
    let name = name.into();
    let node = base.node().clone();
    base.enter_execution();
    node.emit_event(WorkflowEvent::TaskStart { node: node.clone(), task: name.clone() });

    let output = body().await;

    if let TaskOutput::Workflows(children) = &output {
        for child in children {
            let child_node = child.borrow().base().node().clone();
            if let Err(error) = base.attach_child(&child_node) {
                node.emit_event(WorkflowEvent::TaskEnd { node: node.clone(), task: name.clone() });
                base.exit_execution_err();
                return Err(TaskError::Validation(error));
            }
        }
        let result = if opts.concurrent {
            run_concurrent(children).await
        } else {
            run_sequential(children).await
        };
        if let Err(error) = result {
            node.emit_event(WorkflowEvent::TaskEnd { node: node.clone(), task: name.clone() });
            base.exit_execution_err();
            return Err(TaskError::Workflow(error));
        }
    }

    node.emit_event(WorkflowEvent::TaskEnd { node: node.clone(), task: name.clone() });
    base.exit_execution_ok();
    Ok(output)
}

/// Await each child's `run()` in order, stopping at the first failure.
async fn run_sequential(children: &[WorkflowHandle]) -> Result<(), Rc<WorkflowError>> {
    for child in children {
        let guard = child.borrow();
        guard.run().await?;
    }
    Ok(())
}

/// Full-settlement join: every child's `run()` is awaited to completion
/// regardless of peer failures, then the first collected rejection (in
/// child order) is returned.
async fn run_concurrent(children: &[WorkflowHandle]) -> Result<(), Rc<WorkflowError>> {
    let futures = children.iter().map(|child| async move {
        let guard = child.borrow();
        guard.run().await
    });
    let results = futures::future::join_all(futures).await;

    let mut first_error = None;
    for result in results {
        if let Err(error) = result {
            first_error.get_or_insert(error);
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
