// SPDX-License-Identifier: MIT

//! Step wrapper: brackets a user method with `stepStart`/`stepEnd` events,
//! optional timing and state-snapshotting, and error wrapping.
//!
//! Rust has no method decorators, so this is the "explicit higher-order
//! helper" rendition `spec.md` §9 calls for: a concrete workflow's step
//! method calls [`run_step`] around its own body instead of being
//! decorated by one.

use crate::error::WorkflowError;
use crate::event::WorkflowEvent;
use crate::log::copy_logs;
use crate::state::ObservedSnapshot;
use crate::workflow::WorkflowBase;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

/// Options controlling one [`run_step`] invocation.
#[derive(Debug, Clone)]
pub struct StepOptions {
    /// Publish an observed-state snapshot on success.
    pub snapshot_state: bool,
    /// Emit `stepEnd` with a real elapsed duration rather than zero.
    pub track_timing: bool,
    /// Write an info log at step entry.
    pub log_start: bool,
    /// Write an info log at step completion.
    pub log_finish: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self { snapshot_state: false, track_timing: true, log_start: false, log_finish: false }
    }
}

/// A closure producing an [`ObservedSnapshot`] for the workflow instance a
/// step body belongs to. Kept as a plain `Fn` rather than a generic
/// `ObservedState` bound so `run_step` itself stays non-generic over the
/// caller's concrete workflow type; the closure is typically just
/// `|| snapshot(self)`.
pub type SnapshotFn<'a> = dyn Fn() -> ObservedSnapshot + 'a;

/// Run `body` as a step named `name` on `base`.
///
/// On success: optionally publishes a state snapshot (if `opts
/// .snapshot_state` and `snapshot_fn` are both present), emits `stepEnd`
/// with elapsed timing (or zero duration if `opts.track_timing` is
/// false), and returns the user value.
///
/// On failure: assembles a [`WorkflowError`] (message from the error,
/// workflow id, a state snapshot taken via `snapshot_fn` regardless of
/// `opts.snapshot_state` — the forensic snapshot is unconditional per
/// `spec.md` §4.2 — and an independent copy of the node's logs), emits
/// `error{node, error}`, and returns it.
///
/// The error type is `Rc<WorkflowError>` rather than an owned
/// `WorkflowError`: the same value is both recorded on the node's event
/// log (`WorkflowEvent::Error` already carries `Rc<WorkflowError>`, see
/// `event.rs`) and returned to the caller, and `WorkflowError` holds an
/// `anyhow::Error` payload that cannot be cheaply duplicated.
pub async fn run_step<F, Fut, T>(
    base: &WorkflowBase,
    name: impl Into<String>,
    opts: StepOptions,
    snapshot_fn: Option<&SnapshotFn<'_>>,
    body: F,
) -> Result<T, Rc<WorkflowError>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let name = name.into();
    let node = base.node().clone();
    base.enter_execution();

    node.emit_event(WorkflowEvent::StepStart { node: node.clone(), step: name.clone() });
    if opts.log_start {
        base.logger().info(format!("STEP START: {name}"));
    }

    let start = opts.track_timing.then(|| base.clock().now());

    match body().await {
        Ok(value) => {
            if opts.snapshot_state {
                if let Some(f) = snapshot_fn {
                    node.publish_state_snapshot(f());
                }
            }
            let duration = start
                .map(|s| base.clock().now().saturating_duration_since(s))
                .unwrap_or(Duration::ZERO);
            node.emit_event(WorkflowEvent::StepEnd { node: node.clone(), step: name.clone(), duration });
            if opts.log_finish {
                base.logger().info(format!("STEP END: {name}"));
            }
            base.exit_execution_ok();
            Ok(value)
        }
        Err(original) => {
            let state = snapshot_fn.map(|f| f());
            let error = WorkflowError::new(base.id(), original)
                .with_state(state)
                .with_logs(copy_logs(&node.logs()));
            let error = Rc::new(error);
            node.emit_event(WorkflowEvent::Error { node: node.clone(), error: error.clone() });
            base.exit_execution_err();
            Err(error)
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
