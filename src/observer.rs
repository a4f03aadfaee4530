// SPDX-License-Identifier: MIT

//! Observer fabric: the capability set a caller registers on a root
//! workflow to receive logs, events, state updates, and tree-shape
//! changes from everything rooted at it.
//!
//! Every notification runs inside an isolation guard: a failing observer
//! never stops delivery to the observers registered after it, and never
//! propagates out of the emitting call. Observer methods return
//! `anyhow::Result<()>` rather than panicking — this is the idiomatic
//! Rust rendition of "thrown exception" isolation: a fallible callback,
//! not a caught panic.

use crate::event::WorkflowEvent;
use crate::log::LogEntry;
use crate::node::WorkflowNode;

/// Capability set an observer implements. Registered only on a root
/// workflow; notified in registration order.
pub trait Observer {
    fn on_log(&self, entry: &LogEntry) -> anyhow::Result<()> {
        let _ = entry;
        Ok(())
    }

    fn on_event(&self, event: &WorkflowEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }

    fn on_state_updated(&self, node: &WorkflowNode) -> anyhow::Result<()> {
        let _ = node;
        Ok(())
    }

    fn on_tree_changed(&self, root: &WorkflowNode) -> anyhow::Result<()> {
        let _ = root;
        Ok(())
    }
}

/// Notify every observer's `on_log`, in order, isolating individual
/// failures. Returns the first failure (if any) so the caller can apply
/// the recursion-breaking fallback described on [`crate::log::Logger`];
/// the failure itself has already been isolated from later observers.
pub fn notify_on_log(
    observers: &[std::rc::Rc<dyn Observer>],
    entry: &LogEntry,
) -> Result<(), anyhow::Error> {
    let mut first_failure = None;
    for observer in observers {
        if let Err(e) = observer.on_log(entry) {
            first_failure.get_or_insert(e);
        }
    }
    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Notify every observer's `on_event`, in order. Each failure is reported,
/// one call per failing observer, to `on_failure` rather than logged here
/// directly — the caller (a node, which owns a [`crate::log::Logger`])
/// decides how to turn it into the `'Observer onEvent error'` log entry
/// `spec.md` §4.1/§4.7 describes.
pub fn notify_on_event(
    observers: &[std::rc::Rc<dyn Observer>],
    event: &WorkflowEvent,
    mut on_failure: impl FnMut(anyhow::Error),
) {
    for observer in observers {
        if let Err(e) = observer.on_event(event) {
            on_failure(e);
        }
    }
}

/// Notify every observer's `on_state_updated`, in order, reporting each
/// failure to `on_failure`.
pub fn notify_on_state_updated(
    observers: &[std::rc::Rc<dyn Observer>],
    node: &WorkflowNode,
    mut on_failure: impl FnMut(anyhow::Error),
) {
    for observer in observers {
        if let Err(e) = observer.on_state_updated(node) {
            on_failure(e);
        }
    }
}

/// Notify every observer's `on_tree_changed`, in order, reporting each
/// failure to `on_failure`.
pub fn notify_on_tree_changed(
    observers: &[std::rc::Rc<dyn Observer>],
    root: &WorkflowNode,
    mut on_failure: impl FnMut(anyhow::Error),
) {
    for observer in observers {
        if let Err(e) = observer.on_tree_changed(root) {
            on_failure(e);
        }
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
