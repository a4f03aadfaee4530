// SPDX-License-Identifier: MIT

//! Read-only introspection queries over a live workflow tree.
//!
//! These are the JSON-schema-describable "tools" `spec.md` §4.8 says an
//! LLM-driven agent layer can call without ever acquiring mutation rights:
//! every function here takes `&WorkflowNode`/`&WorkflowBase` and returns a
//! plain, `Serialize`-able value. None of them mutate the tree.

use crate::cache::CacheEntry;
use crate::event::WorkflowEvent;
use crate::id::WorkflowId;
use crate::node::{NodeSummary, WorkflowNode};
use crate::state::ObservedSnapshot;
use crate::workflow::WorkflowBase;
use serde::Serialize;

/// Hard cap on how many ancestors [`read_ancestor_outputs`] (and the
/// ancestor list in [`inspect_hierarchy`]) will walk, regardless of the
/// caller-supplied depth.
pub const MAX_ANCESTRY_DEPTH: usize = 1_000;

/// Hard cap on how many entries any introspection query returns.
pub const MAX_RESULTS: usize = 1_000;

/// How much of the surrounding tree [`inspect_hierarchy`] should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyDepth {
    CurrentOnly,
    ParentOnly,
    AncestorsOnly,
    FullTree,
}

/// Result of [`inspect_hierarchy`].
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyView {
    pub current: NodeSummary,
    pub parent: Option<NodeSummary>,
    pub ancestors: Vec<NodeSummary>,
    pub siblings: Vec<NodeSummary>,
    pub hierarchy_depth: usize,
    pub total_siblings: usize,
}

/// Structural position of `node` in its tree: its parent, the full
/// ancestor chain to the root, and its siblings — trimmed to what `depth`
/// asks for.
pub fn inspect_hierarchy(node: &WorkflowNode, depth: HierarchyDepth) -> HierarchyView {
    let current = node.summary();
    let parent = node.parent();

    let siblings: Vec<NodeSummary> = parent
        .as_ref()
        .map(|p| {
            p.children()
                .iter()
                .filter(|c| c.id() != node.id())
                .map(|c| c.summary())
                .collect()
        })
        .unwrap_or_default();
    let total_siblings = siblings.len();

    let mut ancestors = Vec::new();
    let mut current_walk = node.clone();
    let mut hierarchy_depth = 0;
    while let Some(p) = current_walk.parent() {
        hierarchy_depth += 1;
        if ancestors.len() < MAX_ANCESTRY_DEPTH {
            ancestors.push(p.summary());
        }
        current_walk = p;
    }

    let parent_summary = parent.as_ref().map(|p| p.summary());
    let (parent_out, ancestors_out, siblings_out) = match depth {
        HierarchyDepth::CurrentOnly => (None, Vec::new(), Vec::new()),
        HierarchyDepth::ParentOnly => (parent_summary, Vec::new(), siblings),
        HierarchyDepth::AncestorsOnly => (parent_summary, ancestors, Vec::new()),
        HierarchyDepth::FullTree => (parent_summary, ancestors, siblings),
    };

    HierarchyView {
        current,
        parent: parent_out,
        ancestors: ancestors_out,
        siblings: siblings_out,
        hierarchy_depth,
        total_siblings,
    }
}

/// One ancestor's last observed output, as seen from [`read_ancestor_outputs`].
#[derive(Debug, Clone, Serialize)]
pub struct AncestorOutput {
    pub id: WorkflowId,
    pub name: String,
    pub state_snapshot: Option<ObservedSnapshot>,
}

/// Walk from `node` up to the root (or `max_depth` ancestors, whichever
/// comes first, capped at [`MAX_ANCESTRY_DEPTH`]), returning each
/// ancestor's latest observed-state snapshot. Redacted fields stay
/// redacted — this reads whatever [`crate::state::snapshot`] already
/// produced, it never re-derives raw field values.
pub fn read_ancestor_outputs(node: &WorkflowNode, max_depth: Option<usize>) -> Vec<AncestorOutput> {
    let limit = max_depth.unwrap_or(MAX_ANCESTRY_DEPTH).min(MAX_ANCESTRY_DEPTH);
    let mut out = Vec::new();
    let mut current = node.clone();
    while out.len() < limit {
        let Some(parent) = current.parent() else { break };
        out.push(AncestorOutput {
            id: parent.id(),
            name: parent.name(),
            state_snapshot: parent.state_snapshot(),
        });
        current = parent;
    }
    out
}

/// Cache entries visible to `base`, or an empty list if it was never
/// opted into caching via [`WorkflowBase::with_cache`].
pub fn inspect_cache(base: &WorkflowBase) -> Vec<CacheEntry> {
    let mut entries = base.cache().borrow().as_ref().map(|c| c.entries()).unwrap_or_default();
    entries.truncate(MAX_RESULTS);
    entries
}

/// A filtered, most-recent-first-capped slice of events from one or more
/// nodes. `limit` is clamped to [`MAX_RESULTS`]; when `event_types` is
/// `Some`, only events whose [`WorkflowEvent::name`] appears in it are
/// kept. Events are returned in their original append order.
pub fn read_event_history(
    nodes: &[WorkflowNode],
    event_types: Option<&[&str]>,
    limit: usize,
) -> Vec<WorkflowEvent> {
    let limit = limit.min(MAX_RESULTS);
    let mut all: Vec<WorkflowEvent> = nodes
        .iter()
        .flat_map(|n| n.events())
        .filter(|e| event_types.map(|types| types.contains(&e.name())).unwrap_or(true))
        .collect();
    if all.len() > limit {
        let drop = all.len() - limit;
        all.drain(0..drop);
    }
    all
}

/// The latest observed-state snapshot for `node`, or `None` if it has
/// never snapshotted.
pub fn inspect_state_snapshot(node: &WorkflowNode) -> Option<ObservedSnapshot> {
    node.state_snapshot()
}

#[cfg(test)]
#[path = "introspection_tests.rs"]
mod tests;
