// SPDX-License-Identifier: MIT

//! Structured log emission bound to a node and its root observers.

use crate::clock::Clock;
use crate::id::{LogId, WorkflowId};
use crate::observer::notify_on_log;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single structured log record appended to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    pub workflow_id: WorkflowId,
    pub timestamp_ms: u64,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_log_id: Option<LogId>,
}

/// What a [`Logger`] needs from the node it is bound to: a place to append
/// entries and a snapshot of the current observed state for observer
/// notification. `node.rs` implements this for `WorkflowNode`.
pub trait LogSink {
    fn workflow_id(&self) -> WorkflowId;
    fn append_log(&self, entry: LogEntry);
    fn root_observers(&self) -> Vec<Rc<dyn crate::observer::Observer>>;
}

/// Bound to a single node; produces [`LogEntry`] records and notifies the
/// owning root's observers.
#[derive(Clone)]
pub struct Logger {
    sink: Rc<dyn LogSink>,
    clock: Rc<dyn Clock>,
    parent_log_id: RefCell<Option<LogId>>,
}

impl Logger {
    pub fn new(sink: Rc<dyn LogSink>, clock: Rc<dyn Clock>) -> Self {
        Self { sink, clock, parent_log_id: RefCell::new(None) }
    }

    /// A derived logger bound to the same node and observers, with
    /// `parent_log_id` drawn from `meta` when present.
    pub fn child(&self, parent_log_id: Option<LogId>) -> Self {
        Self {
            sink: self.sink.clone(),
            clock: self.clock.clone(),
            parent_log_id: RefCell::new(parent_log_id),
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn debug_with(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Debug, message, Some(data));
    }

    pub fn info_with(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Info, message, Some(data));
    }

    pub fn warn_with(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Warn, message, Some(data));
    }

    pub fn error_with(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Error, message, Some(data));
    }

    fn log(&self, level: LogLevel, message: impl Into<String>, data: Option<Value>) {
        let sink = &self.sink;
        let entry = LogEntry {
            id: LogId::new(),
            workflow_id: sink.workflow_id(),
            timestamp_ms: self.clock.epoch_ms(),
            level,
            message: message.into(),
            data,
            parent_log_id: *self.parent_log_id.borrow(),
        };
        sink.append_log(entry.clone());
        self.notify(sink, entry);
    }

    fn notify(&self, sink: &Rc<dyn LogSink>, entry: LogEntry) {
        let observers = sink.root_observers();
        if let Err(failure) = notify_on_log(&observers, &entry) {
            // Recursion-breaking path: do not re-notify, write the failure
            // straight onto the node's log.
            let fallback = LogEntry {
                id: LogId::new(),
                workflow_id: sink.workflow_id(),
                timestamp_ms: self.clock.epoch_ms(),
                level: LogLevel::Error,
                message: "Observer onLog error".to_string(),
                data: Some(serde_json::json!({ "error": failure.to_string() })),
                parent_log_id: None,
            };
            sink.append_log(fallback);
        }
    }
}

/// Helper used by [`crate::error::WorkflowError`] assembly: produce an
/// independent copy of a node's current logs.
pub fn copy_logs(logs: &[LogEntry]) -> Vec<LogEntry> {
    logs.to_vec()
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
