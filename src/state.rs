// SPDX-License-Identifier: MIT

//! Observed-state metadata and snapshot assembly.
//!
//! A workflow subclass declares which of its fields are "observed" by
//! registering them, once per concrete type, in a process-wide registry
//! keyed by [`TypeId`] — the stable class id this crate has in place of a
//! prototype map. Metadata lives in the registry, never on the instance,
//! so subclasses only need to register once and snapshots stay cheap to
//! assemble.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Per-field visibility rules for observed-state snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field is excluded entirely from snapshots.
    pub hidden: bool,
    /// Field is included but its value is replaced with `"***"`.
    pub redact: bool,
}

impl FieldSpec {
    pub const VISIBLE: FieldSpec = FieldSpec { hidden: false, redact: false };
    pub const HIDDEN: FieldSpec = FieldSpec { hidden: true, redact: false };
    pub const REDACTED: FieldSpec = FieldSpec { hidden: false, redact: true };
}

type ClassRegistry = HashMap<TypeId, HashMap<&'static str, FieldSpec>>;

fn registry() -> &'static Mutex<ClassRegistry> {
    static REGISTRY: OnceLock<Mutex<ClassRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register (or update) the observed-field metadata for a concrete workflow
/// type. Call once, typically from the type's constructor or a `OnceLock`
/// guard; later calls for the same type overwrite earlier ones.
pub fn register_fields<T: 'static>(fields: impl IntoIterator<Item = (&'static str, FieldSpec)>) {
    let mut reg = registry().lock().unwrap_or_else(|e| e.into_inner());
    reg.insert(TypeId::of::<T>(), fields.into_iter().collect());
}

fn fields_for<T: 'static>() -> HashMap<&'static str, FieldSpec> {
    registry()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&TypeId::of::<T>())
        .cloned()
        .unwrap_or_default()
}

/// Implemented by workflow subclasses that want their fields included in
/// observed-state snapshots.
///
/// `observed_values` should return the instance's current values for every
/// field the type registered via [`register_fields`], keyed by field name;
/// fields not present in the registry are ignored.
pub trait ObservedState: 'static {
    fn observed_values(&self) -> HashMap<&'static str, Value>;
}

/// A flat, redaction-applied record produced from a workflow's observed
/// fields at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservedSnapshot {
    pub fields: HashMap<String, Value>,
}

impl ObservedSnapshot {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Assemble a snapshot for `instance` by combining its registered field
/// metadata with its current observed values.
pub fn snapshot<T: ObservedState>(instance: &T) -> ObservedSnapshot {
    let specs = fields_for::<T>();
    let values = instance.observed_values();
    let mut fields = HashMap::new();
    for (name, spec) in specs {
        if spec.hidden {
            continue;
        }
        let value = if spec.redact {
            Value::String("***".to_string())
        } else {
            values.get(name).cloned().unwrap_or(Value::Null)
        };
        fields.insert(name.to_string(), value);
    }
    ObservedSnapshot { fields }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
