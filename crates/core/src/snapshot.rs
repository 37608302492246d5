//! Context snapshot — the structured state blob injected into a session.
//!
//! A snapshot is a keyed mapping of arbitrary JSON values read wholesale
//! from the context store. It is never mutated in place, only replaced by
//! a fresh read. Its stringified form feeds both prompt placeholder
//! substitution and the initiation payload's dynamic-variable map, and is
//! the representation the synchronizer diffs between polls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mapping from key to stringified value.
///
/// `BTreeMap` so iteration order is stable — the changed-key summary and
/// the serialized dynamic-variable map must be deterministic.
pub type StringMap = BTreeMap<String, String>;

/// A full context snapshot: unique keys, arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot(pub serde_json::Map<String, Value>);

impl ContextSnapshot {
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Convert to a string map for dynamic variables and prompt rendering.
    ///
    /// - objects and lists serialize as compact JSON text (stable, so equal
    ///   values always stringify equally for diffing)
    /// - `null` becomes the empty string
    /// - strings pass through without JSON quoting
    /// - other scalars use their plain text representation
    pub fn stringify(&self) -> StringMap {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), stringify_value(v)))
            .collect()
    }
}

fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Compact JSON; serialization of a Value cannot fail
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Compute the set of keys whose stringified value changed between two
/// successive snapshots.
///
/// A key present in `current` but absent from `previous` counts as changed;
/// keys that disappeared are not reported (only current keys are compared,
/// so a deleted key resurfaces the next time it is written).
pub fn changed_keys(previous: &StringMap, current: &StringMap) -> Vec<String> {
    current
        .iter()
        .filter(|&(k, v)| previous.get(k) != Some(v))
        .map(|(k, _)| k.clone())
        .collect()
}
