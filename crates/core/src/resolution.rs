//! Identifier collection and rewriting for result records.
//!
//! Resolution is two passes over a batch with one lookup in between:
//! [`collect_identifiers`] gathers every distinct token found in the
//! module's resolvable fields, the caller looks all of them up at once,
//! and [`rewrite_identifiers`] swaps tokens for display names in place.
//! Tokens without a name are left untouched.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value};

use crate::modules::{FieldKind, ResolvableField};
use crate::path::{value_at, value_at_mut};
use crate::types::DbId;

/// Distinct identifier tokens split by lookup strategy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdentifierSet {
    /// Tokens that parse as database ids.
    pub numeric: Vec<DbId>,
    /// Everything else, looked up by name.
    pub names: Vec<String>,
}

impl IdentifierSet {
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.names.is_empty()
    }
}

/// Gather the distinct identifier tokens referenced by `fields` across
/// every record.
pub fn collect_identifiers(records: &[Value], fields: &[ResolvableField]) -> IdentifierSet {
    let mut tokens = BTreeSet::new();
    for record in records {
        for field in fields {
            let Some(value) = value_at(record, field.path) else {
                continue;
            };
            match field.kind {
                FieldKind::MapKeys => {
                    if let Value::Object(map) = value {
                        tokens.extend(map.keys().cloned());
                    }
                }
                FieldKind::Value => {
                    if let Some(token) = scalar_token(value) {
                        tokens.insert(token);
                    }
                }
            }
        }
    }

    let mut set = IdentifierSet::default();
    for token in tokens {
        // Only canonical integers go through the id lookup, so the
        // rewrite map can be keyed by `id.to_string()`.
        match token.parse::<DbId>() {
            Ok(id) if id.to_string() == token => set.numeric.push(id),
            _ => set.names.push(token),
        }
    }
    set
}

/// Replace identifier tokens with display names from `names`.
///
/// `names` maps the token exactly as it appears in the record (e.g. `"12"`)
/// to its display name.
pub fn rewrite_identifiers(
    records: &mut [Value],
    fields: &[ResolvableField],
    names: &HashMap<String, String>,
) {
    if names.is_empty() {
        return;
    }
    for record in records.iter_mut() {
        for field in fields {
            let Some(value) = value_at_mut(record, field.path) else {
                continue;
            };
            match field.kind {
                FieldKind::MapKeys => {
                    if let Value::Object(map) = value {
                        let original = std::mem::take(map);
                        *map = rename_keys(original, names);
                    }
                }
                FieldKind::Value => {
                    if let Some(name) = scalar_token(value).and_then(|t| names.get(&t)) {
                        *value = Value::String(name.clone());
                    }
                }
            }
        }
    }
}

/// Rename map keys, keeping the original key whenever the display name
/// would collide with another entry so no value is dropped.
fn rename_keys(map: Map<String, Value>, names: &HashMap<String, String>) -> Map<String, Value> {
    let mut targets: Vec<String> = Vec::with_capacity(map.len());
    {
        let originals: HashSet<&str> = map.keys().map(String::as_str).collect();
        let mut renamed: HashSet<&str> = HashSet::new();
        for key in map.keys() {
            let target = match names.get(key) {
                Some(name)
                    if name != key
                        && !originals.contains(name.as_str())
                        && renamed.insert(name.as_str()) =>
                {
                    name.clone()
                }
                _ => key.clone(),
            };
            targets.push(target);
        }
    }

    targets.into_iter().zip(map.into_iter().map(|(_, v)| v)).collect()
}

fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
