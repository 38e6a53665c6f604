//! Job payload assembly.
//!
//! Turns a stored module configuration plus the reference records it
//! selects into the JSON payload the compute service expects. The database
//! reads happen in the orchestrator; this module only shapes data.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::error::CoreError;
use crate::modules::ModuleAdapter;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower ratio bound (percent) when the configuration does not set one.
pub const DEFAULT_MIN_RATIO: f64 = 0.0;

/// Upper ratio bound (percent) when the configuration does not set one.
pub const DEFAULT_MAX_RATIO: f64 = 100.0;

/// Settings keys the assembler writes itself; copied settings never
/// override them.
const RESERVED_KEYS: &[&str] = &["module", "limits", "costs"];

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// A reference record as seen by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceInput {
    pub id: DbId,
    pub name: String,
    pub composition: Value,
    pub unit_price: Option<f64>,
}

/// The parts of a stored configuration the payload depends on.
#[derive(Debug, Clone, Copy)]
pub struct ConfigInput<'a> {
    pub selected_ids: &'a [DbId],
    /// `{ "<id>": { "min": f64, "max": f64 } }`
    pub bounds: &'a Value,
    /// `{ "limits": {...}, "costs": {...}, ... }`
    pub settings: &'a Value,
}

/// Assembled payload plus the selected ids that had no reference record.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPayload {
    pub payload: Value,
    pub missing_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the start payload for `adapter`'s module.
///
/// Blocks follow the order of `config.selected_ids`. Ids without a
/// matching reference are reported in `missing_ids`; if no block survives
/// the configuration is unusable and `ConfigurationMissing` is returned.
pub fn assemble_payload(
    adapter: &ModuleAdapter,
    owner_id: DbId,
    config: ConfigInput<'_>,
    references: &[ReferenceInput],
) -> Result<AssembledPayload, CoreError> {
    let by_id: HashMap<DbId, &ReferenceInput> = references.iter().map(|r| (r.id, r)).collect();
    let default_price = config
        .settings
        .pointer("/costs/defaultUnitPrice")
        .and_then(number)
        .unwrap_or(0.0);

    let mut blocks = Vec::with_capacity(config.selected_ids.len());
    let mut missing_ids = Vec::new();
    for id in config.selected_ids {
        match by_id.get(id) {
            Some(reference) => blocks.push(parameter_block(
                adapter,
                reference,
                config.bounds.get(id.to_string()),
                default_price,
            )),
            None => missing_ids.push(*id),
        }
    }

    if blocks.is_empty() {
        return Err(CoreError::ConfigurationMissing {
            module: adapter.module.as_str().to_string(),
            owner_id,
        });
    }

    let mut payload = Map::new();
    payload.insert("module".into(), json!(adapter.module.as_str()));
    payload.insert(adapter.payload_key.into(), Value::Array(blocks));
    payload.insert("limits".into(), object_or_empty(config.settings.get("limits")));
    payload.insert("costs".into(), object_or_empty(config.settings.get("costs")));
    if let Some(extra) = config.settings.as_object() {
        for (key, value) in extra {
            if !RESERVED_KEYS.contains(&key.as_str()) && key != adapter.payload_key {
                payload.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(AssembledPayload {
        payload: Value::Object(payload),
        missing_ids,
    })
}

/// One fully populated numeric parameter block.
///
/// Every declared composition field is present; missing or non-numeric
/// values become `0.0`.
pub fn parameter_block(
    adapter: &ModuleAdapter,
    reference: &ReferenceInput,
    bounds: Option<&Value>,
    default_price: f64,
) -> Value {
    let mut block = Map::new();
    block.insert("id".into(), json!(reference.id));
    block.insert("name".into(), json!(reference.name));

    for field in adapter.composition_fields {
        let value = reference
            .composition
            .get(*field)
            .and_then(number)
            .unwrap_or(0.0);
        block.insert((*field).to_string(), json!(value));
    }

    let (min, max) = ratio_bounds(bounds);
    block.insert(
        "unitPrice".into(),
        json!(reference.unit_price.unwrap_or(default_price)),
    );
    block.insert("minRatio".into(), json!(min));
    block.insert("maxRatio".into(), json!(max));
    Value::Object(block)
}

/// Resolve `(min, max)` ratio bounds, clamped to `[0, 100]` and ordered.
pub fn ratio_bounds(bounds: Option<&Value>) -> (f64, f64) {
    let min = bounds
        .and_then(|b| b.get("min"))
        .and_then(number)
        .unwrap_or(DEFAULT_MIN_RATIO)
        .clamp(DEFAULT_MIN_RATIO, DEFAULT_MAX_RATIO);
    let max = bounds
        .and_then(|b| b.get("max"))
        .and_then(number)
        .unwrap_or(DEFAULT_MAX_RATIO)
        .clamp(DEFAULT_MIN_RATIO, DEFAULT_MAX_RATIO);
    if min <= max {
        (min, max)
    } else {
        (max, min)
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn object_or_empty(value: Option<&Value>) -> Value {
    match value {
        Some(v @ Value::Object(_)) => v.clone(),
        _ => Value::Object(Map::new()),
    }
}
