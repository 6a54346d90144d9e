//! Normalizes raw metrics JSON into [`AreaRecord`] values.
//!
//! Metrics files come in two shapes: an array of row objects, or an object
//! keyed by area id. Either way the family's [`FamilyDefinition`] says
//! which field is the area key and which is the access index.

use std::collections::BTreeMap;

use access_map_area_models::{AreaId, AreaRecord};
use access_map_ingest_models::FamilyDefinition;
use serde_json::{Map, Value};

use crate::IngestError;

/// Normalizes a metrics document into records, in document order.
///
/// Rows without an area id are skipped. A null or missing index means no
/// data; any other non-numeric index is rejected.
///
/// # Errors
///
/// * [`IngestError::InvalidInput`] if the document is neither an array nor
///   an object, or if an index or area id has an unusable type.
pub fn normalize_metrics(
    document: &Value,
    definition: &FamilyDefinition,
) -> Result<Vec<AreaRecord>, IngestError> {
    let records = match document {
        Value::Array(rows) => rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let Some(fields) = row.as_object() else {
                    log::warn!("Skipping metrics row {i}: not an object");
                    return None;
                };
                normalize_row(None, fields, definition).transpose()
            })
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(keyed) => keyed
            .iter()
            .filter_map(|(key, row)| {
                let Some(fields) = row.as_object() else {
                    log::warn!("Skipping metrics entry '{key}': not an object");
                    return None;
                };
                normalize_row(Some(key), fields, definition).transpose()
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(IngestError::invalid(format!(
                "metrics document must be an array or object, got {}",
                json_type(other)
            )));
        }
    };

    log::info!(
        "Normalized {} {} metric records",
        records.len(),
        definition.family
    );

    Ok(records)
}

/// Normalizes one row. `fallback_key` is the enclosing object key, used
/// when the row itself lacks the key field.
fn normalize_row(
    fallback_key: Option<&str>,
    fields: &Map<String, Value>,
    definition: &FamilyDefinition,
) -> Result<Option<AreaRecord>, IngestError> {
    let area_id = match fields.get(&definition.key_field) {
        Some(Value::Null) | None => fallback_key.map(AreaId::from),
        Some(value) => Some(area_id_from(value, &definition.key_field)?),
    };

    let Some(area_id) = area_id else {
        log::warn!(
            "Skipping metrics row without '{}' field",
            definition.key_field
        );
        return Ok(None);
    };

    let access_index = match fields.get(&definition.index_field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(other) => {
            return Err(IngestError::invalid(format!(
                "'{}' for area {area_id} must be a number, got {}",
                definition.index_field,
                json_type(other)
            )));
        }
    };

    let extra: BTreeMap<String, f64> = fields
        .iter()
        .filter(|(name, _)| **name != definition.key_field && **name != definition.index_field)
        .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
        .collect();

    Ok(Some(AreaRecord {
        area_id,
        access_index,
        extra,
    }))
}

/// Reads an area id from a string or integral number (`8` and `8.0` are
/// the same area).
pub(crate) fn area_id_from(value: &Value, field: &str) -> Result<AreaId, IngestError> {
    match value {
        Value::String(s) => Ok(AreaId::from(s.trim())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(AreaId::from(i));
            }
            match n.as_f64() {
                #[allow(clippy::cast_possible_truncation)]
                Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(AreaId::from(f as i64)),
                _ => Err(IngestError::invalid(format!(
                    "'{field}' must be an integer or string, got {n}"
                ))),
            }
        }
        other => Err(IngestError::invalid(format!(
            "'{field}' must be an integer or string, got {}",
            json_type(other)
        ))),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
