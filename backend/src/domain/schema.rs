//! Versioned upgrade of stored wallet documents.
//!
//! Documents written before versioning carry no `schemaVersion` field. Some of
//! them stored `classEarnings` as a single number and lack the `classes` and
//! `teacherName` settings. [`upgrade`] brings any known shape up to
//! [`CURRENT_SCHEMA_VERSION`] and is applied once wherever a document is loaded.

use chrono::NaiveDate;
use serde_json::map::Entry;
use serde_json::{Map, Value};
use shared::{WalletData, CURRENT_SCHEMA_VERSION};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Wallet document is not a JSON object")]
    NotAnObject,

    #[error("Wallet document has unsupported schema version {0}")]
    UnsupportedVersion(u64),

    #[error("Malformed wallet document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a stored document, upgrading older shapes first
pub fn upgrade(document: Value, today: NaiveDate) -> Result<WalletData, SchemaError> {
    let Value::Object(mut fields) = document else {
        return Err(SchemaError::NotAnObject);
    };

    let version = fields
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if version > u64::from(CURRENT_SCHEMA_VERSION) {
        return Err(SchemaError::UnsupportedVersion(version));
    }

    if version == 0 {
        upgrade_v0(&mut fields, today)?;
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Unversioned documents: fix the scalar class earnings and backfill every
/// missing field from the initial wallet
fn upgrade_v0(fields: &mut Map<String, Value>, today: NaiveDate) -> Result<(), SchemaError> {
    let Value::Object(defaults) = serde_json::to_value(WalletData::initial(today))? else {
        return Err(SchemaError::NotAnObject);
    };

    if !matches!(fields.get("classEarnings"), Some(Value::Object(_))) {
        fields.remove("classEarnings");
    }

    for (key, default) in defaults {
        let nested = key == "settings" || key == "stats";
        match fields.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(default);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), default) {
                (Value::Object(existing), Value::Object(default_fields)) if nested => {
                    for (nested_key, nested_default) in default_fields {
                        existing.entry(nested_key).or_insert(nested_default);
                    }
                }
                (existing, default) if existing.is_null() => *existing = default,
                _ => {}
            },
        }
    }

    fields.insert(
        "schemaVersion".to_string(),
        Value::from(CURRENT_SCHEMA_VERSION),
    );
    Ok(())
}
