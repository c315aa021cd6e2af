//! Entity Projection
//!
//! Converts an entity's column attributes into a field/value map for
//! serialization at the data-access boundary.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::utils::error::{AppError, AppResult};

/// Project an entity into a field/value map, optionally excluding a set of
/// field names. Excludes nothing by default: `deleted_at` is included.
pub fn to_map<M: Serialize>(model: &M, exclude: Option<&[&str]>) -> AppResult<Map<String, Value>> {
    let value = serde_json::to_value(model)?;
    let mut map = match value {
        Value::Object(map) => map,
        _ => return Err(AppError::validation("entity did not serialize to an object")),
    };

    if let Some(exclude) = exclude {
        for key in exclude {
            map.remove(*key);
        }
    }

    Ok(map)
}
