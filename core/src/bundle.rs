//! Reading and writing the whole data bundle as one JSON document.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::AppData;

/// Top-level keys an imported document must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["user_settings", "workout_programs", "session_history"];

/// Parses a stored bundle, filling anything older documents did not record.
///
/// Missing or null fields take their defaults; programs without a frequency
/// get their schedule length.
pub fn load_bundle(text: &str) -> Result<AppData> {
    let mut value: Value = serde_json::from_str(text)?;
    strip_nulls(&mut value);
    let mut data: AppData = serde_json::from_value(value)?;
    data.normalize();
    Ok(data)
}

/// Parses an externally supplied document that replaces the whole bundle.
///
/// Stricter than [`load_bundle`]: the document must be an object carrying
/// every key in [`REQUIRED_KEYS`].
pub fn import_bundle(text: &str) -> Result<AppData> {
    let mut value: Value =
        serde_json::from_str(text).map_err(|e| Error::InvalidDocument(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(Error::InvalidDocument("expected a JSON object".to_string()));
    };
    if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
        return Err(Error::InvalidDocument(format!("missing `{missing}`")));
    }

    strip_nulls(&mut value);
    let mut data: AppData =
        serde_json::from_value(value).map_err(|e| Error::InvalidDocument(e.to_string()))?;
    data.normalize();
    Ok(data)
}

pub fn export_bundle(data: &AppData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
