//! Aggregation policies: pure reducers over ordered implementation results.
//!
//! Every reducer receives results in registration order, one entry per
//! implementation that actually ran. `None` and JSON `null` both count as
//! abstentions.

use std::collections::HashSet;

use serde_json::{Map, Value};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;

use super::definitions::HookValue;

/// Returns the first non-null result.
pub fn first_non_null(results: Vec<Option<HookValue>>) -> Option<HookValue> {
    results.into_iter().flatten().find(|v| !v.is_null())
}

/// Returns the first boolean decision, or `None` if every result abstained.
///
/// Non-boolean answers are a plugin error, never an implicit allow or deny.
pub fn decisive(hook: &str, results: Vec<Option<HookValue>>) -> AppResult<Option<bool>> {
    match first_non_null(results) {
        None => Ok(None),
        Some(HookValue::Bool(b)) | Some(HookValue::Json(Value::Bool(b))) => Ok(Some(b)),
        Some(other) => Err(AppError::plugin(format!(
            "Hook '{hook}' returned {}, expected a bool or no answer",
            other.kind_name()
        ))),
    }
}

/// Flattens every non-null result into one ordered list.
///
/// A result may be a single item, a [`HookValue::List`] or a JSON array.
/// When `key` is given, items with an identity already seen are dropped so
/// only the first occurrence keeps its position; items without an identity
/// are always kept.
pub fn collect_flatten<K>(results: Vec<Option<HookValue>>, key: Option<K>) -> Vec<HookValue>
where
    K: Fn(&HookValue) -> Option<String>,
{
    let mut items = Vec::new();
    for value in results.into_iter().flatten() {
        flatten_into(value, &mut items);
    }

    let Some(key) = key else {
        return items;
    };

    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match key(item) {
            Some(identity) => seen.insert(identity),
            None => true,
        })
        .collect()
}

fn flatten_into(value: HookValue, out: &mut Vec<HookValue>) {
    match value {
        HookValue::List(values) => {
            for v in values {
                flatten_into(v, out);
            }
        }
        HookValue::Json(Value::Array(values)) => {
            for v in values {
                flatten_into(HookValue::Json(v), out);
            }
        }
        v if v.is_null() => {}
        v => out.push(v),
    }
}

/// Deep-merges mapping results left to right, then `local` on top.
pub fn merge_dict(
    hook: &str,
    results: Vec<Option<HookValue>>,
    local: Option<&Map<String, Value>>,
) -> AppResult<Map<String, Value>> {
    let mut merged = Map::new();
    for value in results.into_iter().flatten() {
        match value {
            HookValue::Json(Value::Object(map)) => deep_merge(&mut merged, &map),
            v if v.is_null() => {}
            other => {
                return Err(AppError::plugin(format!(
                    "Hook '{hook}' returned {}, expected a mapping",
                    other.kind_name()
                )));
            }
        }
    }
    if let Some(local) = local {
        deep_merge(&mut merged, local);
    }
    Ok(merged)
}

/// Merges `source` into `target`.
///
/// Nested mappings merge recursively; any other non-null value replaces
/// what was there; null leaves never overwrite.
pub fn deep_merge(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        if value.is_null() {
            continue;
        }
        if let (Some(Value::Object(existing)), Value::Object(incoming)) =
            (target.get_mut(key), value)
        {
            deep_merge(existing, incoming);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}
