//! Deterministic cell names from builder parameters.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::LayoutResult;

/// Names longer than this are replaced by a digest.
pub const MAX_NAME_LEN: usize = 99;

/// Format a float with six decimals, trailing zeros trimmed.
pub fn format_float(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    let key = |k: &str| {
        if prefix.is_empty() {
            k.to_string()
        } else {
            format!("{prefix}.{k}")
        }
    };
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            let text = match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => i.to_string(),
                (None, Some(u)) => u.to_string(),
                _ => format_float(n.as_f64().unwrap_or_default()),
            };
            out.insert(prefix.to_string(), text);
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&key(&i.to_string()), item, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten(&key(k), v, out);
            }
        }
    }
}

/// Sorted `key=value` tokens for a parameter record.
pub fn param_tokens(params: &impl Serialize) -> LayoutResult<Vec<String>> {
    let value = serde_json::to_value(params)?;
    let mut flat = BTreeMap::new();
    flatten("", &value, &mut flat);
    Ok(flat.into_iter().map(|(k, v)| format!("{k}={v}")).collect())
}

/// `builder_key1=v1_key2=v2...`, or `builder_<32 hex>` when that is too long.
pub fn cell_name(builder: &str, params: &impl Serialize) -> LayoutResult<String> {
    let tokens = param_tokens(params)?;
    if tokens.is_empty() {
        return Ok(builder.to_string());
    }
    let full = format!("{builder}_{}", tokens.join("_"));
    if full.len() <= MAX_NAME_LEN {
        return Ok(full);
    }
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, full.as_bytes()).simple();
    Ok(format!("{builder}_{digest}"))
}
