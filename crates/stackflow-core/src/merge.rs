//! Desired-state merger
//!
//! Computes the descriptor submitted to the remote side from the existing
//! representation (if any) and a sparse set of desired fields.

use crate::descriptor::{ConfigMap, ConfigValue, DesiredFields, ResourceDescriptor};
use serde_json::Value;

/// Merge `desired` over `existing`
///
/// - attributes are overlaid one by one; empty desired values never erase
///   an existing value
/// - config is merged key by key (desired wins per key, existing-only keys
///   survive), then every entry is widened to a sequence
/// - when no config is desired, the existing config is carried verbatim
pub fn merge(existing: Option<&ResourceDescriptor>, desired: &DesiredFields) -> ResourceDescriptor {
    let mut target = existing.cloned().unwrap_or_default();

    for (key, value) in &desired.attributes {
        // id and config are structural, never plain attributes
        if key == "id" || key == "config" || is_empty(value) {
            continue;
        }
        target.attributes.insert(key.clone(), value.clone());
    }

    if !desired.config.is_empty() {
        let mut merged = existing
            .and_then(|e| e.config.clone())
            .unwrap_or_default();
        merged.extend(
            desired
                .config
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        target.config = Some(normalize_config(&merged));
    }

    target
}

/// Widen every entry of a config mapping to a sequence
pub fn normalize_config(config: &ConfigMap) -> ConfigMap {
    config
        .iter()
        .map(|(key, value)| (key.clone(), ConfigValue::Sequence(value.normalize())))
        .collect()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
