//! # Recursive Config Merge
//!
//! The merge rule for layered rule configuration: when both sides hold
//! a dict, merge key-by-key recursively; any other collision is
//! wholesale replacement by the later source. Lists do not merge —
//! replacing a list outright is how a layer retires entries.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}
