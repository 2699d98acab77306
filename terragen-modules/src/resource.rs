//! Shared resource record construction
//!
//! Every generated resource is a Terraform-JSON `null_resource` whose
//! `triggers` block carries the simulated attributes. Records are built once
//! at construction time, so module exports stay byte-stable.

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Tag map applied to generated resources
pub type Tags = BTreeMap<String, String>;

/// Short random identifier with a resource-kind prefix, e.g. `vpc-1f2e3d4c`
pub fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &hex[..8])
}

/// Current timestamp in RFC 3339 form
pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Simulated private address inside the 10.0.0.0/16 range
pub fn private_ip() -> String {
    let id = Uuid::new_v4();
    let bytes = id.as_bytes();
    format!("10.0.{}.{}", bytes[0], bytes[1])
}

/// Wrap a `triggers` block into the `null_resource` record shape
pub fn null_resource(label: &str, triggers: Value) -> Value {
    let mut entry = Map::new();
    entry.insert(label.to_string(), json!([{ "triggers": triggers }]));
    json!({ "null_resource": [entry] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id("vpc");
        assert!(id.starts_with("vpc-"));
        assert_eq!(id.len(), "vpc-".len() + 8);
    }

    #[test]
    fn test_null_resource_shape() {
        let record = null_resource("vpc_main", json!({ "name": "main" }));
        let triggers = &record["null_resource"][0]["vpc_main"][0]["triggers"];
        assert_eq!(triggers["name"], "main");
    }
}
