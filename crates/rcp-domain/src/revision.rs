use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::DomainError;

/// Canonicalize a JSON value by sorting object keys recursively. Arrays keep
/// their original order — order is semantically meaningful there (§4.1, §9
/// "Determinism of revisions").
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Compute the content-addressed revision of a component's semantic payload:
/// `(kind, properties)` under canonical encoding, excluding the current
/// revision field and any server-populated identity (§4.1).
///
/// Fails with [`DomainError::BadInput`] if `properties` is not serializable
/// under the canonical encoding (callers pass an already-parsed `Value`, so
/// this only fails if `kind` cannot round-trip through JSON, which in
/// practice never happens for a `&str`).
pub fn compute_revision(kind: &str, properties: &Value) -> Result<String, DomainError> {
    let payload = serde_json::json!({
        "kind": kind,
        "properties": properties,
    });
    let canonical = canonicalize(payload);
    let bytes = serde_json::to_vec(&canonical)
        .map_err(|e| DomainError::BadInput(format!("non-canonicalizable component definition: {e}")))?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// True iff `compute_revision` of each side would match.
pub fn revisions_equal(kind_a: &str, props_a: &Value, kind_b: &str, props_b: &Value) -> bool {
    match (compute_revision(kind_a, props_a), compute_revision(kind_b, props_b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deterministic_across_key_order() {
        let a = json!({"config": {"x": 1, "y": 2}, "run": {"image": "nginx"}});
        let b = json!({"run": {"image": "nginx"}, "config": {"y": 2, "x": 1}});
        assert!(revisions_equal("Container", &a, "Container", &b));
    }

    #[test]
    fn array_order_is_significant() {
        let a = json!({"provides": [{"name": "a"}, {"name": "b"}]});
        let b = json!({"provides": [{"name": "b"}, {"name": "a"}]});
        assert!(!revisions_equal("Container", &a, "Container", &b));
    }

    #[test]
    fn different_kind_changes_revision() {
        let props = json!({"run": {}});
        assert!(!revisions_equal("Container", &props, "Gateway", &props));
    }

    #[test]
    fn same_input_hashes_identically_every_call() {
        let props = json!({"run": {"image": "nginx:1.2"}});
        let r1 = compute_revision("Container", &props).unwrap();
        let r2 = compute_revision("Container", &props).unwrap();
        assert_eq!(r1, r2);
    }
}
