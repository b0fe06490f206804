use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// JSON-RPC 2.0 id: a string or an integer. `bool`, floating point, and
/// `null` are rejected by construction — serde never lands a JSON `true`,
/// `1.5`, or `null` in either variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Integer(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Integer(value)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value)
    }
}

/// Monotonically increasing integer id generator, one per peer, as required
/// by spec §3 ("Request id").
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    next: std::sync::atomic::AtomicI64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            next: std::sync::atomic::AtomicI64::new(1),
        }
    }

    pub fn next(&self) -> RequestId {
        RequestId::Integer(self.next.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_monotonic_and_unique() {
        let gen = RequestIdGenerator::new();
        let ids: Vec<RequestId> = (0..100).map(|_| gen.next()).collect();
        let mut seen = std::collections::HashSet::new();
        for id in ids {
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn rejects_bool_and_float_and_null() {
        // bool: matches neither variant.
        assert!(serde_json::from_value::<RequestId>(serde_json::json!(true)).is_err());
        // float: not a whole i64, and not a string.
        assert!(serde_json::from_value::<RequestId>(serde_json::json!(1.5)).is_err());
        // null: neither variant accepts it.
        assert!(serde_json::from_value::<RequestId>(serde_json::json!(null)).is_err());
    }

    #[test]
    fn accepts_string_and_integer() -> Result<(), serde_json::Error> {
        assert_eq!(
            serde_json::from_value::<RequestId>(serde_json::json!("abc"))?,
            RequestId::String("abc".to_string())
        );
        assert_eq!(
            serde_json::from_value::<RequestId>(serde_json::json!(42))?,
            RequestId::Integer(42)
        );
        Ok(())
    }
}
