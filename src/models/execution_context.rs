use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context key holding the cumulative count of failed processing attempts
pub const RETRY_COUNT_KEY: &str = "retryCount";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

/// Per-step-run key/value store readable by listeners after the step ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, ContextValue>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i64) {
        self.entries.insert(key.into(), ContextValue::Int(value));
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), ContextValue::Str(value.into()));
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.entries.insert(key.into(), ContextValue::Bool(value));
    }

    /// Integer at `key`, or `default` when absent or not an integer
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(ContextValue::Int(v)) => *v,
            _ => default,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ContextValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(ContextValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors_fall_back_to_default() {
        let mut ctx = ExecutionContext::new();
        ctx.put_int(RETRY_COUNT_KEY, 3);
        ctx.put_string("source", "recordRetry.csv");
        ctx.put_bool("scanned", true);

        assert_eq!(ctx.get_int(RETRY_COUNT_KEY, 0), 3);
        assert_eq!(ctx.get_int("missing", 0), 0);
        assert_eq!(ctx.get_int("source", -1), -1);
        assert_eq!(ctx.get_string("source"), Some("recordRetry.csv"));
        assert!(ctx.get_bool("scanned", false));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_context_serializes_as_flat_map() {
        let mut ctx = ExecutionContext::new();
        ctx.put_int(RETRY_COUNT_KEY, 4);

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, serde_json::json!({"retryCount": 4}));
    }
}
