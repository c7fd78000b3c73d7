//! Value coercion and well-known context keys.
//!
//! Crash backends only store string values in their context key store, so
//! every piece of additional data passes through [`stringify`] before it is
//! forwarded. Coercion is total: it never fails and never panics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Additional data attached to crash events: string keys to arbitrary JSON values.
pub type Data = BTreeMap<String, Value>;

/// Analytics event parameters: string keys to primitive values.
pub type Params = BTreeMap<String, ParamValue>;

/// Placeholder used when a value cannot be serialized.
pub const UNSERIALIZABLE: &str = "<unserializable>";

pub const KEY_EVENT_ID: &str = "event_id";
pub const KEY_EVENT_NAME: &str = "event_name";
pub const KEY_EVENT_DESCRIPTION: &str = "event_description";

pub const KEY_ERROR_EVENT_ID: &str = "error_event_id";
pub const KEY_ERROR_EVENT_NAME: &str = "error_event_name";
pub const KEY_IS_FATAL: &str = "is_fatal";
pub const KEY_ERROR_TYPE: &str = "error_type";
/// Prefix for additional data keys set by `log_error`.
pub const ERROR_DATA_PREFIX: &str = "error_";

pub const KEY_LAST_NON_FATAL_ERROR: &str = "last_non_fatal_error";
pub const KEY_LAST_NON_FATAL_TIME: &str = "last_non_fatal_time";
pub const KEY_LAST_NON_FATAL_MESSAGE: &str = "last_non_fatal_message";

pub const KEY_NON_FATAL_EVENT_ID: &str = "non_fatal_event_id";
pub const KEY_NON_FATAL_EVENT_NAME: &str = "non_fatal_event_name";
pub const KEY_NON_FATAL_TIMESTAMP: &str = "non_fatal_timestamp";
pub const KEY_NON_FATAL_ERROR_TYPE: &str = "non_fatal_error_type";
/// Prefix for additional data keys set by `log_non_fatal_error`.
pub const NON_FATAL_DATA_PREFIX: &str = "non_fatal_";

/// Keys reset by `clear_custom_keys`.
pub const CLEARABLE_KEYS: [&str; 3] = [KEY_EVENT_ID, KEY_EVENT_NAME, KEY_EVENT_DESCRIPTION];

/// Coerces a JSON value to the text stored in the backend.
///
/// Strings are passed through without quotes; everything else uses its
/// compact JSON representation (`1`, `true`, `null`, `[1,2]`, `{"a":1}`).
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerces any serializable value, falling back to [`UNSERIALIZABLE`].
///
/// # Example
///
/// ```
/// use telemetry_facade::value::stringify_serialize;
///
/// assert_eq!(stringify_serialize(&42), "42");
/// assert_eq!(stringify_serialize("plain"), "plain");
/// assert_eq!(stringify_serialize(&vec![1, 2]), "[1,2]");
/// ```
pub fn stringify_serialize<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(v) => stringify(&v),
        Err(_) => UNSERIALIZABLE.to_string(),
    }
}

/// Converts analytics parameters into crash event additional data.
///
/// Every value is string-coerced, so `{"a": 1}` becomes `{"a": "1"}`.
pub fn params_to_data(params: &Params) -> Data {
    params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.to_string())))
        .collect()
}

/// A primitive analytics parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;
    use serde_json::json;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("nope"))
        }
    }

    #[test]
    fn stringify_passes_strings_through_unquoted() {
        assert_eq!(stringify(&json!("hello")), "hello");
        assert_eq!(stringify(&json!("")), "");
    }

    #[test]
    fn stringify_formats_scalars() {
        assert_eq!(stringify(&json!(1)), "1");
        assert_eq!(stringify(&json!(-2.5)), "-2.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&Value::Null), "null");
    }

    #[test]
    fn stringify_uses_compact_json_for_containers() {
        assert_eq!(stringify(&json!([1, "a"])), r#"[1,"a"]"#);
        assert_eq!(stringify(&json!({"k": {"n": 1}})), r#"{"k":{"n":1}}"#);
    }

    #[test]
    fn stringify_serialize_falls_back_to_placeholder() {
        assert_eq!(stringify_serialize(&Unserializable), UNSERIALIZABLE);
    }

    #[test]
    fn params_to_data_coerces_every_value() {
        let mut params = Params::new();
        params.insert("a".into(), 1.into());
        params.insert("b".into(), true.into());
        params.insert("c".into(), "x".into());
        params.insert("d".into(), 0.5.into());

        let data = params_to_data(&params);

        assert_eq!(data["a"], json!("1"));
        assert_eq!(data["b"], json!("true"));
        assert_eq!(data["c"], json!("x"));
        assert_eq!(data["d"], json!("0.5"));
    }

    #[test]
    fn param_value_deserializes_untagged() {
        let params: Params = serde_json::from_str(r#"{"n":3,"s":"x","f":1.5,"b":false}"#).unwrap();

        assert_eq!(params["n"], ParamValue::Int(3));
        assert_eq!(params["s"], ParamValue::String("x".into()));
        assert_eq!(params["f"], ParamValue::Float(1.5));
        assert_eq!(params["b"], ParamValue::Bool(false));
    }
}
