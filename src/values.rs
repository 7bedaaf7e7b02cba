//! Parsed return values from the host.
//!
//! Every command response carries an optional `{key=value;key=value}` block.
//! The host's value grammar is untyped text, so each value is coerced by
//! trial: `true`/`false`, then integer, then float, then raw string. The
//! store keeps one entry per canonical key for the lifetime of the session;
//! later responses overwrite earlier values in place.
use log::debug;

use crate::error::LinkError;

/// Namespace prefix every stored key carries.
pub const KEY_PREFIX: &str = "v.";

/// Key synthesized for every response, success or failure.
pub const EXECUTION_STATUS: &str = "v.execution_status";

/// Leading token the host emits on command failure.
pub const ERROR_SENTINEL: &str = "vstarsError";

/// Execution status value reported on failure.
pub const STATUS_FAILED: i64 = -2;

/// Host-internal bookkeeping fields that leak through its object-graph
/// serialization and carry no script-visible meaning.
const DENYLIST: [&str; 4] = ["null", "this", "parent", "objectName"];

/// A single typed value from a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    fn coerce(text: &str) -> Self {
        match text {
            "false" => return Value::Bool(false),
            "true" => return Value::Bool(true),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Str(text.to_string())
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }
}

/// A key/value pair parsed out of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnValue {
    pub key: String,
    pub value: Value,
}

/// Insertion-ordered collection of every return value seen this session.
#[derive(Debug, Default)]
pub struct ReturnValueStore {
    values: Vec<ReturnValue>,
}

impl ReturnValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one raw response buffer into the store.
    ///
    /// Always produces an execution-status entry first; a response without a
    /// `{...}` block yields nothing further and is not an error.
    pub fn parse(&mut self, data: &[u8]) {
        let decoded = String::from_utf8_lossy(data);
        let text = decoded.as_ref();

        let status = if text.starts_with(ERROR_SENTINEL) {
            STATUS_FAILED
        } else {
            0
        };
        self.store(ReturnValue {
            key: EXECUTION_STATUS.to_string(),
            value: Value::Int(status),
        });

        let Some(start) = text.find('{') else { return };
        let Some(end) = text.rfind('}') else { return };
        if end <= start {
            return;
        }

        for token in text[start + 1..end].split(';') {
            let Some((key, raw)) = token.split_once('=') else {
                continue;
            };
            if raw.contains('=') {
                continue;
            }
            if DENYLIST.iter().any(|d| key.starts_with(d)) {
                continue;
            }

            let key = if key.starts_with(KEY_PREFIX) {
                key.to_string()
            } else {
                debug!("return key '{key}' is missing the '{KEY_PREFIX}' prefix");
                format!("{KEY_PREFIX}{key}")
            };

            self.store(ReturnValue {
                key,
                value: Value::coerce(raw),
            });
        }
    }

    /// Store a value, replacing in place if the key is already present.
    fn store(&mut self, rv: ReturnValue) {
        match self.values.iter_mut().find(|item| item.key == rv.key) {
            Some(item) => item.value = rv.value,
            None => self.values.push(rv),
        }
    }

    /// First entry whose key matches exactly.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|item| item.key == key)
            .map(|item| &item.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, LinkError> {
        match self.require(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_type(key, "bool", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, LinkError> {
        match self.require(key)? {
            Value::Int(i) => Ok(*i),
            other => Err(wrong_type(key, "int", other)),
        }
    }

    /// Float accessor; an integer-looking value widens rather than erroring
    /// since the host prints whole-number floats without a decimal point.
    pub fn get_float(&self, key: &str) -> Result<f64, LinkError> {
        match self.require(key)? {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(wrong_type(key, "float", other)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str, LinkError> {
        match self.require(key)? {
            Value::Str(s) => Ok(s),
            other => Err(wrong_type(key, "string", other)),
        }
    }

    fn require(&self, key: &str) -> Result<&Value, LinkError> {
        self.get(key)
            .ok_or_else(|| LinkError::MissingValue(key.to_string()))
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Value) -> LinkError {
    LinkError::WrongType {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}
