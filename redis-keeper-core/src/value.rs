//! RESP (`REdis` Serialization Protocol) values and the typed reply view

use crate::error::{RedisError, RedisResult};
use bytes::Bytes;
use std::collections::HashMap;

/// RESP protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple string (status): +OK\r\n
    SimpleString(String),
    /// Error: -ERR message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n
    BulkString(Bytes),
    /// Null bulk string or null array: $-1\r\n
    Null,
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Check if this is a null value
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Whether this is the status reply `status`
    #[must_use]
    pub fn is_status(&self, status: &str) -> bool {
        matches!(self, Self::SimpleString(s) if s == status)
    }

    /// Extract error message if this is an error
    #[must_use]
    pub fn into_error(self) -> Option<String> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Short name of the reply's shape, used in mismatch errors
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SimpleString(_) => "status",
            Self::Error(_) => "error",
            Self::Integer(_) => "integer",
            Self::BulkString(_) => "bulk string",
            Self::Null => "nil",
            Self::Array(_) => "array",
        }
    }
}

impl From<String> for RespValue {
    fn from(s: String) -> Self {
        Self::BulkString(Bytes::from(s.into_bytes()))
    }
}

impl From<&str> for RespValue {
    fn from(s: &str) -> Self {
        Self::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<i64> for RespValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<Bytes> for RespValue {
    fn from(b: Bytes) -> Self {
        Self::BulkString(b)
    }
}

fn mismatch(expected: &'static str, value: &RespValue) -> RedisError {
    RedisError::ShapeMismatch {
        expected,
        actual: value.kind().to_string(),
    }
}

fn utf8(bytes: &Bytes) -> RedisResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| RedisError::ShapeMismatch {
        expected: "utf-8 string",
        actual: format!("invalid utf-8 ({e})"),
    })
}

/// Typed view over a command reply.
///
/// Every accessor is fallible: asking for a shape the reply cannot be
/// coerced into yields [`RedisError::ShapeMismatch`], never a zero value.
/// Nil replies only convert through the `as_opt_*` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyView {
    value: RespValue,
}

impl ReplyView {
    /// Wrap a raw reply
    #[must_use]
    pub const fn new(value: RespValue) -> Self {
        Self { value }
    }

    /// The raw reply
    #[must_use]
    pub const fn raw(&self) -> &RespValue {
        &self.value
    }

    /// Unwrap into the raw reply
    #[must_use]
    pub fn into_inner(self) -> RespValue {
        self.value
    }

    /// Whether the reply is nil
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        self.value.is_null()
    }

    /// Reply as a UTF-8 string (bulk or status)
    pub fn as_string(&self) -> RedisResult<String> {
        match &self.value {
            RespValue::SimpleString(s) => Ok(s.clone()),
            RespValue::BulkString(b) => utf8(b).map(str::to_owned),
            RespValue::Integer(i) => Ok(i.to_string()),
            other => Err(mismatch("string", other)),
        }
    }

    /// Reply as a string, with nil mapped to `None`
    pub fn as_opt_string(&self) -> RedisResult<Option<String>> {
        if self.is_nil() {
            Ok(None)
        } else {
            self.as_string().map(Some)
        }
    }

    /// Reply as raw bytes
    pub fn as_bytes(&self) -> RedisResult<Bytes> {
        match &self.value {
            RespValue::BulkString(b) => Ok(b.clone()),
            RespValue::SimpleString(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            other => Err(mismatch("bytes", other)),
        }
    }

    /// Reply as a signed integer; numeric bulk strings are parsed
    pub fn as_i64(&self) -> RedisResult<i64> {
        match &self.value {
            RespValue::Integer(i) => Ok(*i),
            RespValue::BulkString(b) => {
                let s = utf8(b)?;
                s.parse::<i64>().map_err(|_| RedisError::ShapeMismatch {
                    expected: "integer",
                    actual: format!("bulk string {s:?}"),
                })
            }
            other => Err(mismatch("integer", other)),
        }
    }

    /// Reply as an integer, with nil mapped to `None`
    pub fn as_opt_i64(&self) -> RedisResult<Option<i64>> {
        if self.is_nil() {
            Ok(None)
        } else {
            self.as_i64().map(Some)
        }
    }

    /// Reply as a float; INCRBYFLOAT and HINCRBYFLOAT answer with bulk strings
    pub fn as_f64(&self) -> RedisResult<f64> {
        match &self.value {
            RespValue::Integer(i) => Ok(*i as f64),
            RespValue::BulkString(b) => {
                let s = utf8(b)?;
                s.parse::<f64>().map_err(|_| RedisError::ShapeMismatch {
                    expected: "float",
                    actual: format!("bulk string {s:?}"),
                })
            }
            other => Err(mismatch("float", other)),
        }
    }

    /// Reply as a boolean.
    ///
    /// Integers are true when non-zero, the status `OK` is true, and bulk
    /// strings `1`/`0`/`true`/`false` are accepted.
    pub fn as_bool(&self) -> RedisResult<bool> {
        match &self.value {
            RespValue::Integer(i) => Ok(*i != 0),
            RespValue::SimpleString(s) if s == "OK" => Ok(true),
            RespValue::BulkString(b) => match utf8(b)? {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                s => Err(RedisError::ShapeMismatch {
                    expected: "boolean",
                    actual: format!("bulk string {s:?}"),
                }),
            },
            other => Err(mismatch("boolean", other)),
        }
    }

    /// Reply as a list of views over the array's elements
    pub fn as_array(&self) -> RedisResult<Vec<ReplyView>> {
        match &self.value {
            RespValue::Array(items) => Ok(items.iter().cloned().map(Self::new).collect()),
            other => Err(mismatch("array", other)),
        }
    }

    /// Reply as a list of strings; nil (empty list or missing key) yields an empty list
    pub fn as_strings(&self) -> RedisResult<Vec<String>> {
        match &self.value {
            RespValue::Null => Ok(Vec::new()),
            RespValue::Array(items) => items
                .iter()
                .map(|item| Self::new(item.clone()).as_string())
                .collect(),
            other => Err(mismatch("array of strings", other)),
        }
    }

    /// Reply as a list of optional strings, as returned by MGET and HMGET
    pub fn as_opt_strings(&self) -> RedisResult<Vec<Option<String>>> {
        match &self.value {
            RespValue::Array(items) => items
                .iter()
                .map(|item| Self::new(item.clone()).as_opt_string())
                .collect(),
            other => Err(mismatch("array of strings", other)),
        }
    }

    /// Reply as a field/value map from a flat `[k1, v1, k2, v2, ...]` array
    pub fn as_map(&self) -> RedisResult<HashMap<String, String>> {
        let items = match &self.value {
            RespValue::Null => return Ok(HashMap::new()),
            RespValue::Array(items) => items,
            other => return Err(mismatch("map", other)),
        };

        if items.len() % 2 != 0 {
            return Err(RedisError::ShapeMismatch {
                expected: "map",
                actual: format!("array of odd length {}", items.len()),
            });
        }

        items
            .chunks_exact(2)
            .map(|pair| {
                let field = Self::new(pair[0].clone()).as_string()?;
                let value = Self::new(pair[1].clone()).as_string()?;
                Ok((field, value))
            })
            .collect()
    }
}

impl From<RespValue> for ReplyView {
    fn from(value: RespValue) -> Self {
        Self::new(value)
    }
}

impl TryFrom<ReplyView> for String {
    type Error = RedisError;

    fn try_from(view: ReplyView) -> Result<Self, Self::Error> {
        view.as_string()
    }
}

impl TryFrom<ReplyView> for i64 {
    type Error = RedisError;

    fn try_from(view: ReplyView) -> Result<Self, Self::Error> {
        view.as_i64()
    }
}

impl TryFrom<ReplyView> for bool {
    type Error = RedisError;

    fn try_from(view: ReplyView) -> Result<Self, Self::Error> {
        view.as_bool()
    }
}
