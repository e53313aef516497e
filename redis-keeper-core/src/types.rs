//! Command argument values

use bytes::Bytes;

/// A single command argument.
///
/// Every variant goes over the wire as a bulk string; `Nil` is sent as an
/// empty one.
#[derive(Debug, Clone, PartialEq)]
pub enum RedisValue {
    /// Null value
    Nil,
    /// String value
    String(String),
    /// Binary data
    Bytes(Bytes),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl RedisValue {
    /// Wire form of the argument
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Nil => Bytes::new(),
            Self::String(s) => Bytes::copy_from_slice(s.as_bytes()),
            Self::Bytes(b) => b.clone(),
            Self::Int(i) => Bytes::from(i.to_string()),
            Self::Float(f) => Bytes::from(format_float(*f)),
        }
    }
}

// Redis expects a signed spelling of infinity for scores and increments
fn format_float(f: f64) -> String {
    if f.is_infinite() {
        if f.is_sign_positive() { "+inf" } else { "-inf" }.to_string()
    } else {
        f.to_string()
    }
}

impl From<String> for RedisValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for RedisValue {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<&str> for RedisValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Vec<u8>> for RedisValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for RedisValue {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Bytes> for RedisValue {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<i64> for RedisValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for RedisValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for RedisValue {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for RedisValue {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| Self::String(i.to_string()), Self::Int)
    }
}

impl From<usize> for RedisValue {
    fn from(i: usize) -> Self {
        Self::from(i as u64)
    }
}

impl From<f64> for RedisValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<Self>> From<Option<T>> for RedisValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

/// Build a `Vec<RedisValue>` from heterogeneous arguments.
///
/// ```
/// use redis_keeper_core::{args, RedisValue};
///
/// let a = args!["key", 42, 1.5];
/// assert_eq!(a[1], RedisValue::Int(42));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::RedisValue>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::RedisValue::from($arg)),+]
    };
}
