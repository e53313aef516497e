//! Optional-argument builders
//!
//! Each builder renders its trailing arguments in a fixed order and rejects
//! flags that cannot be combined before anything reaches the network.

use super::keywords::{COUNT, EX, MATCH, NX, PX, XX};
use redis_keeper_core::{
    error::{RedisError, RedisResult},
    types::RedisValue,
};
use std::time::Duration;

/// Trailing options of `SET key value [EX s] [PX ms] [NX|XX]`
///
/// ```
/// use redis_keeper::SetOptions;
///
/// let opts = SetOptions::new().ex(60).nx();
/// assert_eq!(opts.args().unwrap().len(), 3);
///
/// assert!(SetOptions::new().nx().xx().args().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire after this many seconds (EX)
    pub expire_seconds: Option<u64>,
    /// Expire after this many milliseconds (PX)
    pub expire_millis: Option<u64>,
    /// Only set when the key does not exist (NX)
    pub only_if_absent: bool,
    /// Only set when the key already exists (XX)
    pub only_if_present: bool,
}

impl SetOptions {
    /// No options: a plain SET
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expire time, in seconds
    #[must_use]
    pub const fn ex(mut self, seconds: u64) -> Self {
        self.expire_seconds = Some(seconds);
        self
    }

    /// Set the expire time, in milliseconds
    #[must_use]
    pub const fn px(mut self, millis: u64) -> Self {
        self.expire_millis = Some(millis);
        self
    }

    /// Expire after `ttl`, using PX when it is not a whole number of seconds
    #[must_use]
    pub fn expire(self, ttl: Duration) -> Self {
        if ttl.subsec_millis() == 0 {
            self.ex(ttl.as_secs())
        } else {
            self.px(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
        }
    }

    /// Only set the key if it does not already exist
    #[must_use]
    pub const fn nx(mut self) -> Self {
        self.only_if_absent = true;
        self
    }

    /// Only set the key if it already exists
    #[must_use]
    pub const fn xx(mut self) -> Self {
        self.only_if_present = true;
        self
    }

    /// Check that no two exclusive options are set
    pub fn validate(&self) -> RedisResult<()> {
        if self.only_if_absent && self.only_if_present {
            return Err(RedisError::InvalidOptionCombination(
                "SET accepts NX or XX, not both".to_string(),
            ));
        }
        if self.expire_seconds.is_some() && self.expire_millis.is_some() {
            return Err(RedisError::InvalidOptionCombination(
                "SET accepts EX or PX, not both".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the trailing arguments
    pub fn args(&self) -> RedisResult<Vec<RedisValue>> {
        self.validate()?;

        let mut args = Vec::with_capacity(3);
        if let Some(seconds) = self.expire_seconds {
            args.push(RedisValue::from(EX));
            args.push(RedisValue::from(seconds));
        }
        if let Some(millis) = self.expire_millis {
            args.push(RedisValue::from(PX));
            args.push(RedisValue::from(millis));
        }
        if self.only_if_absent {
            args.push(RedisValue::from(NX));
        } else if self.only_if_present {
            args.push(RedisValue::from(XX));
        }
        Ok(args)
    }
}

/// Trailing options of `SCAN cursor [MATCH pattern] [COUNT n]`, shared by HSCAN
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Glob-style pattern keys must match
    pub pattern: Option<String>,
    /// Hint for how much work each call does
    pub count: Option<u64>,
}

impl ScanOptions {
    /// No options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return elements matching `pattern`
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Ask the server for roughly `count` elements per call
    #[must_use]
    pub const fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Render the trailing arguments
    pub fn args(&self) -> RedisResult<Vec<RedisValue>> {
        if self.count == Some(0) {
            return Err(RedisError::InvalidOptionCombination(
                "SCAN COUNT must be positive".to_string(),
            ));
        }

        let mut args = Vec::with_capacity(4);
        if let Some(ref pattern) = self.pattern {
            args.push(RedisValue::from(MATCH));
            args.push(RedisValue::from(pattern.as_str()));
        }
        if let Some(count) = self.count {
            args.push(RedisValue::from(COUNT));
            args.push(RedisValue::from(count));
        }
        Ok(args)
    }
}
