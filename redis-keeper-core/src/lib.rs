//! Core types for the redis-keeper Redis client
//!
//! This crate holds what every layer of the client shares: the server
//! [`Configuration`], the [`RedisError`] taxonomy, command arguments
//! ([`RedisValue`]) and replies ([`RespValue`] and its typed [`ReplyView`]).

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{Configuration, PoolConfig, TlsConfig, DEFAULT_PORT};
pub use error::{RedisError, RedisResult};
pub use types::RedisValue;
pub use value::{ReplyView, RespValue};
