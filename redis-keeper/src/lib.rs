//! Pooled async Redis client for Rust
//!
//! `redis-keeper` keeps a bounded pool of connections per server
//! configuration, runs commands over it and converts replies into typed
//! values. A [`Registry`] maps group names to configurations so one process
//! can talk to several independently configured servers.
//!
//! # Features
//!
//! - Bounded connection pool with idle and lifetime eviction
//! - Typed reply accessors that fail on mismatched shapes
//! - Typed wrappers for common string, hash and list commands
//! - Pipelining and pub/sub on leased connections
//! - Named client registry
//! - Optional TLS via rustls
//!
//! # Quick Start
//!
//! ```no_run
//! use redis_keeper::{args, Client, Configuration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Configuration::new("localhost", 6379));
//!
//!     client.set("mykey", "myvalue").await?;
//!     let value: Option<String> = client.get("mykey").await?;
//!     println!("Value: {:?}", value);
//!
//!     let reply = client.execute_view("STRLEN", &args!["mykey"]).await?;
//!     println!("Length: {}", reply.as_i64()?);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::future_not_send)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod client;
pub mod commands;
pub mod connection;
pub mod pool;
pub mod protocol;
pub mod pubsub;
pub mod registry;
pub mod tls;

pub use client::Client;
pub use commands::{ScanOptions, SetOptions};
pub use pool::{Pool, PoolStats, PooledConnection};
pub use pubsub::{PubSubMessage, Subscriber};
pub use registry::{Registry, DEFAULT_GROUP};

pub use redis_keeper_core::{
    args,
    config::{Configuration, PoolConfig, TlsConfig, DEFAULT_PORT},
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::{ReplyView, RespValue},
};
