//! High-level Redis client
//!
//! This module provides the main `Client` interface for interacting with Redis.

use crate::commands::names;
use crate::commands::{ScanOptions, SetOptions};
use crate::pool::{Pool, PoolStats, PooledConnection};
use crate::pubsub::Subscriber;
use redis_keeper_core::{
    config::Configuration,
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::{ReplyView, RespValue},
};
use std::collections::HashMap;
use tracing::{debug, info};

/// High-level Redis client
///
/// Owns one connection [`Pool`]. Every call leases a connection, runs a
/// single command and hands the connection back; use
/// [`get_connection`](Self::get_connection) to drive several commands on
/// the same connection.
#[derive(Debug, Clone)]
pub struct Client {
    pool: Pool,
}

impl Client {
    /// Create a client. Connections are dialed on first use.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use redis_keeper::{Client, Configuration};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let client = Client::new(Configuration::new("localhost", 6379).with_database(1));
    ///     client.set("greeting", "hello").await?;
    ///     assert_eq!(client.get("greeting").await?, Some("hello".to_string()));
    ///     Ok(())
    /// }
    /// ```
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        debug!("Creating client for {}", config.address());
        Self {
            pool: Pool::new(config),
        }
    }

    /// Create a client from a `redis://` or `rediss://` URL
    pub fn from_url(url: &str) -> RedisResult<Self> {
        let config = Configuration::from_url(url)?;
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Configuration this client was built from
    #[must_use]
    pub fn config(&self) -> &Configuration {
        self.pool.config()
    }

    /// Run one command and return its raw reply.
    ///
    /// The connection goes back to the pool afterwards, unless the command
    /// failed in a way that left it unusable.
    pub async fn execute(&self, command: &str, args: &[RedisValue]) -> RedisResult<RespValue> {
        let mut conn = self.pool.acquire().await?;
        let reply = conn.execute(command, args).await?;
        Ok(reply)
    }

    /// Run one command and return a typed view of its reply
    pub async fn execute_view(&self, command: &str, args: &[RedisValue]) -> RedisResult<ReplyView> {
        self.execute(command, args).await.map(ReplyView::new)
    }

    /// Send one command and wait for it to be acknowledged, dropping the reply.
    ///
    /// This is a single round trip on a freshly leased connection, not a
    /// pipeline. Queue several commands on one connection with
    /// [`PooledConnection::send`] instead.
    pub async fn send(&self, command: &str, args: &[RedisValue]) -> RedisResult<()> {
        let mut conn = self.pool.acquire().await?;
        conn.send(command, args)?;
        conn.flush().await?;
        conn.receive().await?;
        Ok(())
    }

    /// Lease a connection for exclusive use.
    ///
    /// It returns to the pool when dropped.
    pub async fn get_connection(&self) -> RedisResult<PooledConnection> {
        self.pool.acquire().await
    }

    /// Lease a connection and put it in subscribe mode
    pub async fn subscriber(&self) -> RedisResult<Subscriber> {
        Ok(Subscriber::new(self.pool.acquire().await?))
    }

    /// Drain the pool. Later calls fail with [`RedisError::PoolClosed`].
    pub fn close(&self) {
        if !self.pool.is_closed() {
            info!("Closing client for {}", self.config().address());
        }
        self.pool.drain();
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Pool occupancy
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // Server

    /// PING the server; true when it answers PONG
    pub async fn ping(&self) -> RedisResult<bool> {
        let reply = self.execute(names::PING, &[]).await?;
        Ok(reply.is_status("PONG"))
    }

    /// Echo a message back from the server
    pub async fn echo(&self, message: impl Into<String>) -> RedisResult<String> {
        self.execute_view(names::ECHO, &[key(message)])
            .await?
            .as_string()
    }

    /// Server information, optionally limited to one section
    pub async fn info(&self, section: Option<&str>) -> RedisResult<String> {
        let args: Vec<RedisValue> = section.map(RedisValue::from).into_iter().collect();
        self.execute_view(names::INFO, &args).await?.as_string()
    }

    /// Remove every key from the selected database
    pub async fn flushdb(&self) -> RedisResult<()> {
        expect_ok(self.execute(names::FLUSHDB, &[]).await?)
    }

    /// Remove every key from every database
    pub async fn flushall(&self) -> RedisResult<()> {
        expect_ok(self.execute(names::FLUSHALL, &[]).await?)
    }

    // Keys and strings

    /// Set a key to a value
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
    ) -> RedisResult<bool> {
        self.set_with_options(key, value, &SetOptions::new()).await
    }

    /// Set a key with expiry and existence conditions.
    ///
    /// Returns false when an NX or XX condition stopped the write.
    pub async fn set_with_options(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
        options: &SetOptions,
    ) -> RedisResult<bool> {
        let mut args = vec![self::key(key), value.into()];
        args.extend(options.args()?);
        set_applied(self.execute(names::SET, &args).await?)
    }

    /// Set a key only if it does not exist
    pub async fn set_nx(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
    ) -> RedisResult<bool> {
        self.set_with_options(key, value, &SetOptions::new().nx())
            .await
    }

    /// Set a key that expires after `seconds`
    pub async fn set_ex(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
        seconds: u64,
    ) -> RedisResult<bool> {
        self.set_with_options(key, value, &SetOptions::new().ex(seconds))
            .await
    }

    /// Set a key that expires after `millis`
    pub async fn set_px(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
        millis: u64,
    ) -> RedisResult<bool> {
        self.set_with_options(key, value, &SetOptions::new().px(millis))
            .await
    }

    /// Get the value of a key
    pub async fn get(&self, key: impl Into<String>) -> RedisResult<Option<String>> {
        self.execute_view(names::GET, &[self::key(key)])
            .await?
            .as_opt_string()
    }

    /// Check whether a key exists
    pub async fn exists(&self, key: impl Into<String>) -> RedisResult<bool> {
        self.execute_view(names::EXISTS, &[self::key(key)])
            .await?
            .as_bool()
    }

    /// Count how many of `keys` exist; repeated keys count repeatedly
    pub async fn exists_many(
        &self,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> RedisResult<i64> {
        self.execute_view(names::EXISTS, &key_list(keys))
            .await?
            .as_i64()
    }

    /// Delete keys, returning how many were removed
    pub async fn del(&self, keys: impl IntoIterator<Item = impl Into<String>>) -> RedisResult<i64> {
        self.execute_view(names::DEL, &key_list(keys))
            .await?
            .as_i64()
    }

    /// Keys matching a glob-style pattern
    pub async fn keys(&self, pattern: impl Into<String>) -> RedisResult<Vec<String>> {
        self.execute_view(names::KEYS, &[key(pattern)])
            .await?
            .as_strings()
    }

    /// Iterate the keyspace; returns the next cursor and a batch of keys.
    ///
    /// The iteration is complete when the returned cursor is 0.
    pub async fn scan(
        &self,
        cursor: u64,
        options: &ScanOptions,
    ) -> RedisResult<(u64, Vec<String>)> {
        let mut args = vec![RedisValue::from(cursor)];
        args.extend(options.args()?);
        scan_page(&self.execute_view(names::SCAN, &args).await?)
    }

    /// Set a timeout on a key; false when the key does not exist
    pub async fn expire(&self, key: impl Into<String>, seconds: i64) -> RedisResult<bool> {
        self.execute_view(names::EXPIRE, &[self::key(key), seconds.into()])
            .await?
            .as_bool()
    }

    /// Remaining time to live in seconds; -1 without expiry, -2 when missing
    pub async fn ttl(&self, key: impl Into<String>) -> RedisResult<i64> {
        self.execute_view(names::TTL, &[self::key(key)])
            .await?
            .as_i64()
    }

    /// Increment the integer value of a key by one
    pub async fn incr(&self, key: impl Into<String>) -> RedisResult<i64> {
        self.execute_view(names::INCR, &[self::key(key)])
            .await?
            .as_i64()
    }

    /// Increment the integer value of a key
    pub async fn incr_by(&self, key: impl Into<String>, increment: i64) -> RedisResult<i64> {
        self.execute_view(names::INCRBY, &[self::key(key), increment.into()])
            .await?
            .as_i64()
    }

    /// Increment the float value of a key
    pub async fn incr_by_float(&self, key: impl Into<String>, increment: f64) -> RedisResult<f64> {
        self.execute_view(names::INCRBYFLOAT, &[self::key(key), increment.into()])
            .await?
            .as_f64()
    }

    /// Decrement the integer value of a key by one
    pub async fn decr(&self, key: impl Into<String>) -> RedisResult<i64> {
        self.execute_view(names::DECR, &[self::key(key)])
            .await?
            .as_i64()
    }

    /// Decrement the integer value of a key
    pub async fn decr_by(&self, key: impl Into<String>, decrement: i64) -> RedisResult<i64> {
        self.execute_view(names::DECRBY, &[self::key(key), decrement.into()])
            .await?
            .as_i64()
    }

    /// Decrement the float value of a key
    pub async fn decr_by_float(&self, key: impl Into<String>, decrement: f64) -> RedisResult<f64> {
        self.incr_by_float(key, -decrement).await
    }

    /// Append to a string, returning its new length
    pub async fn append(
        &self,
        key: impl Into<String>,
        value: impl Into<RedisValue>,
    ) -> RedisResult<i64> {
        self.execute_view(names::APPEND, &[self::key(key), value.into()])
            .await?
            .as_i64()
    }

    /// Substring between two inclusive offsets; negative offsets count from the end
    pub async fn getrange(
        &self,
        key: impl Into<String>,
        start: i64,
        end: i64,
    ) -> RedisResult<String> {
        self.execute_view(names::GETRANGE, &[self::key(key), start.into(), end.into()])
            .await?
            .as_string()
    }

    /// Overwrite part of a string, returning its new length
    pub async fn setrange(
        &self,
        key: impl Into<String>,
        offset: u64,
        value: impl Into<RedisValue>,
    ) -> RedisResult<i64> {
        self.execute_view(names::SETRANGE, &[self::key(key), offset.into(), value.into()])
            .await?
            .as_i64()
    }

    // Hashes

    /// Set a hash field; true when the field is new
    pub async fn hset(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<RedisValue>,
    ) -> RedisResult<bool> {
        self.execute_view(names::HSET, &[self::key(key), self::key(field), value.into()])
            .await?
            .as_bool()
    }

    /// Get the value of a hash field
    pub async fn hget(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
    ) -> RedisResult<Option<String>> {
        self.execute_view(names::HGET, &[self::key(key), self::key(field)])
            .await?
            .as_opt_string()
    }

    /// Get all fields and values in a hash
    pub async fn hgetall(&self, key: impl Into<String>) -> RedisResult<HashMap<String, String>> {
        self.execute_view(names::HGETALL, &[self::key(key)])
            .await?
            .as_map()
    }

    /// Delete hash fields, returning how many were removed
    pub async fn hdel(
        &self,
        key: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> RedisResult<i64> {
        let mut args = vec![self::key(key)];
        args.extend(key_list(fields));
        self.execute_view(names::HDEL, &args).await?.as_i64()
    }

    /// Field names of a hash
    pub async fn hkeys(&self, key: impl Into<String>) -> RedisResult<Vec<String>> {
        self.execute_view(names::HKEYS, &[self::key(key)])
            .await?
            .as_strings()
    }

    /// Check whether a hash field exists
    pub async fn hexists(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
    ) -> RedisResult<bool> {
        self.execute_view(names::HEXISTS, &[self::key(key), self::key(field)])
            .await?
            .as_bool()
    }

    /// Increment the integer value of a hash field
    pub async fn hincr_by(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
        increment: i64,
    ) -> RedisResult<i64> {
        self.execute_view(
            names::HINCRBY,
            &[self::key(key), self::key(field), increment.into()],
        )
        .await?
        .as_i64()
    }

    /// Increment the float value of a hash field
    pub async fn hincr_by_float(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
        increment: f64,
    ) -> RedisResult<f64> {
        self.execute_view(
            names::HINCRBYFLOAT,
            &[self::key(key), self::key(field), increment.into()],
        )
        .await?
        .as_f64()
    }

    /// Decrement the integer value of a hash field by one
    pub async fn hdecr(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
    ) -> RedisResult<i64> {
        self.hincr_by(key, field, -1).await
    }

    /// Decrement the integer value of a hash field
    pub async fn hdecr_by(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
        decrement: i64,
    ) -> RedisResult<i64> {
        let increment = decrement.checked_neg().ok_or_else(|| {
            RedisError::InvalidOptionCombination(format!(
                "HINCRBY cannot decrement by {}",
                decrement
            ))
        })?;
        self.hincr_by(key, field, increment).await
    }

    /// Decrement the float value of a hash field
    pub async fn hdecr_by_float(
        &self,
        key: impl Into<String>,
        field: impl Into<String>,
        decrement: f64,
    ) -> RedisResult<f64> {
        self.hincr_by_float(key, field, -decrement).await
    }

    /// Iterate a hash; returns the next cursor and a flat field/value batch
    pub async fn hscan(
        &self,
        key: impl Into<String>,
        cursor: u64,
        options: &ScanOptions,
    ) -> RedisResult<(u64, Vec<String>)> {
        let mut args = vec![self::key(key), RedisValue::from(cursor)];
        args.extend(options.args()?);
        scan_page(&self.execute_view(names::HSCAN, &args).await?)
    }

    // Lists

    /// Prepend values to a list, returning its new length
    pub async fn lpush(
        &self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<RedisValue>>,
    ) -> RedisResult<i64> {
        self.push(names::LPUSH, key, values).await
    }

    /// Prepend values only if the list exists
    pub async fn lpushx(
        &self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<RedisValue>>,
    ) -> RedisResult<i64> {
        self.push(names::LPUSHX, key, values).await
    }

    /// Append values to a list, returning its new length
    pub async fn rpush(
        &self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<RedisValue>>,
    ) -> RedisResult<i64> {
        self.push(names::RPUSH, key, values).await
    }

    /// Append values only if the list exists
    pub async fn rpushx(
        &self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<RedisValue>>,
    ) -> RedisResult<i64> {
        self.push(names::RPUSHX, key, values).await
    }

    async fn push(
        &self,
        command: &str,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<RedisValue>>,
    ) -> RedisResult<i64> {
        let mut args = vec![self::key(key)];
        args.extend(values.into_iter().map(Into::into));
        self.execute_view(command, &args).await?.as_i64()
    }

    /// Remove and return the first element of a list
    pub async fn lpop(&self, key: impl Into<String>) -> RedisResult<Option<String>> {
        self.execute_view(names::LPOP, &[self::key(key)])
            .await?
            .as_opt_string()
    }

    /// Remove and return the last element of a list
    pub async fn rpop(&self, key: impl Into<String>) -> RedisResult<Option<String>> {
        self.execute_view(names::RPOP, &[self::key(key)])
            .await?
            .as_opt_string()
    }

    /// Length of a list
    pub async fn llen(&self, key: impl Into<String>) -> RedisResult<i64> {
        self.execute_view(names::LLEN, &[self::key(key)])
            .await?
            .as_i64()
    }

    /// Elements between two inclusive indexes
    pub async fn lrange(
        &self,
        key: impl Into<String>,
        start: i64,
        stop: i64,
    ) -> RedisResult<Vec<String>> {
        self.execute_view(names::LRANGE, &[self::key(key), start.into(), stop.into()])
            .await?
            .as_strings()
    }

    /// Overwrite the element at `index`
    pub async fn lset(
        &self,
        key: impl Into<String>,
        index: i64,
        value: impl Into<RedisValue>,
    ) -> RedisResult<()> {
        expect_ok(
            self.execute(names::LSET, &[self::key(key), index.into(), value.into()])
                .await?,
        )
    }

    // Pub/Sub

    /// Publish a message, returning how many subscribers received it
    pub async fn publish(
        &self,
        channel: impl Into<String>,
        message: impl Into<RedisValue>,
    ) -> RedisResult<i64> {
        self.execute_view(names::PUBLISH, &[key(channel), message.into()])
            .await?
            .as_i64()
    }
}

fn key(name: impl Into<String>) -> RedisValue {
    RedisValue::String(name.into())
}

fn key_list(names: impl IntoIterator<Item = impl Into<String>>) -> Vec<RedisValue> {
    names.into_iter().map(key).collect()
}

fn expect_ok(reply: RespValue) -> RedisResult<()> {
    if reply.is_status("OK") {
        Ok(())
    } else {
        Err(RedisError::shape("status OK", reply))
    }
}

// SET answers OK when it wrote and nil when NX/XX held it back.
fn set_applied(reply: RespValue) -> RedisResult<bool> {
    match reply {
        RespValue::Null => Ok(false),
        ref r if r.is_status("OK") => Ok(true),
        other => Err(RedisError::shape("status OK or nil", other)),
    }
}

// SCAN-family replies are `[cursor, [elements...]]` with the cursor as a bulk string.
fn scan_page(reply: &ReplyView) -> RedisResult<(u64, Vec<String>)> {
    let parts = reply.as_array()?;
    let [cursor, elements] = parts.as_slice() else {
        return Err(RedisError::shape("scan page", reply.raw()));
    };

    let cursor = cursor.as_string()?;
    let cursor = cursor.parse::<u64>().map_err(|_| RedisError::ShapeMismatch {
        expected: "scan cursor",
        actual: format!("{cursor:?}"),
    })?;

    Ok((cursor, elements.as_strings()?))
}
