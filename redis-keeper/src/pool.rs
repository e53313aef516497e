//! Bounded connection pool
//!
//! The pool tracks two populations: `active` connections (leased to a
//! caller, or being dialed for one) and `idle` connections waiting for
//! reuse. With a bounded configuration `active + idle` never exceeds
//! `max_active`, and `idle` never exceeds `max_idle`.
//!
//! Idle and lifetime expiry are checked lazily when a connection is taken
//! or handed back; there is no background reaper.
//!
//! ```no_run
//! use redis_keeper::{Configuration, Pool};
//!
//! # async fn example() -> redis_keeper::RedisResult<()> {
//! let pool = Pool::new(Configuration::new("localhost", 6379));
//! let mut conn = pool.acquire().await?;
//! let reply = conn.execute("PING", &[]).await?;
//! drop(conn); // back to the idle set
//! # Ok(())
//! # }
//! ```

use crate::connection::RawConnection;
use crate::tls::TlsContext;
use parking_lot::Mutex;
use redis_keeper_core::{
    config::{Configuration, PoolConfig},
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::{ReplyView, RespValue},
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Connections leased to callers, including ones still being dialed
    pub active: usize,
    /// Connections parked for reuse
    pub idle: usize,
}

impl PoolStats {
    /// Connections the pool currently accounts for
    #[must_use]
    pub const fn open(&self) -> usize {
        self.active + self.idle
    }
}

struct IdleConn {
    conn: RawConnection,
    idle_since: Instant,
}

struct PoolState {
    // Oldest at the front; reuse takes from the back.
    idle: VecDeque<IdleConn>,
    active: usize,
    closed: bool,
}

impl PoolState {
    fn prune(&mut self, config: &PoolConfig) -> usize {
        let before = self.idle.len();
        self.idle.retain(|idle| {
            !idle_expired(idle, config) && !lifetime_expired(&idle.conn, config)
        });
        before - self.idle.len()
    }

    fn has_room(&self, config: &PoolConfig) -> bool {
        !config.is_bounded() || self.active + self.idle.len() < config.max_active
    }
}

fn idle_expired(idle: &IdleConn, config: &PoolConfig) -> bool {
    config
        .idle_timeout
        .is_some_and(|limit| idle.idle_since.elapsed() >= limit)
}

fn lifetime_expired(conn: &RawConnection, config: &PoolConfig) -> bool {
    config
        .max_conn_lifetime
        .is_some_and(|limit| conn.age() >= limit)
}

enum Checkout {
    Idle(RawConnection),
    Dial,
    Wait,
}

struct PoolInner {
    config: Configuration,
    state: Mutex<PoolState>,
    available: Notify,
    // Resolved on the first TLS dial and kept once it succeeds.
    tls: Mutex<Option<TlsContext>>,
}

/// A pool of connections to one Redis server.
///
/// Cloning is cheap and every clone shares the same connections.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("address", &self.inner.config.address())
            .field("stats", &self.stats())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// Holds a reserved dial slot until the dial resolves, so a cancelled
// acquire does not leak capacity.
struct Reservation<'a> {
    pool: &'a Pool,
    armed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.release_slot();
        }
    }
}

impl Pool {
    /// Create a pool. No connection is dialed until the first acquire.
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        debug!(
            "Creating pool for {} (max_active={}, max_idle={})",
            config.address(),
            config.pool.max_active,
            config.pool.max_idle
        );

        Self {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    active: 0,
                    closed: false,
                }),
                available: Notify::new(),
                tls: Mutex::new(None),
            }),
        }
    }

    /// Configuration the pool dials with
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.inner.config
    }

    /// Lease a connection, waiting up to the configured `wait_timeout`
    pub async fn acquire(&self) -> RedisResult<PooledConnection> {
        self.acquire_timeout(self.inner.config.pool.wait_timeout)
            .await
    }

    /// Lease a connection, waiting at most `wait` for one to free up.
    ///
    /// Fails with [`RedisError::PoolExhausted`] when the bound elapses and
    /// [`RedisError::PoolClosed`] once the pool has been drained.
    pub async fn acquire_timeout(&self, wait: Duration) -> RedisResult<PooledConnection> {
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            let notified = self.inner.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.checkout()? {
                Checkout::Idle(conn) => {
                    debug!(conn = conn.id(), "Reusing idle connection");
                    return Ok(PooledConnection::new(self.clone(), conn));
                }
                Checkout::Dial => return self.dial().await,
                Checkout::Wait => {}
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                warn!(
                    "Pool for {} exhausted after waiting {:?}",
                    self.inner.config.address(),
                    wait
                );
                return Err(RedisError::PoolExhausted {
                    waited_ms: wait.as_millis(),
                });
            }
        }
    }

    fn checkout(&self) -> RedisResult<Checkout> {
        let config = &self.inner.config.pool;
        let mut state = self.inner.state.lock();

        if state.closed {
            return Err(RedisError::PoolClosed);
        }

        let pruned = state.prune(config);
        if pruned > 0 {
            debug!(pruned, "Evicted expired idle connections");
        }

        if let Some(idle) = state.idle.pop_back() {
            state.active += 1;
            return Ok(Checkout::Idle(idle.conn));
        }

        if state.has_room(config) {
            state.active += 1;
            return Ok(Checkout::Dial);
        }

        Ok(Checkout::Wait)
    }

    async fn dial(&self) -> RedisResult<PooledConnection> {
        let mut reservation = Reservation {
            pool: self,
            armed: true,
        };

        let tls = self.tls_context()?;
        match RawConnection::connect(&self.inner.config, tls.as_ref()).await {
            Ok(conn) => {
                reservation.armed = false;
                Ok(PooledConnection::new(self.clone(), conn))
            }
            Err(e) => {
                warn!("Failed to dial {}: {}", self.inner.config.address(), e);
                Err(e)
            }
        }
    }

    fn tls_context(&self) -> RedisResult<Option<TlsContext>> {
        let Some(ref tls_config) = self.inner.config.tls else {
            return Ok(None);
        };

        let mut cached = self.inner.tls.lock();
        if let Some(ref context) = *cached {
            return Ok(Some(context.clone()));
        }

        let context = TlsContext::new(tls_config, &self.inner.config.host).map_err(|e| {
            warn!("TLS setup for {} failed: {}", self.inner.config.address(), e);
            match e {
                RedisError::Tls(message) => {
                    RedisError::Connect(format!("TLS setup failed: {}", message))
                }
                other => other,
            }
        })?;
        *cached = Some(context.clone());
        Ok(Some(context))
    }

    fn release_slot(&self) {
        {
            let mut state = self.inner.state.lock();
            state.active = state.active.saturating_sub(1);
        }
        self.inner.available.notify_one();
    }

    /// Take back a leased connection.
    ///
    /// The connection is discarded instead of parked when `failed` is set,
    /// when it saw an execution failure, when it still owes replies, when
    /// it outlived `max_conn_lifetime`, when the idle set is full, or when
    /// the pool is closed.
    fn release(&self, conn: RawConnection, failed: bool) {
        let config = &self.inner.config.pool;

        let discarded = {
            let mut state = self.inner.state.lock();
            state.active = state.active.saturating_sub(1);

            let reason = if state.closed {
                Some("pool closed")
            } else if failed || conn.is_broken() {
                Some("execution failure")
            } else if conn.pending() > 0 {
                Some("unread replies")
            } else if lifetime_expired(&conn, config) {
                Some("max lifetime exceeded")
            } else if state.idle.len() >= config.max_idle {
                Some("idle set full")
            } else {
                None
            };

            match reason {
                Some(reason) => Some((reason, conn)),
                None => {
                    state.idle.push_back(IdleConn {
                        conn,
                        idle_since: Instant::now(),
                    });
                    None
                }
            }
        };

        self.inner.available.notify_one();

        if let Some((reason, conn)) = discarded {
            debug!(conn = conn.id(), reason, "Discarding connection");
        }
    }

    /// Current occupancy
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            active: state.active,
            idle: state.idle.len(),
        }
    }

    /// Close every idle connection and refuse further acquires.
    ///
    /// Leased connections are discarded as they come back. Waiters wake
    /// up with [`RedisError::PoolClosed`]. Draining twice is harmless.
    pub fn drain(&self) {
        let idle = {
            let mut state = self.inner.state.lock();
            state.closed = true;
            std::mem::take(&mut state.idle)
        };

        self.inner.available.notify_waiters();

        if !idle.is_empty() {
            debug!(
                "Drained {} idle connections from pool for {}",
                idle.len(),
                self.inner.config.address()
            );
        }
    }

    /// Whether [`drain`](Self::drain) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }
}

/// A connection leased from a [`Pool`].
///
/// Dropping the lease hands the connection back; a connection that saw an
/// execution failure is discarded rather than reused.
pub struct PooledConnection {
    pool: Pool,
    conn: Option<RawConnection>,
    poisoned: bool,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl PooledConnection {
    fn new(pool: Pool, conn: RawConnection) -> Self {
        Self {
            pool,
            conn: Some(conn),
            poisoned: false,
        }
    }

    fn raw(&mut self) -> RedisResult<&mut RawConnection> {
        self.conn.as_mut().ok_or(RedisError::ConnectionClosed)
    }

    /// Run one command and return its raw reply
    pub async fn execute(&mut self, command: &str, args: &[RedisValue]) -> RedisResult<RespValue> {
        self.raw()?.execute(command, args).await
    }

    /// Run one command and return a typed view of its reply
    pub async fn execute_view(
        &mut self,
        command: &str,
        args: &[RedisValue],
    ) -> RedisResult<ReplyView> {
        self.execute(command, args).await.map(ReplyView::new)
    }

    /// Queue a command without sending it; pair with [`flush`](Self::flush)
    /// and one [`receive`](Self::receive) per queued command.
    pub fn send(&mut self, command: &str, args: &[RedisValue]) -> RedisResult<()> {
        self.raw()?.send(command, args);
        Ok(())
    }

    /// Write queued commands to the server
    pub async fn flush(&mut self) -> RedisResult<()> {
        self.raw()?.flush().await
    }

    /// Read the next reply
    pub async fn receive(&mut self) -> RedisResult<RespValue> {
        self.raw()?.receive().await
    }

    /// Read the next reply as a typed view
    pub async fn receive_view(&mut self) -> RedisResult<ReplyView> {
        self.receive().await.map(ReplyView::new)
    }

    /// Read the next reply with an explicit bound; `None` waits indefinitely
    pub async fn receive_timeout(&mut self, limit: Option<Duration>) -> RedisResult<RespValue> {
        self.raw()?.receive_timeout(limit).await
    }

    /// PING the server, optionally with a message to echo back
    pub async fn ping(&mut self, message: Option<&str>) -> RedisResult<String> {
        let args: Vec<RedisValue> = message.map(RedisValue::from).into_iter().collect();
        let reply = self.execute_view("PING", &args).await?.as_string()?;

        match message {
            Some(expected) if reply != expected => Err(RedisError::Protocol(format!(
                "PING echoed {:?}, expected {:?}",
                reply, expected
            ))),
            _ => Ok(reply),
        }
    }

    /// Never return this connection to the idle set
    pub fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Whether the connection is unfit for reuse
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.poisoned || self.conn.as_ref().map_or(true, RawConnection::is_broken)
    }

    /// Identifier of the underlying connection
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.conn.as_ref().map(RawConnection::id)
    }

    /// Close the underlying connection instead of handing it back
    pub async fn close(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release_slot();
            conn.close().await;
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn, self.poisoned);
        }
    }
}
