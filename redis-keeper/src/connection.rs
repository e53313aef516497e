//! Physical connections to a Redis server
//!
//! A [`RawConnection`] is one TCP (optionally TLS) stream plus the buffers
//! and timestamps the pool needs. It knows nothing about pooling: it dials,
//! authenticates, selects the database and then runs commands one round
//! trip at a time, or pipelined through `send`/`flush`/`receive`.

use crate::protocol::{RespDecoder, RespEncoder};
use crate::tls::TlsContext;
use bytes::{Buf, BytesMut};
use redis_keeper_core::{
    config::Configuration,
    error::{RedisError, RedisResult},
    types::RedisValue,
    value::RespValue,
};
use socket2::{SockRef, TcpKeepalive};
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Plain or TLS transport
enum ConnectionStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for ConnectionStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            ConnectionStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ConnectionStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            ConnectionStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            ConnectionStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Plain(s) => Pin::new(s).poll_flush(cx),
            ConnectionStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            ConnectionStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> RedisResult<T>
where
    F: Future<Output = RedisResult<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| RedisError::Timeout)?,
        None => fut.await,
    }
}

/// A connection to a Redis server
pub struct RawConnection {
    id: u64,
    stream: ConnectionStream,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    pending: usize,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    created_at: Instant,
    last_used_at: Instant,
    broken: bool,
}

impl std::fmt::Debug for RawConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawConnection")
            .field("id", &self.id)
            .field("pending", &self.pending)
            .field("age", &self.age())
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

impl RawConnection {
    /// Dial the server, then run AUTH and SELECT as the configuration asks.
    ///
    /// The stream is wrapped in TLS when `tls` is given. Every failure on
    /// the way is reported as [`RedisError::Connect`].
    pub async fn connect(config: &Configuration, tls: Option<&TlsContext>) -> RedisResult<Self> {
        let addr = config.address();
        debug!("Connecting to Redis at {}", addr);

        let stream = timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                RedisError::Connect(format!(
                    "Timed out connecting to {} after {:?}",
                    addr, config.connect_timeout
                ))
            })?
            .map_err(|e| RedisError::Connect(format!("Failed to connect to {}: {}", addr, e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| RedisError::Connect(format!("Failed to set TCP_NODELAY: {}", e)))?;

        if let Some(keepalive_duration) = config.tcp_keepalive {
            let keepalive = TcpKeepalive::new().with_time(keepalive_duration);
            SockRef::from(&stream)
                .set_tcp_keepalive(&keepalive)
                .map_err(|e| RedisError::Connect(format!("Failed to set TCP keepalive: {}", e)))?;
        }

        let stream = match tls {
            Some(context) => ConnectionStream::Tls(Box::new(context.handshake(stream).await?)),
            None => ConnectionStream::Plain(stream),
        };

        let now = Instant::now();
        let mut conn = Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            stream,
            read_buffer: BytesMut::with_capacity(8192),
            write_buffer: BytesMut::with_capacity(1024),
            pending: 0,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            created_at: now,
            last_used_at: now,
            broken: false,
        };

        if let Some(ref password) = config.password {
            conn.authenticate(config.username.as_deref(), password)
                .await?;
        }

        if config.database != 0 {
            conn.select_database(config.database).await?;
        }

        debug!(conn = conn.id, "Connected to {}", addr);
        Ok(conn)
    }

    /// Authenticate with the Redis server
    async fn authenticate(&mut self, username: Option<&str>, password: &str) -> RedisResult<()> {
        debug!(conn = self.id, "Authenticating with Redis server");
        let args: Vec<RedisValue> = match username {
            Some(user) => vec![user.into(), password.into()],
            None => vec![password.into()],
        };

        match self.execute("AUTH", &args).await {
            Ok(ref reply) if reply.is_status("OK") => Ok(()),
            Ok(reply) => Err(RedisError::Connect(format!(
                "Unexpected authentication response: {:?}",
                reply
            ))),
            Err(e) => Err(RedisError::Connect(format!("Authentication failed: {}", e))),
        }
    }

    /// Select a database
    async fn select_database(&mut self, db: u32) -> RedisResult<()> {
        match self.execute("SELECT", &[RedisValue::from(db)]).await {
            Ok(ref reply) if reply.is_status("OK") => Ok(()),
            Ok(reply) => Err(RedisError::Connect(format!(
                "Unexpected SELECT response: {:?}",
                reply
            ))),
            Err(e) => Err(RedisError::Connect(format!(
                "Failed to select database {}: {}",
                db, e
            ))),
        }
    }

    /// Run one command and return its reply.
    ///
    /// Commands queued earlier with [`send`](Self::send) are flushed along
    /// with this one and their replies read and dropped; the result is the
    /// reply to this command. Error replies become [`RedisError::Server`].
    pub async fn execute(&mut self, command: &str, args: &[RedisValue]) -> RedisResult<RespValue> {
        self.send(command, args);
        self.flush().await?;

        let mut result = Ok(RespValue::Null);
        while self.pending > 0 {
            result = self.receive().await;
            if let Err(ref e) = result {
                if e.is_execution_failure() {
                    return result;
                }
            }
        }
        result
    }

    /// Queue a command in the write buffer without touching the network
    pub fn send(&mut self, command: &str, args: &[RedisValue]) {
        RespEncoder::encode_command_into(command, args, &mut self.write_buffer);
        self.pending += 1;
    }

    /// Write every queued command to the server
    pub async fn flush(&mut self) -> RedisResult<()> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        let data = self.write_buffer.split().freeze();
        let stream = &mut self.stream;
        let result = bounded(self.write_timeout, async move {
            stream.write_all(&data).await?;
            stream.flush().await?;
            Ok::<(), RedisError>(())
        })
        .await;

        self.last_used_at = Instant::now();
        self.observe(result)
    }

    /// Read the next reply, bounded by the configured read timeout
    pub async fn receive(&mut self) -> RedisResult<RespValue> {
        self.receive_timeout(self.read_timeout).await
    }

    /// Read the next reply with an explicit bound; `None` waits indefinitely
    pub async fn receive_timeout(&mut self, limit: Option<Duration>) -> RedisResult<RespValue> {
        let result = bounded(limit, self.read_frame()).await;
        self.pending = self.pending.saturating_sub(1);
        self.last_used_at = Instant::now();

        match self.observe(result)? {
            RespValue::Error(msg) => Err(RedisError::Server(msg)),
            reply => Ok(reply),
        }
    }

    /// Read a complete RESP frame from the connection
    async fn read_frame(&mut self) -> RedisResult<RespValue> {
        loop {
            let mut cursor = Cursor::new(&self.read_buffer[..]);
            if let Some(value) = RespDecoder::decode(&mut cursor)? {
                let pos = cursor.position() as usize;
                self.read_buffer.advance(pos);
                return Ok(value);
            }

            let n = self.stream.read_buf(&mut self.read_buffer).await?;
            if n == 0 {
                return Err(RedisError::ConnectionClosed);
            }
        }
    }

    fn observe<T>(&mut self, result: RedisResult<T>) -> RedisResult<T> {
        if let Err(ref e) = result {
            if e.is_execution_failure() && !self.broken {
                warn!(conn = self.id, error = %e, "Connection marked broken");
                self.broken = true;
            }
        }
        result
    }

    /// Shut the stream down. Errors are ignored; the connection is gone either way.
    pub async fn close(mut self) {
        debug!(conn = self.id, "Closing connection");
        let _ = self.stream.shutdown().await;
    }

    /// Process-unique identifier, used in logs
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Replies still owed by the server for queued commands
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// Whether an execution failure left this connection unusable
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    /// When the connection was dialed
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the connection last wrote or read
    #[must_use]
    pub const fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    /// Time since the connection was dialed
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
