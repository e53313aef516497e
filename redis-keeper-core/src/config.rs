//! Configuration types for Redis connections

use crate::error::{RedisError, RedisResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Port used when a URL or endpoint does not name one
pub const DEFAULT_PORT: u16 = 6379;

const DEFAULT_MAX_IDLE: usize = 10;
const DEFAULT_MAX_ACTIVE: usize = 100;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_CONN_LIFETIME: Duration = Duration::from_secs(60);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(60);

/// Bounds and eviction policy for a connection pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of idle connections kept for reuse
    pub max_idle: usize,
    /// Maximum number of open connections (leased + idle); 0 means unbounded
    pub max_active: usize,
    /// Idle connections older than this are closed instead of reused
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Option<Duration>,
    /// Connections older than this are closed instead of reused
    #[serde(with = "humantime_serde")]
    pub max_conn_lifetime: Option<Duration>,
    /// How long `acquire` waits for a free slot before failing
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: DEFAULT_MAX_IDLE,
            max_active: DEFAULT_MAX_ACTIVE,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            max_conn_lifetime: Some(DEFAULT_MAX_CONN_LIFETIME),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Set the maximum number of idle connections
    #[must_use]
    pub const fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Set the maximum number of open connections (0 = unbounded)
    #[must_use]
    pub const fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Set the idle timeout
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    #[must_use]
    pub const fn with_max_conn_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_conn_lifetime = lifetime;
        self
    }

    /// Set how long `acquire` may wait for a free slot
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Whether the pool has a ceiling on open connections
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.max_active > 0
    }
}

/// Client-side TLS options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Name presented for SNI and certificate verification; defaults to the host
    pub server_name: Option<String>,
    /// PEM bundle of trusted CAs; the webpki root set is used when absent
    pub ca_path: Option<PathBuf>,
}

impl TlsConfig {
    /// TLS with the default trust store
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the SNI server name
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Trust the CAs in the given PEM file instead of the webpki roots
    #[must_use]
    pub fn with_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }
}

/// Configuration for one Redis server (and the pool that talks to it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Server host name or address
    pub host: String,

    /// Server port
    pub port: u16,

    /// ACL user name (Redis 6+); `AUTH user pass` is sent when set together with a password
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Database index selected after connecting
    #[serde(default)]
    pub database: u32,

    /// Dial timeout
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Bound on waiting for a reply
    #[serde(default = "default_io_timeout", with = "humantime_serde")]
    pub read_timeout: Option<Duration>,

    /// Bound on writing a command
    #[serde(default = "default_io_timeout", with = "humantime_serde")]
    pub write_timeout: Option<Duration>,

    /// Enable TCP keepalive
    #[serde(default = "default_keepalive", with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,

    /// TLS options; plain TCP when absent
    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// Pool configuration
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_io_timeout() -> Option<Duration> {
    Some(DEFAULT_IO_TIMEOUT)
}

fn default_keepalive() -> Option<Duration> {
    Some(DEFAULT_KEEPALIVE)
}

impl Configuration {
    /// Create a configuration for `host:port` with default timeouts and pool bounds
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
            database: 0,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
            write_timeout: Some(DEFAULT_IO_TIMEOUT),
            tcp_keepalive: Some(DEFAULT_KEEPALIVE),
            tls: None,
            pool: PoolConfig::default(),
        }
    }

    /// Parse a `redis://[user:pass@]host[:port][/db]` or `rediss://` URL
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::Config`] if the URL is malformed, uses another
    /// scheme, has no host or names a non-numeric database.
    pub fn from_url(input: &str) -> RedisResult<Self> {
        let url = Url::parse(input).map_err(|e| RedisError::Config(format!("{input}: {e}")))?;

        let tls = match url.scheme() {
            "redis" => None,
            "rediss" => Some(TlsConfig::default()),
            other => {
                return Err(RedisError::Config(format!(
                    "unsupported URL scheme '{other}'"
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RedisError::Config(format!("{input}: missing host")))?;
        // Bracketed IPv6 literals come back with their brackets
        let host = host.trim_start_matches('[').trim_end_matches(']');

        let mut config = Self::new(host, url.port().unwrap_or(DEFAULT_PORT));
        config.tls = tls;

        if !url.username().is_empty() {
            config.username = Some(url.username().to_string());
        }
        if let Some(password) = url.password() {
            config.password = Some(password.to_string());
        }

        let db = url.path().trim_start_matches('/');
        if !db.is_empty() {
            config.database = db
                .parse()
                .map_err(|_| RedisError::Config(format!("invalid database index '{db}'")))?;
        }

        Ok(config)
    }

    /// Set the password for authentication
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the ACL user name
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the database number
    #[must_use]
    pub const fn with_database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    /// Set the connection timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set TCP keepalive
    #[must_use]
    pub const fn with_tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.tcp_keepalive = keepalive;
        self
    }

    /// Enable TLS
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set the pool configuration
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// `host:port` for dialing
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Check the configuration for values no connection could be built from
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::Config`] describing the first problem found.
    pub fn validate(&self) -> RedisResult<()> {
        if self.host.trim().is_empty() {
            return Err(RedisError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(RedisError::Config("port must not be 0".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(RedisError::Config(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }
        if self.username.is_some() && self.password.is_none() {
            return Err(RedisError::Config(
                "username requires a password".to_string(),
            ));
        }
        Ok(())
    }
}
