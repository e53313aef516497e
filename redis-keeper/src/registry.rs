//! Named client registry
//!
//! A [`Registry`] maps group names to configurations and lazily builds one
//! [`Client`] per group on first lookup. Clients stay cached until their
//! group is removed or the registry is cleared; both close the pool.
//!
//! ```no_run
//! use redis_keeper::{Configuration, Registry};
//!
//! # async fn example() -> redis_keeper::RedisResult<()> {
//! let registry = Registry::new();
//! registry.set_config(Configuration::new("127.0.0.1", 6379).with_database(1), "cache");
//!
//! if let Some(client) = registry.instance("cache") {
//!     client.ping().await?;
//! }
//!
//! registry.remove_config("cache");
//! assert!(registry.instance("cache").is_none());
//! # Ok(())
//! # }
//! ```

use crate::client::Client;
use parking_lot::Mutex;
use redis_keeper_core::config::Configuration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Group name used by [`Registry::set_default_config`] and [`Registry::default_instance`]
pub const DEFAULT_GROUP: &str = "default";

#[derive(Default)]
struct Entries {
    configs: HashMap<String, Configuration>,
    clients: HashMap<String, Arc<Client>>,
}

/// Group name to client mapping
#[derive(Default)]
pub struct Registry {
    entries: Mutex<Entries>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("Registry")
            .field("groups", &entries.configs.keys().collect::<Vec<_>>())
            .field("cached", &entries.clients.len())
            .finish()
    }
}

impl Registry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite the configuration of `name`.
    ///
    /// A client already built for `name` is kept; call
    /// [`remove_config`](Self::remove_config) first to pick up the new
    /// configuration.
    pub fn set_config(&self, config: Configuration, name: impl Into<String>) {
        let name = name.into();
        info!("Registering Redis group '{}' at {}", name, config.address());
        self.entries.lock().configs.insert(name, config);
    }

    /// Register the configuration of the default group
    pub fn set_default_config(&self, config: Configuration) {
        self.set_config(config, DEFAULT_GROUP);
    }

    /// Configuration registered for `name`
    #[must_use]
    pub fn get_config(&self, name: &str) -> Option<Configuration> {
        self.entries.lock().configs.get(name).cloned()
    }

    /// Registered group names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().configs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Client for `name`, built on first call and cached afterwards.
    ///
    /// `None` when no configuration is registered under `name`.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<Arc<Client>> {
        let mut entries = self.entries.lock();

        if let Some(client) = entries.clients.get(name) {
            return Some(Arc::clone(client));
        }

        let config = entries.configs.get(name)?.clone();
        let client = Arc::new(Client::new(config));
        entries
            .clients
            .insert(name.to_string(), Arc::clone(&client));
        Some(client)
    }

    /// Client for the default group
    #[must_use]
    pub fn default_instance(&self) -> Option<Arc<Client>> {
        self.instance(DEFAULT_GROUP)
    }

    /// Forget `name`, closing its client if one was built.
    ///
    /// Returns whether anything was registered under `name`.
    pub fn remove_config(&self, name: &str) -> bool {
        let (config, client) = {
            let mut entries = self.entries.lock();
            (entries.configs.remove(name), entries.clients.remove(name))
        };

        if let Some(client) = client {
            client.close();
        }

        if config.is_some() {
            info!("Removed Redis group '{}'", name);
        }
        config.is_some()
    }

    /// Forget every group and close every cached client
    pub fn clear_config(&self) {
        let clients = {
            let mut entries = self.entries.lock();
            entries.configs.clear();
            std::mem::take(&mut entries.clients)
        };

        for client in clients.values() {
            client.close();
        }

        info!("Cleared Redis registry ({} clients closed)", clients.len());
    }
}
