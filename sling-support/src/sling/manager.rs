use crate::{
    config::{SlingManagerConfig, SlingServerConfiguration},
    errors::SlingError,
};

use super::{DefaultSlingSupportFactory, SlingSupport, SlingSupportFactory};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the configured server set and hands out [`SlingSupport`]
/// handles for them.
///
/// Handles are created lazily through the configured factory and cached
/// per server name, so repeated lookups of one server share a single
/// handle (and its connection pool). This caching is a documented
/// property of the manager, not of the factory.
pub struct SlingSupportManager {
    configs: HashMap<String, SlingServerConfiguration>,
    default_server: Option<String>,
    factory: Arc<dyn SlingSupportFactory>,
    handles: RwLock<HashMap<String, Arc<SlingSupport>>>,
}

impl SlingSupportManager {
    pub fn new(config: SlingManagerConfig) -> Result<Self, SlingError> {
        Self::with_factory(config, Arc::new(DefaultSlingSupportFactory))
    }

    /// Builds the manager around a caller-supplied factory, selected at
    /// composition time.
    pub fn with_factory(
        config: SlingManagerConfig,
        factory: Arc<dyn SlingSupportFactory>,
    ) -> Result<Self, SlingError> {
        let mut default_server = config.default_server;

        if let Some(name) = &default_server {
            if !config.servers.contains_key(name) {
                return Err(SlingError::ServerNotFound(name.clone()));
            }
        }

        // If no default was declared but active servers exist, use one
        // of them (iteration order unspecified).
        if default_server.is_none() {
            default_server = config
                .servers
                .values()
                .find(|s| s.active)
                .map(|s| s.name.clone());
        }

        Ok(Self {
            configs: config.servers,
            default_server,
            factory,
            handles: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the handle for the named server, creating it on first
    /// use. Unknown names fail with [`SlingError::ServerNotFound`].
    pub async fn get(
        &self,
        name: &str,
    ) -> Result<Arc<SlingSupport>, SlingError> {
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(name) {
                debug!(server = %name, "Reusing cached Sling handle");
                return Ok(handle.clone());
            }
        }

        let config = self
            .configs
            .get(name)
            .ok_or_else(|| SlingError::ServerNotFound(name.to_string()))?;

        let mut handles = self.handles.write().await;
        // Another task may have created the handle while we waited for
        // the write lock.
        if let Some(handle) = handles.get(name) {
            return Ok(handle.clone());
        }

        info!(server = %name, url = %config.base_url(), "Creating Sling handle");
        let handle = Arc::new(self.factory.create(config)?);
        handles.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Returns the handle for the default server: the declared default
    /// if one was configured, otherwise an active server chosen at
    /// construction.
    pub async fn get_default(
        &self,
    ) -> Result<Arc<SlingSupport>, SlingError> {
        match &self.default_server {
            Some(name) => self.get(name).await,
            None if self.configs.is_empty() => {
                Err(SlingError::NoDefaultServer)
            }
            None => {
                warn!("All configured servers are inactive");
                Err(SlingError::NoActiveServers)
            }
        }
    }

    pub fn list_servers(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    pub fn active_servers(&self) -> Vec<String> {
        self.configs
            .values()
            .filter(|s| s.active)
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn default_server(&self) -> Option<&str> {
        self.default_server.as_deref()
    }

    pub fn server_config(
        &self,
        name: &str,
    ) -> Option<&SlingServerConfiguration> {
        self.configs.get(name)
    }
}
