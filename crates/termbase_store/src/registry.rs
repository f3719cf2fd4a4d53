//! Named store connections.

use crate::connection::Connection;
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of store connections by name.
///
/// The host process registers its connections once at startup and hands
/// the registry to the dictionary engine by reference. Lookups are cheap
/// and return a shared handle.
#[derive(Default)]
pub struct StoreRegistry {
    connections: RwLock<HashMap<String, Arc<dyn Connection>>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, replacing any previous one with that name.
    pub fn register(&self, name: impl Into<String>, connection: Arc<dyn Connection>) {
        let name = name.into();
        tracing::debug!(store = %name, "registered store connection");
        self.connections.write().insert(name, connection);
    }

    /// Removes a connection. Returns true if it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.connections.write().remove(name).is_some()
    }

    /// Returns the connection registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections.read().get(name).cloned()
    }

    /// Returns the connection registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such connection exists.
    pub fn connection(&self, name: &str) -> StoreResult<Arc<dyn Connection>> {
        self.get(name).ok_or_else(|| StoreError::not_found(name))
    }

    /// Returns true if a connection is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.connections.read().contains_key(name)
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("names", &self.names())
            .finish()
    }
}
