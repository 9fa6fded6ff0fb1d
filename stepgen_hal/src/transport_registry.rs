//! Transport registry.
//!
//! Maps a transport name from `board.toml` to the factory that opens it.
//! The registry is built at startup and handed to `HalCore` by value.

use std::collections::HashMap;

use stepgen_common::hal::transport::{RegisterTransport, TransportError, TransportFactory};
use stepgen_common::hal::types::ModuleDescriptor;

use crate::drivers;

/// Registry of available register transports.
pub struct TransportRegistry {
    factories: HashMap<&'static str, TransportFactory>,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in transport.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        drivers::register_all(&mut registry);
        registry
    }

    /// Register a transport factory.
    ///
    /// # Panics
    /// Panics if a transport with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: TransportFactory) {
        if self.factories.contains_key(name) {
            panic!("Transport '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a transport factory by name.
    pub fn get_factory(&self, name: &str) -> Option<TransportFactory> {
        self.factories.get(name).copied()
    }

    /// Open transport `name` for the module described by `md`.
    ///
    /// # Errors
    /// Returns `TransportError::NotFound` for an unknown name.
    pub fn create(
        &self,
        name: &str,
        md: &ModuleDescriptor,
    ) -> Result<Box<dyn RegisterTransport>, TransportError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| TransportError::NotFound(name.to_string()))?;
        Ok(factory(md))
    }

    /// List all registered transport names.
    pub fn list(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
