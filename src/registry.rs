//! Named service registry
//!
//! Services are created once at startup and registered under a name; any
//! consumer can then look a service up by that name and its concrete type.
//!
//! ```rust
//! use std::sync::Arc;
//! use asset_cache::registry::ServiceRegistry;
//!
//! let mut registry = ServiceRegistry::new();
//! registry.register("Greeting", Arc::new(String::from("hello"))).unwrap();
//! let greeting = registry.get::<String>("Greeting").unwrap();
//! assert_eq!(greeting.as_str(), "hello");
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{RegistryError, RegistryResult};

/// A type-erased service instance
struct ServiceEntry {
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service; each name can be registered once
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> RegistryResult<()> {
        let name = name.into();
        if self.services.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered { name });
        }

        let type_name = std::any::type_name::<T>();
        debug!("Registering service {} ({})", name, type_name);
        self.services.insert(
            name,
            ServiceEntry {
                type_name,
                instance,
            },
        );
        Ok(())
    }

    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> RegistryResult<Arc<T>> {
        let entry = self
            .services
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered {
                name: name.to_string(),
            })?;

        entry
            .instance
            .clone()
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                registered: entry.type_name,
                requested: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }
}
