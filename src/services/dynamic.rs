use std::collections::HashMap;

use dashmap::DashMap;

use super::registry::{normalize_service, RegistryError, ServiceRegistry};
use crate::functions::Deadline;

/// Concurrent registry that can be updated while evaluations read it.
#[derive(Debug, Default)]
pub struct DynamicServiceRegistry {
    services: DashMap<String, String>,
}

impl DynamicServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a service. Returns the previous URL, if any.
    pub fn register(&self, service: &str, url: impl Into<String>) -> Option<String> {
        let previous = self.services.insert(normalize_service(service), url.into());
        tracing::debug!(service = %service, replaced = previous.is_some(), "Service registered");
        previous
    }

    pub fn remove(&self, service: &str) -> Option<String> {
        self.services
            .remove(&normalize_service(service))
            .map(|(_, url)| url)
    }

    /// Replace the whole mapping, e.g. after a configuration reload.
    pub fn replace_all<I, K, V>(&self, services: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let next: HashMap<String, String> = services
            .into_iter()
            .map(|(name, url)| (normalize_service(name.as_ref()), url.into()))
            .collect();
        self.services.retain(|name, _| next.contains_key(name));
        for (name, url) in next {
            self.services.insert(name, url);
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceRegistry for DynamicServiceRegistry {
    fn lookup(&self, service: &str, deadline: &Deadline) -> Result<Option<String>, RegistryError> {
        deadline.check()?;
        Ok(self
            .services
            .get(&normalize_service(service))
            .map(|entry| entry.value().clone()))
    }
}
