use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::functions::{Deadline, DeadlineError};

/// A lookup that could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Deadline(#[from] DeadlineError),

    #[error("service registry unavailable: {0}")]
    Backend(String),
}

/// Resolves a logical service name to its canonical URL.
pub trait ServiceRegistry: Send + Sync + fmt::Debug {
    fn lookup(&self, service: &str, deadline: &Deadline) -> Result<Option<String>, RegistryError>;
}

/// Canonical form of a service name.
pub fn normalize_service(service: &str) -> String {
    service.trim().to_ascii_uppercase()
}

/// Immutable mapping loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticServiceRegistry {
    services: HashMap<String, String>,
}

impl StaticServiceRegistry {
    pub fn new<I, K, V>(services: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            services: services
                .into_iter()
                .map(|(name, url)| (normalize_service(name.as_ref()), url.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceRegistry for StaticServiceRegistry {
    fn lookup(&self, service: &str, deadline: &Deadline) -> Result<Option<String>, RegistryError> {
        deadline.check()?;
        Ok(self.services.get(&normalize_service(service)).cloned())
    }
}
