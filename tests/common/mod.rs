//! Shared utilities for integration testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use rewrite_gateway::config::{parse_config, GatewayConfig};
use rewrite_gateway::functions::{self, Deadline, FunctionRegistry, HostMap, Variables};
use rewrite_gateway::rewrite::{RewriteEngine, RewriteOptions};
use rewrite_gateway::services::{normalize_service, RegistryError, ServiceRegistry};

/// Service registry that records every lookup it serves.
#[derive(Debug, Default)]
pub struct CountingRegistry {
    services: HashMap<String, String>,
    lookups: Mutex<Vec<String>>,
}

impl CountingRegistry {
    pub fn new(services: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            services: services
                .iter()
                .map(|(name, url)| (normalize_service(name), url.to_string()))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        })
    }

    /// Service names looked up so far, in order, including lookups refused
    /// because the deadline had passed.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl ServiceRegistry for CountingRegistry {
    fn lookup(&self, service: &str, deadline: &Deadline) -> Result<Option<String>, RegistryError> {
        self.lookups.lock().unwrap().push(service.to_string());
        deadline.check()?;
        Ok(self.services.get(&normalize_service(service)).cloned())
    }
}

/// Standard functions over `services`.
pub fn functions(services: Arc<CountingRegistry>) -> Arc<FunctionRegistry> {
    strict_functions(services, HashSet::new())
}

/// Standard functions over `services`, with `strict` service functions.
pub fn strict_functions(services: Arc<CountingRegistry>, strict: HashSet<String>) -> Arc<FunctionRegistry> {
    Arc::new(functions::standard(services, HostMap::default(), Variables::default(), &strict).unwrap())
}

/// Parse a TOML configuration, panicking on error.
pub fn config(toml: &str) -> GatewayConfig {
    parse_config(toml).unwrap()
}

/// Engine over the rules of `toml` and the given services.
#[allow(dead_code)]
pub fn engine(toml: &str, services: Arc<CountingRegistry>) -> RewriteEngine {
    let config = config(toml);
    RewriteEngine::compile(
        &config.rules,
        strict_functions(services, config.rewrite.strict_set()),
        RewriteOptions::from(&config.rewrite),
    )
    .unwrap()
}

/// The WEBHDFS mapping used across tests.
#[allow(dead_code)]
pub fn webhdfs() -> Arc<CountingRegistry> {
    CountingRegistry::new(&[("WEBHDFS", "http://node1:50070/webhdfs/v1")])
}
