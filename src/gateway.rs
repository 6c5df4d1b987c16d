//! Gateway assembly.
//!
//! # Responsibilities
//! - Build the service registry, function registry and engine from configuration
//! - Apply reloaded configurations without interrupting evaluations
//!
//! # Design Decisions
//! - Rules and service mappings reload; host map, variables and rewrite
//!   options are fixed at startup because the function registry is immutable
//! - A reload compiles the new rules before touching anything, so a bad file
//!   changes nothing
//! - Service mappings are replaced before the rules are swapped: an evaluation
//!   that sees the new rules also sees the services they were written against

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::schema::{GatewayConfig, RewriteConfig};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ConfigWatcher};
use crate::functions::{self, HostMap, Variables};
use crate::rewrite::{Direction, RewriteEngine, RewriteOptions, RewriteUrlError, RuleSet};
use crate::services::{DynamicServiceRegistry, ServiceRegistry};

/// Settings that cannot change without a restart.
#[derive(Debug, Clone, PartialEq)]
struct Fixed {
    rewrite: RewriteConfig,
    hostmap: BTreeMap<String, String>,
    variables: BTreeMap<String, String>,
}

impl Fixed {
    fn of(config: &GatewayConfig) -> Self {
        Self {
            rewrite: config.rewrite.clone(),
            hostmap: config.hostmap.clone(),
            variables: config.variables.clone(),
        }
    }
}

/// A configuration that has been validated and compiled, ready to swap in.
#[derive(Debug)]
pub struct GatewayUpdate {
    rules: RuleSet,
    services: BTreeMap<String, String>,
    fixed: Fixed,
}

impl GatewayUpdate {
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

#[derive(Debug)]
pub struct Gateway {
    engine: Arc<RewriteEngine>,
    services: Arc<DynamicServiceRegistry>,
    fixed: Fixed,
}

impl Gateway {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let services = Arc::new(DynamicServiceRegistry::new());
        services.replace_all(&config.services);

        let registry: Arc<dyn ServiceRegistry> = services.clone();
        let functions = functions::standard(
            registry,
            HostMap::new(&config.hostmap),
            Variables::parse(&config.variables)?,
            &config.rewrite.strict_set(),
        )?;
        let engine = RewriteEngine::compile(
            &config.rules,
            Arc::new(functions),
            RewriteOptions::from(&config.rewrite),
        )?;

        tracing::info!(
            rules = config.rules.len(),
            services = services.len(),
            hosts = config.hostmap.len(),
            variables = config.variables.len(),
            "Gateway initialized"
        );

        Ok(Self {
            engine: Arc::new(engine),
            services,
            fixed: Fixed::of(config),
        })
    }

    pub fn engine(&self) -> &Arc<RewriteEngine> {
        &self.engine
    }

    pub fn services(&self) -> &Arc<DynamicServiceRegistry> {
        &self.services
    }

    pub fn rewrite_url(&self, raw: &str, direction: Direction) -> Result<String, RewriteUrlError> {
        self.engine.rewrite_url(raw, direction)
    }

    /// Validate `config` and compile its rules without changing anything.
    pub fn prepare(&self, config: &GatewayConfig) -> Result<GatewayUpdate, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        Ok(GatewayUpdate {
            rules: self.engine.prepare(&config.rules)?,
            services: config.services.clone(),
            fixed: Fixed::of(config),
        })
    }

    /// Swap in a prepared update.
    pub fn apply(&self, update: GatewayUpdate) {
        if update.fixed != self.fixed {
            tracing::warn!("Rewrite options, hostmap and variables changed; restart to apply them");
        }
        self.services.replace_all(&update.services);
        self.engine.reload(update.rules);
    }

    /// Swap in the rules and service mappings of `config`.
    pub fn reload(&self, config: &GatewayConfig) -> Result<(), ConfigError> {
        let update = self.prepare(config)?;
        self.apply(update);
        Ok(())
    }

    /// Watcher for `path` that publishes updates prepared against this gateway.
    pub fn watcher(
        self: &Arc<Self>,
        path: &Path,
    ) -> (ConfigWatcher<GatewayUpdate>, mpsc::UnboundedReceiver<GatewayUpdate>) {
        let gateway = Arc::clone(self);
        ConfigWatcher::new(path, move |config| gateway.prepare(&config))
    }

    /// Apply updates from a watcher until the channel closes.
    pub async fn watch(self: Arc<Self>, mut updates: mpsc::UnboundedReceiver<GatewayUpdate>) {
        while let Some(update) = updates.recv().await {
            tracing::info!(rules = update.rules.len(), services = update.services.len(), "Applying config update");
            self.apply(update);
        }
        tracing::debug!("Config updates closed");
    }
}
