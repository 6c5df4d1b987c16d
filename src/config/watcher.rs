//! Configuration file watcher for hot reload.
//!
//! Each change runs the file through loading, validation and a caller-supplied
//! `prepare` step (the gateway compiles its rule set there). Only updates that
//! got through every step are published, so the receiver never has to deal with
//! a broken file. Events that leave the file content unchanged are dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::GatewayConfig;

type Prepare<T> = Box<dyn Fn(GatewayConfig) -> Result<T, ConfigError> + Send>;

/// Watches a configuration file and publishes prepared updates.
pub struct ConfigWatcher<T> {
    path: PathBuf,
    prepare: Prepare<T>,
    update_tx: mpsc::UnboundedSender<T>,
}

impl ConfigWatcher<GatewayConfig> {
    /// Watcher that publishes validated configurations as they are.
    pub fn configs(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        Self::new(path, Ok)
    }
}

impl<T: Send + 'static> ConfigWatcher<T> {
    /// Create a watcher whose updates are produced by `prepare`.
    ///
    /// Returns the watcher and the receiving end of the update channel.
    pub fn new<F>(path: &Path, prepare: F) -> (Self, mpsc::UnboundedReceiver<T>)
    where
        F: Fn(GatewayConfig) -> Result<T, ConfigError> + Send + 'static,
    {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                prepare: Box::new(prepare),
                update_tx,
            },
            update_rx,
        )
    }

    /// Load, validate and prepare the file's current content.
    fn load(path: &Path, prepare: &Prepare<T>, content: &str) -> Result<T, ConfigError> {
        let config = parse_config(content)?;
        tracing::debug!(path = ?path, rules = config.rules.len(), "Config parsed, preparing update");
        prepare(config)
    }

    /// Start watching the file. Events are handled on notify's own thread;
    /// the returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let ConfigWatcher {
            path,
            prepare,
            update_tx,
        } = self;
        let watched = path.clone();
        let mut last: Option<String> = fs::read_to_string(&path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let content = match fs::read_to_string(&path) {
                        Ok(content) => content,
                        Err(source) => {
                            let error = ConfigError::Io {
                                path: path.clone(),
                                source,
                            };
                            tracing::error!(error = %error, "Failed to read changed config");
                            return;
                        }
                    };
                    if last.as_deref() == Some(content.as_str()) {
                        tracing::trace!(path = ?path, "Config content unchanged, ignoring event");
                        return;
                    }
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match Self::load(&path, &prepare, &content) {
                        Ok(update) => {
                            last = Some(content);
                            if update_tx.send(update).is_err() {
                                tracing::debug!("Config receiver dropped");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Rejected config change, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}
