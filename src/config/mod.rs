//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → Gateway::from_config compiles rules and builds the function registry
//!
//! On file change:
//!     watcher.rs detects change (unchanged content is ignored)
//!     → loader.rs parses new config
//!     → validation.rs validates
//!     → Gateway::prepare compiles rules (on the watcher thread)
//!     → GatewayUpdate published over mpsc
//!     → Gateway::apply replaces services, then swaps Arc<RuleSet>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{FlowConfig, GatewayConfig, ObservabilityConfig, RewriteConfig, RuleConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
