//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! template / rewrite / functions / config produce:
//!     → tracing events with structured fields (rule, direction, function, error)
//!     → metrics.rs counters (evaluations, rule errors, function calls, reloads)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, text or JSON)
//!     → whatever `metrics` recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Every evaluation runs in a span carrying a UUID evaluation id
//! - Metrics go through the `metrics` facade; no exporter is bundled
//! - Counters only: they are cheap atomic increments on the hot path

pub mod logging;
pub mod metrics;
