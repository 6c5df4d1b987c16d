//! Service registry collaborators.
//!
//! # Responsibilities
//! - Map logical service names (e.g. `WEBHDFS`) to canonical URLs
//! - Bound every lookup by the evaluation's deadline
//!
//! # Design Decisions
//! - Service names are case-insensitive, normalized to uppercase
//! - `lookup` is synchronous; implementations that perform I/O must honour the deadline
//! - A missing mapping is `Ok(None)`, not an error
//!
//! # Data Flow
//! ```text
//! {$servicescheme:WEBHDFS} → ServiceFunction → ServiceRegistry::lookup → "http://node1:50070/webhdfs/v1"
//! ```

mod dynamic;
mod registry;

pub use dynamic::DynamicServiceRegistry;
pub use registry::{normalize_service, RegistryError, ServiceRegistry, StaticServiceRegistry};
