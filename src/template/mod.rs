//! URL template subsystem.
//!
//! # Data Flow
//! ```text
//! raw string
//!     → parser.rs (tokenize on : // / ? # & =, decode literals)
//!     → Template (immutable, model.rs)
//!     → matcher / rewriter
//!     → format.rs (encode literals)
//!     → output string
//! ```
//!
//! # Design Decisions
//! - Templates are values: matching and rewriting build new ones
//! - `parse(format(t)) == t` for every template the parser accepts
//! - Only one span wildcard (`**`) per path keeps matching linear

pub mod error;
pub mod format;
pub mod model;
pub mod parser;

pub use error::TemplateSyntaxError;
pub use format::{encode, format, Component};
pub use model::{FunctionRef, QueryParam, Segment, Span, Template, TemplateBuilder, Value, GLOB_BINDING};
pub use parser::{parse, parse_argument, parse_url};
