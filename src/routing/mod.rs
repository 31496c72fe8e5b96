//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteEntry[]
//!     → escape route and mount paths
//!     → lexer.rs → parser.rs → compiler.rs (regex + parameter keys)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (method, path)
//!     → router.rs (lazy Dispatch cursor)
//!     → matcher.rs (prefix / exact / mount matches)
//!     → Step { handler, params, path } ...
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always yields the same steps
//! - First exact terminal match wins; all matching middleware runs

pub mod compiler;
pub mod error;
mod lexer;
pub mod matcher;
pub mod parser;
pub mod router;

pub use compiler::{compile, PatternCache, PatternOptions};
pub use error::PatternError;
pub use matcher::{Decoder, MatchResult, Matcher, ParamValue, Params};
pub use parser::{Modifier, Param, ParamName, Token};
pub use router::{escape_route_path, Dispatch, RouteEntry, RouteTable, Step};
