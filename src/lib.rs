//! Trellis - hierarchical key-value memory for AI agents
//!
//! Namespaced memory items over a partitioned key-value backend, with
//! optional semantic search via pluggable embedding providers.

pub mod backend;
pub mod embedding;
pub mod error;
pub mod retry;
pub mod search;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{Result, TrellisError};
pub use store::{Store, StoreOptions};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
