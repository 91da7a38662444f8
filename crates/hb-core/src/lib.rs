//! hb-core: shared identifiers, errors, configuration, and domain types.
//!
//! This crate is the foundational dependency for all other hb-* crates,
//! providing content keys and their digests, a unified error type, stream
//! descriptors with payload validation, provider descriptors, and the
//! application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod meta;
pub mod provider;
pub mod stream;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use meta::{MetaDetail, MetaSummary};
pub use provider::{ProviderCategory, ProviderDescriptor};
pub use stream::{ResolutionSource, StreamDescriptor};
