//! Stream resolution for hubbio.
//!
//! [`Resolver`] answers `(type, id)` queries from the stream cache, then by
//! fanning out to every registered provider through a [`StreamSource`], and
//! finally from the [`FallbackCatalog`]. [`Telemetry`] counts each answer and
//! [`Enricher`] decorates cache and stats entries with TMDB metadata in the
//! background.

pub mod aggregator;
pub mod enricher;
pub mod fallback;
pub mod metadata;
pub mod resolver;
pub mod source;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use aggregator::Aggregator;
pub use enricher::Enricher;
pub use fallback::FallbackCatalog;
pub use metadata::{ExternalRef, MetadataProvider, TmdbProvider};
pub use resolver::{Resolution, Resolver};
pub use source::{AddonClient, StreamSource};
pub use telemetry::Telemetry;
