//! Movie metadata lookup across multiple providers.
//!
//! # Module layout
//!
//! - [`provider`] -- The [`MovieProvider`] trait, records and errors.
//! - [`providers`] -- TMDB and OMDb clients.
//! - [`query`] -- Parsed lookup requests.
//! - [`merge`] -- Field-priority merging of provider records.
//! - [`registry`] -- The configured primary/secondary provider set.
//! - [`lookup`] -- The orchestrator that queries both providers and
//!   classifies the combined outcome.

pub mod lookup;
pub mod merge;
pub mod provider;
pub mod providers;
pub mod query;
pub mod registry;

pub use lookup::{LookupOutcome, MovieLookup};
pub use merge::UnifiedRecord;
pub use provider::{MovieProvider, ProviderError, ProviderRecord};
pub use query::{Query, QueryTerm};
pub use registry::{ProviderRegistry, ProviderStatus};
