//! Provider registry for the primary/secondary movie-data providers.
//!
//! The [`ProviderRegistry`] holds every recognized provider in priority order,
//! whether or not it has credentials. Unconfigured providers stay registered
//! so they can answer `not_configured` and show up in status reports.

use std::sync::Arc;
use std::time::Duration;

use super::provider::MovieProvider;
use super::providers::{OmdbProvider, TmdbProvider};
use crate::config::Config;

/// Configured state of one registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub name: &'static str,
    pub configured: bool,
}

/// Priority-ordered set of movie-data providers.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MovieProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Build the standard TMDB (primary) + OMDb (secondary) pair from config.
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.http.request_timeout_secs);
        let mut registry = Self::new();
        registry.register(Arc::new(TmdbProvider::from_config(&config.tmdb, timeout)));
        registry.register(Arc::new(OmdbProvider::from_config(&config.omdb, timeout)));
        registry
    }

    /// Register a provider. The first registered provider is the primary.
    pub fn register(&mut self, provider: Arc<dyn MovieProvider>) {
        self.providers.push(provider);
    }

    /// The primary provider (first registered).
    pub fn primary(&self) -> Option<Arc<dyn MovieProvider>> {
        self.providers.first().cloned()
    }

    /// The secondary provider (second registered).
    pub fn secondary(&self) -> Option<Arc<dyn MovieProvider>> {
        self.providers.get(1).cloned()
    }

    /// Configured flag for every registered provider, in priority order.
    pub fn status(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                name: p.name(),
                configured: p.is_configured(),
            })
            .collect()
    }

    /// Whether at least one provider has credentials.
    pub fn any_configured(&self) -> bool {
        self.providers.iter().any(|p| p.is_configured())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
