//! Multi-source lookup with merge and graceful degradation.
//!
//! [`MovieLookup`] queries the primary and secondary providers concurrently,
//! merges their records, and reduces every combination of per-provider
//! failures to one of three [`LookupOutcome`] variants.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::merge::{merge, UnifiedRecord};
use super::provider::{MovieProvider, ProviderError, ProviderRecord};
use super::query::Query;
use super::registry::ProviderRegistry;

/// Default number of retries for a timed-out provider call.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Result of a lookup. No other states exist.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// At least one provider returned a record.
    Found(UnifiedRecord),
    /// Every provider that was asked reported no matching title.
    NotFound,
    /// The title could not be checked.
    ProvidersUnavailable,
}

impl LookupOutcome {
    pub fn record(&self) -> Option<&UnifiedRecord> {
        match self {
            LookupOutcome::Found(r) => Some(r),
            _ => None,
        }
    }
}

/// Orchestrates the primary/secondary provider pair.
#[derive(Clone)]
pub struct MovieLookup {
    primary: Arc<dyn MovieProvider>,
    secondary: Arc<dyn MovieProvider>,
    max_retries: u32,
}

impl MovieLookup {
    pub fn new(primary: Arc<dyn MovieProvider>, secondary: Arc<dyn MovieProvider>) -> Self {
        Self {
            primary,
            secondary,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Build from a registry's first two providers.
    ///
    /// Returns `None` when fewer than two providers are registered.
    pub fn from_registry(registry: &ProviderRegistry) -> Option<Self> {
        Some(Self::new(registry.primary()?, registry.secondary()?))
    }

    /// Override the per-call retry count for timeouts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Look up `query` in both providers and reconcile the results.
    pub async fn lookup(&self, query: &Query) -> LookupOutcome {
        let (primary, secondary) = tokio::join!(
            fetch_with_retry(self.primary.as_ref(), query, self.max_retries),
            fetch_with_retry(self.secondary.as_ref(), query, self.max_retries),
        );

        let outcome = resolve(primary, secondary);
        match &outcome {
            LookupOutcome::Found(record) => info!(
                query = %query,
                title = %record.title,
                sources = ?record.sources,
                "Lookup found a movie"
            ),
            LookupOutcome::NotFound => info!(query = %query, "Lookup found no movie"),
            LookupOutcome::ProvidersUnavailable => {
                warn!(query = %query, "Lookup failed: no provider could answer")
            }
        }
        outcome
    }
}

/// Call `provider`, retrying up to `max_retries` times on timeouts only.
pub async fn fetch_with_retry(
    provider: &dyn MovieProvider,
    query: &Query,
    max_retries: u32,
) -> Result<ProviderRecord, ProviderError> {
    let mut attempt = 0u32;
    loop {
        match provider.fetch(query).await {
            Ok(record) => {
                debug!(provider = provider.name(), title = %record.title, "Provider returned a record");
                return Ok(record);
            }
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                warn!(
                    provider = provider.name(),
                    cause = e.cause(),
                    retry = attempt,
                    "Provider call failed, retrying"
                );
            }
            Err(e) => {
                match e {
                    ProviderError::NotConfigured | ProviderError::NoResults => {
                        debug!(provider = provider.name(), cause = e.cause(), "Provider returned no record")
                    }
                    _ => warn!(
                        provider = provider.name(),
                        cause = e.cause(),
                        error = %e,
                        "Provider call failed"
                    ),
                }
                return Err(e);
            }
        }
    }
}

/// Reduce the two provider results to an outcome.
fn resolve(
    primary: Result<ProviderRecord, ProviderError>,
    secondary: Result<ProviderRecord, ProviderError>,
) -> LookupOutcome {
    match (primary, secondary) {
        (Ok(p), Ok(s)) => LookupOutcome::Found(merge(p, s)),
        (Ok(p), Err(_)) => LookupOutcome::Found(UnifiedRecord::from(p)),
        (Err(_), Ok(s)) => LookupOutcome::Found(UnifiedRecord::from(s)),
        (Err(p), Err(s)) => classify_failures(&[p, s]),
    }
}

/// `NotFound` only when every attempted provider explicitly reported no
/// results. Unconfigured providers were never attempted.
fn classify_failures(errors: &[ProviderError]) -> LookupOutcome {
    let attempted: Vec<&ProviderError> = errors
        .iter()
        .filter(|e| **e != ProviderError::NotConfigured)
        .collect();

    if !attempted.is_empty() && attempted.iter().all(|e| **e == ProviderError::NoResults) {
        LookupOutcome::NotFound
    } else {
        LookupOutcome::ProvidersUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that replays scripted responses and counts calls.
    struct ScriptedProvider {
        provider_name: &'static str,
        responses: Mutex<VecDeque<Result<ProviderRecord, ProviderError>>>,
        fallback: Result<ProviderRecord, ProviderError>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn always(name: &'static str, response: Result<ProviderRecord, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                provider_name: name,
                responses: Mutex::new(VecDeque::new()),
                fallback: response,
                calls: AtomicUsize::new(0),
            })
        }

        fn sequence(
            name: &'static str,
            first: Vec<Result<ProviderRecord, ProviderError>>,
            then: Result<ProviderRecord, ProviderError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                provider_name: name,
                responses: Mutex::new(first.into()),
                fallback: then,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MovieProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.provider_name
        }

        fn is_configured(&self) -> bool {
            self.fallback != Err(ProviderError::NotConfigured)
        }

        async fn fetch(&self, _query: &Query) -> Result<ProviderRecord, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn primary_inception() -> ProviderRecord {
        let mut r = ProviderRecord::new("Inception", "tmdb");
        r.year = Some(2010);
        r.rating = Some(8.8);
        r
    }

    fn secondary_inception() -> ProviderRecord {
        let mut r = ProviderRecord::new("Inception", "omdb");
        r.plot = Some("A thief...".into());
        r
    }

    fn lookup_of(
        primary: Arc<ScriptedProvider>,
        secondary: Arc<ScriptedProvider>,
    ) -> MovieLookup {
        MovieLookup::new(primary, secondary)
    }

    #[tokio::test]
    async fn merges_matching_records() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Ok(primary_inception())),
            ScriptedProvider::always("omdb", Ok(secondary_inception())),
        );

        let outcome = lookup.lookup(&Query::title("Inception")).await;
        let record = outcome.record().unwrap();
        assert_eq!(record.title, "Inception");
        assert_eq!(record.year, Some(2010));
        assert_eq!(record.rating, Some(8.8));
        assert_eq!(record.plot.as_deref(), Some("A thief..."));
        assert_eq!(record.sources, vec!["tmdb", "omdb"]);
    }

    #[tokio::test]
    async fn primary_fields_are_never_overwritten() {
        let mut secondary = secondary_inception();
        secondary.year = Some(1999);
        secondary.rating = Some(1.0);
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Ok(primary_inception())),
            ScriptedProvider::always("omdb", Ok(secondary)),
        );

        let outcome = lookup.lookup(&Query::title("Inception")).await;
        let record = outcome.record().unwrap();
        assert_eq!(record.year, Some(2010));
        assert_eq!(record.rating, Some(8.8));
    }

    #[tokio::test]
    async fn not_configured_primary_falls_back_to_secondary() {
        let primary = ScriptedProvider::always("tmdb", Err(ProviderError::NotConfigured));
        let lookup = lookup_of(
            primary.clone(),
            ScriptedProvider::always("omdb", Ok(secondary_inception())),
        );

        let outcome = lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(
            outcome,
            LookupOutcome::Found(UnifiedRecord::from(secondary_inception()))
        );
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn any_primary_failure_falls_back_to_secondary() {
        for err in [
            ProviderError::Timeout,
            ProviderError::RateLimited,
            ProviderError::Status(500),
            ProviderError::MalformedResponse("bad".into()),
            ProviderError::NoResults,
        ] {
            let lookup = lookup_of(
                ScriptedProvider::always("tmdb", Err(err.clone())),
                ScriptedProvider::always("omdb", Ok(secondary_inception())),
            );
            let outcome = lookup.lookup(&Query::title("Inception")).await;
            let record = outcome.record().unwrap();
            assert_eq!(record.sources, vec!["omdb"], "primary error {err:?}");
            assert_eq!(record.plot.as_deref(), Some("A thief..."));
        }
    }

    #[tokio::test]
    async fn secondary_failure_keeps_primary() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Ok(primary_inception())),
            ScriptedProvider::always("omdb", Err(ProviderError::RateLimited)),
        );
        let outcome = lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(outcome, LookupOutcome::Found(primary_inception().into()));
    }

    #[tokio::test]
    async fn both_timeouts_are_unavailable() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Err(ProviderError::Timeout)),
            ScriptedProvider::always("omdb", Err(ProviderError::Timeout)),
        );
        let outcome = lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(outcome, LookupOutcome::ProvidersUnavailable);
    }

    #[tokio::test]
    async fn both_failing_is_never_not_found() {
        let failures = [
            ProviderError::NotConfigured,
            ProviderError::Timeout,
            ProviderError::RateLimited,
            ProviderError::Status(502),
            ProviderError::Transport("refused".into()),
            ProviderError::MalformedResponse("x".into()),
        ];
        for p in &failures {
            for s in &failures {
                let lookup = lookup_of(
                    ScriptedProvider::always("tmdb", Err(p.clone())),
                    ScriptedProvider::always("omdb", Err(s.clone())),
                );
                let outcome = lookup.lookup(&Query::title("Inception")).await;
                assert_eq!(outcome, LookupOutcome::ProvidersUnavailable, "{p:?} / {s:?}");
            }
        }
    }

    #[tokio::test]
    async fn both_empty_is_not_found() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Err(ProviderError::NoResults)),
            ScriptedProvider::always("omdb", Err(ProviderError::NoResults)),
        );
        let outcome = lookup.lookup(&Query::title("Qwxzzy")).await;
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn empty_plus_unconfigured_is_not_found() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Err(ProviderError::NoResults)),
            ScriptedProvider::always("omdb", Err(ProviderError::NotConfigured)),
        );
        let outcome = lookup.lookup(&Query::title("Qwxzzy")).await;
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn empty_plus_timeout_is_unavailable() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Err(ProviderError::NoResults)),
            ScriptedProvider::always("omdb", Err(ProviderError::Timeout)),
        );
        let outcome = lookup.lookup(&Query::title("Qwxzzy")).await;
        assert_eq!(outcome, LookupOutcome::ProvidersUnavailable);
    }

    #[tokio::test]
    async fn title_mismatch_trusts_primary() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Ok(primary_inception())),
            ScriptedProvider::always("omdb", Ok(ProviderRecord::new("Insomnia", "omdb"))),
        );
        let outcome = lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(outcome, LookupOutcome::Found(primary_inception().into()));
    }

    #[tokio::test]
    async fn timeout_is_retried_once() {
        let primary = ScriptedProvider::sequence(
            "tmdb",
            vec![Err(ProviderError::Timeout)],
            Ok(primary_inception()),
        );
        let secondary = ScriptedProvider::always("omdb", Err(ProviderError::NoResults));
        let lookup = lookup_of(primary.clone(), secondary.clone());

        let outcome = lookup.lookup(&Query::title("Inception")).await;
        assert_matches!(outcome, LookupOutcome::Found(_));
        assert_eq!(primary.calls(), 2);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn retry_is_bounded() {
        let primary = ScriptedProvider::always("tmdb", Err(ProviderError::Timeout));
        let secondary = ScriptedProvider::always("omdb", Err(ProviderError::Timeout));
        let lookup = lookup_of(primary.clone(), secondary.clone());

        lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(primary.calls(), 2);
        assert_eq!(secondary.calls(), 2);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        for err in [
            ProviderError::NotConfigured,
            ProviderError::NoResults,
            ProviderError::RateLimited,
            ProviderError::Status(500),
        ] {
            let primary = ScriptedProvider::always("tmdb", Err(err.clone()));
            let lookup = lookup_of(
                primary.clone(),
                ScriptedProvider::always("omdb", Err(ProviderError::NoResults)),
            );
            lookup.lookup(&Query::title("Inception")).await;
            assert_eq!(primary.calls(), 1, "{err:?}");
        }
    }

    #[tokio::test]
    async fn retries_can_be_disabled() {
        let primary = ScriptedProvider::always("tmdb", Err(ProviderError::Timeout));
        let lookup = lookup_of(
            primary.clone(),
            ScriptedProvider::always("omdb", Err(ProviderError::Timeout)),
        )
        .with_max_retries(0);

        lookup.lookup(&Query::title("Inception")).await;
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn lookup_is_idempotent() {
        let lookup = lookup_of(
            ScriptedProvider::always("tmdb", Ok(primary_inception())),
            ScriptedProvider::always("omdb", Ok(secondary_inception())),
        );
        let query = Query::title("Inception");
        let first = lookup.lookup(&query).await;
        let second = lookup.lookup(&query).await;
        assert_eq!(first, second);
    }

    #[test]
    fn from_registry_needs_two_providers() {
        let registry = ProviderRegistry::new();
        assert!(MovieLookup::from_registry(&registry).is_none());
    }
}
