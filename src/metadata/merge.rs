//! Merging provider records into a single [`UnifiedRecord`].

use serde::Serialize;

use super::provider::ProviderRecord;

/// Metadata for one movie, merged from one or more providers.
///
/// Fields taken from the primary record are never replaced; later records
/// only fill fields the earlier ones left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    pub title: String,
    pub year: Option<u16>,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<u64>,
    pub plot: Option<String>,
    pub poster_url: Option<String>,
    pub director: Option<String>,
    pub cast: Option<Vec<String>>,
    pub runtime_minutes: Option<u32>,
    pub genres: Option<Vec<String>>,
    /// Providers that contributed, in priority order.
    pub sources: Vec<&'static str>,
}

impl From<ProviderRecord> for UnifiedRecord {
    fn from(r: ProviderRecord) -> Self {
        Self {
            title: r.title,
            year: r.year,
            release_date: r.release_date,
            rating: r.rating,
            imdb_id: r.imdb_id,
            tmdb_id: r.tmdb_id,
            plot: r.plot,
            poster_url: r.poster_url,
            director: r.director,
            cast: r.cast,
            runtime_minutes: r.runtime_minutes,
            genres: r.genres,
            sources: vec![r.source],
        }
    }
}

impl UnifiedRecord {
    /// Fill every absent field from `other`. Present fields are kept as-is,
    /// including the title.
    pub fn fill_gaps(mut self, other: ProviderRecord) -> Self {
        self.year = self.year.or(other.year);
        self.release_date = self.release_date.or(other.release_date);
        self.rating = self.rating.or(other.rating);
        self.imdb_id = self.imdb_id.or(other.imdb_id);
        self.tmdb_id = self.tmdb_id.or(other.tmdb_id);
        self.plot = self.plot.or(other.plot);
        self.poster_url = self.poster_url.or(other.poster_url);
        self.director = self.director.or(other.director);
        self.cast = self.cast.or(other.cast);
        self.runtime_minutes = self.runtime_minutes.or(other.runtime_minutes);
        self.genres = self.genres.or(other.genres);
        if !self.sources.contains(&other.source) {
            self.sources.push(other.source);
        }
        self
    }
}

/// Whether two records plausibly describe the same movie.
///
/// Exact title equality ignoring case, or equal IMDb ids when both carry one.
/// No fuzzy matching.
pub fn same_title(a: &ProviderRecord, b: &ProviderRecord) -> bool {
    if a.title.to_lowercase() == b.title.to_lowercase() {
        return true;
    }
    matches!((&a.imdb_id, &b.imdb_id), (Some(x), Some(y)) if x.eq_ignore_ascii_case(y))
}

/// Merge a primary and secondary record.
///
/// When the titles disagree the primary record is used alone.
pub fn merge(primary: ProviderRecord, secondary: ProviderRecord) -> UnifiedRecord {
    if same_title(&primary, &secondary) {
        UnifiedRecord::from(primary).fill_gaps(secondary)
    } else {
        tracing::debug!(
            primary = %primary.title,
            secondary = %secondary.title,
            "Provider titles disagree; keeping primary record"
        );
        UnifiedRecord::from(primary)
    }
}
