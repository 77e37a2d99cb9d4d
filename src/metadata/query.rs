//! Lookup queries.
//!
//! A [`Query`] is either a free-text title or an IMDb identifier, with an
//! optional release-year hint used for disambiguation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static IMDB_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(tt\d{7,})\b").unwrap());

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static PAREN_YEAR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((19\d{2}|20\d{2})\)$").unwrap());

/// Suffixes stripped from free-text titles, applied in order.
static NOISE_SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\s*\[.*\]$",
        r"(?i)\s*-\s*trailer$",
        r"(?i)\s*official\s*trailer$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// What a query identifies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryTerm {
    /// Free-text title.
    Title(String),
    /// IMDb identifier such as `tt1375666`.
    ImdbId(String),
}

/// An immutable lookup request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    term: QueryTerm,
    year: Option<u16>,
}

impl Query {
    /// Query by title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            term: QueryTerm::Title(title.into()),
            year: None,
        }
    }

    /// Query by IMDb identifier.
    pub fn imdb_id(id: impl Into<String>) -> Self {
        Self {
            term: QueryTerm::ImdbId(id.into()),
            year: None,
        }
    }

    /// Attach a release-year hint.
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Parse user text into a query.
    ///
    /// An IMDb id anywhere in the text wins. Otherwise the text is cleaned
    /// (whitespace collapsed, a trailing `(YYYY)` taken as the year hint,
    /// bracketed tags and "trailer" suffixes removed). Returns `None` when
    /// nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(m) = IMDB_ID_PATTERN.captures(raw) {
            return Some(Self::imdb_id(&m[1]));
        }

        let mut text = WHITESPACE.replace_all(raw.trim(), " ").into_owned();

        let mut year = None;
        if let Some(caps) = PAREN_YEAR_SUFFIX.captures(&text) {
            year = caps[1].parse::<u16>().ok();
            text = PAREN_YEAR_SUFFIX.replace(&text, "").into_owned();
        }

        for suffix in NOISE_SUFFIXES.iter() {
            text = suffix.replace(&text, "").into_owned();
        }

        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let query = Self::title(text);
        Some(match year {
            Some(y) => query.with_year(y),
            None => query,
        })
    }

    pub fn term(&self) -> &QueryTerm {
        &self.term
    }

    pub fn year(&self) -> Option<u16> {
        self.year
    }

}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.term {
            QueryTerm::Title(t) => f.write_str(t)?,
            QueryTerm::ImdbId(id) => f.write_str(id)?,
        }
        if let Some(y) = self.year {
            write!(f, " ({y})")?;
        }
        Ok(())
    }
}

/// Find the first plausible four-digit year (1900 - 2099) in `text`.
pub fn extract_year(text: &str) -> Option<u16> {
    YEAR_PATTERN
        .captures(text)
        .and_then(|c| c[1].parse::<u16>().ok())
}
