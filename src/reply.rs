//! Reply text for the chat front end (Telegram-flavored Markdown).

use crate::enrich::{AuxResults, Candidate};
use crate::metadata::query::extract_year;
use crate::metadata::{LookupOutcome, Query, UnifiedRecord};

const MAX_PLOT_CHARS: usize = 300;
const MAX_CAST: usize = 3;
const MAX_TRAILER_TITLE_CHARS: usize = 60;

pub const UNAVAILABLE_TEXT: &str =
    "⚠️ Movie search is temporarily unavailable. Please try again later.";

/// Render the reply for a finished lookup.
pub fn render(query: &Query, outcome: &LookupOutcome, aux: &AuxResults) -> String {
    match outcome {
        LookupOutcome::Found(record) => render_record(record, aux),
        LookupOutcome::NotFound => format!(
            "🔍 No movies found for \"{query}\". Try a different title or add the release year."
        ),
        LookupOutcome::ProvidersUnavailable => UNAVAILABLE_TEXT.to_string(),
    }
}

fn render_record(record: &UnifiedRecord, aux: &AuxResults) -> String {
    let mut parts = vec![format!("🎬 *{}*", record.title)];

    // TMDB dates are ISO, OMDb's read "15 Dec 1995".
    let year = record
        .year
        .or_else(|| record.release_date.as_deref().and_then(extract_year));
    if let Some(year) = year {
        parts.push(format!("📅 *Year:* {year}"));
    }
    if let Some(rating) = record.rating {
        parts.push(format!("⭐ *Rating:* {rating:.1}/10"));
    }
    if let Some(director) = &record.director {
        parts.push(format!("🎭 *Director:* {director}"));
    }
    if let Some(cast) = record.cast.as_ref().filter(|c| !c.is_empty()) {
        let shown: Vec<&str> = cast.iter().take(MAX_CAST).map(String::as_str).collect();
        parts.push(format!("👥 *Cast:* {}", shown.join(", ")));
    }
    if let Some(minutes) = record.runtime_minutes {
        parts.push(format!("⏱️ *Runtime:* {}", format_runtime(minutes)));
    }
    if let Some(genres) = record.genres.as_ref().filter(|g| !g.is_empty()) {
        parts.push(format!("🎞️ *Genres:* {}", genres.join(", ")));
    }
    if let Some(plot) = record.plot.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("📖 *Plot:* {}", truncate(plot, MAX_PLOT_CHARS)));
    }
    if let Some(poster) = record.poster_url.as_deref().filter(|p| !p.is_empty()) {
        parts.push(format!("🖼️ [Poster]({poster})"));
    }
    if let Some(imdb_id) = &record.imdb_id {
        parts.push(format!(
            "🔗 [View on IMDB](https://www.imdb.com/title/{imdb_id}/)"
        ));
    }

    if !aux.trailers.is_empty() {
        let mut lines = vec!["🎥 *Trailers:*".to_string()];
        for (i, trailer) in aux.trailers.iter().enumerate() {
            lines.push(format!(
                "{}. [{}]({})",
                i + 1,
                truncate(&trailer.title, MAX_TRAILER_TITLE_CHARS),
                trailer.url
            ));
        }
        parts.push(lines.join("\n"));
    }

    parts.join("\n\n")
}

/// Render recognition candidates as a numbered list.
pub fn render_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "🔍 *Analysis Complete*\n\nNo movie titles detected. \
                The text might not be clear enough."
            .to_string();
    }

    let mut lines = vec!["🔍 *Potential movie titles detected:*".to_string()];
    for (i, c) in candidates.iter().enumerate() {
        let emoji = if c.confidence > 0.8 {
            "🎯"
        } else if c.confidence > 0.5 {
            "🎲"
        } else {
            "❓"
        };
        let percent = (c.confidence * 100.0) as u32;
        lines.push(format!(
            "{}. {emoji} *{}* ({percent}% confidence)",
            i + 1,
            c.title
        ));
    }
    lines.push(String::new());
    lines.push("💡 Tip: Use /search with any of these titles to get movie details!".to_string());
    lines.join("\n")
}

/// Render a user-facing error.
pub fn render_error(description: &str) -> String {
    format!("❌ {description}\n\nPlease try again or use /help for assistance.")
}

/// `"45min"`, `"2h"` or `"2h 28min"`.
pub fn format_runtime(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}min");
    }
    match (minutes / 60, minutes % 60) {
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

/// Limit `text` to `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
