//! Message dispatch for the chat front end.
//!
//! [`BotHandlers`] turns one [`InboundMessage`] into one [`Reply`]. It owns
//! no transport; callers deliver messages and send the reply text back.

pub mod media;

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::enrich::{
    AuxResults, MediaKind, MediaPayload, MediaRecognizer, RecognitionError, TrailerFinder,
};
use crate::metadata::{LookupOutcome, MovieLookup, ProviderRegistry, Query};
use crate::reply;

const WELCOME_TEXT: &str = "🎬 *Welcome to the Movie Search Bot!*\n\n\
Send me a movie title, a poster photo or a short clip and I'll look it up.\n\n\
Use /help to see everything I can do.";

const TRAILERS_UNAVAILABLE: &str = "Trailer search is not available right now.";

const HELP_TEXT: &str = "*Available commands:*\n\
/start - Start the bot\n\
/help - Show this help message\n\
/search <movie> - Search for a movie\n\
/trailer <movie> - Find trailers for a movie\n\
/status - Check which services are configured\n\n\
You can also send a title as plain text (add the year like `Dune (2021)` to narrow it down), \
or upload a poster image or a video.";

/// An incoming chat message.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Command { name: String, args: Vec<String> },
    Text(String),
    Image { file_name: String, bytes: Vec<u8> },
    Video { file_name: String, bytes: Vec<u8> },
    Document { file_name: String, bytes: Vec<u8> },
}

impl InboundMessage {
    /// Split a typed line into a command or plain text.
    ///
    /// `/search@cinebot dune` becomes `Command { name: "search", args: ["dune"] }`.
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        match line.strip_prefix('/') {
            Some(rest) if !rest.is_empty() => {
                let mut words = rest.split_whitespace();
                let name = words
                    .next()
                    .unwrap_or_default()
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                InboundMessage::Command {
                    name,
                    args: words.map(String::from).collect(),
                }
            }
            _ => InboundMessage::Text(line.to_string()),
        }
    }
}

/// Text to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
}

impl Reply {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn error(description: &str) -> Self {
        Self::new(reply::render_error(description))
    }
}

pub struct BotHandlers {
    config: Config,
    registry: ProviderRegistry,
    lookup: Option<MovieLookup>,
    trailers: TrailerFinder,
    recognizer: MediaRecognizer,
}

impl BotHandlers {
    pub fn from_config(config: Config) -> Self {
        let timeout = Duration::from_secs(config.http.request_timeout_secs);
        let registry = ProviderRegistry::from_config(&config);
        let trailers = TrailerFinder::from_config(&config.youtube, timeout);
        let recognizer = MediaRecognizer::from_config(&config.vision, timeout);
        Self::new(config, registry, trailers, recognizer)
    }

    pub fn new(
        config: Config,
        registry: ProviderRegistry,
        trailers: TrailerFinder,
        recognizer: MediaRecognizer,
    ) -> Self {
        let lookup = MovieLookup::from_registry(&registry)
            .map(|l| l.with_max_retries(config.http.max_retries));
        if lookup.is_none() {
            warn!("Fewer than two movie providers registered; lookups are unavailable");
        }
        Self {
            config,
            registry,
            lookup,
            trailers,
            recognizer,
        }
    }

    /// Handle one message. Never fails; problems become reply text.
    pub async fn handle(&self, message: InboundMessage) -> Reply {
        match message {
            InboundMessage::Command { name, args } => self.command(&name, &args).await,
            InboundMessage::Text(text) => self.text(&text).await,
            InboundMessage::Image { file_name, bytes } => {
                self.upload(file_name, bytes, Some(MediaKind::Image)).await
            }
            InboundMessage::Video { file_name, bytes } => {
                self.upload(file_name, bytes, Some(MediaKind::Video)).await
            }
            InboundMessage::Document { file_name, bytes } => self.upload(file_name, bytes, None).await,
        }
    }

    async fn command(&self, name: &str, args: &[String]) -> Reply {
        info!(command = name, "Handling command");
        match name {
            "start" => self.start(),
            "help" => self.help(),
            "search" => self.search(&args.join(" ")).await,
            "trailer" => self.trailer(&args.join(" ")).await,
            "status" => self.status(),
            other => Reply::error(&format!("Unknown command /{other}")),
        }
    }

    pub fn start(&self) -> Reply {
        Reply::new(WELCOME_TEXT)
    }

    pub fn help(&self) -> Reply {
        Reply::new(HELP_TEXT)
    }

    pub async fn search(&self, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::new("Please specify a movie name after /search");
        }
        self.text(text).await
    }

    /// Look up a title and reply with its trailers only.
    pub async fn trailer(&self, text: &str) -> Reply {
        let Some(query) = Query::parse(text) else {
            return Reply::new("Please specify a movie name after /trailer");
        };
        if !self.trailers.is_configured() {
            return Reply::error(TRAILERS_UNAVAILABLE);
        }

        let outcome = self.lookup(&query).await;
        let Some(record) = outcome.record() else {
            return Reply::new(reply::render(&query, &outcome, &AuxResults::default()));
        };

        match self.trailers.find(&record.title, record.year).await {
            Ok(trailers) if trailers.is_empty() => Reply::new(format!(
                "🎬 No trailers found for '{}'",
                record.title
            )),
            Ok(trailers) => {
                let mut lines = vec![format!("🎬 *Trailers for '{}'*", record.title)];
                for (i, t) in trailers.iter().enumerate() {
                    lines.push(format!(
                        "{}. [{}]({})\n   📺 *Channel:* {}",
                        i + 1,
                        reply::truncate(&t.title, 60),
                        t.url,
                        t.channel
                    ));
                }
                Reply::new(lines.join("\n\n"))
            }
            Err(e) => {
                warn!(title = %record.title, error = %e, "Trailer search failed");
                Reply::error(TRAILERS_UNAVAILABLE)
            }
        }
    }

    pub fn status(&self) -> Reply {
        let mut lines = vec!["🤖 *Bot Status*".to_string(), String::new()];
        for (name, configured) in self.config.api_status() {
            let mark = if configured { "✅" } else { "❌" };
            lines.push(format!("{mark} {name}"));
        }
        if !self.registry.any_configured() {
            lines.push(String::new());
            lines.push("⚠️ No movie provider is configured; searches will fail.".to_string());
        }
        Reply::new(lines.join("\n"))
    }

    /// Free-text search.
    pub async fn text(&self, text: &str) -> Reply {
        let Some(query) = Query::parse(text) else {
            return Reply::error("Please send a movie title to search for.");
        };
        let outcome = self.lookup(&query).await;
        let aux = self.enrichment(&outcome).await;
        Reply::new(reply::render(&query, &outcome, &aux))
    }

    async fn upload(&self, file_name: String, bytes: Vec<u8>, expected: Option<MediaKind>) -> Reply {
        let kind = match media::validate(&file_name, bytes.len() as u64, expected, &self.config.media) {
            Ok(kind) => kind,
            Err(e) => return Reply::error(&e.to_string()),
        };

        let payload = MediaPayload {
            kind,
            file_name,
            bytes,
        };
        self.media(&payload).await
    }

    /// Recognize a validated upload and look up its best candidate.
    pub async fn media(&self, payload: &MediaPayload) -> Reply {
        let candidates = match self.recognizer.candidates(payload).await {
            Ok(c) => c,
            Err(RecognitionError::NotConfigured) => {
                return Reply::error("Image and video recognition is not configured.")
            }
            Err(e) => {
                warn!(file = %payload.file_name, error = %e, "Recognition failed");
                return Reply::error(&format!("Could not analyze the upload: {e}"));
            }
        };

        let Some(best) = candidates.first() else {
            return Reply::new(reply::render_candidates(&candidates));
        };
        let Some(query) = Query::parse(&best.title) else {
            return Reply::new(reply::render_candidates(&candidates));
        };

        let outcome = self.lookup(&query).await;
        match outcome {
            LookupOutcome::Found(_) => {
                let aux = self.enrichment(&outcome).await;
                Reply::new(format!(
                    "📸 Recognized *{}*\n\n{}",
                    best.title,
                    reply::render(&query, &outcome, &aux)
                ))
            }
            LookupOutcome::NotFound => Reply::new(reply::render_candidates(&candidates)),
            LookupOutcome::ProvidersUnavailable => {
                Reply::new(reply::render(&query, &outcome, &AuxResults::default()))
            }
        }
    }

    /// Core lookup for free text. Unparseable text is `NotFound` without
    /// contacting any provider.
    pub async fn on_text(&self, text: &str) -> LookupOutcome {
        match Query::parse(text) {
            Some(query) => self.lookup(&query).await,
            None => LookupOutcome::NotFound,
        }
    }

    /// Best candidate title for an upload, if one was recognized.
    pub async fn on_media(&self, payload: &MediaPayload) -> Option<String> {
        match self.recognizer.recognize(payload).await {
            Ok(title) => Some(title),
            Err(e) => {
                info!(file = %payload.file_name, error = %e, "No title recognized");
                None
            }
        }
    }

    async fn lookup(&self, query: &Query) -> LookupOutcome {
        match &self.lookup {
            Some(lookup) => lookup.lookup(query).await,
            None => LookupOutcome::ProvidersUnavailable,
        }
    }

    /// Trailers for a found movie. Failures only drop the enrichment.
    async fn enrichment(&self, outcome: &LookupOutcome) -> AuxResults {
        let Some(record) = outcome.record() else {
            return AuxResults::default();
        };
        if !self.trailers.is_configured() {
            return AuxResults::default();
        }
        match self.trailers.find(&record.title, record.year).await {
            Ok(trailers) => AuxResults::with_trailers(trailers),
            Err(e) => {
                warn!(title = %record.title, error = %e, "Trailer enrichment skipped");
                AuxResults::default()
            }
        }
    }
}
