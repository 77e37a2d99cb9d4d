mod cli;

use cinebot::{
    bot::{BotHandlers, InboundMessage},
    config,
    metadata::LookupOutcome,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cinebot=debug".to_string()
        } else {
            "cinebot=info".to_string()
        }
    });

    // Replies go to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search { query, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(search(config, &query.join(" "), json))
        }
        Commands::Identify { file } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(identify(config, &file))
        }
        Commands::Status => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let bot = BotHandlers::from_config(config);
            println!("{}", bot.status().text);
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cinebot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Chat => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(chat(config))
        }
    }
}

async fn search(config: config::Config, query: &str, json: bool) -> Result<()> {
    let bot = BotHandlers::from_config(config);

    if !json {
        println!("{}", bot.search(query).await.text);
        return Ok(());
    }

    let value = match bot.on_text(query).await {
        LookupOutcome::Found(record) => serde_json::json!({
            "outcome": "found",
            "record": record,
        }),
        LookupOutcome::NotFound => serde_json::json!({ "outcome": "not_found" }),
        LookupOutcome::ProvidersUnavailable => {
            serde_json::json!({ "outcome": "providers_unavailable" })
        }
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn identify(config: config::Config, file: &Path) -> Result<()> {
    let message = read_upload(file).await?;
    let bot = BotHandlers::from_config(config);
    println!("{}", bot.handle(message).await.text);
    Ok(())
}

async fn read_upload(file: &Path) -> Result<InboundMessage> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(InboundMessage::Document { file_name, bytes })
}

/// Local stand-in for a chat transport. Each stdin line is one message;
/// `@path` uploads a file.
async fn chat(config: config::Config) -> Result<()> {
    let bot = BotHandlers::from_config(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!("Chat session started");
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = match line.strip_prefix('@') {
            Some(path) => match read_upload(Path::new(path.trim())).await {
                Ok(message) => message,
                Err(e) => {
                    println!("{}", cinebot::reply::render_error(&e.to_string()));
                    continue;
                }
            },
            None => InboundMessage::from_line(line),
        };

        println!("{}\n", bot.handle(message).await.text);
    }
    tracing::info!("Chat session ended");

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, checking default locations");
            let config = config::load_config_or_default(None)?;
            config::validate_config(&config)?;
            print_summary(&config);
        }
    }

    Ok(())
}

fn print_summary(config: &config::Config) {
    for (name, configured) in config.api_status() {
        let state = if configured { "configured" } else { "not configured" };
        println!("  {name}: {state}");
    }
    println!(
        "  HTTP: timeout {}s, {} retries",
        config.http.request_timeout_secs, config.http.max_retries
    );
    println!(
        "  Media: max {} bytes, images [{}], videos [{}]",
        config.media.max_file_size,
        config.media.image_formats.join(", "),
        config.media.video_formats.join(", ")
    );
}
