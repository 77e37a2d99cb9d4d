mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variables that override the file's API keys.
const KEY_OVERRIDES: [&str; 4] = [
    "TMDB_API_KEY",
    "OMDB_API_KEY",
    "YOUTUBE_API_KEY",
    "GOOGLE_VISION_API_KEY",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./cinebot.toml",
        "~/.config/cinebot/config.toml",
        "/etc/cinebot/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading config");
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Replace API keys with non-empty environment values.
pub fn apply_env_overrides(config: &mut Config) {
    let [tmdb, omdb, youtube, vision] = KEY_OVERRIDES.map(env_key);

    if tmdb.is_some() {
        config.tmdb.api_key = tmdb;
    }
    if omdb.is_some() {
        config.omdb.api_key = omdb;
    }
    if youtube.is_some() {
        config.youtube.api_key = youtube;
    }
    if vision.is_some() {
        config.vision.api_key = vision;
    }
}

fn env_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.http.request_timeout_secs == 0 {
        anyhow::bail!("http.request_timeout_secs must be greater than 0");
    }

    if config.http.max_retries > 3 {
        anyhow::bail!(
            "http.max_retries is {}, at most 3 is allowed",
            config.http.max_retries
        );
    }

    let urls = [
        ("tmdb.base_url", &config.tmdb.base_url),
        ("tmdb.image_base_url", &config.tmdb.image_base_url),
        ("omdb.base_url", &config.omdb.base_url),
        ("youtube.base_url", &config.youtube.base_url),
        ("vision.base_url", &config.vision.base_url),
    ];
    for (name, url) in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("{name} must be an http(s) URL, got '{url}'");
        }
    }

    if config.media.image_formats.is_empty() {
        anyhow::bail!("media.image_formats cannot be empty");
    }
    if config.media.video_formats.is_empty() {
        anyhow::bail!("media.video_formats cannot be empty");
    }

    if config.vision.max_frames == 0 {
        tracing::warn!("vision.max_frames is 0; video recognition will find nothing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for var in KEY_OVERRIDES {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.media.max_file_size, 20 * 1024 * 1024);
        assert_eq!(config.vision.max_frames, 5);
        assert_eq!(config.tmdb.language, "en-US");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tmdb]
            api_key = "abc"

            [http]
            max_retries = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.tmdb.api_key.as_deref(), Some("abc"));
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.media.image_formats.len(), 5);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = Config::default();
        config.http.request_timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.http.max_retries = 4;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.omdb.base_url = "ftp://omdb".into();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.media.video_formats.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn api_status_reflects_keys() {
        let mut config = Config::default();
        config.tmdb.api_key = Some("key".into());
        config.youtube.api_key = Some("   ".into());

        assert_eq!(
            config.api_status(),
            vec![
                ("TMDB", true),
                ("OMDB", false),
                ("YOUTUBE", false),
                ("GOOGLE_VISION", false),
            ]
        );
    }

    #[test]
    #[serial]
    fn env_overrides_file_keys() {
        clear_env();
        std::env::set_var("TMDB_API_KEY", "from-env");
        std::env::set_var("OMDB_API_KEY", "");

        let mut config = Config::default();
        config.tmdb.api_key = Some("from-file".into());
        config.omdb.api_key = Some("omdb-file".into());
        apply_env_overrides(&mut config);

        assert_eq!(config.tmdb.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.omdb.api_key.as_deref(), Some("omdb-file"));
        clear_env();
    }

    #[test]
    #[serial]
    fn load_config_reads_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[vision]\napi_key = \"vision-key\"\nmax_frames = 3\n\n[media]\nmax_file_size = 1024"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.vision.api_key.as_deref(), Some("vision-key"));
        assert_eq!(config.vision.max_frames, 3);
        assert_eq!(config.media.max_file_size, 1024);
    }

    #[test]
    #[serial]
    fn load_config_rejects_invalid_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nrequest_timeout_secs = 0").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_config(Path::new("/nonexistent/cinebot.toml"));
        assert!(result.is_err());
    }
}
