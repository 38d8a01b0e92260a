//! Configuration loader and validator for the Open Clipart repository adapter.
//!
//! Endpoint URLs and the fixed numeric contract of the upstream gallery live
//! here as named constants; the YAML file only overrides what a deployment
//! actually needs to change.
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

/// RSS feed base; a search appends the encoded keyword.
pub const FEED_URL: &str = "http://openclipart.org/media/feed/rss/";
/// MediaWiki-compatible API endpoint of the clipart commons.
pub const COMMONS_API_URL: &str = "http://commons.openclipart.org/w/api.php";
/// Upload host prefix stripped before building `thumb/` paths.
pub const COMMONS_UPLOAD_DIR: &str = "http://upload.openclipart.org/wikipedia/commons/";
/// Shown instead of a thumbnail for GIF uploads.
pub const GENERIC_ICON_URL: &str = "http://openclipart.org/pix/f/jpeg-32.png";

/// Settings namespace used with the settings store.
pub const SETTINGS_NAMESPACE: &str = "openclipart";

pub const DEFAULT_IMAGE_HEIGHT: i64 = 320;
/// Height of the thumbnails served by the feed; also the `/90px` marker.
pub const DEFAULT_THUMBNAIL_HEIGHT: i64 = 90;
pub const DEFAULT_MAX_FILES: i64 = 50;
pub const IMAGE_HEIGHT_RANGE: RangeInclusive<i64> = 10..=4068;
pub const MAX_FILES_RANGE: RangeInclusive<i64> = 10..=500;

pub const THUMBS_PER_PAGE: u32 = 24;
pub const FILE_NAMESPACE: u32 = 6;
pub const IMAGE_SIDE_LENGTH: u32 = 1024;
pub const THUMB_TARGET_WIDTH: u32 = 75;
/// Display box for search-API thumbnails.
pub const API_THUMBNAIL_SIZE: u32 = 120;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 120;
pub const USER_AGENT: &str = concat!("openclipart-repo/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub commons: Commons,
    #[serde(default)]
    pub http: Http,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// Where persisted plugin settings live.
    pub database_url: String,
    /// Which adapter answers keyword searches.
    #[serde(default)]
    pub search_backend: SearchBackend,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Feed,
    Commons,
}

/// RSS feed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feed {
    pub url: String,
}

/// MediaWiki search API endpoint and the host it serves uploads from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commons {
    pub api_url: String,
    pub upload_dir: String,
    pub generic_icon_url: String,
}

/// Outbound HTTP behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Http {
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub user_agent: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/openclipart.db".into(),
            search_backend: SearchBackend::Feed,
        }
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            url: FEED_URL.into(),
        }
    }
}

impl Default for Commons {
    fn default() -> Self {
        Self {
            api_url: COMMONS_API_URL.into(),
            upload_dir: COMMONS_UPLOAD_DIR.into(),
            generic_icon_url: GENERIC_ICON_URL.into(),
        }
    }
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            user_agent: USER_AGENT.into(),
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - A missing file at the default location yields the built-in defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            serde_yaml::from_str(&content)?
        }
        None => match fs::read_to_string("config.yaml") {
            Ok(content) => serde_yaml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(err) => return Err(err.into()),
        },
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.database_url.trim().is_empty() {
        return Err(ConfigError::Invalid("app.database_url must be non-empty"));
    }
    if url::Url::parse(&cfg.feed.url).is_err() {
        return Err(ConfigError::Invalid("feed.url must be an absolute URL"));
    }
    if url::Url::parse(&cfg.commons.api_url).is_err() {
        return Err(ConfigError::Invalid("commons.api_url must be an absolute URL"));
    }
    if !cfg.commons.upload_dir.ends_with('/') {
        return Err(ConfigError::Invalid("commons.upload_dir must end with '/'"));
    }
    if cfg.http.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("http.timeout_seconds must be > 0"));
    }
    if cfg.http.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("http.user_agent must be non-empty"));
    }
    // cache_ttl_seconds == 0 disables the response cache

    Ok(())
}

/// Returns the sample YAML written by `openclipart-repo init`.
pub fn example() -> &'static str {
    r#"app:
  database_url: "sqlite://./data/openclipart.db"
  # feed | commons
  search_backend: feed

feed:
  url: "http://openclipart.org/media/feed/rss/"

commons:
  api_url: "http://commons.openclipart.org/w/api.php"
  upload_dir: "http://upload.openclipart.org/wikipedia/commons/"
  generic_icon_url: "http://openclipart.org/pix/f/jpeg-32.png"

http:
  timeout_seconds: 30
  cache_ttl_seconds: 120
  user_agent: "openclipart-repo/0.1"
"#
}
