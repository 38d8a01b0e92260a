//! Outbound HTTP with a short-lived in-process response cache.
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// GET a URL with query parameters and return the body as text.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, HttpError>;
}

#[derive(Clone)]
struct CachedBody {
    fetched_at: Instant,
    body: String,
}

pub struct CachingHttpClient {
    http: Client,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedBody>>,
}

impl fmt::Debug for CachingHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingHttpClient")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CachingHttpClient {
    pub fn new(http: Client, ttl: Duration) -> Self {
        Self {
            http,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, HttpError> {
        Ok(Self::new(
            build_client(cfg)?,
            Duration::from_secs(cfg.http.cache_ttl_seconds),
        ))
    }

    /// Full request URL; also the cache key.
    pub fn request_url(url: &str, params: &[(&str, String)]) -> Result<Url, HttpError> {
        let mut parsed = Url::parse(url).map_err(|source| HttpError::Url {
            url: url.to_string(),
            source,
        })?;
        if !params.is_empty() {
            let mut pairs = parsed.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(parsed)
    }

    fn cached(&self, key: &str) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match cache.get(key) {
            Some(hit) if hit.fetched_at.elapsed() < self.ttl => Some(hit.body.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: String, body: &str) {
        if self.ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|_, hit| hit.fetched_at.elapsed() < self.ttl);
        cache.insert(
            key,
            CachedBody {
                fetched_at: Instant::now(),
                body: body.to_string(),
            },
        );
    }
}

#[async_trait]
impl HttpFetch for CachingHttpClient {
    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, HttpError> {
        let request_url = Self::request_url(url, params)?;
        let key = request_url.to_string();
        if let Some(body) = self.cached(&key) {
            debug!(url = %key, "serving cached response");
            return Ok(body);
        }

        info!(url = %key, "GET");
        let res = self.http.get(request_url).send().await?;
        let status = res.status();
        if !status.is_success() {
            warn!(url = %key, %status, "upstream error");
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: key,
            });
        }
        let body = res.text().await?;
        self.store(key, &body);
        Ok(body)
    }
}

/// reqwest client with the configured user agent and timeout.
pub fn build_client(cfg: &Config) -> Result<Client, HttpError> {
    Ok(Client::builder()
        .user_agent(cfg.http.user_agent.clone())
        .timeout(Duration::from_secs(cfg.http.timeout_seconds))
        .build()?)
}
