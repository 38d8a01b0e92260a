//! Image search against the clipart commons' MediaWiki API.
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{
    Config, API_THUMBNAIL_SIZE, COMMONS_UPLOAD_DIR, FILE_NAMESPACE, GENERIC_ICON_URL,
    IMAGE_SIDE_LENGTH, THUMBS_PER_PAGE, THUMB_TARGET_WIDTH,
};
use crate::http::{HttpError, HttpFetch};
use crate::model::ListingRecord;

pub mod model;

use model::{Page, QueryResponse};

const IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/svg+xml"];
/// Length of the `File:` namespace prefix on page titles.
const FILE_PREFIX_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("invalid API response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
}

/// Where thumbnails live on the upload host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRules {
    pub upload_dir: String,
    pub generic_icon_url: String,
}

impl Default for ThumbnailRules {
    fn default() -> Self {
        Self {
            upload_dir: COMMONS_UPLOAD_DIR.into(),
            generic_icon_url: GENERIC_ICON_URL.into(),
        }
    }
}

impl ThumbnailRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            upload_dir: cfg.commons.upload_dir.clone(),
            generic_icon_url: cfg.commons.generic_icon_url.clone(),
        }
    }

    /// Thumbnail URL of an upload at most `target` pixels wide.
    ///
    /// Small images are used as is. GIFs get the generic icon since the
    /// upload host does not render animated thumbnails; SVGs get a PNG.
    pub fn derive(&self, url: &str, orig_w: u32, orig_h: u32, target: u32) -> String {
        if orig_w <= target && orig_h <= target {
            return url.to_string();
        }
        if url.is_empty() {
            return String::new();
        }
        let short_path = url.replace(&self.upload_dir, "");
        let file_name = short_path.rsplit('/').next().unwrap_or_default();
        let extension = extension(file_name);
        if extension == Some("gif") {
            return self.generic_icon_url.clone();
        }
        let width = if orig_h > orig_w {
            (f64::from(target) * f64::from(orig_w) / f64::from(orig_h)).round() as u32
        } else {
            target
        };
        let mut thumb = format!(
            "{}thumb/{}/{}px-{}",
            self.upload_dir, short_path, width, file_name
        );
        if extension == Some("svg") {
            thumb.push_str(".png");
        }
        thumb
    }
}

/// [`ThumbnailRules::derive`] with the default upload host.
pub fn derive_thumbnail(url: &str, orig_w: u32, orig_h: u32, target: u32) -> String {
    ThumbnailRules::default().derive(url, orig_w, orig_h, target)
}

/// Text after the last dot of a file name.
fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

pub struct CommonsClient {
    http: Arc<dyn HttpFetch>,
    api_url: String,
    rules: ThumbnailRules,
}

impl CommonsClient {
    pub fn new(http: Arc<dyn HttpFetch>, api_url: impl Into<String>, rules: ThumbnailRules) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            rules,
        }
    }

    pub fn from_config(http: Arc<dyn HttpFetch>, cfg: &Config) -> Self {
        Self::new(http, cfg.commons.api_url.clone(), ThumbnailRules::from_config(cfg))
    }

    /// One page of file-namespace search hits for `keyword`.
    #[instrument(skip(self))]
    pub async fn search_images(&self, keyword: &str, page: u32) -> Result<Vec<ListingRecord>, ApiError> {
        let params = search_params(keyword, page);
        let body = self.http.get(&self.api_url, &params).await?;
        let resp: QueryResponse = serde_json::from_str(&body)?;
        if let Some(err) = resp.error {
            return Err(ApiError::Api {
                code: err.code,
                info: err.info,
            });
        }
        let records = map_pages(resp, &self.rules);
        info!(records = records.len(), "search results");
        Ok(records)
    }
}

/// Query parameters of a `generator=search` image lookup.
pub fn search_params(keyword: &str, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("format", "json".into()),
        ("redirects", "1".into()),
        ("action", "query".into()),
        ("generator", "search".into()),
        ("gsrsearch", keyword.into()),
        ("gsrnamespace", FILE_NAMESPACE.to_string()),
        ("gsrlimit", THUMBS_PER_PAGE.to_string()),
        ("gsroffset", (u64::from(page) * u64::from(THUMBS_PER_PAGE)).to_string()),
        ("prop", "imageinfo".into()),
        ("iiprop", "url|dimensions|mime".into()),
        ("iiurlwidth", IMAGE_SIDE_LENGTH.to_string()),
        ("iiurlheight", IMAGE_SIDE_LENGTH.to_string()),
    ]
}

/// Records in search rank order; pages that fail to decode or lack image
/// info are skipped.
pub fn map_pages(resp: QueryResponse, rules: &ThumbnailRules) -> Vec<ListingRecord> {
    let Some(query) = resp.query else {
        return Vec::new();
    };
    let mut pages: Vec<(String, Page)> = query
        .pages
        .into_iter()
        .filter_map(|(key, raw)| match serde_json::from_value::<Page>(raw) {
            Ok(page) => Some((key, page)),
            Err(err) => {
                warn!(page = %key, %err, "undecodable search hit skipped");
                None
            }
        })
        .collect();
    pages.sort_by_key(|(key, page)| {
        (
            page.index.unwrap_or(i64::MAX),
            page.pageid.or_else(|| key.parse().ok()).unwrap_or(i64::MAX),
        )
    });
    pages
        .into_iter()
        .filter_map(|(_, page)| map_page(page, rules))
        .collect()
}

fn map_page(page: Page, rules: &ThumbnailRules) -> Option<ListingRecord> {
    let Some(info) = page.imageinfo.into_iter().next() else {
        warn!(title = %page.title, "search hit without image info skipped");
        return None;
    };
    let Some(url) = info.url else {
        warn!(title = %page.title, "search hit without file url skipped");
        return None;
    };

    let mut title = page.title;
    let is_image = info
        .mime
        .as_deref()
        .map_or(false, |mime| IMAGE_TYPES.contains(&mime));
    let (thumbnail_url, source_url) = if is_image {
        let thumbnail = rules.derive(
            &url,
            info.width.unwrap_or(0),
            info.height.unwrap_or(0),
            THUMB_TARGET_WIDTH,
        );
        // the rasterized version is what gets uploaded
        if extension(&title) == Some("svg") {
            title.push_str(".png");
        }
        (thumbnail, info.thumburl.unwrap_or_else(|| url.clone()))
    } else {
        (String::new(), url)
    };

    Some(ListingRecord {
        title: title.chars().skip(FILE_PREFIX_LEN).collect(),
        author: None,
        date: None,
        thumbnail_url,
        thumbnail_width: API_THUMBNAIL_SIZE,
        thumbnail_height: Some(API_THUMBNAIL_SIZE),
        source_url,
        permalink_url: info.descriptionurl.unwrap_or_default(),
    })
}
