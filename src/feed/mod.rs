//! Listings built from the gallery's RSS feed.
use async_trait::async_trait;
use chrono::DateTime;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_THUMBNAIL_HEIGHT;
use crate::http::{HttpError, HttpFetch};
use crate::model::{ListingRecord, ListingResult};
use crate::settings::Settings;
use crate::strings::get_string;

pub mod parser;

pub use parser::{parse_feed, FeedItem};

/// `j F Y | g:i a`, e.g. `5 March 2024 | 2:07 pm`.
const DATE_FORMAT: &str = "%-d %B %Y | %-I:%M %P";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document is not an RSS or Atom feed")]
    NotAFeed,
}

/// Fetches and parses a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FeedError>;
}

/// [`FeedSource`] over any [`HttpFetch`].
#[derive(Clone)]
pub struct HttpFeedSource {
    http: Arc<dyn HttpFetch>,
}

impl HttpFeedSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FeedError> {
        let body = self.http.get(url, &[]).await?;
        parse_feed(&body)
    }
}

pub struct FeedAdapter {
    source: Arc<dyn FeedSource>,
    base_url: String,
    settings: Settings,
}

impl FeedAdapter {
    pub fn new(source: Arc<dyn FeedSource>, base_url: impl Into<String>, settings: Settings) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            settings,
        }
    }

    /// The most recent uploads.
    pub async fn list_recent(&self) -> ListingResult {
        self.file_list(&self.base_url, &get_string("recent", None))
            .await
    }

    /// Uploads matching `keyword`; the encoded keyword doubles as the breadcrumb.
    pub async fn search(&self, keyword: &str) -> ListingResult {
        let encoded = encode_keyword(keyword);
        let request = format!("{}{}", self.base_url, encoded);
        self.file_list(&request, &encoded).await
    }

    #[instrument(skip(self))]
    async fn file_list(&self, request: &str, vpath: &str) -> ListingResult {
        match self.source.fetch(request).await {
            Ok(items) => {
                let list = map_items(&items, &self.settings);
                info!(items = items.len(), records = list.len(), "feed listing");
                ListingResult::with_records(vpath, list)
            }
            Err(err) => {
                debug!(%err, "Feed Error");
                ListingResult::new(vpath)
            }
        }
    }
}

/// Form-urlencode a search term (spaces become `+`).
pub fn encode_keyword(keyword: &str) -> String {
    url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect()
}

/// Map the first `max_files` items; items without a thumbnail are dropped.
pub fn map_items(items: &[FeedItem], settings: &Settings) -> Vec<ListingRecord> {
    let limit = usize::try_from(settings.max_files).unwrap_or(0);
    items
        .iter()
        .take(limit)
        .filter_map(|item| map_item(item, settings.image_height))
        .collect()
}

fn map_item(item: &FeedItem, image_height: i64) -> Option<ListingRecord> {
    let Some(thumbnail) = item.thumbnail() else {
        debug!(title = %item.title, "feed item without thumbnail skipped");
        return None;
    };
    Some(ListingRecord {
        // The file name, not the item's title.
        title: file_name(thumbnail),
        author: item.author_name(),
        date: format_date(&item.pub_date),
        thumbnail_url: thumbnail.to_string(),
        thumbnail_width: DEFAULT_THUMBNAIL_HEIGHT as u32,
        thumbnail_height: None,
        source_url: rewrite_source(thumbnail, image_height),
        permalink_url: item.permalink().unwrap_or_default().to_string(),
    })
}

/// Swap the thumbnail size marker for the configured image height.
///
/// Literal substitution only: a URL without `/90px` is returned as is.
pub fn rewrite_source(thumbnail: &str, image_height: i64) -> String {
    thumbnail.replace(
        &format!("/{}px", DEFAULT_THUMBNAIL_HEIGHT),
        &format!("/{}px", image_height),
    )
}

/// Last path segment of a URL.
pub fn file_name(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Feed dates in RFC 2822 or RFC 3339, shown in their own offset.
pub fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(thumb: &str) -> FeedItem {
        FeedItem {
            title: "Semantic title".into(),
            link: "http://openclipart.org/detail/7".into(),
            pub_date: "Tue, 05 Mar 2024 14:07:00 +0000".into(),
            authors: vec!["anna".into()],
            thumbnails: vec![thumb.into()],
            ..Default::default()
        }
    }

    #[test]
    fn rewrite_replaces_size_marker() {
        assert_eq!(
            rewrite_source("http://openclipart.org/image/90px-foo.png", 480),
            "http://openclipart.org/image/480px-foo.png"
        );
        assert_eq!(
            rewrite_source("http://openclipart.org/image/90px/svg_to_png/1/foo.png", 480),
            "http://openclipart.org/image/480px/svg_to_png/1/foo.png"
        );
    }

    #[test]
    fn rewrite_without_marker_is_noop() {
        let url = "http://openclipart.org/image/120px/foo.png";
        assert_eq!(rewrite_source(url, 480), url);
        // only a slash-prefixed marker counts
        let url = "http://openclipart.org/image/foo-90px.png";
        assert_eq!(rewrite_source(url, 480), url);
    }

    #[test]
    fn file_name_ignores_query() {
        assert_eq!(file_name("http://o.org/a/b/90px-foo.png?x=1"), "90px-foo.png");
        assert_eq!(file_name("relative/path/bar.png"), "bar.png");
    }

    #[test]
    fn date_uses_long_month_and_twelve_hour_clock() {
        assert_eq!(
            format_date("Tue, 05 Mar 2024 14:07:00 +0000").as_deref(),
            Some("5 March 2024 | 2:07 pm")
        );
        assert_eq!(
            format_date("2024-12-25T09:30:00+01:00").as_deref(),
            Some("25 December 2024 | 9:30 am")
        );
        assert_eq!(format_date("yesterday"), None);
        assert_eq!(format_date(""), None);
    }

    #[test]
    fn record_title_is_the_thumbnail_file_name() {
        let settings = Settings {
            image_height: 480,
            max_files: 50,
        };
        let records = map_items(&[item("http://o.org/image/90px/svg_to_png/7/red-apple.png")], &settings);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.title, "red-apple.png");
        assert_eq!(rec.author.as_deref(), Some("anna"));
        assert_eq!(rec.date.as_deref(), Some("5 March 2024 | 2:07 pm"));
        assert_eq!(rec.thumbnail_width, 90);
        assert_eq!(rec.thumbnail_height, None);
        assert_eq!(rec.source_url, "http://o.org/image/480px/svg_to_png/7/red-apple.png");
        assert_eq!(rec.permalink_url, "http://openclipart.org/detail/7");
    }

    #[test]
    fn map_items_bounds_then_skips_thumbless() {
        let settings = Settings {
            image_height: 320,
            max_files: 10,
        };
        let mut items: Vec<FeedItem> = (0..15)
            .map(|i| item(&format!("http://o.org/90px-{}.png", i)))
            .collect();
        items[1].thumbnails.clear();

        let records = map_items(&items, &settings);
        assert_eq!(records.len(), 9);
        assert_eq!(records[0].title, "90px-0.png");
        assert_eq!(records[1].title, "90px-2.png");
        assert_eq!(records[8].title, "90px-9.png");
    }

    #[test]
    fn keyword_encoding_matches_form_encoding() {
        assert_eq!(encode_keyword("red apple"), "red+apple");
        assert_eq!(encode_keyword("a&b/c"), "a%26b%2Fc");
    }
}
