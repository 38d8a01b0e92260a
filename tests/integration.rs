use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use openclipart_repo::commons::CommonsClient;
use openclipart_repo::config::{self, SearchBackend};
use openclipart_repo::feed::{parse_feed, FeedError, FeedItem, FeedSource};
use openclipart_repo::form::FormSpec;
use openclipart_repo::http::{HttpError, HttpFetch};
use openclipart_repo::model::ReturnTypes;
use openclipart_repo::repository::{ClipartRepository, OpenClipart};
use openclipart_repo::settings::MemorySettingsStore;

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Open Clipart</title>
    <item>
      <title>Red Apple</title>
      <link>http://openclipart.org/detail/1/red-apple</link>
      <pubDate>Tue, 05 Mar 2024 14:07:00 +0000</pubDate>
      <dc:creator>anna</dc:creator>
      <media:thumbnail url="http://openclipart.org/image/90px/svg_to_png/1/red-apple.png"/>
    </item>
    <item>
      <title>No thumbnail</title>
      <link>http://openclipart.org/detail/2/nothing</link>
    </item>
    <item>
      <title>Pear</title>
      <link>http://openclipart.org/detail/3/pear</link>
      <media:thumbnail url="http://openclipart.org/thumbs/pear.png"/>
    </item>
  </channel>
</rss>"#;

#[derive(Clone, Default)]
struct RecordingFeed {
    responses: Arc<Mutex<VecDeque<Result<Vec<FeedItem>, FeedError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingFeed {
    fn with_responses(responses: Vec<Result<Vec<FeedItem>, FeedError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for RecordingFeed {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FeedError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Clone, Default)]
struct RecordingHttp {
    body: Option<String>,
    calls: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

#[async_trait]
impl HttpFetch for RecordingHttp {
    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, HttpError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));
        match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(HttpError::Status {
                status: 503,
                url: url.to_string(),
            }),
        }
    }
}

async fn repo_with(
    cfg: &config::Config,
    store: &MemorySettingsStore,
    feed: RecordingFeed,
    http: RecordingHttp,
) -> OpenClipart {
    let commons = CommonsClient::from_config(Arc::new(http), cfg);
    OpenClipart::connect(cfg, store, Arc::new(feed), commons)
        .await
        .unwrap()
}

#[tokio::test]
async fn recent_listing_maps_feed_items() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::with_values("openclipart", &[("imageheight", "480"), ("maxfiles", "50")]);
    let feed = RecordingFeed::with_responses(vec![Ok(parse_feed(FEED_XML).unwrap())]);
    let repo = repo_with(&cfg, &store, feed.clone(), RecordingHttp::default()).await;

    let listing = repo.list_recent().await;
    assert_eq!(feed.requests(), vec![config::FEED_URL.to_string()]);
    assert_eq!(listing.path[1].name, "Recent");
    assert!(listing.nologin);
    assert_eq!(listing.list.len(), 2);

    let apple = &listing.list[0];
    assert_eq!(apple.title, "red-apple.png");
    assert_eq!(apple.author.as_deref(), Some("anna"));
    assert_eq!(apple.date.as_deref(), Some("5 March 2024 | 2:07 pm"));
    assert_eq!(apple.source_url, "http://openclipart.org/image/480px/svg_to_png/1/red-apple.png");
    assert_eq!(apple.permalink_url, "http://openclipart.org/detail/1/red-apple");

    let pear = &listing.list[1];
    assert_eq!(pear.title, "pear.png");
    assert_eq!(pear.source_url, pear.thumbnail_url);
    assert_eq!(pear.author, None);
    assert_eq!(pear.date, None);
}

#[tokio::test]
async fn feed_search_appends_encoded_keyword() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::new();
    let feed = RecordingFeed::default();
    let repo = repo_with(&cfg, &store, feed.clone(), RecordingHttp::default()).await;

    let listing = repo.search("red apple", 3).await;
    assert_eq!(
        feed.requests(),
        vec![format!("{}red+apple", config::FEED_URL)]
    );
    assert_eq!(listing.path[1].name, "red+apple");
    assert!(listing.is_empty());
}

#[tokio::test]
async fn feed_failure_degrades_to_empty_listing() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::new();
    let feed = RecordingFeed::with_responses(vec![Err(FeedError::NotAFeed)]);
    let repo = repo_with(&cfg, &store, feed, RecordingHttp::default()).await;

    let listing = repo.list_recent().await;
    assert!(listing.is_empty());
    assert_eq!(listing.path.len(), 2);
}

#[tokio::test]
async fn construction_repairs_settings() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::with_values("openclipart", &[("imageheight", "9"), ("maxfiles", "501")]);
    let repo = repo_with(&cfg, &store, RecordingFeed::default(), RecordingHttp::default()).await;

    assert_eq!(repo.settings().image_height, 320);
    assert_eq!(repo.settings().max_files, 50);
    assert_eq!(store.get("openclipart", "imageheight").as_deref(), Some("320"));
    assert_eq!(store.get("openclipart", "maxfiles").as_deref(), Some("50"));
}

#[tokio::test]
async fn max_files_bounds_the_listing() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::with_values("openclipart", &[("imageheight", "320"), ("maxfiles", "10")]);
    let items: Vec<FeedItem> = (0..30)
        .map(|i| FeedItem {
            thumbnails: vec![format!("http://openclipart.org/image/90px/{}.png", i)],
            ..Default::default()
        })
        .collect();
    let feed = RecordingFeed::with_responses(vec![Ok(items)]);
    let repo = repo_with(&cfg, &store, feed, RecordingHttp::default()).await;

    let listing = repo.list_recent().await;
    assert_eq!(listing.list.len(), 10);
    assert_eq!(listing.list[9].title, "9.png");
}

#[tokio::test]
async fn commons_backend_serves_search() {
    let mut cfg = config::Config::default();
    cfg.app.search_backend = SearchBackend::Commons;
    let http = RecordingHttp {
        body: Some(
            r#"{"query":{"pages":{"12":{"pageid":12,"title":"File:Example.svg","index":1,
              "imageinfo":[{"url":"http://upload.openclipart.org/wikipedia/commons/1/12/Example.svg",
              "thumburl":"http://upload.openclipart.org/wikipedia/commons/thumb/1/12/Example.svg/1024px-Example.svg.png",
              "descriptionurl":"http://commons.openclipart.org/wiki/File:Example.svg",
              "width":400,"height":800,"mime":"image/svg+xml"}]}}}}"#
                .into(),
        ),
        ..Default::default()
    };
    let store = MemorySettingsStore::new();
    let feed = RecordingFeed::default();
    let repo = repo_with(&cfg, &store, feed.clone(), http.clone()).await;

    let listing = repo.search("example", 1).await;
    assert!(feed.requests().is_empty());
    assert_eq!(listing.list.len(), 1);
    assert_eq!(listing.list[0].title, "Example.svg.png");
    assert_eq!(
        listing.list[0].thumbnail_url,
        "http://upload.openclipart.org/wikipedia/commons/thumb/1/12/Example.svg/38px-Example.svg.png"
    );

    let calls = http.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, config::COMMONS_API_URL);
    assert!(calls[0].1.contains(&("gsroffset".to_string(), "24".to_string())));
    assert!(calls[0].1.contains(&("gsrsearch".to_string(), "example".to_string())));
}

#[tokio::test]
async fn commons_failure_degrades_to_empty_listing() {
    let mut cfg = config::Config::default();
    cfg.app.search_backend = SearchBackend::Commons;
    let store = MemorySettingsStore::new();
    let repo = repo_with(&cfg, &store, RecordingFeed::default(), RecordingHttp::default()).await;

    let listing = repo.search("anything", 0).await;
    assert!(listing.is_empty());
    assert!(repo.commons().search_images("anything", 0).await.is_err());
}

#[tokio::test]
async fn host_surface() {
    let cfg = config::Config::default();
    let store = MemorySettingsStore::new();
    let repo = repo_with(&cfg, &store, RecordingFeed::default(), RecordingHttp::default()).await;

    assert_eq!(repo.option_names(), &["imageheight", "maxfiles", "pluginname"]);
    let rt = repo.supported_return_types();
    assert!(rt.contains(ReturnTypes::INTERNAL));
    assert!(rt.contains(ReturnTypes::EXTERNAL));

    let mut form = FormSpec::default();
    repo.render_config_form(&mut form);
    let json = serde_json::to_value(&form).unwrap();
    assert_eq!(json["elements"][1]["name"], "imageheight");
    assert_eq!(json["elements"][1]["default"], "320");
    assert_eq!(json["elements"][3]["default"], "50");
}
