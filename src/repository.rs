//! The capability surface the host platform drives.
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::commons::CommonsClient;
use crate::config::{Config, SearchBackend};
use crate::feed::{encode_keyword, FeedAdapter, FeedSource};
use crate::form::{self, FormBuilder};
use crate::model::{ListingResult, ReturnTypes};
use crate::settings::{
    ensure_settings, Settings, SettingsStore, KEY_IMAGE_HEIGHT, KEY_MAX_FILES, KEY_PLUGIN_NAME,
};

#[async_trait]
pub trait ClipartRepository: Send + Sync {
    /// Root listing: the most recent clipart.
    async fn list_recent(&self) -> ListingResult;

    async fn search(&self, keyword: &str, page: u32) -> ListingResult;

    fn option_names(&self) -> &'static [&'static str];

    fn render_config_form(&self, form: &mut dyn FormBuilder);

    fn supported_return_types(&self) -> ReturnTypes;
}

pub struct OpenClipart {
    settings: Settings,
    feed: FeedAdapter,
    commons: CommonsClient,
    search_backend: SearchBackend,
}

impl OpenClipart {
    /// Load (and repair) the stored settings, then wire up both adapters.
    pub async fn connect(
        cfg: &Config,
        store: &dyn SettingsStore,
        feed_source: Arc<dyn FeedSource>,
        commons: CommonsClient,
    ) -> Result<Self> {
        let settings = ensure_settings(store).await?;
        Ok(Self {
            settings,
            feed: FeedAdapter::new(feed_source, cfg.feed.url.clone(), settings),
            commons,
            search_backend: cfg.app.search_backend,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn commons(&self) -> &CommonsClient {
        &self.commons
    }
}

#[async_trait]
impl ClipartRepository for OpenClipart {
    async fn list_recent(&self) -> ListingResult {
        self.feed.list_recent().await
    }

    #[instrument(skip(self))]
    async fn search(&self, keyword: &str, page: u32) -> ListingResult {
        match self.search_backend {
            SearchBackend::Feed => self.feed.search(keyword).await,
            SearchBackend::Commons => {
                let vpath = encode_keyword(keyword);
                match self.commons.search_images(keyword, page).await {
                    Ok(list) => ListingResult::with_records(&vpath, list),
                    Err(err) => {
                        warn!(%err, "image search failed");
                        ListingResult::new(&vpath)
                    }
                }
            }
        }
    }

    fn option_names(&self) -> &'static [&'static str] {
        &[KEY_IMAGE_HEIGHT, KEY_MAX_FILES, KEY_PLUGIN_NAME]
    }

    fn render_config_form(&self, builder: &mut dyn FormBuilder) {
        form::render_config_form(builder, &self.settings);
    }

    fn supported_return_types(&self) -> ReturnTypes {
        ReturnTypes::INTERNAL | ReturnTypes::EXTERNAL
    }
}
