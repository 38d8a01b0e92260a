use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// `action=query` response; `query` is absent when nothing matched.
#[derive(Deserialize, Debug, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<Query>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Query {
    /// Keyed by page id; left undecoded so one bad page cannot sink the rest.
    #[serde(default)]
    pub pages: HashMap<String, Value>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Page {
    #[serde(default)]
    pub pageid: Option<i64>,
    pub title: String,
    /// Search rank when produced by `generator=search`.
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub imageinfo: Vec<ImageInfo>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ImageInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub descriptionurl: Option<String>,
    #[serde(default)]
    pub thumburl: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub mime: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}
