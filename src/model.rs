use serde::{Deserialize, Serialize};

/// One file offered to the host's file picker.
///
/// Serialized with the field names the host's listing renderer expects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    pub thumbnail_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_height: Option<u32>,
    #[serde(rename = "source")]
    pub source_url: String,
    #[serde(rename = "url")]
    pub permalink_url: String,
}

/// Breadcrumb element of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingResult {
    pub list: Vec<ListingRecord>,
    pub manage: bool,
    pub dynload: bool,
    pub nologin: bool,
    pub nosearch: bool,
    pub path: Vec<PathEntry>,
}

impl ListingResult {
    /// Empty listing under `root / <vpath>`.
    pub fn new(vpath: &str) -> Self {
        Self {
            list: Vec::new(),
            manage: false,
            dynload: false,
            nologin: true,
            nosearch: false,
            path: vec![
                PathEntry {
                    name: "root".into(),
                    path: String::new(),
                },
                PathEntry {
                    name: vpath.to_string(),
                    path: String::new(),
                },
            ],
        }
    }

    pub fn with_records(vpath: &str, list: Vec<ListingRecord>) -> Self {
        Self {
            list,
            ..Self::new(vpath)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// How the host may hand a picked file to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTypes(u8);

impl ReturnTypes {
    /// Copy the file into the host's own storage.
    pub const INTERNAL: ReturnTypes = ReturnTypes(1);
    /// Link to the file where it lives.
    pub const EXTERNAL: ReturnTypes = ReturnTypes(2);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: ReturnTypes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ReturnTypes {
    type Output = ReturnTypes;

    fn bitor(self, rhs: ReturnTypes) -> ReturnTypes {
        ReturnTypes(self.0 | rhs.0)
    }
}
