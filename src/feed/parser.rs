//! Pull parser for the gallery's RSS 2.0 feed (with Media RSS and Dublin
//! Core extensions). Atom entries are accepted too.
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use super::FeedError;

/// One `<item>` as far as the listing needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub pub_date: String,
    /// Raw author entries in document order.
    pub authors: Vec<String>,
    /// `media:thumbnail` URLs in document order.
    pub thumbnails: Vec<String>,
}

impl FeedItem {
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnails.first().map(String::as_str).filter(|t| !t.is_empty())
    }

    /// Display name of the first author entry, if it carries one.
    pub fn author_name(&self) -> Option<String> {
        self.authors.first().and_then(|a| display_name(a))
    }

    pub fn permalink(&self) -> Option<&str> {
        [self.link.as_str(), self.guid.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

static EMAIL_WITH_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\s*\((?P<name>[^)]+)\)$").expect("valid regex"));
static BARE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+$").expect("valid regex"));

/// `jo@example.org (Jo)` -> `Jo`; a bare address has no display name.
fn display_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || BARE_EMAIL.is_match(raw) {
        return None;
    }
    match EMAIL_WITH_NAME.captures(raw) {
        Some(caps) => Some(caps["name"].trim().to_string()),
        None => Some(raw.to_string()),
    }
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a feed document into its items, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut saw_root = false;

    loop {
        let event = reader.read_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = qualified_name(e);
                let is_empty = matches!(event, Event::Empty(_));
                if stack.is_empty() {
                    saw_root = matches!(name.as_str(), "rss" | "feed" | "rdf:RDF");
                }
                match name.as_str() {
                    "item" | "entry" => current = Some(FeedItem::default()),
                    "media:thumbnail" => {
                        if let (Some(item), Some(url)) = (current.as_mut(), attribute(e, "url")) {
                            item.thumbnails.push(url);
                        }
                    }
                    // Atom links carry the target in an attribute
                    "link" => {
                        if let (Some(item), Some(href)) = (current.as_mut(), attribute(e, "href")) {
                            let rel = attribute(e, "rel").unwrap_or_default();
                            if item.link.is_empty() && (rel.is_empty() || rel == "alternate") {
                                item.link = href;
                            }
                        }
                    }
                    _ => {}
                }
                if is_empty {
                    if matches!(name.as_str(), "item" | "entry") {
                        items.extend(current.take());
                    }
                } else {
                    stack.push(name);
                }
            }
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    if matches!(name.as_str(), "item" | "entry") {
                        items.extend(current.take());
                    }
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape().map_err(quick_xml::Error::from)?;
                assign_text(current.as_mut(), &stack, text.trim());
            }
            Event::CData(ref c) => {
                let text = String::from_utf8_lossy(c);
                assign_text(current.as_mut(), &stack, text.trim());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedError::NotAFeed);
    }
    Ok(items)
}

fn assign_text(item: Option<&mut FeedItem>, stack: &[String], text: &str) {
    let Some(item) = item else { return };
    if text.is_empty() {
        return;
    }
    let tag = stack.last().map(String::as_str).unwrap_or_default();
    let parent = stack
        .len()
        .checked_sub(2)
        .and_then(|i| stack.get(i))
        .map(String::as_str)
        .unwrap_or_default();
    match tag {
        "title" if matches!(parent, "item" | "entry") => item.title.push_str(text),
        "link" if item.link.is_empty() => item.link = text.to_string(),
        "guid" | "id" if item.guid.is_empty() => item.guid = text.to_string(),
        "pubDate" | "dc:date" | "published" | "updated" if item.pub_date.is_empty() => {
            item.pub_date = text.to_string()
        }
        "author" | "dc:creator" => item.authors.push(text.to_string()),
        "name" if parent == "author" => item.authors.push(text.to_string()),
        _ => {}
    }
}
