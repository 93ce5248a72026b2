// src/ingest/providers/feed.rs
//! RSS 2.0 / RSS 1.0 (RDF) / Atom adapter. Streaming parse so entries that
//! completed before a malformed tail are still delivered.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::SourceFetchError;
use crate::ingest::normalize_text;
use crate::ingest::types::{resolve_id, FetchOutcome, Item, SourceKind, SourceProvider};

pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(20);

pub struct FeedProvider {
    label: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedProvider {
    pub fn new(label: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            client,
            timeout: DEFAULT_FEED_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_body(&self) -> Result<Vec<u8>, SourceFetchError> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| timeout_or_http(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| timeout_or_http(e, self.timeout))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SourceProvider for FeedProvider {
    async fn fetch_latest(&self) -> FetchOutcome {
        let t0 = Instant::now();
        let body = match self.fetch_body().await {
            Ok(b) => b,
            Err(e) => return FetchOutcome::failed(e),
        };
        let out = parse_feed(&body, &self.label);
        histogram!(crate::metrics::FETCH_MS).record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    fn name(&self) -> &str {
        &self.label
    }
}

pub(crate) fn timeout_or_http(e: reqwest::Error, timeout: Duration) -> SourceFetchError {
    if e.is_timeout() {
        SourceFetchError::Timeout(timeout)
    } else {
        SourceFetchError::Http(e)
    }
}

/// Parse a feed document into items, in document order.
pub fn parse_feed(xml: &[u8], label: &str) -> FetchOutcome {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut current: Option<EntryBuilder> = None;
    let mut field = String::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = qname(&e);
                if is_root(&name) {
                    saw_root = true;
                }
                if is_entry(&name) {
                    current = Some(EntryBuilder::default());
                } else if let Some(entry) = current.as_mut() {
                    if name == "link" {
                        entry.take_link_attrs(&e);
                    }
                    field = name;
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                let name = qname(&e);
                if is_root(&name) {
                    saw_root = true;
                }
                if name == "link" {
                    if let Some(entry) = current.as_mut() {
                        entry.take_link_attrs(&e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if current.is_some() && !field.is_empty() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        // HTML entities (&nbsp; ...) are not XML; keep raw, normalize_text decodes them.
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if current.is_some() && !field.is_empty() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if is_entry(&name) {
                    if let Some(entry) = current.take() {
                        items.push(entry.build(label));
                    }
                } else if let Some(entry) = current.as_mut() {
                    if name == field {
                        entry.take_text(&field, std::mem::take(&mut text));
                    }
                }
                field.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                let err = SourceFetchError::Parse(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                ));
                return FetchOutcome::partial(items, Some(err));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return FetchOutcome::failed(SourceFetchError::Schema(
            "not an RSS/Atom document".into(),
        ));
    }

    FetchOutcome::ok(items)
}

fn qname(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_root(name: &str) -> bool {
    matches!(name, "rss" | "feed" | "rdf:RDF" | "RDF")
}

fn is_entry(name: &str) -> bool {
    matches!(name, "item" | "entry")
}

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.trim().is_empty() {
        *slot = Some(value.trim().to_string());
    }
}

#[derive(Default)]
struct EntryBuilder {
    title: Option<String>,
    link: Option<String>,
    other_link: Option<String>,
    guid: Option<String>,
    atom_id: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<String>,
}

impl EntryBuilder {
    fn take_text(&mut self, field: &str, value: String) {
        match field {
            "title" => set_once(&mut self.title, value),
            "link" => set_once(&mut self.link, value),
            "guid" => set_once(&mut self.guid, value),
            "id" => set_once(&mut self.atom_id, value),
            "pubDate" | "published" | "issued" | "dc:date" => set_once(&mut self.published, value),
            "updated" | "modified" => set_once(&mut self.updated, value),
            "description" | "summary" | "content" | "content:encoded" => {
                set_once(&mut self.summary, value)
            }
            _ => {}
        }
    }

    /// Atom links: prefer `rel="alternate"` (or no rel) over enclosures/self links.
    fn take_link_attrs(&mut self, e: &BytesStart) {
        let Some(href) = attr(e, b"href") else {
            return;
        };
        match attr(e, b"rel").as_deref() {
            None | Some("alternate") => set_once(&mut self.link, href),
            Some(_) => set_once(&mut self.other_link, href),
        }
    }

    fn build(self, label: &str) -> Item {
        let link = self.link.or(self.other_link);
        let title = self
            .title
            .map(|t| normalize_text(&t))
            .filter(|t| !t.is_empty());
        let id = resolve_id(
            self.atom_id.as_deref(),
            self.guid.as_deref(),
            link.as_deref(),
            title.as_deref(),
        );

        Item {
            id,
            label: label.to_string(),
            kind: SourceKind::Feed,
            title: title.unwrap_or_else(|| SourceKind::Feed.placeholder_title().to_string()),
            link,
            published_at: self.published.or(self.updated),
            summary: self
                .summary
                .map(|s| normalize_text(&s))
                .unwrap_or_default(),
            score: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>First &amp; best</title><link>https://a.example/1</link>
<guid>g-1</guid><pubDate>Sat, 06 Sep 2025 09:00:00 GMT</pubDate>
<description><![CDATA[<p>Hello&nbsp;<b>world</b></p>]]></description></item>
<item><title></title><link>https://a.example/2</link></item>
</channel></rss>"#;

    #[test]
    fn rss_items_normalize() {
        let out = parse_feed(RSS.as_bytes(), "L");
        assert!(out.error.is_none());
        assert_eq!(out.items.len(), 2);

        let a = &out.items[0];
        assert_eq!(a.title, "First & best");
        assert_eq!(a.id.as_deref(), Some("g-1"));
        assert_eq!(a.link.as_deref(), Some("https://a.example/1"));
        assert_eq!(a.summary, "Hello world");
        assert_eq!(a.published_at.as_deref(), Some("Sat, 06 Sep 2025 09:00:00 GMT"));

        let b = &out.items[1];
        assert_eq!(b.title, "New item");
        assert_eq!(b.id.as_deref(), Some("https://a.example/2"));
        assert!(b.published_at.is_none());
    }

    #[test]
    fn truncated_document_keeps_completed_entries() {
        let xml = r#"<rss><channel>
<item><title>One</title><link>https://a.example/1</link></item>
<item><title>Two</title><link>https://a.example/2</lnk></item>"#;
        let out = parse_feed(xml.as_bytes(), "L");
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].title, "One");
        assert!(matches!(out.error, Some(SourceFetchError::Parse(_))));
    }

    #[test]
    fn html_page_is_not_a_feed() {
        let out = parse_feed(b"<html><body>nope</body></html>", "L");
        assert!(out.items.is_empty());
        assert!(matches!(out.error, Some(SourceFetchError::Schema(_))));
    }
}
