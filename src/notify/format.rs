// src/notify/format.rs
//! Telegram HTML rendering for dispatched items and sample-mode previews.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;

use super::Notification;
use crate::ingest::truncate_chars;
use crate::ingest::types::{Item, SourceKind};

/// Alert areas can list dozens of counties.
pub const MAX_AREA_CHARS: usize = 140;

pub const DEFAULT_MARKER_THRESHOLD: i32 = 20;
pub const DEFAULT_MARKER: &str = "🔥 ";

#[derive(Debug, Clone, Deserialize)]
pub struct FormatRules {
    /// Items scoring at least this get `marker` in front of the label.
    #[serde(default = "default_marker_threshold")]
    pub marker_threshold: i32,
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker_threshold() -> i32 {
    DEFAULT_MARKER_THRESHOLD
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            marker_threshold: DEFAULT_MARKER_THRESHOLD,
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

fn link_of(item: &Item) -> String {
    encode_double_quoted_attribute(item.link.as_deref().unwrap_or_default()).into_owned()
}

fn area_of(item: &Item) -> String {
    encode_text(truncate_chars(&item.summary, MAX_AREA_CHARS)).into_owned()
}

/// Message for a dispatched item. Uses `item.score` for the marker.
pub fn format_item(item: &Item, rules: &FormatRules) -> Notification {
    let marker = if item.score >= rules.marker_threshold {
        rules.marker.as_str()
    } else {
        ""
    };
    let label = encode_text(&item.label);
    let title = encode_text(&item.title);
    let link = link_of(item);

    match item.kind {
        SourceKind::Feed => Notification {
            text: format!("{marker}{label}\n<b>{title}</b>\n<a href=\"{link}\">Read more</a>"),
            disable_preview: false,
        },
        SourceKind::Alert => Notification {
            text: format!(
                "{marker}{label}\n<b>{title}</b>\n📍 {}\n<a href=\"{link}\">Details</a>",
                area_of(item)
            ),
            disable_preview: true,
        },
    }
}

/// Sample-mode preview: no marker, raw timestamp shown.
pub fn format_sample(item: &Item) -> Notification {
    let label = encode_text(&item.label);
    let title = encode_text(&item.title);
    let published = encode_text(item.published_at.as_deref().unwrap_or("No date")).into_owned();
    let link = link_of(item);

    match item.kind {
        SourceKind::Feed => Notification {
            text: format!(
                "[DEBUG] {label}\n<b>{title}</b>\n📅 {published}\n<a href=\"{link}\">Read more</a>"
            ),
            disable_preview: false,
        },
        SourceKind::Alert => Notification {
            text: format!(
                "[DEBUG] {label}\n<b>{title}</b>\n📍 {}\n📅 {published}\n<a href=\"{link}\">Details</a>",
                area_of(item)
            ),
            disable_preview: true,
        },
    }
}
