//! Broadcast events and the HTML scraping that turns them into chat lines.
//!
//! A broadcast arrives as JSON carrying ids plus the rendered feed row. The
//! row has a fixed layout: the photo link comes first, the author link
//! second, and the post body sits in the `.text` element.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{BroadcastError, Result};

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static TEXT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".text").expect("valid selector"));

/// Position of the author link among the row's anchors.
const NAME_ANCHOR_INDEX: usize = 1;

/// Wire shape of a `new-broadcast` event. Only `html` is required; the ids
/// are informational.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub person_id: Option<i64>,
    #[serde(default)]
    pub client_id: Option<i64>,
    pub html: String,
}

/// One feed post, parsed and ready to format. Lives for a single event.
#[derive(Debug)]
pub struct Broadcast {
    pub id: Option<i64>,
    pub person_id: Option<i64>,
    pub client_id: Option<i64>,
    pub document: Html,
}

impl Broadcast {
    pub fn from_payload(payload: BroadcastPayload) -> Self {
        Self {
            id: payload.id,
            person_id: payload.person_id,
            client_id: payload.client_id,
            document: Html::parse_document(&payload.html),
        }
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let payload: BroadcastPayload = serde_json::from_str(data)?;
        Ok(Self::from_payload(payload))
    }

    pub fn name(&self) -> std::result::Result<String, BroadcastError> {
        parse_name(&self.document)
    }

    pub fn content(&self) -> std::result::Result<String, BroadcastError> {
        parse_content(&self.document)
    }

    /// The chat line for this broadcast: `"<content> - <name>"`.
    pub fn message(&self) -> std::result::Result<String, BroadcastError> {
        Ok(compose_message(&self.content()?, &self.name()?))
    }
}

/// Text of the second anchor, untrimmed.
pub fn parse_name(document: &Html) -> std::result::Result<String, BroadcastError> {
    document
        .select(&ANCHORS)
        .nth(NAME_ANCHOR_INDEX)
        .map(|anchor| anchor.text().collect())
        .ok_or_else(|| BroadcastError::MissingName {
            anchors: document.select(&ANCHORS).count(),
        })
}

/// Text of the first `.text` element with surrounding whitespace removed.
pub fn parse_content(document: &Html) -> std::result::Result<String, BroadcastError> {
    document
        .select(&TEXT)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or(BroadcastError::MissingContent)
}

pub fn compose_message(content: &str, name: &str) -> String {
    format!("{content} - {name}")
}
