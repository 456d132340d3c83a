//! Chatbase conversation source.
//!
//! One GET per run against the provider's conversations endpoint. Transport
//! failures, non-2xx responses, and unrecognized payload shapes are soft
//! failures: they are logged and surface as an empty batch, so a provider
//! outage never aborts a scheduled tick. The next tick retries with an
//! overlapping window.

use std::time::Duration;

use async_trait::async_trait;
use chatsink_core::{Conversation, ConversationSource, FetchWindow, Message};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

const DEFAULT_BASE_URL: &str = "https://www.chatbase.co/api/v1";
const DEFAULT_PAGE_SIZE: u32 = 50;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unrecognized response shape: {0}")]
    Shape(String),
}

pub struct ChatbaseProvider {
    client: Client,
    api_key: String,
    bot_id: String,
    base_url: String,
    page_size: u32,
}

impl ChatbaseProvider {
    pub fn new(api_key: String, bot_id: String) -> anyhow::Result<Self> {
        info!("Creating ChatbaseProvider");
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            bot_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetch one page of conversations for the window.
    ///
    /// Only the first page is requested; a window producing more than the
    /// page size silently truncates.
    pub async fn try_fetch(&self, window: &FetchWindow) -> Result<Vec<Conversation>, FetchError> {
        let query = [
            ("bot_id", self.bot_id.clone()),
            ("start_date", window.start().to_rfc3339()),
            ("end_date", window.end().to_rfc3339()),
            ("page", "1".to_string()),
            ("size", self.page_size.to_string()),
        ];

        let response = self
            .client
            .get(format!("{}/get-conversations", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        parse_conversations(&body)
    }
}

#[async_trait]
impl ConversationSource for ChatbaseProvider {
    async fn fetch(&self, window: &FetchWindow) -> Vec<Conversation> {
        info!(
            "Fetching conversations from {} to {} for bot {}",
            window.start().to_rfc3339(),
            window.end().to_rfc3339(),
            self.bot_id
        );

        match self.try_fetch(window).await {
            Ok(conversations) => {
                info!("Retrieved {} conversations", conversations.len());
                conversations
            }
            Err(FetchError::Status { status, body }) => {
                error!("Chatbase request failed with status {status}: {body}");
                Vec::new()
            }
            Err(e) => {
                error!("Chatbase request failed: {e}");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConversation {
    id: String,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: serde_json::Value,
}

/// The provider has shipped both a bare array and envelopes over its
/// history; all are accepted, anything else is a shape error.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConversationsBody {
    Bare(Vec<RawConversation>),
    Envelope { conversations: Vec<RawConversation> },
    DataEnvelope { data: Vec<RawConversation> },
}

fn parse_conversations(body: &str) -> Result<Vec<Conversation>, FetchError> {
    let parsed: ConversationsBody =
        serde_json::from_str(body).map_err(|e| FetchError::Shape(e.to_string()))?;

    let raw = match parsed {
        ConversationsBody::Bare(list) => list,
        ConversationsBody::Envelope {
            conversations: list,
        }
        | ConversationsBody::DataEnvelope { data: list } => list,
    };

    Ok(raw.into_iter().map(normalize).collect())
}

fn normalize(raw: RawConversation) -> Conversation {
    Conversation {
        id: raw.id,
        email: raw.metadata.and_then(|metadata| metadata.email),
        messages: raw
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| Message {
                content: message.content.as_str().map(str::to_string),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_a_bare_array() {
        let body = r#"[
            {"id": "c1", "metadata": {"email": "a@x.com"},
             "messages": [{"content": "hi"}, {"content": "bye"}]}
        ]"#;

        let conversations = parse_conversations(body).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, "c1");
        assert_eq!(conversations[0].email.as_deref(), Some("a@x.com"));
        assert_eq!(conversations[0].messages.len(), 2);
        assert_eq!(conversations[0].messages[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn parses_a_conversations_envelope() {
        let body = r#"{"conversations": [{"id": "c2", "messages": [{"content": "hello"}]}]}"#;

        let conversations = parse_conversations(body).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, "c2");
        assert_eq!(conversations[0].email, None);
    }

    #[test]
    fn parses_a_data_envelope() {
        let body = r#"{"data": [{"id": "c3"}]}"#;

        let conversations = parse_conversations(body).unwrap();
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].messages.is_empty());
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        assert!(matches!(
            parse_conversations(r#"{"unexpected": true}"#),
            Err(FetchError::Shape(_))
        ));
        assert!(matches!(
            parse_conversations("not json at all"),
            Err(FetchError::Shape(_))
        ));
    }

    #[test]
    fn non_string_content_normalizes_to_none() {
        let body = r#"[
            {"id": "c4", "messages": [
                {"content": "hi"},
                {"content": 42},
                {"content": null},
                {}
            ]}
        ]"#;

        let conversations = parse_conversations(body).unwrap();
        let contents: Vec<Option<&str>> = conversations[0]
            .messages
            .iter()
            .map(|message| message.content.as_deref())
            .collect();
        assert_eq!(contents, vec![Some("hi"), None, None, None]);
    }

    #[test]
    fn absent_message_list_normalizes_to_empty() {
        let conversations = parse_conversations(r#"[{"id": "c5"}]"#).unwrap();
        assert!(conversations[0].messages.is_empty());
    }

    #[test]
    fn an_empty_array_is_a_valid_empty_batch() {
        assert!(parse_conversations("[]").unwrap().is_empty());
    }
}
