#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod email;
pub mod recorder;
pub mod summary;

pub use recorder::{Outcome, Recorder, RecorderConfig, RunReport, SkipReason};

/// One recorded chat session from the external provider.
///
/// The provider-assigned `id` is opaque and serves as the dedup key;
/// `email` carries the explicit metadata email when the provider captured
/// one. Conversations are fetched transiently once per run and never
/// mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub email: Option<String>,
    pub messages: Vec<Message>,
}

/// A single message within a conversation.
///
/// Providers sometimes ship non-string or absent content; that normalizes
/// to `None` and must be tolerated everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub content: Option<String>,
}

/// Half-open instant window `[start, end)` for a provider query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FetchWindow {
    /// Build a window from explicit bounds. The end must not precede the
    /// start.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> anyhow::Result<Self> {
        if end < start {
            anyhow::bail!("window end {end} precedes window start {start}");
        }
        Ok(Self { start, end })
    }

    /// The trailing window ending now, matching the periodic polling
    /// cadence.
    #[must_use]
    pub fn trailing_hours(hours: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::hours(hours),
            end,
        }
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A resolved person: a known customer or a prospect, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Customer(Uuid),
    Lead(Uuid),
}

/// One interaction-history record ready for insertion.
///
/// Holding the attribution as an [`Identity`] keeps `customer_id` and
/// `lead_id` mutually exclusive by construction.
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub identity: Identity,
    pub interaction_type: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub source_conversation_id: String,
}

impl NewInteraction {
    #[must_use]
    pub fn new(
        identity: Identity,
        interaction_type: String,
        summary: String,
        source_conversation_id: String,
    ) -> Self {
        Self {
            identity,
            interaction_type,
            summary,
            created_at: Utc::now(),
            source_conversation_id,
        }
    }

    #[must_use]
    pub const fn customer_id(&self) -> Option<Uuid> {
        match self.identity {
            Identity::Customer(id) => Some(id),
            Identity::Lead(_) => None,
        }
    }

    #[must_use]
    pub const fn lead_id(&self) -> Option<Uuid> {
        match self.identity {
            Identity::Lead(id) => Some(id),
            Identity::Customer(_) => None,
        }
    }
}

/// Source of conversations for one run.
///
/// Fetching fails soft: transport and shape problems are logged by the
/// implementation and surface as an empty list, so a provider outage never
/// aborts a scheduled tick.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    async fn fetch(&self, window: &FetchWindow) -> Vec<Conversation>;
}

/// Lookup of known people by exact (case-sensitive, as stored) email.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn find_customer(&self, email: &str) -> anyhow::Result<Option<Uuid>>;
    async fn find_lead(&self, email: &str) -> anyhow::Result<Option<Uuid>>;
}

/// The append-only interaction log.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Whether an interaction already exists for this conversation id.
    async fn interaction_exists(&self, conversation_id: &str) -> anyhow::Result<bool>;
    async fn insert_interaction(&self, interaction: &NewInteraction) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rejects_end_before_start() {
        let end = Utc::now();
        let start = end + Duration::hours(1);
        assert!(FetchWindow::new(start, end).is_err());
    }

    #[test]
    fn window_accepts_equal_bounds() {
        let instant = Utc::now();
        assert!(FetchWindow::new(instant, instant).is_ok());
    }

    #[test]
    fn trailing_window_spans_requested_hours() {
        let window = FetchWindow::trailing_hours(3);
        assert_eq!(window.end() - window.start(), Duration::hours(3));
    }

    #[test]
    fn identity_projection_is_exclusive() {
        let customer = NewInteraction::new(
            Identity::Customer(Uuid::now_v7()),
            "chatbase_summary".to_string(),
            "hi".to_string(),
            "c1".to_string(),
        );
        assert!(customer.customer_id().is_some());
        assert!(customer.lead_id().is_none());

        let lead = NewInteraction::new(
            Identity::Lead(Uuid::now_v7()),
            "chatbase_summary".to_string(),
            "hi".to_string(),
            "c2".to_string(),
        );
        assert!(lead.customer_id().is_none());
        assert!(lead.lead_id().is_some());
    }
}
