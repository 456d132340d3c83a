//! The interaction recorder: identity resolution, dedup, and persistence
//! for one batch of fetched conversations.

use std::fmt;

use tracing::{error, info};

use crate::{
    Conversation, Identity, InteractionStore, NewInteraction, PersonDirectory, email, summary,
};

/// Recorder settings.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Tag identifying this pipeline as the source of a record.
    pub interaction_type: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            interaction_type: "chatbase_summary".to_string(),
        }
    }
}

/// Why a conversation was skipped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The message list was empty or absent.
    EmptyConversation,
    /// An interaction already exists for this conversation id.
    AlreadyRecorded,
    /// No email in metadata and none found in message text.
    NoEmail,
    /// The email matched neither customers nor leads.
    UnknownContact,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyConversation => write!(f, "no messages"),
            Self::AlreadyRecorded => write!(f, "already recorded"),
            Self::NoEmail => write!(f, "no email found"),
            Self::UnknownContact => write!(f, "unknown contact"),
        }
    }
}

/// Per-conversation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Recorded,
    Skipped(SkipReason),
    Failed(String),
}

/// Inspectable result of one run: every conversation considered, with its
/// outcome, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<(String, Outcome)>,
}

impl RunReport {
    fn push(&mut self, conversation_id: String, outcome: Outcome) {
        self.outcomes.push((conversation_id, outcome));
    }

    /// Total conversations considered, successful or not.
    #[must_use]
    pub fn considered(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn recorded(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Recorded))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped(_)))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    /// The outcome for a conversation id, if it was part of this run.
    #[must_use]
    pub fn outcome(&self, conversation_id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == conversation_id)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// Records fetched conversations as interaction-log rows.
///
/// Conversations are processed strictly one at a time. Each one is fenced:
/// an unexpected failure becomes [`Outcome::Failed`] for that item and the
/// batch continues.
pub struct Recorder<D, S> {
    directory: D,
    store: S,
    config: RecorderConfig,
}

impl<D, S> Recorder<D, S>
where
    D: PersonDirectory,
    S: InteractionStore,
{
    pub const fn new(directory: D, store: S, config: RecorderConfig) -> Self {
        Self {
            directory,
            store,
            config,
        }
    }

    /// Process a batch and report every outcome.
    pub async fn record(&self, conversations: Vec<Conversation>) -> RunReport {
        let mut report = RunReport::default();

        for conversation in conversations {
            let outcome = match self.process_one(&conversation).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Conversation {} failed: {e:#}", conversation.id);
                    Outcome::Failed(e.to_string())
                }
            };

            match &outcome {
                Outcome::Recorded => {
                    info!("Recorded interaction for conversation {}", conversation.id);
                }
                Outcome::Skipped(reason) => {
                    info!("Skipping conversation {}: {reason}", conversation.id);
                }
                Outcome::Failed(_) => {}
            }

            report.push(conversation.id, outcome);
        }

        info!("Processed {} conversations", report.considered());
        report
    }

    async fn process_one(&self, conversation: &Conversation) -> anyhow::Result<Outcome> {
        if conversation.messages.is_empty() {
            return Ok(Outcome::Skipped(SkipReason::EmptyConversation));
        }

        // Existence check and insert are separate round-trips; overlapping
        // runs can both pass the check for the same id. Accepted for the
        // hourly cadence.
        if self.store.interaction_exists(&conversation.id).await? {
            return Ok(Outcome::Skipped(SkipReason::AlreadyRecorded));
        }

        let Some(email) = email::resolve_email(conversation) else {
            return Ok(Outcome::Skipped(SkipReason::NoEmail));
        };

        let identity = if let Some(id) = self.directory.find_customer(&email).await? {
            Identity::Customer(id)
        } else if let Some(id) = self.directory.find_lead(&email).await? {
            Identity::Lead(id)
        } else {
            return Ok(Outcome::Skipped(SkipReason::UnknownContact));
        };

        let interaction = NewInteraction::new(
            identity,
            self.config.interaction_type.clone(),
            summary::summarize(&conversation.messages),
            conversation.id.clone(),
        );

        if let Err(e) = self.store.insert_interaction(&interaction).await {
            error!("Failed to record interaction for {email}: {e:#}");
            return Ok(Outcome::Failed(e.to_string()));
        }

        Ok(Outcome::Recorded)
    }
}
