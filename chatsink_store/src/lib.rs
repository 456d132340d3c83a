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

//! Storage engine over the relational store.
//!
//! Implements the person-directory lookups and the interaction log on a
//! single database connection. Lookups are exact email matches as stored;
//! inserts are append-only.

use async_trait::async_trait;
use chatsink_core::{InteractionStore, NewInteraction, PersonDirectory};
use chatsink_entities::{customers, interaction_logs, leads};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct StorageEngine {
    db: DatabaseConnection,
}

impl StorageEngine {
    /// Connect to the store. A connection failure here is fatal for the
    /// run, not a per-item skip.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database for StorageEngine");
        let db = Database::connect(database_url).await?;
        info!("StorageEngine initialized");
        Ok(Self { db })
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl PersonDirectory for StorageEngine {
    async fn find_customer(&self, email: &str) -> anyhow::Result<Option<Uuid>> {
        let found = customers::Entity::find()
            .filter(customers::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(found.map(|model| model.id))
    }

    async fn find_lead(&self, email: &str) -> anyhow::Result<Option<Uuid>> {
        let found = leads::Entity::find()
            .filter(leads::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(found.map(|model| model.id))
    }
}

#[async_trait]
impl InteractionStore for StorageEngine {
    async fn interaction_exists(&self, conversation_id: &str) -> anyhow::Result<bool> {
        let found = interaction_logs::Entity::find()
            .filter(interaction_logs::Column::SourceConversationId.eq(conversation_id))
            .one(&self.db)
            .await?;

        Ok(found.is_some())
    }

    async fn insert_interaction(&self, interaction: &NewInteraction) -> anyhow::Result<()> {
        let model = interaction_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            customer_id: Set(interaction.customer_id()),
            lead_id: Set(interaction.lead_id()),
            interaction_type: Set(interaction.interaction_type.clone()),
            summary: Set(interaction.summary.clone()),
            created_at: Set(interaction.created_at),
            source_conversation_id: Set(interaction.source_conversation_id.clone()),
        };

        model.insert(&self.db).await?;

        info!(
            "Recorded interaction for conversation {}",
            interaction.source_conversation_id
        );
        Ok(())
    }
}
