//! Prospects not yet converted to customers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interaction_logs::Entity")]
    InteractionLogs,
}

impl Related<super::interaction_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InteractionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
