//! `SeaORM` Entity for reusable prompt templates
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[sea_orm(unique)]
    #[serde(default)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    #[serde(default)]
    pub body: String,
    /// JSON-encoded argument schema
    #[sea_orm(column_type = "Text", default_value = "{}")]
    #[serde(default)]
    pub args: String,
    /// JSON-encoded free-form metadata
    #[sea_orm(column_type = "Text", default_value = "{}")]
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub created_at: DateTimeUtc,
    #[serde(default)]
    pub updated_at: DateTimeUtc,
    #[serde(default)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
