//! Country entity - Top of the location hierarchy used by search filters.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Country database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    /// Unique identifier for the country
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "France")
    pub name: String,
}

/// Defines relationships between Country and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One country has many cities
    #[sea_orm(has_many = "super::city::Entity")]
    Cities,
}

impl Related<super::city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
