//! Facility entity - A named tag attached to properties and apartments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Facility database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facilities")]
pub struct Model {
    /// Unique identifier for the facility
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display category, if any
    pub category_id: Option<i64>,
    /// Display name (e.g., "Free Wi-Fi")
    pub name: String,
}

/// Defines relationships between Facility and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each facility optionally belongs to a category
    #[sea_orm(
        belongs_to = "super::facility_category::Entity",
        from = "Column::CategoryId",
        to = "super::facility_category::Column::Id"
    )]
    Category,
}

impl Related<super::facility_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
