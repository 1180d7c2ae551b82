//! City entity - Properties are located in exactly one city.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// City database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    /// Unique identifier for the city
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Country this city belongs to
    pub country_id: i64,
    /// Display name (e.g., "Paris")
    pub name: String,
}

/// Defines relationships between City and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each city belongs to one country
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id"
    )]
    Country,
    /// One city has many properties
    #[sea_orm(has_many = "super::property::Entity")]
    Properties,
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
