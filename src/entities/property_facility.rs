//! Join table between properties and facilities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Property-facility link
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_facilities")]
pub struct Model {
    /// Tagged property
    #[sea_orm(primary_key, auto_increment = false)]
    pub property_id: i64,
    /// Facility tag
    #[sea_orm(primary_key, auto_increment = false)]
    pub facility_id: i64,
}

/// Both sides of the many-to-many link
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the property
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id"
    )]
    Property,
    /// Link to the facility
    #[sea_orm(
        belongs_to = "super::facility::Entity",
        from = "Column::FacilityId",
        to = "super::facility::Column::Id"
    )]
    Facility,
}

impl ActiveModelBehavior for ActiveModel {}
