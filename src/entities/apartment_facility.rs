//! Join table between apartments and facilities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Apartment-facility link
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apartment_facilities")]
pub struct Model {
    /// Tagged apartment
    #[sea_orm(primary_key, auto_increment = false)]
    pub apartment_id: i64,
    /// Facility tag
    #[sea_orm(primary_key, auto_increment = false)]
    pub facility_id: i64,
}

/// Both sides of the many-to-many link
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Link to the apartment
    #[sea_orm(
        belongs_to = "super::apartment::Entity",
        from = "Column::ApartmentId",
        to = "super::apartment::Column::Id"
    )]
    Apartment,
    /// Link to the facility
    #[sea_orm(
        belongs_to = "super::facility::Entity",
        from = "Column::FacilityId",
        to = "super::facility::Column::Id"
    )]
    Facility,
}

impl ActiveModelBehavior for ActiveModel {}
