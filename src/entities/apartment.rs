//! Apartment entity - The bookable unit inside a property.
//!
//! Apartments own their price periods and bookings. Capacity columns are
//! validated as non-negative on write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Apartment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apartments")]
pub struct Model {
    /// Unique identifier for the apartment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Property this apartment belongs to
    pub property_id: i64,
    /// Display name (e.g., "Apartment 101")
    pub name: String,
    /// Maximum number of adult guests
    pub adult_capacity: i32,
    /// Maximum number of child guests
    pub children_capacity: i32,
    /// Floor area in square metres
    pub size: i32,
    /// Number of bathrooms
    pub bathrooms: i32,
    /// Visibility flag - inactive apartments are neither searchable nor bookable
    pub is_active: bool,
}

/// Defines relationships between Apartment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each apartment belongs to one property
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id"
    )]
    Property,
    /// One apartment has many price periods
    #[sea_orm(has_many = "super::price_period::Entity")]
    PricePeriods,
    /// One apartment has many bookings
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::price_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PricePeriods.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
