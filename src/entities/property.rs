//! Property entity - A listed building owned by one owner.
//!
//! Properties group apartments, carry the location used by geo search and
//! cache the derived `bookings_avg_rating` aggregate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Property database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// Unique identifier for the property
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner account id (identity is managed outside the engine)
    pub owner_id: i64,
    /// Public name of the property
    pub name: String,
    /// City the property is located in
    pub city_id: i64,
    /// Street address shown to guests
    pub address: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub long: f64,
    /// Visibility flag - inactive properties are hidden from public reads
    pub is_active: bool,
    /// Mean rating over active rated bookings, recomputed asynchronously
    pub bookings_avg_rating: Option<f64>,
    /// When the property was listed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Property and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each property belongs to one city
    #[sea_orm(
        belongs_to = "super::city::Entity",
        from = "Column::CityId",
        to = "super::city::Column::Id"
    )]
    City,
    /// One property has many apartments
    #[sea_orm(has_many = "super::apartment::Entity")]
    Apartments,
}

impl Related<super::city::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::City.def()
    }
}

impl Related<super::apartment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apartments.def()
    }
}

impl Related<super::facility::Entity> for Entity {
    fn to() -> RelationDef {
        super::property_facility::Relation::Facility.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::property_facility::Relation::Property.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
