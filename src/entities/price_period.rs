//! Price period entity - A nightly rate valid for an inclusive date window.
//!
//! Periods of one apartment may overlap or leave gaps; resolution rules live
//! in `core::pricing`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price period database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apartment_prices")]
pub struct Model {
    /// Unique identifier for the period
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Apartment this rate applies to
    pub apartment_id: i64,
    /// First night covered (inclusive)
    pub start_date: Date,
    /// Last night covered (inclusive)
    pub end_date: Date,
    /// Rate per night, always positive
    pub price_per_night: f64,
    /// When the owner defined this period; later periods win on overlap
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Whether the given night falls inside `[start_date, end_date]`.
    #[must_use]
    pub fn covers(&self, night: Date) -> bool {
        self.start_date <= night && night <= self.end_date
    }
}

/// Defines relationships between `PricePeriod` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each period belongs to one apartment
    #[sea_orm(
        belongs_to = "super::apartment::Entity",
        from = "Column::ApartmentId",
        to = "super::apartment::Column::Id"
    )]
    Apartment,
}

impl Related<super::apartment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apartment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
