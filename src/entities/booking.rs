//! Booking entity - A guest reservation of one apartment.
//!
//! Bookings are never hard-deleted: cancelling stamps `cancelled_at` and the
//! row stays for history. A booking is active iff `cancelled_at` is `None`.
//! Dates form the half-open stay `[start_date, end_date)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Apartment being booked
    pub apartment_id: i64,
    /// Guest account that owns the booking
    pub user_id: i64,
    /// Check-in date (first occupied night)
    pub start_date: Date,
    /// Check-out date (not occupied, not billed)
    pub end_date: Date,
    /// Number of adult guests
    pub adult_guests: i32,
    /// Number of child guests
    pub children_guests: i32,
    /// Stay total computed by the pricing resolver at booking time
    pub total_price: f64,
    /// Guest rating from 1 to 10
    pub rating: Option<i32>,
    /// Free-text review
    pub review_comment: Option<String>,
    /// When the booking was made
    pub created_at: DateTimeUtc,
    /// When the booking was cancelled, `None` while active
    pub cancelled_at: Option<DateTimeUtc>,
}

impl Model {
    /// Whether this booking still occupies its dates.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cancelled_at.is_none()
    }
}

/// Defines relationships between Booking and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each booking belongs to one apartment
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
