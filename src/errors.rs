//! Unified error type for the marketplace engine.
//!
//! Business rejections (`PriceGap`, `Unavailable`) are ordinary outcomes of a
//! well-formed request and are never retried. Validation-shaped errors are
//! raised before any store mutation.

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// No price period covers one or more requested nights
    #[error("No price defined for {} night(s): {}", .nights.len(), format_nights(.nights))]
    PriceGap {
        /// Every uncovered night, in ascending order
        nights: Vec<NaiveDate>,
    },

    /// The requested range collides with an active booking
    #[error("Apartment {apartment_id} is not available from {start_date} to {end_date}")]
    Unavailable {
        /// Apartment that was requested
        apartment_id: i64,
        /// Requested check-in
        start_date: NaiveDate,
        /// Requested check-out
        end_date: NaiveDate,
    },

    /// Guest counts exceed what the apartment accommodates
    #[error(
        "Apartment sleeps {adult_capacity} adults and {children_capacity} children, \
         requested {adults} adults and {children} children"
    )]
    CapacityExceeded {
        /// Requested adults
        adults: i32,
        /// Requested children
        children: i32,
        /// Apartment adult capacity
        adult_capacity: i32,
        /// Apartment children capacity
        children_capacity: i32,
    },

    /// End date is not after start date
    #[error("Invalid date range: {start_date} to {end_date}")]
    InvalidDateRange {
        /// Range start
        start_date: NaiveDate,
        /// Range end
        end_date: NaiveDate,
    },

    /// An entity id did not resolve (or is hidden from the caller)
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"apartment"`
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// Cancelled bookings are terminal
    #[error("Booking {booking_id} is cancelled")]
    BookingCancelled {
        /// The cancelled booking
        booking_id: i64,
    },

    /// Rating outside `1..=10`
    #[error("Rating must be between 1 and 10, got {rating}")]
    InvalidRating {
        /// Offending rating
        rating: i32,
    },

    /// Rating policy forbids rating before checkout
    #[error("Booking {booking_id} can only be rated after {end_date}")]
    RatingNotAllowed {
        /// Booking being rated
        booking_id: i64,
        /// Checkout date of the booking
        end_date: NaiveDate,
    },

    /// Money amounts must be finite and positive
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Offending amount
        amount: f64,
    },

    /// Malformed input that does not fit a more specific variant
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Store failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Integer conversion failure (page arithmetic, counts)
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// True for rule-based rejections that must not be retried automatically.
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        matches!(self, Self::PriceGap { .. } | Self::Unavailable { .. })
    }

    /// True for errors caused by the request itself rather than the system.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Config { .. } | Self::IntConversion(_)
        )
    }
}

fn format_nights(nights: &[NaiveDate]) -> String {
    nights
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_price_gap_message_lists_nights() {
        let err = Error::PriceGap {
            nights: vec![
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "No price defined for 2 night(s): 2026-03-02, 2026-03-03"
        );
    }

    #[test]
    fn test_business_rejections_are_not_system_failures() {
        let gap = Error::PriceGap { nights: vec![] };
        assert!(gap.is_business_rejection());
        assert!(gap.is_client_error());

        let db = Error::Database(DbErr::Custom("boom".to_string()));
        assert!(!db.is_business_rejection());
        assert!(!db.is_client_error());

        let not_found = Error::NotFound {
            entity: "apartment",
            id: 7,
        };
        assert!(!not_found.is_business_rejection());
        assert_eq!(not_found.to_string(), "apartment 7 not found");
    }
}
