//! Availability business logic - Decides whether an apartment can be booked.
//!
//! An apartment is bookable for `[start, end)` when no active booking overlaps
//! the range (half-open, so back-to-back stays are fine) and every night of
//! the range has a price. Cancelled bookings never block dates.

use crate::{
    core::{
        pricing::{self, StayQuote},
        stay::StayRange,
    },
    entities::{Apartment, Booking, booking},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::prelude::*;
use tracing::{debug, instrument};

/// Whether any active booking in `bookings` overlaps `stay`.
///
/// `exclude_booking` lets a booking being edited ignore its own dates.
#[must_use]
pub fn has_conflict(
    bookings: &[booking::Model],
    stay: StayRange,
    exclude_booking: Option<i64>,
) -> bool {
    bookings.iter().any(|existing| {
        existing.is_active()
            && Some(existing.id) != exclude_booking
            && stay.overlaps(existing.start_date, existing.end_date)
    })
}

/// Active bookings of `apartment_id` that overlap `stay`.
pub async fn overlapping_bookings<C>(
    db: &C,
    apartment_id: i64,
    stay: StayRange,
    exclude_booking: Option<i64>,
) -> Result<Vec<booking::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Booking::find()
        .filter(booking::Column::ApartmentId.eq(apartment_id))
        .filter(booking::Column::CancelledAt.is_null())
        .filter(booking::Column::StartDate.lt(stay.end_date()))
        .filter(booking::Column::EndDate.gt(stay.start_date()));

    if let Some(booking_id) = exclude_booking {
        query = query.filter(booking::Column::Id.ne(booking_id));
    }

    query.all(db).await.map_err(Into::into)
}

/// Checks the range is free and fully priced, returning the price quote.
///
/// Runs on a connection or an open transaction so the booking lifecycle can
/// check and insert atomically.
///
/// # Errors
/// `Error::Unavailable` on a date conflict, `Error::PriceGap` when a night
/// has no price.
pub async fn ensure_available<C>(
    db: &C,
    apartment_id: i64,
    stay: StayRange,
    exclude_booking: Option<i64>,
) -> Result<StayQuote>
where
    C: ConnectionTrait,
{
    let conflicts = overlapping_bookings(db, apartment_id, stay, exclude_booking).await?;
    if !conflicts.is_empty() {
        debug!(
            "Apartment {} has {} conflicting booking(s) for {:?}",
            apartment_id,
            conflicts.len(),
            stay
        );
        return Err(Error::Unavailable {
            apartment_id,
            start_date: stay.start_date(),
            end_date: stay.end_date(),
        });
    }

    let periods = pricing::list_price_periods(db, apartment_id).await?;
    pricing::quote_stay(&periods, stay)
}

/// Whether `apartment_id` can be booked from `stay_start` to `stay_end`.
///
/// Inactive apartments are never available. A missing price counts as
/// "not offered" rather than an error.
///
/// # Errors
/// `Error::InvalidDateRange` for an empty range, `Error::NotFound` for an
/// unknown apartment, store errors otherwise.
#[instrument(skip(db))]
pub async fn is_available(
    db: &DatabaseConnection,
    apartment_id: i64,
    stay_start: NaiveDate,
    stay_end: NaiveDate,
) -> Result<bool> {
    let stay = StayRange::new(stay_start, stay_end)?;

    let apartment = Apartment::find_by_id(apartment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?;
    if !apartment.is_active {
        return Ok(false);
    }

    match ensure_available(db, apartment_id, stay, None).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_business_rejection() => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Utc;

    fn booking(id: i64, start: NaiveDate, end: NaiveDate, cancelled: bool) -> booking::Model {
        booking::Model {
            id,
            apartment_id: 1,
            user_id: 1,
            start_date: start,
            end_date: end,
            adult_guests: 2,
            children_guests: 0,
            total_price: 100.0,
            rating: None,
            review_comment: None,
            created_at: Utc::now(),
            cancelled_at: cancelled.then(Utc::now),
        }
    }

    #[test]
    fn test_has_conflict_cases() {
        let existing = vec![booking(1, date(2026, 3, 1), date(2026, 3, 5), false)];
        let stay = |s, e| StayRange::new(s, e).unwrap();

        // contained, containing, partial on either side
        assert!(has_conflict(&existing, stay(date(2026, 3, 2), date(2026, 3, 3)), None));
        assert!(has_conflict(&existing, stay(date(2026, 2, 20), date(2026, 3, 20)), None));
        assert!(has_conflict(&existing, stay(date(2026, 2, 27), date(2026, 3, 2)), None));
        assert!(has_conflict(&existing, stay(date(2026, 3, 4), date(2026, 3, 8)), None));

        // adjacent and disjoint
        assert!(!has_conflict(&existing, stay(date(2026, 3, 5), date(2026, 3, 8)), None));
        assert!(!has_conflict(&existing, stay(date(2026, 2, 25), date(2026, 3, 1)), None));
        assert!(!has_conflict(&existing, stay(date(2026, 4, 1), date(2026, 4, 3)), None));
    }

    #[test]
    fn test_has_conflict_ignores_cancelled_and_excluded() {
        let cancelled = vec![booking(1, date(2026, 3, 1), date(2026, 3, 5), true)];
        let stay = StayRange::new(date(2026, 3, 2), date(2026, 3, 4)).unwrap();
        assert!(!has_conflict(&cancelled, stay, None));

        let active = vec![booking(7, date(2026, 3, 1), date(2026, 3, 5), false)];
        assert!(has_conflict(&active, stay, None));
        assert!(!has_conflict(&active, stay, Some(7)));
    }

    #[tokio::test]
    async fn test_is_available_integration() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;
        add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 31), 100.0).await?;
        insert_test_booking(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 5)).await?;

        assert!(!is_available(&db, apartment.id, date(2026, 3, 3), date(2026, 3, 6)).await?);
        assert!(!is_available(&db, apartment.id, date(2026, 2, 28), date(2026, 3, 10)).await?);
        assert!(is_available(&db, apartment.id, date(2026, 3, 5), date(2026, 3, 8)).await?);

        // Free dates without a price are not offered
        assert!(!is_available(&db, apartment.id, date(2026, 3, 30), date(2026, 4, 2)).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_is_available_errors() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;

        let missing = is_available(&db, 999, date(2026, 3, 1), date(2026, 3, 2)).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let empty = is_available(&db, apartment.id, date(2026, 3, 2), date(2026, 3, 2)).await;
        assert!(matches!(empty, Err(Error::InvalidDateRange { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_available_typed_errors() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;
        add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 10), 50.0).await?;
        let existing =
            insert_test_booking(&db, apartment.id, date(2026, 3, 2), date(2026, 3, 4)).await?;

        let stay = StayRange::new(date(2026, 3, 3), date(2026, 3, 6)).unwrap();
        let conflict = ensure_available(&db, apartment.id, stay, None).await;
        assert!(matches!(conflict, Err(Error::Unavailable { .. })));

        // The booking itself does not block its own re-validation
        let quote = ensure_available(&db, apartment.id, stay, Some(existing.id)).await?;
        assert_eq!(quote.total, 150.0);

        let uncovered = StayRange::new(date(2026, 3, 9), date(2026, 3, 13)).unwrap();
        match ensure_available(&db, apartment.id, uncovered, None).await {
            Err(Error::PriceGap { nights }) => assert_eq!(nights.len(), 2),
            other => panic!("expected PriceGap, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_apartment_is_unavailable() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;
        add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 31), 100.0).await?;
        crate::core::catalog::set_apartment_active(&db, apartment.id, false).await?;

        assert!(!is_available(&db, apartment.id, date(2026, 3, 5), date(2026, 3, 8)).await?);
        Ok(())
    }
}
