//! Booking business logic - Creates, edits and cancels guest reservations.
//!
//! Writes that claim dates run check-then-insert under the apartment's lock
//! and inside a store transaction, so two overlapping requests can never both
//! succeed. A partial unique index on active bookings backs this up; its
//! violations surface as `Error::Unavailable` like any other date conflict.
//!
//! Bookings are cancelled, never deleted. Rating changes are handed to the
//! background rating worker and do not delay the write.

use crate::{
    config::{BookingSettings, RatingPolicy},
    core::{
        availability, catalog,
        locks::ApartmentLocks,
        rating::RatingDispatcher,
        stay::StayRange,
    },
    entities::{Apartment, Booking, Property, apartment, booking},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Lowest accepted guest rating
pub const MIN_RATING: i32 = 1;
/// Highest accepted guest rating
pub const MAX_RATING: i32 = 10;

/// Guest request for a new booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Apartment to book
    pub apartment_id: i64,
    /// Check-in
    pub start_date: NaiveDate,
    /// Checkout (not a billed night)
    pub end_date: NaiveDate,
    /// Adults, at least one
    pub adult_guests: i32,
    /// Children
    pub children_guests: i32,
}

/// Partial edit of a booking. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingChanges {
    /// New check-in
    pub start_date: Option<NaiveDate>,
    /// New checkout
    pub end_date: Option<NaiveDate>,
    /// New adult count
    pub adult_guests: Option<i32>,
    /// New children count
    pub children_guests: Option<i32>,
    /// Guest rating, `1..=10`
    pub rating: Option<i32>,
    /// Free-text review
    pub review_comment: Option<String>,
}

impl BookingChanges {
    const fn touches_stay(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.adult_guests.is_some()
            || self.children_guests.is_some()
    }
}

fn validate_guests(adults: i32, children: i32) -> Result<()> {
    if adults < 1 {
        return Err(Error::Validation {
            message: format!("At least one adult is required, got {adults}"),
        });
    }
    if children < 0 {
        return Err(Error::Validation {
            message: format!("Children cannot be negative, got {children}"),
        });
    }
    Ok(())
}

fn validate_rating(rating: i32) -> Result<()> {
    if rating < MIN_RATING || rating > MAX_RATING {
        return Err(Error::InvalidRating { rating });
    }
    Ok(())
}

fn check_capacity(apartment: &apartment::Model, adults: i32, children: i32) -> Result<()> {
    if adults > apartment.adult_capacity || children > apartment.children_capacity {
        return Err(Error::CapacityExceeded {
            adults,
            children,
            adult_capacity: apartment.adult_capacity,
            children_capacity: apartment.children_capacity,
        });
    }
    Ok(())
}

/// Maps a store write failure, turning the active-booking index violation
/// into a date conflict.
fn conflict_or(err: DbErr, apartment_id: i64, stay: StayRange) -> Error {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        debug!("Active-booking index rejected apartment {}", apartment_id);
        Error::Unavailable {
            apartment_id,
            start_date: stay.start_date(),
            end_date: stay.end_date(),
        }
    } else {
        Error::Database(err)
    }
}

/// Books an apartment for a guest at the current price.
///
/// Input is validated before the store is touched. The booking's
/// `total_price` is the resolver total for its nights at creation time.
///
/// # Errors
/// - `Error::InvalidDateRange` / `Error::Validation` for malformed input
/// - `Error::NotFound` if the apartment is unknown or not publicly visible
/// - `Error::CapacityExceeded` if the party does not fit
/// - `Error::Unavailable` if the dates collide with an active booking
/// - `Error::PriceGap` if a night has no price
#[instrument(skip(db, locks, input), fields(apartment_id = input.apartment_id))]
pub async fn create_booking(
    db: &DatabaseConnection,
    locks: &ApartmentLocks,
    guest_id: i64,
    input: NewBooking,
) -> Result<booking::Model> {
    let stay = StayRange::new(input.start_date, input.end_date)?;
    validate_guests(input.adult_guests, input.children_guests)?;

    let apartment = catalog::get_apartment(db, input.apartment_id, false)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: input.apartment_id,
        })?;
    check_capacity(&apartment, input.adult_guests, input.children_guests)?;

    let _guard = locks.acquire(apartment.id).await;
    let txn = db.begin().await?;

    let quote = availability::ensure_available(&txn, apartment.id, stay, None).await?;

    let model = booking::ActiveModel {
        apartment_id: Set(apartment.id),
        user_id: Set(guest_id),
        start_date: Set(stay.start_date()),
        end_date: Set(stay.end_date()),
        adult_guests: Set(input.adult_guests),
        children_guests: Set(input.children_guests),
        total_price: Set(quote.total),
        rating: Set(None),
        review_comment: Set(None),
        created_at: Set(Utc::now()),
        cancelled_at: Set(None),
        ..Default::default()
    };
    let created = model
        .insert(&txn)
        .await
        .map_err(|e| conflict_or(e, apartment.id, stay))?;
    txn.commit().await?;

    info!(
        "Guest {} booked apartment {} from {} to {} for {}",
        guest_id, apartment.id, created.start_date, created.end_date, created.total_price
    );
    Ok(created)
}

/// Finds a booking owned by `guest_id`. Other guests' bookings are
/// reported as not found.
pub async fn get_guest_booking<C>(db: &C, guest_id: i64, booking_id: i64) -> Result<booking::Model>
where
    C: ConnectionTrait,
{
    Booking::find_by_id(booking_id)
        .filter(booking::Column::UserId.eq(guest_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "booking",
            id: booking_id,
        })
}

/// A guest's bookings ordered by check-in.
pub async fn list_guest_bookings(
    db: &DatabaseConnection,
    guest_id: i64,
    include_cancelled: bool,
) -> Result<Vec<booking::Model>> {
    let mut query = Booking::find().filter(booking::Column::UserId.eq(guest_id));
    if !include_cancelled {
        query = query.filter(booking::Column::CancelledAt.is_null());
    }
    query
        .order_by_asc(booking::Column::StartDate)
        .order_by_asc(booking::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Bookings of one apartment, for the owner of its property.
///
/// # Errors
/// `Error::NotFound` if the apartment is unknown or belongs to another owner.
pub async fn list_apartment_bookings(
    db: &DatabaseConnection,
    owner_id: i64,
    apartment_id: i64,
    include_cancelled: bool,
) -> Result<Vec<booking::Model>> {
    let not_found = Error::NotFound {
        entity: "apartment",
        id: apartment_id,
    };
    let Some((_, Some(parent))) = Apartment::find_by_id(apartment_id)
        .find_also_related(Property)
        .one(db)
        .await?
    else {
        return Err(not_found);
    };
    if parent.owner_id != owner_id {
        return Err(not_found);
    }

    let mut query = Booking::find().filter(booking::Column::ApartmentId.eq(apartment_id));
    if !include_cancelled {
        query = query.filter(booking::Column::CancelledAt.is_null());
    }
    query
        .order_by_asc(booking::Column::StartDate)
        .order_by_asc(booking::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Edits a guest's booking.
///
/// Date or party changes re-check availability (ignoring the booking's own
/// dates) and re-price the stay. A changed rating schedules a recompute of
/// the property's average.
///
/// # Errors
/// - `Error::InvalidRating` for a rating outside `1..=10`
/// - `Error::NotFound` if the booking is not the guest's
/// - `Error::BookingCancelled` for a cancelled booking
/// - `Error::RatingNotAllowed` when the policy forbids rating yet
/// - any error `create_booking` can return for the new dates and party
#[instrument(skip(db, locks, dispatcher, settings, changes))]
pub async fn update_booking(
    db: &DatabaseConnection,
    locks: &ApartmentLocks,
    dispatcher: &RatingDispatcher,
    settings: &BookingSettings,
    guest_id: i64,
    booking_id: i64,
    changes: BookingChanges,
) -> Result<booking::Model> {
    if let Some(rating) = changes.rating {
        validate_rating(rating)?;
    }

    let current = get_guest_booking(db, guest_id, booking_id).await?;
    if !current.is_active() {
        return Err(Error::BookingCancelled { booking_id });
    }
    if !changes.touches_stay() && changes.rating.is_none() && changes.review_comment.is_none() {
        return Ok(current);
    }

    let stay = StayRange::new(
        changes.start_date.unwrap_or(current.start_date),
        changes.end_date.unwrap_or(current.end_date),
    )?;
    let adults = changes.adult_guests.unwrap_or(current.adult_guests);
    let children = changes.children_guests.unwrap_or(current.children_guests);
    validate_guests(adults, children)?;

    if changes.rating.is_some() && settings.rating_policy == RatingPolicy::AfterCheckout {
        let today = Utc::now().date_naive();
        if today < stay.end_date() {
            return Err(Error::RatingNotAllowed {
                booking_id,
                end_date: stay.end_date(),
            });
        }
    }

    let apartment = catalog::get_apartment(db, current.apartment_id, true)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: current.apartment_id,
        })?;

    let _guard = if changes.touches_stay() {
        check_capacity(&apartment, adults, children)?;
        Some(locks.acquire(apartment.id).await)
    } else {
        None
    };
    let txn = db.begin().await?;

    let rating_changed = changes.rating.is_some_and(|r| current.rating != Some(r));
    let mut model: booking::ActiveModel = current.into();

    if changes.touches_stay() {
        let quote =
            availability::ensure_available(&txn, apartment.id, stay, Some(booking_id)).await?;
        model.start_date = Set(stay.start_date());
        model.end_date = Set(stay.end_date());
        model.adult_guests = Set(adults);
        model.children_guests = Set(children);
        model.total_price = Set(quote.total);
    }
    if let Some(rating) = changes.rating {
        model.rating = Set(Some(rating));
    }
    if let Some(comment) = changes.review_comment {
        model.review_comment = Set(Some(comment));
    }

    let updated = model
        .update(&txn)
        .await
        .map_err(|e| conflict_or(e, apartment.id, stay))?;
    txn.commit().await?;

    if rating_changed {
        dispatcher.submit(apartment.property_id);
    }
    debug!("Booking {} updated", booking_id);
    Ok(updated)
}

/// Cancels a guest's booking, freeing its dates.
///
/// Cancelling an already-cancelled booking changes nothing and returns it
/// as stored. Cancelling a rated booking schedules a rating recompute.
///
/// # Errors
/// `Error::NotFound` if the booking is not the guest's.
#[instrument(skip(db, dispatcher))]
pub async fn cancel_booking(
    db: &DatabaseConnection,
    dispatcher: &RatingDispatcher,
    guest_id: i64,
    booking_id: i64,
) -> Result<booking::Model> {
    let current = get_guest_booking(db, guest_id, booking_id).await?;
    if !current.is_active() {
        debug!("Booking {} already cancelled", booking_id);
        return Ok(current);
    }

    let was_rated = current.rating.is_some();
    let apartment_id = current.apartment_id;
    let mut model: booking::ActiveModel = current.into();
    model.cancelled_at = Set(Some(Utc::now()));
    let cancelled = model.update(db).await?;

    if was_rated {
        if let Some(apartment) = Apartment::find_by_id(apartment_id).one(db).await? {
            dispatcher.submit(apartment.property_id);
        }
    }
    info!("Guest {} cancelled booking {}", guest_id, booking_id);
    Ok(cancelled)
}
