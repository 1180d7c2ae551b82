//! Rating business logic - Maintains each property's average guest rating.
//!
//! `bookings_avg_rating` is a derived value: the mean of the ratings on the
//! property's active bookings. It is recomputed from scratch every time, so
//! running a recompute twice is harmless. Booking writes do not wait for it;
//! they hand the property id to a background worker through a
//! [`RatingDispatcher`].

use crate::{
    config::RatingSettings,
    entities::{Apartment, Booking, Property, apartment, booking, property},
    errors::{Error, Result},
};
use sea_orm::{QuerySelect, Set, prelude::*};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

/// Recomputes and stores the average rating of `property_id`.
///
/// Only active (non-cancelled) bookings with a rating count. With no such
/// booking the average is cleared to `None`.
///
/// # Errors
/// `Error::NotFound` for an unknown property, store errors otherwise.
#[instrument(skip(db))]
pub async fn recompute_property_rating(
    db: &DatabaseConnection,
    property_id: i64,
) -> Result<Option<f64>> {
    let found = Property::find_by_id(property_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "property",
            id: property_id,
        })?;

    let ratings: Vec<Option<i32>> = Booking::find()
        .select_only()
        .column(booking::Column::Rating)
        .inner_join(Apartment)
        .filter(apartment::Column::PropertyId.eq(property_id))
        .filter(booking::Column::CancelledAt.is_null())
        .filter(booking::Column::Rating.is_not_null())
        .into_tuple()
        .all(db)
        .await?;

    let ratings: Vec<f64> = ratings.into_iter().flatten().map(f64::from).collect();
    #[allow(clippy::cast_precision_loss)]
    let average = (!ratings.is_empty()).then(|| ratings.iter().sum::<f64>() / ratings.len() as f64);

    let mut model: property::ActiveModel = found.into();
    model.bookings_avg_rating = Set(average);
    model.update(db).await?;

    debug!(
        "Property {} rated {:?} over {} booking(s)",
        property_id,
        average,
        ratings.len()
    );
    Ok(average)
}

/// Fire-and-forget handle for scheduling rating recomputes.
///
/// Cloning is cheap. The worker stops once every dispatcher is dropped.
#[derive(Debug, Clone)]
pub struct RatingDispatcher {
    tx: mpsc::UnboundedSender<i64>,
}

impl RatingDispatcher {
    /// Schedules a recompute of `property_id`. Never blocks the caller.
    pub fn submit(&self, property_id: i64) {
        if self.tx.send(property_id).is_err() {
            warn!(
                "Rating worker is gone, recompute for property {} dropped",
                property_id
            );
        }
    }
}

/// Starts the background rating worker.
///
/// Each task is attempted up to `settings.max_attempts` times. Only store
/// failures are retried; an unknown property is logged and skipped.
#[must_use]
pub fn spawn_rating_worker(
    db: DatabaseConnection,
    settings: &RatingSettings,
) -> (RatingDispatcher, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<i64>();
    let max_attempts = settings.max_attempts.max(1);

    let handle = tokio::spawn(async move {
        info!("Rating worker started");
        while let Some(property_id) = rx.recv().await {
            run_with_retries(&db, property_id, max_attempts).await;
        }
        info!("Rating worker stopped");
    });

    (RatingDispatcher { tx }, handle)
}

async fn run_with_retries(db: &DatabaseConnection, property_id: i64, max_attempts: u32) {
    for attempt in 1..=max_attempts {
        match recompute_property_rating(db, property_id).await {
            Ok(_) => return,
            Err(e) if e.is_client_error() => {
                warn!("Skipping rating recompute for property {}: {}", property_id, e);
                return;
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    "Rating recompute for property {} failed (attempt {}/{}): {}",
                    property_id, attempt, max_attempts, e
                );
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
            }
            Err(e) => {
                error!(
                    "Giving up on rating recompute for property {} after {} attempts: {}",
                    property_id, max_attempts, e
                );
            }
        }
    }
}
