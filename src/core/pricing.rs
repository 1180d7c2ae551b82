//! Pricing business logic - Resolves stay totals from nightly price periods.
//!
//! The resolver walks each billed night of a half-open stay, picks the period
//! covering that night and sums the rates. When periods overlap, the most
//! recently created one wins (greatest `created_at`, then greatest `id`).
//! Resolution is a pure function over already-loaded periods, so results can
//! be cached per apartment, stay and period set.
//!
//! The owner-side management of periods (create, update, delete, list) lives
//! here too.

use crate::{
    core::stay::StayRange,
    entities::{Apartment, PricePeriod, price_period},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Price applied to one night of a stay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightlyRate {
    /// The billed night
    pub night: NaiveDate,
    /// Period that priced it
    pub period_id: i64,
    /// Rate charged for the night
    pub price: f64,
}

/// Fully resolved stay price with its per-night breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayQuote {
    /// One entry per billed night, in order
    pub nights: Vec<NightlyRate>,
    /// Sum of all nightly rates
    pub total: f64,
}

/// Picks the period that prices `night`, if any.
fn winning_period(
    periods: &[price_period::Model],
    night: NaiveDate,
) -> Option<&price_period::Model> {
    periods
        .iter()
        .filter(|period| period.covers(night))
        .max_by_key(|period| (period.created_at, period.id))
}

/// Resolves every night of `stay` against `periods`.
///
/// # Errors
/// Returns `Error::PriceGap` listing every night no period covers.
pub fn quote_stay(periods: &[price_period::Model], stay: StayRange) -> Result<StayQuote> {
    let mut nights = Vec::new();
    let mut gaps = Vec::new();

    for night in stay.nights() {
        match winning_period(periods, night) {
            Some(period) => nights.push(NightlyRate {
                night,
                period_id: period.id,
                price: period.price_per_night,
            }),
            None => gaps.push(night),
        }
    }

    if !gaps.is_empty() {
        return Err(Error::PriceGap { nights: gaps });
    }

    let total = nights.iter().map(|rate| rate.price).sum();
    Ok(StayQuote { nights, total })
}

/// Total cost of staying from `stay_start` to `stay_end` (checkout not billed).
///
/// # Errors
/// Returns `Error::InvalidDateRange` when `stay_end <= stay_start` and
/// `Error::PriceGap` when any night is uncovered.
pub fn resolve_price(
    periods: &[price_period::Model],
    stay_start: NaiveDate,
    stay_end: NaiveDate,
) -> Result<f64> {
    let stay = StayRange::new(stay_start, stay_end)?;
    quote_stay(periods, stay).map(|quote| quote.total)
}

/// Periods that price at least one night of `stay`.
pub fn periods_within(
    periods: &[price_period::Model],
    stay: StayRange,
) -> impl Iterator<Item = &price_period::Model> {
    // Inclusive end_date: a period ending on check-in night still prices it
    periods.iter().filter(move |period| {
        period.start_date < stay.end_date() && period.end_date >= stay.start_date()
    })
}

/// Whole-currency price used in listings; fractional cents are truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn truncate_price(price: f64) -> i64 {
    price.trunc() as i64
}

/// Owner input for a nightly price window.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPricePeriod {
    /// First night covered, inclusive
    pub start_date: NaiveDate,
    /// Last night covered, inclusive
    pub end_date: NaiveDate,
    /// Rate per night
    pub price_per_night: f64,
}

impl NewPricePeriod {
    fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(Error::InvalidDateRange {
                start_date: self.start_date,
                end_date: self.end_date,
            });
        }
        if !self.price_per_night.is_finite() || self.price_per_night <= 0.0 {
            return Err(Error::InvalidAmount {
                amount: self.price_per_night,
            });
        }
        Ok(())
    }
}

/// Loads all periods of an apartment ordered by start date.
pub async fn list_price_periods<C>(db: &C, apartment_id: i64) -> Result<Vec<price_period::Model>>
where
    C: ConnectionTrait,
{
    PricePeriod::find()
        .filter(price_period::Column::ApartmentId.eq(apartment_id))
        .order_by_asc(price_period::Column::StartDate)
        .order_by_asc(price_period::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one period, scoped to its apartment.
pub async fn get_price_period(
    db: &DatabaseConnection,
    apartment_id: i64,
    period_id: i64,
) -> Result<Option<price_period::Model>> {
    PricePeriod::find_by_id(period_id)
        .filter(price_period::Column::ApartmentId.eq(apartment_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds a price window to an apartment.
///
/// Inactive apartments can still be priced; visibility is a separate concern.
///
/// # Errors
/// Returns `Error::InvalidDateRange` / `Error::InvalidAmount` for bad input
/// (checked before touching the store) and `Error::NotFound` for an unknown
/// apartment.
#[instrument(skip(db))]
pub async fn create_price_period<C>(
    db: &C,
    apartment_id: i64,
    input: NewPricePeriod,
) -> Result<price_period::Model>
where
    C: ConnectionTrait,
{
    input.validate()?;

    Apartment::find_by_id(apartment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?;

    let period = price_period::ActiveModel {
        apartment_id: Set(apartment_id),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        price_per_night: Set(input.price_per_night),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = period.insert(db).await?;
    debug!(
        "Apartment {} priced at {} from {} to {}",
        apartment_id, created.price_per_night, created.start_date, created.end_date
    );
    Ok(created)
}

/// Replaces the window and rate of an existing period.
///
/// The creation timestamp is kept, so editing a period does not change its
/// precedence among overlapping periods.
///
/// # Errors
/// Validation errors as for `create_price_period`; `Error::NotFound` when the
/// period does not belong to the apartment.
#[instrument(skip(db))]
pub async fn update_price_period(
    db: &DatabaseConnection,
    apartment_id: i64,
    period_id: i64,
    input: NewPricePeriod,
) -> Result<price_period::Model> {
    input.validate()?;

    let mut period: price_period::ActiveModel = get_price_period(db, apartment_id, period_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "price period",
            id: period_id,
        })?
        .into();

    period.start_date = Set(input.start_date);
    period.end_date = Set(input.end_date);
    period.price_per_night = Set(input.price_per_night);
    period.update(db).await.map_err(Into::into)
}

/// Removes a period. Existing bookings keep the total they were created with.
///
/// # Errors
/// Returns `Error::NotFound` when the period does not belong to the apartment.
#[instrument(skip(db))]
pub async fn delete_price_period(
    db: &DatabaseConnection,
    apartment_id: i64,
    period_id: i64,
) -> Result<()> {
    let period = get_price_period(db, apartment_id, period_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "price period",
            id: period_id,
        })?;
    period.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone, Utc};

    fn period(id: i64, start: NaiveDate, end: NaiveDate, price: f64) -> price_period::Model {
        price_period::Model {
            id,
            apartment_id: 1,
            start_date: start,
            end_date: end,
            price_per_night: price,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
        }
    }

    #[test]
    fn test_single_period_covering_whole_stay() {
        let periods = vec![period(1, date(2026, 3, 1), date(2026, 3, 31), 100.50)];
        let total = resolve_price(&periods, date(2026, 3, 15), date(2026, 3, 20)).unwrap();
        assert_eq!(total, 502.50);
    }

    #[test]
    fn test_adjacent_periods_are_summed_per_night() {
        let periods = vec![
            period(1, date(2026, 3, 1), date(2026, 3, 10), 80.0),
            period(2, date(2026, 3, 11), date(2026, 3, 20), 120.0),
        ];
        // Nights 9, 10 at 80 and 11, 12 at 120
        let quote = quote_stay(
            &periods,
            StayRange::new(date(2026, 3, 9), date(2026, 3, 13)).unwrap(),
        )
        .unwrap();
        assert_eq!(quote.total, 400.0);
        assert_eq!(quote.nights.len(), 4);
        assert_eq!(quote.nights[1].period_id, 1);
        assert_eq!(quote.nights[2].period_id, 2);
    }

    #[test]
    fn test_checkout_night_is_not_billed() {
        // The period ends the night before checkout, which is enough
        let periods = vec![period(1, date(2026, 3, 1), date(2026, 3, 4), 50.0)];
        let total = resolve_price(&periods, date(2026, 3, 1), date(2026, 3, 5)).unwrap();
        assert_eq!(total, 200.0);
    }

    #[test]
    fn test_gap_reports_every_uncovered_night() {
        let periods = vec![
            period(1, date(2026, 3, 1), date(2026, 3, 2), 50.0),
            period(2, date(2026, 3, 5), date(2026, 3, 9), 50.0),
        ];
        let err = resolve_price(&periods, date(2026, 3, 1), date(2026, 3, 7)).unwrap_err();
        match err {
            Error::PriceGap { nights } => {
                assert_eq!(nights, vec![date(2026, 3, 3), date(2026, 3, 4)]);
            }
            other => panic!("expected PriceGap, got {other:?}"),
        }
    }

    #[test]
    fn test_no_periods_is_a_gap() {
        let err = resolve_price(&[], date(2026, 3, 1), date(2026, 3, 2)).unwrap_err();
        assert!(matches!(err, Error::PriceGap { .. }));
    }

    #[test]
    fn test_overlap_resolved_by_most_recent_period() {
        let base = period(1, date(2026, 3, 1), date(2026, 3, 31), 100.0);
        let promo = period(2, date(2026, 3, 10), date(2026, 3, 12), 60.0);

        // Input order must not matter
        for periods in [vec![base.clone(), promo.clone()], vec![promo, base]] {
            let quote = quote_stay(
                &periods,
                StayRange::new(date(2026, 3, 9), date(2026, 3, 14)).unwrap(),
            )
            .unwrap();
            let prices: Vec<f64> = quote.nights.iter().map(|rate| rate.price).collect();
            assert_eq!(prices, vec![100.0, 60.0, 60.0, 60.0, 100.0]);
        }
    }

    #[test]
    fn test_overlap_with_equal_timestamps_prefers_higher_id() {
        let mut older = period(3, date(2026, 3, 1), date(2026, 3, 31), 90.0);
        let mut newer = period(4, date(2026, 3, 1), date(2026, 3, 31), 70.0);
        let stamp = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        older.created_at = stamp;
        newer.created_at = stamp;

        let total = resolve_price(&[newer, older], date(2026, 3, 1), date(2026, 3, 3)).unwrap();
        assert_eq!(total, 140.0);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let periods = vec![period(1, date(2026, 3, 1), date(2026, 3, 31), 100.0)];
        let err = resolve_price(&periods, date(2026, 3, 5), date(2026, 3, 5)).unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange { .. }));
    }

    #[test]
    fn test_periods_within_stay() {
        let periods = vec![
            period(1, date(2026, 2, 1), date(2026, 2, 28), 40.0),
            period(2, date(2026, 3, 1), date(2026, 3, 1), 50.0),
            period(3, date(2026, 3, 5), date(2026, 3, 9), 60.0),
        ];
        let stay = StayRange::new(date(2026, 3, 1), date(2026, 3, 5)).unwrap();
        let ids: Vec<i64> = periods_within(&periods, stay).map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_truncate_price() {
        assert_eq!(truncate_price(502.99), 502);
        assert_eq!(truncate_price(100.0), 100);
    }

    #[tokio::test]
    async fn test_create_price_period_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let inverted = NewPricePeriod {
            start_date: date(2026, 3, 10),
            end_date: date(2026, 3, 1),
            price_per_night: 100.0,
        };
        let result = create_price_period(&db, 1, inverted).await;
        assert!(matches!(result, Err(Error::InvalidDateRange { .. })));

        for bad_price in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let input = NewPricePeriod {
                start_date: date(2026, 3, 1),
                end_date: date(2026, 3, 10),
                price_per_night: bad_price,
            };
            let result = create_price_period(&db, 1, input).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_price_period_crud_integration() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;

        let created = add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 31), 100.5)
            .await?;
        let listed = list_price_periods(&db, apartment.id).await?;
        assert_eq!(listed, vec![created.clone()]);

        let updated = update_price_period(
            &db,
            apartment.id,
            created.id,
            NewPricePeriod {
                start_date: date(2026, 3, 1),
                end_date: date(2026, 4, 15),
                price_per_night: 120.0,
            },
        )
        .await?;
        assert_eq!(updated.end_date, date(2026, 4, 15));
        assert_eq!(updated.price_per_night, 120.0);
        assert_eq!(updated.created_at, created.created_at);

        // Scoped lookups do not leak across apartments
        let foreign = get_price_period(&db, apartment.id + 1, created.id).await?;
        assert!(foreign.is_none());

        delete_price_period(&db, apartment.id, created.id).await?;
        assert!(list_price_periods(&db, apartment.id).await?.is_empty());

        let again = delete_price_period(&db, apartment.id, created.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_price_period_unknown_apartment() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_price_period(
            &db,
            404,
            NewPricePeriod {
                start_date: date(2026, 3, 1),
                end_date: date(2026, 3, 2),
                price_per_night: 10.0,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "apartment",
                id: 404
            })
        ));
        Ok(())
    }
}
