//! Shared test utilities for the marketplace engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test listings with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewApartment, NewProperty},
        geo::GeoPoint,
        pricing::{self, NewPricePeriod},
    },
    entities::{self, booking},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Shorthand for a calendar date. Panics on an impossible date.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Routes engine logs to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("stay_market=debug")
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates "Testland" and its city "Test City".
pub async fn create_test_city(
    db: &DatabaseConnection,
) -> Result<(entities::country::Model, entities::city::Model)> {
    let country = catalog::create_country(db, "Testland").await?;
    let city = catalog::create_city(db, country.id, "Test City").await?;
    Ok((country, city))
}

/// Creates a test property in a fresh city.
///
/// # Defaults
/// * `owner_id`: 1
/// * location: 48.8566, 2.3522
pub async fn create_test_property(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::property::Model> {
    let (_, city) = create_test_city(db).await?;
    create_custom_property(db, name, city.id, GeoPoint::new(48.8566, 2.3522)).await
}

/// Creates a test property with a custom city and location.
pub async fn create_custom_property(
    db: &DatabaseConnection,
    name: &str,
    city_id: i64,
    location: GeoPoint,
) -> Result<entities::property::Model> {
    catalog::create_property(
        db,
        NewProperty {
            owner_id: 1,
            name: name.to_string(),
            city_id,
            address: "1 Test Street".to_string(),
            location,
        },
    )
    .await
}

/// Creates a test apartment sleeping 2 adults and 1 child.
pub async fn create_test_apartment(
    db: &DatabaseConnection,
    property_id: i64,
    name: &str,
) -> Result<entities::apartment::Model> {
    create_custom_apartment(db, property_id, name, 2, 1).await
}

/// Creates a test apartment with custom capacities.
pub async fn create_custom_apartment(
    db: &DatabaseConnection,
    property_id: i64,
    name: &str,
    adult_capacity: i32,
    children_capacity: i32,
) -> Result<entities::apartment::Model> {
    catalog::create_apartment(
        db,
        property_id,
        NewApartment {
            name: name.to_string(),
            adult_capacity,
            children_capacity,
            size: 40,
            bathrooms: 1,
        },
    )
    .await
}

/// Prices `[start, end]` (inclusive) at `price` per night.
pub async fn add_test_price(
    db: &DatabaseConnection,
    apartment_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    price: f64,
) -> Result<entities::price_period::Model> {
    pricing::create_price_period(
        db,
        apartment_id,
        NewPricePeriod {
            start_date: start,
            end_date: end,
            price_per_night: price,
        },
    )
    .await
}

/// Inserts an active booking directly, bypassing availability checks.
///
/// # Defaults
/// * `user_id`: 1
/// * 2 adults, 0 children, total 100.0
pub async fn insert_test_booking(
    db: &DatabaseConnection,
    apartment_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<booking::Model> {
    let model = booking::ActiveModel {
        apartment_id: Set(apartment_id),
        user_id: Set(1),
        start_date: Set(start),
        end_date: Set(end),
        adult_guests: Set(2),
        children_guests: Set(0),
        total_price: Set(100.0),
        rating: Set(None),
        review_comment: Set(None),
        created_at: Set(chrono::Utc::now()),
        cancelled_at: Set(None),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a facility, optionally inside a new category.
pub async fn create_test_facility(
    db: &DatabaseConnection,
    name: &str,
    category: Option<&str>,
) -> Result<entities::facility::Model> {
    let category_id = match category {
        Some(category) => Some(catalog::create_facility_category(db, category).await?.id),
        None => None,
    };
    catalog::create_facility(db, name, category_id).await
}

/// Sets up a complete test environment with a property and one apartment.
/// Returns (db, property, apartment) for common test scenarios.
pub async fn setup_with_apartment() -> Result<(
    DatabaseConnection,
    entities::property::Model,
    entities::apartment::Model,
)> {
    init_test_tracing();
    let db = setup_test_db().await?;
    let property = create_test_property(&db, "Test Property").await?;
    let apartment = create_test_apartment(&db, property.id, "Test Apartment").await?;
    Ok((db, property, apartment))
}
