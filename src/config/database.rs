//! Database configuration for the marketplace store.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. A few indexes that entities
//! cannot express (the partial unique index guarding active bookings, the
//! price-range lookup index) are created with plain SQL afterwards.

use crate::entities::{
    Apartment, ApartmentFacility, Booking, City, Country, Facility, FacilityCategory, GeoObject,
    PricePeriod, Property, PropertyFacility,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/stay_market.sqlite?mode=rwc";

/// Statements that back up the engine's invariants at the store level.
///
/// `idx_bookings_active_start` rejects two active bookings of one apartment
/// starting on the same night; the engine maps that violation to
/// `Error::Unavailable`.
const INDEX_STATEMENTS: [&str; 3] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_start \
     ON bookings (apartment_id, start_date) WHERE cancelled_at IS NULL",
    "CREATE INDEX IF NOT EXISTS idx_bookings_apartment_range \
     ON bookings (apartment_id, start_date, end_date)",
    "CREATE INDEX IF NOT EXISTS idx_apartment_prices_range \
     ON apartment_prices (apartment_id, start_date, end_date)",
];

/// Resolves the database URL: the `DATABASE_URL` environment variable first,
/// then the configured value, then a local `SQLite` file.
#[must_use]
pub fn resolve_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the store at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table and index the engine needs. Safe to call repeatedly.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    // Parents before children so foreign keys resolve
    create_table(db, &schema, Country).await?;
    create_table(db, &schema, City).await?;
    create_table(db, &schema, GeoObject).await?;
    create_table(db, &schema, FacilityCategory).await?;
    create_table(db, &schema, Facility).await?;
    create_table(db, &schema, Property).await?;
    create_table(db, &schema, PropertyFacility).await?;
    create_table(db, &schema, Apartment).await?;
    create_table(db, &schema, ApartmentFacility).await?;
    create_table(db, &schema, PricePeriod).await?;
    create_table(db, &schema, Booking).await?;

    for statement in INDEX_STATEMENTS {
        db.execute_unprepared(statement).await?;
    }

    info!("Marketplace tables and indexes ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BookingModel, PricePeriodModel, PropertyModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<PropertyModel> = Property::find().limit(1).all(&db).await?;
        let _: Vec<PricePeriodModel> = PricePeriod::find().limit(1).all(&db).await?;
        let _: Vec<BookingModel> = Booking::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_resolve_database_url_prefers_configured_value_over_default() {
        if std::env::var("DATABASE_URL").is_ok() {
            return;
        }
        assert_eq!(
            resolve_database_url(Some("sqlite::memory:")),
            "sqlite::memory:"
        );
        assert_eq!(resolve_database_url(None), DEFAULT_DATABASE_URL);
    }
}
