//! Public listing views.
//!
//! View models are assembled explicitly from store rows; nothing here
//! mutates state. Only active listings are visible.

use crate::{
    config::ViewSettings,
    core::{
        catalog,
        pricing::{self, truncate_price},
        search::PhotoSource,
        stay::StayRange,
    },
    entities::{
        ApartmentFacility, City, Facility, FacilityCategory, apartment, apartment_facility,
        facility,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// Group name for facilities without a category.
pub const UNCATEGORIZED: &str = "Other";

/// A priced window of an apartment's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceWindow {
    /// First night, inclusive
    pub from: NaiveDate,
    /// Last night, inclusive
    pub to: NaiveDate,
    /// Nightly rate in whole currency units
    pub price_per_night: i64,
}

/// Public view of one apartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApartmentView {
    /// Apartment id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Maximum adults
    pub adult_capacity: i32,
    /// Maximum children
    pub children_capacity: i32,
    /// Floor area in square metres
    pub size: i32,
    /// Number of bathrooms
    pub bathrooms: i32,
    /// Facility names grouped by category name
    pub facility_categories: BTreeMap<String, Vec<String>>,
    /// Every price window, by start date
    pub available_in: Vec<PriceWindow>,
    /// Total for the requested stay; `None` when some night has no price
    pub price: Option<i64>,
}

/// Public view of one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    /// Property id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// City name
    pub city: String,
    /// Facility names, alphabetical
    pub facilities: Vec<String>,
    /// Apartments with at least one price window
    pub apartments: Vec<ApartmentView>,
    /// Photo URLs in display order
    pub photos: Vec<String>,
    /// Average guest rating; `None` until a booking is rated
    pub avg_rating: Option<f64>,
}

fn default_stay(settings: &ViewSettings, today: NaiveDate) -> Result<StayRange> {
    StayRange::from_offsets(today, 0, settings.default_nights)
}

async fn facility_categories(
    db: &DatabaseConnection,
    apartment_id: i64,
) -> Result<BTreeMap<String, Vec<String>>> {
    let facility_ids: Vec<i64> = ApartmentFacility::find()
        .filter(apartment_facility::Column::ApartmentId.eq(apartment_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.facility_id)
        .collect();

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (tag, category) in Facility::find()
        .find_also_related(FacilityCategory)
        .filter(facility::Column::Id.is_in(facility_ids))
        .order_by_asc(facility::Column::Name)
        .all(db)
        .await?
    {
        let group = category.map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name);
        grouped.entry(group).or_default().push(tag.name);
    }
    Ok(grouped)
}

async fn build_apartment_view(
    db: &DatabaseConnection,
    apartment: apartment::Model,
    stay: StayRange,
) -> Result<ApartmentView> {
    let periods = pricing::list_price_periods(db, apartment.id).await?;
    let price = pricing::quote_stay(&periods, stay)
        .ok()
        .map(|quote| truncate_price(quote.total));
    let available_in = periods
        .iter()
        .map(|period| PriceWindow {
            from: period.start_date,
            to: period.end_date,
            price_per_night: truncate_price(period.price_per_night),
        })
        .collect();

    Ok(ApartmentView {
        facility_categories: facility_categories(db, apartment.id).await?,
        id: apartment.id,
        name: apartment.name,
        adult_capacity: apartment.adult_capacity,
        children_capacity: apartment.children_capacity,
        size: apartment.size,
        bathrooms: apartment.bathrooms,
        available_in,
        price,
    })
}

/// Public view of an apartment, priced for `stay` or for the default
/// `view.default_nights` starting today.
///
/// # Errors
/// `Error::NotFound` when the apartment or its property is unknown or
/// inactive.
#[instrument(skip(db, settings))]
pub async fn view_apartment(
    db: &DatabaseConnection,
    settings: &ViewSettings,
    apartment_id: i64,
    stay: Option<StayRange>,
) -> Result<ApartmentView> {
    let stay = match stay {
        Some(stay) => stay,
        None => default_stay(settings, Utc::now().date_naive())?,
    };
    let found = catalog::get_apartment(db, apartment_id, false)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?;
    build_apartment_view(db, found, stay).await
}

/// Public view of a property with its priced apartments.
///
/// # Errors
/// `Error::NotFound` when the property is unknown or inactive.
#[instrument(skip(db, settings, photos))]
pub async fn view_property(
    db: &DatabaseConnection,
    settings: &ViewSettings,
    photos: &dyn PhotoSource,
    property_id: i64,
) -> Result<PropertyView> {
    let found = catalog::get_property(db, property_id, false)
        .await?
        .ok_or(Error::NotFound {
            entity: "property",
            id: property_id,
        })?;
    let stay = default_stay(settings, Utc::now().date_naive())?;

    let mut apartments = Vec::new();
    for listed in catalog::list_property_apartments(db, property_id, false).await? {
        if pricing::list_price_periods(db, listed.id).await?.is_empty() {
            continue;
        }
        apartments.push(build_apartment_view(db, listed, stay).await?);
    }

    let city = found
        .find_related(City)
        .one(db)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    let mut facilities: Vec<String> = found
        .find_related(Facility)
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.name)
        .collect();
    facilities.sort();

    Ok(PropertyView {
        photos: photos.photo_urls(found.id),
        id: found.id,
        name: found.name,
        address: found.address,
        city,
        facilities,
        apartments,
        avg_rating: found.bookings_avg_rating,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        catalog::{attach_apartment_facilities, attach_property_facilities, set_property_active},
        search::NoPhotos,
    };
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_view_apartment_groups_facilities_and_prices() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;
        add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 10), 99.90).await?;
        add_test_price(&db, apartment.id, date(2026, 3, 11), date(2026, 3, 20), 120.0).await?;
        let kitchen = create_test_facility(&db, "Kitchen", Some("Cooking")).await?;
        let oven = catalog::create_facility(&db, "Oven", kitchen.category_id).await?;
        let balcony = create_test_facility(&db, "Balcony", None).await?;
        attach_apartment_facilities(&db, apartment.id, &[kitchen.id, oven.id, balcony.id]).await?;

        let stay = StayRange::new(date(2026, 3, 9), date(2026, 3, 13))?;
        let view = view_apartment(&db, &ViewSettings::default(), apartment.id, Some(stay)).await?;

        assert_eq!(view.price, Some(439));
        assert_eq!(
            view.available_in,
            vec![
                PriceWindow {
                    from: date(2026, 3, 1),
                    to: date(2026, 3, 10),
                    price_per_night: 99,
                },
                PriceWindow {
                    from: date(2026, 3, 11),
                    to: date(2026, 3, 20),
                    price_per_night: 120,
                },
            ]
        );
        assert_eq!(view.facility_categories["Cooking"], vec!["Kitchen", "Oven"]);
        assert_eq!(view.facility_categories[UNCATEGORIZED], vec!["Balcony"]);

        let unpriced = StayRange::new(date(2026, 3, 19), date(2026, 3, 23))?;
        let view =
            view_apartment(&db, &ViewSettings::default(), apartment.id, Some(unpriced)).await?;
        assert_eq!(view.price, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_view_apartment_defaults_to_today() -> Result<()> {
        let (db, _property, apartment) = setup_with_apartment().await?;
        let today = Utc::now().date_naive();
        add_test_price(&db, apartment.id, today, today + chrono::Days::new(1), 75.0).await?;

        let view = view_apartment(&db, &ViewSettings::default(), apartment.id, None).await?;
        assert_eq!(view.price, Some(150));
        Ok(())
    }

    #[tokio::test]
    async fn test_view_property_lists_priced_apartments() -> Result<()> {
        let (db, property, apartment) = setup_with_apartment().await?;
        add_test_price(&db, apartment.id, date(2026, 3, 1), date(2026, 3, 10), 80.0).await?;
        create_test_apartment(&db, property.id, "Unpriced").await?;
        let wifi = create_test_facility(&db, "Wi-Fi", None).await?;
        let garden = create_test_facility(&db, "Garden", None).await?;
        attach_property_facilities(&db, property.id, &[wifi.id, garden.id]).await?;

        let view = view_property(&db, &ViewSettings::default(), &NoPhotos, property.id).await?;
        assert_eq!(view.city, "Test City");
        assert_eq!(view.facilities, vec!["Garden", "Wi-Fi"]);
        assert_eq!(view.apartments.len(), 1);
        assert_eq!(view.apartments[0].id, apartment.id);
        assert!(view.photos.is_empty());
        assert_eq!(view.avg_rating, None);

        set_property_active(&db, property.id, false).await?;
        let hidden = view_property(&db, &ViewSettings::default(), &NoPhotos, property.id).await;
        assert!(matches!(hidden, Err(Error::NotFound { .. })));
        let hidden = view_apartment(&db, &ViewSettings::default(), apartment.id, None).await;
        assert!(matches!(hidden, Err(Error::NotFound { .. })));
        Ok(())
    }
}
