//! Catalog business logic - Owner-side management of listings and reference data.
//!
//! Provides functions for creating properties and apartments, toggling their
//! visibility, tagging them with facilities and seeding the whole catalog from
//! configuration. Every read takes an explicit `include_inactive` flag: owners
//! see their deactivated listings, the public never does.

use crate::{
    config::catalog::{ApartmentSeed, CatalogConfig},
    core::{
        geo::GeoPoint,
        pricing::{self, NewPricePeriod},
    },
    entities::{
        Apartment, ApartmentFacility, City, Country, Facility, FacilityCategory, GeoObject,
        Property, PropertyFacility, apartment, apartment_facility, city, country, facility,
        facility_category, geo_object, property, property_facility,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, instrument};

fn require_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{kind} name cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn require_location(point: GeoPoint) -> Result<()> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(Error::Validation {
            message: format!("Invalid coordinates: {}, {}", point.lat, point.long),
        })
    }
}

/// Creates a country.
pub async fn create_country<C>(db: &C, name: &str) -> Result<country::Model>
where
    C: ConnectionTrait,
{
    let model = country::ActiveModel {
        name: Set(require_name("Country", name)?),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a city inside an existing country.
pub async fn create_city<C>(db: &C, country_id: i64, name: &str) -> Result<city::Model>
where
    C: ConnectionTrait,
{
    let name = require_name("City", name)?;
    Country::find_by_id(country_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "country",
            id: country_id,
        })?;

    let model = city::ActiveModel {
        country_id: Set(country_id),
        name: Set(name),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a facility category.
pub async fn create_facility_category<C>(db: &C, name: &str) -> Result<facility_category::Model>
where
    C: ConnectionTrait,
{
    let model = facility_category::ActiveModel {
        name: Set(require_name("Facility category", name)?),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a facility tag, optionally inside a category.
pub async fn create_facility<C>(
    db: &C,
    name: &str,
    category_id: Option<i64>,
) -> Result<facility::Model>
where
    C: ConnectionTrait,
{
    let model = facility::ActiveModel {
        name: Set(require_name("Facility", name)?),
        category_id: Set(category_id),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a named geo reference point.
pub async fn create_geo_object<C>(
    db: &C,
    name: &str,
    city_id: Option<i64>,
    location: GeoPoint,
) -> Result<geo_object::Model>
where
    C: ConnectionTrait,
{
    let name = require_name("Geo object", name)?;
    require_location(location)?;

    let model = geo_object::ActiveModel {
        name: Set(name),
        city_id: Set(city_id),
        lat: Set(location.lat),
        long: Set(location.long),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Owner input for a new property.
#[derive(Debug, Clone)]
pub struct NewProperty {
    /// Owning account
    pub owner_id: i64,
    /// Public name
    pub name: String,
    /// City the property is in
    pub city_id: i64,
    /// Street address
    pub address: String,
    /// Map location
    pub location: GeoPoint,
}

/// Lists a new, active property.
///
/// # Errors
/// `Error::Validation` for an empty name or invalid coordinates,
/// `Error::NotFound` for an unknown city.
#[instrument(skip(db, input), fields(owner_id = input.owner_id))]
pub async fn create_property<C>(db: &C, input: NewProperty) -> Result<property::Model>
where
    C: ConnectionTrait,
{
    let name = require_name("Property", &input.name)?;
    require_location(input.location)?;

    City::find_by_id(input.city_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "city",
            id: input.city_id,
        })?;

    let model = property::ActiveModel {
        owner_id: Set(input.owner_id),
        name: Set(name),
        city_id: Set(input.city_id),
        address: Set(input.address.trim().to_string()),
        lat: Set(input.location.lat),
        long: Set(input.location.long),
        is_active: Set(true),
        bookings_avg_rating: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!("Listed property '{}' (ID: {})", created.name, created.id);
    Ok(created)
}

/// Owner input for a new or edited apartment.
#[derive(Debug, Clone)]
pub struct NewApartment {
    /// Display name
    pub name: String,
    /// Max adults
    pub adult_capacity: i32,
    /// Max children
    pub children_capacity: i32,
    /// Floor area in square metres
    pub size: i32,
    /// Bathrooms
    pub bathrooms: i32,
}

impl NewApartment {
    fn validate(&self) -> Result<String> {
        let name = require_name("Apartment", &self.name)?;
        for (field, value) in [
            ("adult_capacity", self.adult_capacity),
            ("children_capacity", self.children_capacity),
            ("size", self.size),
            ("bathrooms", self.bathrooms),
        ] {
            if value < 0 {
                return Err(Error::Validation {
                    message: format!("{field} cannot be negative, got {value}"),
                });
            }
        }
        Ok(name)
    }
}

/// Adds an active apartment to a property.
///
/// # Errors
/// `Error::Validation` for negative capacities or an empty name,
/// `Error::NotFound` for an unknown property.
#[instrument(skip(db, input))]
pub async fn create_apartment<C>(
    db: &C,
    property_id: i64,
    input: NewApartment,
) -> Result<apartment::Model>
where
    C: ConnectionTrait,
{
    let name = input.validate()?;

    Property::find_by_id(property_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "property",
            id: property_id,
        })?;

    let model = apartment::ActiveModel {
        property_id: Set(property_id),
        name: Set(name),
        adult_capacity: Set(input.adult_capacity),
        children_capacity: Set(input.children_capacity),
        size: Set(input.size),
        bathrooms: Set(input.bathrooms),
        is_active: Set(true),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Edits an apartment's details. Existing bookings are not re-validated.
///
/// # Errors
/// Same validation as `create_apartment`; `Error::NotFound` for an unknown
/// apartment.
#[instrument(skip(db, input))]
pub async fn update_apartment(
    db: &DatabaseConnection,
    apartment_id: i64,
    input: NewApartment,
) -> Result<apartment::Model> {
    let name = input.validate()?;

    let mut model: apartment::ActiveModel = Apartment::find_by_id(apartment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?
        .into();

    model.name = Set(name);
    model.adult_capacity = Set(input.adult_capacity);
    model.children_capacity = Set(input.children_capacity);
    model.size = Set(input.size);
    model.bathrooms = Set(input.bathrooms);
    model.update(db).await.map_err(Into::into)
}

/// Activates or deactivates a property. Data is never removed.
pub async fn set_property_active(
    db: &DatabaseConnection,
    property_id: i64,
    active: bool,
) -> Result<property::Model> {
    let mut model: property::ActiveModel = Property::find_by_id(property_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "property",
            id: property_id,
        })?
        .into();
    model.is_active = Set(active);
    let updated = model.update(db).await?;
    info!("Property {} active = {}", property_id, active);
    Ok(updated)
}

/// Activates or deactivates an apartment. Data is never removed.
pub async fn set_apartment_active(
    db: &DatabaseConnection,
    apartment_id: i64,
    active: bool,
) -> Result<apartment::Model> {
    let mut model: apartment::ActiveModel = Apartment::find_by_id(apartment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?
        .into();
    model.is_active = Set(active);
    let updated = model.update(db).await?;
    info!("Apartment {} active = {}", apartment_id, active);
    Ok(updated)
}

/// Finds a property; inactive ones only when `include_inactive` is set.
pub async fn get_property<C>(
    db: &C,
    property_id: i64,
    include_inactive: bool,
) -> Result<Option<property::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Property::find_by_id(property_id);
    if !include_inactive {
        query = query.filter(property::Column::IsActive.eq(true));
    }
    query.one(db).await.map_err(Into::into)
}

/// Finds an apartment. Without `include_inactive`, the apartment and its
/// property must both be active.
pub async fn get_apartment<C>(
    db: &C,
    apartment_id: i64,
    include_inactive: bool,
) -> Result<Option<apartment::Model>>
where
    C: ConnectionTrait,
{
    let Some(found) = Apartment::find_by_id(apartment_id).one(db).await? else {
        return Ok(None);
    };
    if include_inactive {
        return Ok(Some(found));
    }
    if !found.is_active {
        return Ok(None);
    }
    let parent_visible = get_property(db, found.property_id, false).await?.is_some();
    Ok(parent_visible.then_some(found))
}

/// Properties owned by `owner_id`, ordered by name.
pub async fn list_owner_properties(
    db: &DatabaseConnection,
    owner_id: i64,
    include_inactive: bool,
) -> Result<Vec<property::Model>> {
    let mut query = Property::find().filter(property::Column::OwnerId.eq(owner_id));
    if !include_inactive {
        query = query.filter(property::Column::IsActive.eq(true));
    }
    query
        .order_by_asc(property::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Apartments of a property, ordered by id.
pub async fn list_property_apartments<C>(
    db: &C,
    property_id: i64,
    include_inactive: bool,
) -> Result<Vec<apartment::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Apartment::find().filter(apartment::Column::PropertyId.eq(property_id));
    if !include_inactive {
        query = query.filter(apartment::Column::IsActive.eq(true));
    }
    query
        .order_by_asc(apartment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn require_facilities<C>(db: &C, facility_ids: &BTreeSet<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let found: BTreeSet<i64> = Facility::find()
        .filter(facility::Column::Id.is_in(facility_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.id)
        .collect();

    match facility_ids.difference(&found).next() {
        Some(&missing) => Err(Error::NotFound {
            entity: "facility",
            id: missing,
        }),
        None => Ok(()),
    }
}

/// Tags a property with facilities. Already-present tags are left alone.
///
/// # Errors
/// `Error::NotFound` for an unknown property or facility.
pub async fn attach_property_facilities<C>(
    db: &C,
    property_id: i64,
    facility_ids: &[i64],
) -> Result<()>
where
    C: ConnectionTrait,
{
    Property::find_by_id(property_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "property",
            id: property_id,
        })?;

    let wanted: BTreeSet<i64> = facility_ids.iter().copied().collect();
    require_facilities(db, &wanted).await?;

    let existing: BTreeSet<i64> = PropertyFacility::find()
        .filter(property_facility::Column::PropertyId.eq(property_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.facility_id)
        .collect();

    let links: Vec<property_facility::ActiveModel> = wanted
        .difference(&existing)
        .map(|&facility_id| property_facility::ActiveModel {
            property_id: Set(property_id),
            facility_id: Set(facility_id),
        })
        .collect();

    if !links.is_empty() {
        PropertyFacility::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Tags an apartment with facilities. Already-present tags are left alone.
///
/// # Errors
/// `Error::NotFound` for an unknown apartment or facility.
pub async fn attach_apartment_facilities<C>(
    db: &C,
    apartment_id: i64,
    facility_ids: &[i64],
) -> Result<()>
where
    C: ConnectionTrait,
{
    Apartment::find_by_id(apartment_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "apartment",
            id: apartment_id,
        })?;

    let wanted: BTreeSet<i64> = facility_ids.iter().copied().collect();
    require_facilities(db, &wanted).await?;

    let existing: BTreeSet<i64> = ApartmentFacility::find()
        .filter(apartment_facility::Column::ApartmentId.eq(apartment_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.facility_id)
        .collect();

    let links: Vec<apartment_facility::ActiveModel> = wanted
        .difference(&existing)
        .map(|&facility_id| apartment_facility::ActiveModel {
            apartment_id: Set(apartment_id),
            facility_id: Set(facility_id),
        })
        .collect();

    if !links.is_empty() {
        ApartmentFacility::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Counts of what `seed_catalog` created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// New properties
    pub properties: usize,
    /// New apartments
    pub apartments: usize,
    /// New price periods
    pub price_periods: usize,
    /// Properties skipped because they already existed
    pub skipped_properties: usize,
}

fn lookup(names: &HashMap<String, i64>, kind: &str, name: &str) -> Result<i64> {
    names.get(name).copied().ok_or_else(|| Error::Config {
        message: format!("Catalog references unknown {kind} '{name}'"),
    })
}

async fn seed_apartment<C>(
    db: &C,
    property_id: i64,
    seed: &ApartmentSeed,
    facilities: &HashMap<String, i64>,
    summary: &mut SeedSummary,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let created = create_apartment(
        db,
        property_id,
        NewApartment {
            name: seed.name.clone(),
            adult_capacity: seed.adult_capacity,
            children_capacity: seed.children_capacity,
            size: seed.size,
            bathrooms: seed.bathrooms,
        },
    )
    .await?;
    summary.apartments += 1;

    let facility_ids = seed
        .facilities
        .iter()
        .map(|name| lookup(facilities, "facility", name))
        .collect::<Result<Vec<_>>>()?;
    attach_apartment_facilities(db, created.id, &facility_ids).await?;

    for price in &seed.prices {
        pricing::create_price_period(
            db,
            created.id,
            NewPricePeriod {
                start_date: price.start_date,
                end_date: price.end_date,
                price_per_night: price.price_per_night,
            },
        )
        .await?;
        summary.price_periods += 1;
    }
    Ok(())
}

/// Seeds reference data and listings from configuration in one transaction.
///
/// Reference rows are matched by name and reused. A property is skipped when
/// its owner already has a property with the same name, so re-running the
/// seed on every start is safe.
///
/// # Errors
/// `Error::Config` when an entry references an unknown name; any validation
/// error from the create functions. Nothing is written on error.
#[instrument(skip(db, catalog))]
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    let mut countries: HashMap<String, i64> = Country::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    for seed in &catalog.countries {
        if !countries.contains_key(&seed.name) {
            let created = create_country(&txn, &seed.name).await?;
            countries.insert(created.name, created.id);
        }
    }

    let mut cities: HashMap<String, i64> = City::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    for seed in &catalog.cities {
        if !cities.contains_key(&seed.name) {
            let country_id = lookup(&countries, "country", &seed.country)?;
            let created = create_city(&txn, country_id, &seed.name).await?;
            cities.insert(created.name, created.id);
        }
    }

    let mut categories: HashMap<String, i64> = FacilityCategory::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    let mut facilities: HashMap<String, i64> = Facility::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|f| (f.name, f.id))
        .collect();
    for seed in &catalog.facilities {
        if facilities.contains_key(&seed.name) {
            continue;
        }
        let category_id = match &seed.category {
            Some(name) => match categories.get(name) {
                Some(&id) => Some(id),
                None => {
                    let created = create_facility_category(&txn, name).await?;
                    categories.insert(created.name, created.id);
                    Some(created.id)
                }
            },
            None => None,
        };
        let created = create_facility(&txn, &seed.name, category_id).await?;
        facilities.insert(created.name, created.id);
    }

    let existing_geo: BTreeSet<String> = GeoObject::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect();
    for seed in &catalog.geo_objects {
        if existing_geo.contains(&seed.name) {
            continue;
        }
        let city_id = seed
            .city
            .as_deref()
            .map(|name| lookup(&cities, "city", name))
            .transpose()?;
        create_geo_object(&txn, &seed.name, city_id, GeoPoint::new(seed.lat, seed.long)).await?;
    }

    for seed in &catalog.properties {
        let already_listed = Property::find()
            .filter(property::Column::OwnerId.eq(seed.owner_id))
            .filter(property::Column::Name.eq(seed.name.trim()))
            .one(&txn)
            .await?
            .is_some();
        if already_listed {
            summary.skipped_properties += 1;
            continue;
        }

        let city_id = lookup(&cities, "city", &seed.city)?;
        let created = create_property(
            &txn,
            NewProperty {
                owner_id: seed.owner_id,
                name: seed.name.clone(),
                city_id,
                address: seed.address.clone(),
                location: GeoPoint::new(seed.lat, seed.long),
            },
        )
        .await?;
        summary.properties += 1;

        let facility_ids = seed
            .facilities
            .iter()
            .map(|name| lookup(&facilities, "facility", name))
            .collect::<Result<Vec<_>>>()?;
        attach_property_facilities(&txn, created.id, &facility_ids).await?;

        for apartment in &seed.apartments {
            seed_apartment(&txn, created.id, apartment, &facilities, &mut summary).await?;
        }
    }

    txn.commit().await?;
    info!(
        "Catalog seeded: {} properties, {} apartments, {} price periods ({} already present)",
        summary.properties, summary.apartments, summary.price_periods, summary.skipped_properties
    );
    Ok(summary)
}
