//! Catalog seed configuration loaded from the `[catalog]` section of config.toml.
//!
//! Seed entries reference each other by name (a city names its country, a
//! property names its city and facilities). The names are resolved to ids by
//! `core::catalog::seed_catalog`. Dates are quoted `YYYY-MM-DD` strings.

use chrono::NaiveDate;
use serde::Deserialize;

/// Everything that can be seeded
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Countries to create
    pub countries: Vec<CountrySeed>,
    /// Cities to create
    pub cities: Vec<CitySeed>,
    /// Facility tags to create
    pub facilities: Vec<FacilitySeed>,
    /// Named search anchors
    pub geo_objects: Vec<GeoObjectSeed>,
    /// Listings with their apartments and prices
    pub properties: Vec<PropertySeed>,
}

/// A country
#[derive(Debug, Clone, Deserialize)]
pub struct CountrySeed {
    /// Country name
    pub name: String,
}

/// A city inside a seeded country
#[derive(Debug, Clone, Deserialize)]
pub struct CitySeed {
    /// City name
    pub name: String,
    /// Name of a seeded country
    pub country: String,
}

/// A facility tag
#[derive(Debug, Clone, Deserialize)]
pub struct FacilitySeed {
    /// Facility name
    pub name: String,
    /// Category name, created on demand
    #[serde(default)]
    pub category: Option<String>,
}

/// A named geo reference point
#[derive(Debug, Clone, Deserialize)]
pub struct GeoObjectSeed {
    /// Display name
    pub name: String,
    /// Name of a seeded city
    #[serde(default)]
    pub city: Option<String>,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub long: f64,
}

/// A property listing
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySeed {
    /// Owner account id
    pub owner_id: i64,
    /// Property name
    pub name: String,
    /// Name of a seeded city
    pub city: String,
    /// Street address
    pub address: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub long: f64,
    /// Facility names
    #[serde(default)]
    pub facilities: Vec<String>,
    /// Apartments in this property
    #[serde(default)]
    pub apartments: Vec<ApartmentSeed>,
}

/// An apartment inside a seeded property
#[derive(Debug, Clone, Deserialize)]
pub struct ApartmentSeed {
    /// Apartment name
    pub name: String,
    /// Max adults
    pub adult_capacity: i32,
    /// Max children
    #[serde(default)]
    pub children_capacity: i32,
    /// Size in square metres
    #[serde(default)]
    pub size: i32,
    /// Bathrooms
    #[serde(default)]
    pub bathrooms: i32,
    /// Facility names
    #[serde(default)]
    pub facilities: Vec<String>,
    /// Nightly price windows
    #[serde(default)]
    pub prices: Vec<PriceSeed>,
}

/// A nightly price window
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSeed {
    /// First night, inclusive
    pub start_date: NaiveDate,
    /// Last night, inclusive
    pub end_date: NaiveDate,
    /// Rate per night
    pub price_per_night: f64,
}
