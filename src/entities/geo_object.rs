//! Geo object entity - Named reference points (airports, stations, landmarks).
//!
//! Search can be anchored on a geo object id instead of raw coordinates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Geo object database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geo_objects")]
pub struct Model {
    /// Unique identifier for the geo object
    #[sea_orm(primary_key)]
    pub id: i64,
    /// City the object sits in, if known
    pub city_id: Option<i64>,
    /// Display name (e.g., "Charles de Gaulle Airport")
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub long: f64,
}

/// `GeoObject` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
