//! Engine settings loaded from config.toml.
//!
//! Every section is optional; missing keys fall back to the marketplace
//! defaults (page size 10, 10 km search radius, tomorrow..+5 days default
//! stay, ratings accepted at any time).

use super::catalog::CatalogConfig;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Root of config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Store URL; the `DATABASE_URL` environment variable takes precedence
    pub database_url: Option<String>,
    /// Search engine tuning
    pub search: SearchSettings,
    /// Public view defaults
    pub view: ViewSettings,
    /// Booking lifecycle policy
    pub booking: BookingSettings,
    /// Rating recomputation worker
    pub rating: RatingSettings,
    /// Reference data and listings to seed on startup
    pub catalog: CatalogConfig,
}

/// Search engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Properties per result page
    pub page_size: u64,
    /// Geo filter radius used when the query gives none
    pub radius_km: f64,
    /// Default check-in, in days from today
    pub default_start_offset_days: i64,
    /// Default check-out, in days from today
    pub default_end_offset_days: i64,
    /// Path used when building pagination links
    pub base_path: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            radius_km: 10.0,
            default_start_offset_days: 1,
            default_end_offset_days: 5,
            base_path: "/api/v1/search".to_string(),
        }
    }
}

/// Apartment view settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Nights quoted from today when the caller gives no dates
    pub default_nights: i64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self { default_nights: 2 }
    }
}

/// When a guest may attach a rating to a booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingPolicy {
    /// No timing restriction
    #[default]
    AnyTime,
    /// Only once the checkout date has been reached
    AfterCheckout,
}

/// Booking lifecycle settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// Rating timing rule
    pub rating_policy: RatingPolicy,
}

/// Rating worker settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Attempts per recompute task before it is dropped
    pub max_attempts: u32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Loads the application configuration from a TOML file.
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or is not valid TOML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns `Error::Config` on invalid TOML or mistyped keys.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `path` if it exists, otherwise returns the defaults.
///
/// # Errors
/// Returns `Error::Config` only when the file exists but cannot be parsed.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        info!(
            "No config file at {}, using defaults",
            path.as_ref().display()
        );
        Ok(AppConfig::default())
    }
}
