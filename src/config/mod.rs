/// Catalog seed data from the `[catalog]` section of config.toml
pub mod catalog;

/// Database configuration and connection management
pub mod database;

/// Engine settings (search, views, booking policy, rating worker)
pub mod settings;

pub use settings::{
    AppConfig, BookingSettings, RatingPolicy, RatingSettings, SearchSettings, ViewSettings,
    load_config, load_config_or_default,
};
