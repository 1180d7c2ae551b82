//! Entity module - Contains all SeaORM entity definitions for the marketplace store.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod apartment;
pub mod apartment_facility;
pub mod booking;
pub mod city;
pub mod country;
pub mod facility;
pub mod facility_category;
pub mod geo_object;
pub mod price_period;
pub mod property;
pub mod property_facility;

// Re-export specific types to avoid conflicts
pub use apartment::{Column as ApartmentColumn, Entity as Apartment, Model as ApartmentModel};
pub use apartment_facility::{
    Column as ApartmentFacilityColumn, Entity as ApartmentFacility,
    Model as ApartmentFacilityModel,
};
pub use booking::{Column as BookingColumn, Entity as Booking, Model as BookingModel};
pub use city::{Column as CityColumn, Entity as City, Model as CityModel};
pub use country::{Column as CountryColumn, Entity as Country, Model as CountryModel};
pub use facility::{Column as FacilityColumn, Entity as Facility, Model as FacilityModel};
pub use facility_category::{
    Column as FacilityCategoryColumn, Entity as FacilityCategory, Model as FacilityCategoryModel,
};
pub use geo_object::{Column as GeoObjectColumn, Entity as GeoObject, Model as GeoObjectModel};
pub use price_period::{
    Column as PricePeriodColumn, Entity as PricePeriod, Model as PricePeriodModel,
};
pub use property::{Column as PropertyColumn, Entity as Property, Model as PropertyModel};
pub use property_facility::{
    Column as PropertyFacilityColumn, Entity as PropertyFacility, Model as PropertyFacilityModel,
};
