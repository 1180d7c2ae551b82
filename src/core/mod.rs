//! Core business logic - framework-agnostic marketplace operations.
//!
//! Pure rules (`stay`, `pricing::quote_stay`, `geo`, `availability::has_conflict`)
//! sit next to the store-backed operations that use them. Nothing in here
//! knows about transports or identity providers: callers pass guest and owner
//! ids explicitly.

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod geo;
pub mod locks;
pub mod pricing;
pub mod rating;
pub mod search;
pub mod stay;
pub mod view;
