//! Bloom Discovery - proximity matching and discovery service for Book&Bloom
//!
//! Notifies nearby users when a business registers and serves location and
//! text based discovery over the verified catalog.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    distance::{calculate_bounding_box, haversine_distance},
    DiscoveryError, DiscoveryOptions, DiscoveryService, NearbyQuery, RegistrationOutcome,
};
pub use models::{BusinessResult, Coordinates, NewBusiness, NewUser, Service};
pub use services::{DiscoveryStore, MemoryStore, PostgresStore, StoreError};
