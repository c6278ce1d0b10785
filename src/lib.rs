//! Parking Garage Management
//!
//! A garage is a fixed row of numbered spots. Vehicles occupy one spot, share
//! a spot with others of their kind, or claim a block of consecutive spots.
//! Fees are charged per started hour after a free grace period.

pub mod domain;
pub use domain::{
    CategorySpec, CategoryTable, Config, Garage, GarageError, Registration, Spot, Vehicle,
    VehicleCategory,
};

/// Snapshot persistence and the price list.
pub mod storage;
pub use storage::{JsonFileStore, MemoryStore, PersistentGarage, Snapshot, SnapshotStore};
