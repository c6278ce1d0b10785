//! Domain models for the parking garage.
//!
//! This module contains the core domain types: vehicle categories and their
//! rules, registrations, vehicles, spots and the garage itself. None of it
//! knows about the filesystem.

/// Vehicle categories and the per-category rule table.
pub mod category;
pub use category::{CategorySpec, CategoryTable, InvalidCategorySpec, VehicleCategory};

/// Registration numbers and their per-category format rules.
pub mod registration;
pub use registration::{InvalidRegistration, Registration};

mod vehicle;
pub use vehicle::{ParkingDuration, Vehicle, calculate_fee};

/// A single parking spot.
pub mod spot;
pub use spot::{Spot, SpotFull, SpotState};

/// The garage: allocation, removal, lookup and occupancy accounting.
pub mod garage;
pub use garage::{Departure, Garage, GarageError, Located, Placement, Relocation};

mod map;

mod config;
pub use config::{Config, ConfigError, InvalidConfig};
