//! The in-memory garage.
//!
//! The [`Garage`] knows nothing about files or terminals. Every search runs
//! in ascending spot order and takes the first fit: the lowest numbered spot
//! (or window of spots) that satisfies the request wins.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    CategoryTable, Config, InvalidRegistration, ParkingDuration, Registration, Spot, SpotFull,
    Vehicle, VehicleCategory,
};

/// Name given to a garage when none is configured.
pub const DEFAULT_NAME: &str = "Prague Parking";

/// A parking garage: a fixed row of spots numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Garage {
    name: String,
    spots: Vec<Spot>,
    rules: CategoryTable,
}

/// Errors returned by garage operations.
///
/// Every failing operation leaves the garage exactly as it was.
#[derive(Debug, Error)]
pub enum GarageError {
    /// The registration breaks its category's format rule.
    #[error(transparent)]
    Validation(#[from] InvalidRegistration),

    /// A vehicle with the same registration is already in the garage.
    #[error("vehicle {registration} is already parked at spot {spot}")]
    Duplicate {
        /// The registration that was requested.
        registration: String,
        /// Where the existing vehicle is.
        spot: usize,
    },

    /// No spot, or no window of consecutive spots, can take the vehicle.
    #[error("no room for {category}: {}", space_needed(.spots_required))]
    Capacity {
        /// The category that could not be placed.
        category: VehicleCategory,
        /// How many consecutive spots it needs.
        spots_required: usize,
    },

    /// No vehicle with this registration is parked.
    #[error("vehicle {0} not found")]
    NotFound(String),

    /// A relocation named a spot outside the garage.
    #[error("spot {spot} does not exist (valid spots are 1-{total})")]
    TargetOutOfRange {
        /// The requested spot.
        spot: usize,
        /// Number of spots in the garage.
        total: usize,
    },

    /// A relocation named a vehicle that occupies a block of spots.
    #[error("{registration} occupies {spots} spots and cannot be moved")]
    MultiSpotRelocation {
        /// The vehicle that was asked to move.
        registration: String,
        /// How many spots it occupies.
        spots: usize,
    },

    /// The relocation target cannot take the vehicle.
    #[error("spot {spot} cannot take {registration}")]
    TargetUnavailable {
        /// The requested spot.
        spot: usize,
        /// The vehicle that was asked to move.
        registration: String,
    },

    /// A secondary block was found without the vehicle that claimed it.
    ///
    /// This indicates corrupted state and is never produced by the garage's
    /// own operations.
    #[error("spot {spot} is blocked by {registration}, but that vehicle is not parked")]
    OrphanedBlock {
        /// The registration on the block.
        registration: String,
        /// The first spot carrying the block.
        spot: usize,
    },

    /// A spot refused a vehicle the garage had checked it would accept.
    #[error(transparent)]
    Spot(#[from] SpotFull),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn space_needed(spots_required: &usize) -> String {
    match spots_required {
        1 => "it needs a free spot".to_string(),
        n => format!("it needs {n} free spots in a row"),
    }
}

/// Where a vehicle was parked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The spot holding the vehicle.
    pub spot: usize,
    /// How many consecutive spots the vehicle occupies, starting at `spot`.
    pub spots: usize,
    /// The arrival time stamped on the vehicle.
    pub arrival: DateTime<Utc>,
}

impl Placement {
    /// The highest spot number the vehicle occupies.
    #[must_use]
    pub const fn last_spot(&self) -> usize {
        self.spot + self.spots - 1
    }
}

/// A vehicle that has left the garage, with what it owes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The spot the vehicle was parked in.
    pub spot: usize,
    /// How many consecutive spots were released.
    pub spots: usize,
    /// The fee, in whole currency units.
    pub fee: u64,
    /// How long the vehicle stayed.
    pub duration: ParkingDuration,
    /// The vehicle itself.
    pub vehicle: Vehicle,
}

/// A parked vehicle and its spot, as returned by [`Garage::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    /// The spot holding the vehicle.
    pub spot: usize,
    /// The vehicle.
    pub vehicle: &'a Vehicle,
}

/// The result of moving a vehicle between spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Where the vehicle was.
    pub from: usize,
    /// Where it is now.
    pub to: usize,
}

impl Garage {
    /// Creates a garage of `spot_count` empty spots with the default rules.
    #[must_use]
    pub fn new(spot_count: usize) -> Self {
        Self::with_rules(DEFAULT_NAME, spot_count, CategoryTable::default())
    }

    /// Creates a garage of `spot_count` empty spots with the given rules.
    #[must_use]
    pub fn with_rules(name: impl Into<String>, spot_count: usize, rules: CategoryTable) -> Self {
        let mut garage = Self {
            name: name.into(),
            spots: Vec::new(),
            rules,
        };
        garage.initialize(spot_count);
        garage
    }

    /// Creates an empty garage sized and ruled by the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_rules(&config.name, config.spots(), config.categories().clone())
    }

    /// Rebuilds a garage from spots that have already been validated.
    pub(crate) const fn from_spots(name: String, spots: Vec<Spot>, rules: CategoryTable) -> Self {
        Self { name, spots, rules }
    }

    /// Replaces every spot with `spot_count` fresh, empty spots.
    pub fn initialize(&mut self, spot_count: usize) {
        self.spots = (1..=spot_count).map(Spot::new).collect();
        tracing::debug!(spots = spot_count, "initialized garage");
    }

    /// The garage's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category rules in force.
    #[must_use]
    pub const fn rules(&self) -> &CategoryTable {
        &self.rules
    }

    /// Every spot, in ascending order.
    #[must_use]
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    /// The spot with the given number.
    #[must_use]
    pub fn spot(&self, number: usize) -> Option<&Spot> {
        number.checked_sub(1).and_then(|index| self.spots.get(index))
    }

    /// Parks a vehicle at the first spot, or first window of spots, that fits.
    ///
    /// Categories that need several spots take the lowest window of
    /// consecutive empty spots: the vehicle is parked in the first spot of the
    /// window and the others are blocked in its name. Every other category
    /// takes the lowest spot that accepts it. The arrival time is `now`.
    ///
    /// # Errors
    ///
    /// - [`GarageError::Validation`] if the registration breaks its rule
    /// - [`GarageError::Duplicate`] if the registration is already parked
    /// - [`GarageError::Capacity`] if nothing fits
    #[instrument(level = "debug", skip(self))]
    pub fn park(
        &mut self,
        category: VehicleCategory,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Placement, GarageError> {
        let registration = Registration::parse(category, registration)?;
        if let Some(spot) = self.position_of(registration.as_str()) {
            return Err(GarageError::Duplicate {
                registration: registration.to_string(),
                spot,
            });
        }

        let spots_required = self.rules.spec(category).spots_required;
        let vehicle = Vehicle::from_parts(registration, category, now);
        let index = if spots_required > 1 {
            self.find_window(spots_required)
        } else {
            self.spots
                .iter()
                .position(|spot| spot.can_accept(&vehicle, &self.rules))
        };
        let Some(index) = index else {
            return Err(GarageError::Capacity {
                category,
                spots_required,
            });
        };

        let owner = vehicle.registration().clone();
        self.spots[index].park(vehicle, &self.rules)?;
        for spot in &mut self.spots[index + 1..index + spots_required] {
            let marked = spot.mark_secondary_block(owner.clone(), category);
            debug_assert!(marked, "window spots were checked to be empty");
        }

        let placement = Placement {
            spot: index + 1,
            spots: spots_required,
            arrival: now,
        };
        tracing::info!(
            registration = %owner,
            %category,
            spot = placement.spot,
            "parked vehicle"
        );
        Ok(placement)
    }

    /// Removes a vehicle and computes its fee as of `now`.
    ///
    /// If the vehicle claimed a block of spots, the block is released too.
    ///
    /// # Errors
    ///
    /// - [`GarageError::NotFound`] if no such vehicle is parked
    /// - [`GarageError::OrphanedBlock`] if the registration only appears on
    ///   a block; nothing is changed
    #[instrument(level = "debug", skip(self))]
    pub fn remove(
        &mut self,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Departure, GarageError> {
        let Some(index) = self
            .spots
            .iter()
            .position(|spot| spot.find(registration).is_some())
        else {
            return Err(self.missing(registration));
        };

        let vehicle = self.spots[index]
            .remove(registration)
            .ok_or_else(|| GarageError::NotFound(registration.to_string()))?;

        let released = self.spots[index + 1..]
            .iter_mut()
            .take_while(|spot| spot.is_blocked_by(registration))
            .map(|spot| spot.clear_secondary_block(registration))
            .filter(|&cleared| cleared)
            .count();

        let departure = Departure {
            spot: index + 1,
            spots: released + 1,
            fee: vehicle.fee(&self.rules, now),
            duration: vehicle.parking_duration(now),
            vehicle,
        };
        tracing::info!(
            registration = %departure.vehicle.registration(),
            spot = departure.spot,
            fee = departure.fee,
            "removed vehicle"
        );
        Ok(departure)
    }

    /// Finds a parked vehicle by registration. Read-only.
    #[must_use]
    pub fn find(&self, registration: &str) -> Option<Located<'_>> {
        self.spots.iter().find_map(|spot| {
            spot.find(registration).map(|vehicle| Located {
                spot: spot.number(),
                vehicle,
            })
        })
    }

    /// Moves a single-spot vehicle to another spot, keeping its arrival time.
    ///
    /// Moving a vehicle to the spot it is already in succeeds without change.
    ///
    /// # Errors
    ///
    /// - [`GarageError::TargetOutOfRange`] if `target` is not a spot number
    /// - [`GarageError::NotFound`] if no such vehicle is parked
    /// - [`GarageError::MultiSpotRelocation`] if the vehicle occupies a block
    /// - [`GarageError::TargetUnavailable`] if the target cannot take it
    #[instrument(level = "debug", skip(self))]
    pub fn relocate(
        &mut self,
        registration: &str,
        target: usize,
    ) -> Result<Relocation, GarageError> {
        let total = self.spots.len();
        if target == 0 || target > total {
            return Err(GarageError::TargetOutOfRange {
                spot: target,
                total,
            });
        }

        let (from, accepts) = {
            let Some(located) = self.find(registration) else {
                return Err(GarageError::NotFound(registration.to_string()));
            };
            let spots = self.rules.spec(located.vehicle.category()).spots_required;
            let has_block = self
                .spot(located.spot + 1)
                .is_some_and(|next| next.is_blocked_by(registration));
            if spots > 1 || has_block {
                return Err(GarageError::MultiSpotRelocation {
                    registration: located.vehicle.registration().to_string(),
                    spots,
                });
            }
            let accepts = self.spots[target - 1].can_accept(located.vehicle, &self.rules);
            (located.spot, accepts)
        };

        if from == target {
            return Ok(Relocation { from, to: target });
        }
        if !accepts {
            return Err(GarageError::TargetUnavailable {
                spot: target,
                registration: registration.to_string(),
            });
        }

        let vehicle = self.spots[from - 1]
            .remove(registration)
            .ok_or_else(|| GarageError::NotFound(registration.to_string()))?;
        if let Err(rejected) = self.spots[target - 1].park(vehicle, &self.rules) {
            self.spots[from - 1].park(rejected.into_vehicle(), &self.rules)?;
            return Err(GarageError::TargetUnavailable {
                spot: target,
                registration: registration.to_string(),
            });
        }

        tracing::info!(registration, from, to = target, "moved vehicle");
        Ok(Relocation { from, to: target })
    }

    /// Number of spots that can take at least one more vehicle.
    #[must_use]
    pub fn available_spots_count(&self) -> usize {
        self.spots
            .iter()
            .filter(|spot| spot.is_available(&self.rules) && !spot.is_blocked())
            .count()
    }

    /// Number of spots in the garage.
    #[must_use]
    pub fn total_spots_count(&self) -> usize {
        self.spots.len()
    }

    /// Number of spots that cannot take another vehicle.
    #[must_use]
    pub fn occupied_spots_count(&self) -> usize {
        self.total_spots_count() - self.available_spots_count()
    }

    /// Number of parked vehicles of each category present in the garage.
    #[must_use]
    pub fn vehicle_counts(&self) -> BTreeMap<VehicleCategory, usize> {
        let mut counts = BTreeMap::new();
        for vehicle in self.spots.iter().flat_map(Spot::vehicles) {
            *counts.entry(vehicle.category()).or_insert(0) += 1;
        }
        counts
    }

    /// Iterates over every parked vehicle with its spot number.
    pub fn vehicles(&self) -> impl Iterator<Item = Located<'_>> {
        self.spots.iter().flat_map(|spot| {
            let number = spot.number();
            spot.vehicles().map(move |vehicle| Located {
                spot: number,
                vehicle,
            })
        })
    }

    /// The number of the first spot mentioning `registration`, either as an
    /// occupant or as a block owner.
    fn position_of(&self, registration: &str) -> Option<usize> {
        self.spots
            .iter()
            .find(|spot| spot.find(registration).is_some() || spot.is_blocked_by(registration))
            .map(Spot::number)
    }

    /// Lowest index starting `width` consecutive empty spots.
    fn find_window(&self, width: usize) -> Option<usize> {
        if width == 0 || width > self.spots.len() {
            return None;
        }
        self.spots
            .windows(width)
            .position(|window| window.iter().all(Spot::is_empty))
    }

    /// The error for a registration with no occupant.
    fn missing(&self, registration: &str) -> GarageError {
        let orphan = self
            .spots
            .iter()
            .find(|spot| spot.is_blocked_by(registration));
        match orphan {
            Some(spot) => {
                tracing::error!(
                    registration,
                    spot = spot.number(),
                    "secondary block has no owning vehicle"
                );
                GarageError::OrphanedBlock {
                    registration: registration.to_string(),
                    spot: spot.number(),
                }
            }
            None => GarageError::NotFound(registration.to_string()),
        }
    }

    #[cfg(test)]
    pub(crate) fn replace_spot(&mut self, number: usize, state: crate::domain::SpotState) {
        self.spots[number - 1] = Spot::with_state(number, state);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::domain::SpotState;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn garage(spots: usize) -> Garage {
        Garage::new(spots)
    }

    #[test]
    fn initialize_replaces_all_spots() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        garage.initialize(4);

        assert_eq!(garage.total_spots_count(), 4);
        assert_eq!(garage.available_spots_count(), 4);
        let numbers: Vec<_> = garage.spots().iter().map(Spot::number).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
    }

    #[test]
    fn every_category_parks_at_lowest_spot_in_fresh_garage() {
        for category in VehicleCategory::ALL {
            let mut garage = garage(10);
            let placement = garage.park(category, "AB12", now()).unwrap();
            assert_eq!(placement.spot, 1, "{category}");
            assert_eq!(placement.arrival, now());
        }
    }

    #[test]
    fn car_occupies_one_spot() {
        let mut garage = garage(10);

        let placement = garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        assert_eq!(placement.spot, 1);
        assert_eq!(placement.spots, 1);
        assert_eq!(garage.available_spots_count(), 9);
        assert_eq!(garage.occupied_spots_count(), 1);
    }

    #[test]
    fn park_then_remove_restores_availability() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        let departure = garage.remove("AB123", now()).unwrap();

        assert_eq!(departure.spot, 1);
        assert_eq!(garage.available_spots_count(), 10);
        assert!(garage.spot(1).unwrap().is_empty());
    }

    #[test]
    fn two_motorcycles_share_and_third_moves_on() {
        let mut garage = garage(10);

        let first = garage.park(VehicleCategory::Motorcycle, "MC001", now()).unwrap();
        let second = garage.park(VehicleCategory::Motorcycle, "MC002", now()).unwrap();
        let third = garage.park(VehicleCategory::Motorcycle, "MC003", now()).unwrap();

        assert_eq!(first.spot, second.spot);
        assert_eq!(third.spot, 2);
    }

    #[test]
    fn shared_spot_stays_available_until_full() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Bicycle, "bike1", now()).unwrap();

        assert_eq!(garage.available_spots_count(), 10);
    }

    #[test]
    fn bus_blocks_four_spots_and_releases_them() {
        let mut garage = garage(10);

        let placement = garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap();

        assert_eq!(placement.spot, 1);
        assert_eq!(placement.last_spot(), 4);
        assert_eq!(garage.available_spots_count(), 6);
        for number in 2..=4 {
            assert!(garage.spot(number).unwrap().is_blocked_by("BUS001"));
        }

        let departure = garage.remove("bus001", now()).unwrap();

        assert_eq!(departure.spots, 4);
        assert_eq!(garage.available_spots_count(), 10);
        assert!(garage.spots().iter().all(Spot::is_empty));
    }

    #[test]
    fn bus_skips_windows_with_any_occupant() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        garage.park(VehicleCategory::Car, "AB2", now()).unwrap();
        garage.park(VehicleCategory::Car, "AB3", now()).unwrap();
        garage.remove("AB2", now()).unwrap();

        let placement = garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap();

        assert_eq!(placement.spot, 4);
    }

    #[test]
    fn bus_fails_without_four_consecutive_empty_spots() {
        let mut garage = garage(10);
        // Leave cars at 3, 6 and 9 so no four empty spots are adjacent.
        for number in 1..=9 {
            let registration = format!("AB{number}");
            garage.park(VehicleCategory::Car, &registration, now()).unwrap();
        }
        for number in [1, 2, 4, 5, 7, 8] {
            garage.remove(&format!("AB{number}"), now()).unwrap();
        }
        let before = garage.clone();

        let error = garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap_err();

        assert!(matches!(
            error,
            GarageError::Capacity {
                category: VehicleCategory::Bus,
                spots_required: 4
            }
        ));
        assert_eq!(garage, before);
    }

    #[test]
    fn bus_fails_in_garage_smaller_than_window() {
        let mut garage = garage(3);

        let error = garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap_err();

        assert!(matches!(error, GarageError::Capacity { .. }));
    }

    #[test]
    fn full_garage_rejects_car_without_mutation() {
        let mut garage = garage(2);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        garage.park(VehicleCategory::Car, "AB2", now()).unwrap();
        let before = garage.clone();

        let error = garage.park(VehicleCategory::Car, "AB3", now()).unwrap_err();

        assert!(matches!(error, GarageError::Capacity { .. }));
        assert_eq!(garage, before);
    }

    #[test]
    fn capacity_message_mentions_a_row_only_for_multi_spot_vehicles() {
        let mut garage = garage(4);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();

        let bus = garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap_err();
        for number in 2..=4 {
            garage.park(VehicleCategory::Car, &format!("AB{number}"), now()).unwrap();
        }
        let car = garage.park(VehicleCategory::Car, "AB5", now()).unwrap_err();

        assert_eq!(bus.to_string(), "no room for Bus: it needs 4 free spots in a row");
        assert_eq!(car.to_string(), "no room for Car: it needs a free spot");
    }

    #[test]
    fn invalid_registration_is_rejected_before_search() {
        let mut garage = garage(10);

        let error = garage
            .park(VehicleCategory::Car, "INVALID_REGISTRATION_TOO_LONG", now())
            .unwrap_err();

        assert!(matches!(error, GarageError::Validation(_)));
        assert_eq!(garage.available_spots_count(), 10);
    }

    #[test]
    fn duplicate_registration_is_rejected_ignoring_case() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        let error = garage.park(VehicleCategory::Motorcycle, "ab123", now()).unwrap_err();

        assert!(matches!(error, GarageError::Duplicate { spot: 1, .. }));
        assert_eq!(garage.available_spots_count(), 9);
    }

    #[test]
    fn remove_computes_fee_at_removal_time() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        let departure = garage.remove("AB123", now() + TimeDelta::minutes(61)).unwrap();

        assert_eq!(departure.fee, 20);
        assert_eq!(departure.duration.to_string(), "1h 1m");
        assert_eq!(departure.vehicle.registration(), &"AB123");
    }

    #[test]
    fn remove_unknown_registration_is_not_found() {
        let mut garage = garage(10);

        let error = garage.remove("AB123", now()).unwrap_err();

        assert!(matches!(error, GarageError::NotFound(ref r) if r == "AB123"));
    }

    #[test]
    fn remove_reports_orphaned_block_without_mutation() {
        let mut garage = garage(5);
        garage.replace_spot(
            3,
            SpotState::Blocked {
                owner: Registration::parse(VehicleCategory::Bus, "GHOST").unwrap(),
                category: VehicleCategory::Bus,
            },
        );
        let before = garage.clone();

        let error = garage.remove("ghost", now()).unwrap_err();

        assert!(matches!(error, GarageError::OrphanedBlock { spot: 3, .. }));
        assert_eq!(garage, before);
    }

    #[test]
    fn find_returns_spot_and_vehicle() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        let located = garage.find("ab123").unwrap();

        assert_eq!(located.spot, 2);
        assert_eq!(located.vehicle.registration(), &"AB123");
    }

    #[test]
    fn find_missing_registration_does_not_mutate() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap();
        let before = garage.clone();

        assert!(garage.find("AB999").is_none());
        // Block markers are not occupants.
        assert!(garage.find("nobody").is_none());
        assert_eq!(garage, before);
    }

    #[test]
    fn relocate_moves_vehicle_and_keeps_arrival() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        let relocation = garage.relocate("AB123", 7).unwrap();

        assert_eq!(relocation, Relocation { from: 1, to: 7 });
        let located = garage.find("AB123").unwrap();
        assert_eq!(located.spot, 7);
        assert_eq!(located.vehicle.arrival(), now());
        assert!(garage.spot(1).unwrap().is_empty());
    }

    #[test]
    fn relocate_rejects_out_of_range_target() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB123", now()).unwrap();

        for target in [0, 11] {
            let error = garage.relocate("AB123", target).unwrap_err();
            assert!(matches!(error, GarageError::TargetOutOfRange { total: 10, .. }));
        }
        assert_eq!(garage.find("AB123").unwrap().spot, 1);
    }

    #[test]
    fn relocate_rejects_multi_spot_vehicle() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap();
        let before = garage.clone();

        let error = garage.relocate("BUS001", 8).unwrap_err();

        assert!(matches!(
            error,
            GarageError::MultiSpotRelocation { spots: 4, .. }
        ));
        assert_eq!(garage, before);
    }

    #[test]
    fn relocate_into_occupied_spot_leaves_vehicle_in_place() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        garage.park(VehicleCategory::Motorcycle, "MC1", now()).unwrap();
        let before = garage.clone();

        let error = garage.relocate("MC1", 1).unwrap_err();

        assert!(matches!(error, GarageError::TargetUnavailable { spot: 1, .. }));
        assert_eq!(garage, before);
    }

    #[test]
    fn relocate_joins_shareable_spot() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Motorcycle, "MC1", now()).unwrap();
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        garage.relocate("AB1", 5).unwrap();
        garage.park(VehicleCategory::Motorcycle, "MC2", now()).unwrap();
        garage.relocate("MC2", 3).unwrap();

        garage.relocate("MC2", 1).unwrap();

        assert_eq!(garage.spot(1).unwrap().occupant_count(), 2);
    }

    #[test]
    fn relocate_unknown_vehicle_is_not_found() {
        let mut garage = garage(10);

        let error = garage.relocate("AB1", 2).unwrap_err();

        assert!(matches!(error, GarageError::NotFound(_)));
    }

    #[test]
    fn relocate_to_same_spot_is_a_no_op() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Car, "AB1", now()).unwrap();
        let before = garage.clone();

        let relocation = garage.relocate("AB1", 1).unwrap();

        assert_eq!(relocation, Relocation { from: 1, to: 1 });
        assert_eq!(garage, before);
    }

    #[test]
    fn vehicle_counts_per_category() {
        let mut garage = garage(10);
        garage.park(VehicleCategory::Bus, "BUS001", now()).unwrap();
        garage.park(VehicleCategory::Motorcycle, "MC1", now()).unwrap();
        garage.park(VehicleCategory::Motorcycle, "MC2", now()).unwrap();

        let counts = garage.vehicle_counts();

        assert_eq!(counts.get(&VehicleCategory::Bus), Some(&1));
        assert_eq!(counts.get(&VehicleCategory::Motorcycle), Some(&2));
        assert_eq!(counts.get(&VehicleCategory::Car), None);
        assert_eq!(garage.vehicles().count(), 3);
    }

    #[test]
    fn configured_rules_change_sharing() {
        let mut rules = CategoryTable::default();
        let mut spec = VehicleCategory::Motorcycle.default_spec();
        spec.capacity_per_spot = 3;
        rules.set(VehicleCategory::Motorcycle, spec).unwrap();
        let mut garage = Garage::with_rules("Test", 5, rules);

        for registration in ["MC1", "MC2", "MC3"] {
            let placement = garage.park(VehicleCategory::Motorcycle, registration, now()).unwrap();
            assert_eq!(placement.spot, 1);
        }
        let fourth = garage.park(VehicleCategory::Motorcycle, "MC4", now()).unwrap();
        assert_eq!(fourth.spot, 2);
    }
}
