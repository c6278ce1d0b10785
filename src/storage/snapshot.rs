//! A garage's full state, in a form that can be written to disk.
//!
//! [`Snapshot`] mirrors the garage spot by spot. Converting a garage into a
//! snapshot cannot fail; turning a snapshot back into a garage validates
//! everything the garage itself would never allow.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CategoryTable, Garage, InvalidRegistration, Registration, Spot, SpotState, Vehicle,
    VehicleCategory,
};

/// The serialized state of a garage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotVersion", into = "SnapshotVersion")]
pub struct Snapshot {
    /// The garage's name.
    pub name: String,
    /// Every spot, in ascending order.
    pub spots: Vec<SpotRecord>,
}

/// One spot in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotRecord {
    /// The spot's number, starting at 1.
    pub number: usize,

    /// The vehicles parked here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vehicles: Vec<VehicleRecord>,

    /// Whether the spot is claimed by a multi-spot vehicle parked below it.
    #[serde(default)]
    pub secondary_block: bool,

    /// Registration of the vehicle holding the block; empty when none.
    #[serde(default)]
    pub block_owner: String,
}

/// One parked vehicle in a [`SpotRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// The vehicle's category code.
    pub category: VehicleCategory,
    /// The registration as entered.
    pub registration: String,
    /// When the vehicle arrived.
    pub arrival: DateTime<Utc>,
}

/// Reasons a snapshot cannot be turned back into a garage.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The snapshot holds no spots, so there is nothing to restore.
    #[error("snapshot contains no spots")]
    Empty,

    /// Spots are not numbered 1, 2, 3...
    #[error("expected spot {expected}, found spot {found}")]
    Numbering {
        /// The number the spot should have.
        expected: usize,
        /// The number it has.
        found: usize,
    },

    /// A spot is both blocked and holding vehicles.
    #[error("spot {0} is both blocked and occupied")]
    BlockedAndOccupied(usize),

    /// A block does not follow the vehicle that owns it.
    #[error("spot {spot} is blocked by '{owner}', which is not parked directly below it")]
    OrphanedBlock {
        /// The blocked spot.
        spot: usize,
        /// The registration named on the block.
        owner: String,
    },

    /// A multi-spot vehicle is missing some of its block.
    #[error("{registration} at spot {spot} is missing {missing} blocked spot(s)")]
    IncompleteBlock {
        /// The vehicle.
        registration: String,
        /// The vehicle's spot.
        spot: usize,
        /// How many blocked spots are missing.
        missing: usize,
    },

    /// A stored registration breaks its category's rule.
    #[error("spot {spot}: {source}")]
    Registration {
        /// The spot holding the vehicle.
        spot: usize,
        /// The validation failure.
        source: InvalidRegistration,
    },

    /// The same registration appears twice.
    #[error("{registration} appears more than once (again at spot {spot})")]
    Duplicate {
        /// The repeated registration.
        registration: String,
        /// The spot of the second appearance.
        spot: usize,
    },

    /// A spot holds vehicles of different categories.
    #[error("spot {0} mixes vehicle categories")]
    MixedCategories(usize),

    /// A spot holds more vehicles than its category allows.
    #[error("spot {spot} holds {count} vehicles, more than the {capacity} allowed")]
    OverCapacity {
        /// The spot.
        spot: usize,
        /// Vehicles stored.
        count: usize,
        /// Vehicles allowed.
        capacity: usize,
    },
}

impl From<&Garage> for Snapshot {
    fn from(garage: &Garage) -> Self {
        Self {
            name: garage.name().to_string(),
            spots: garage.spots().iter().map(SpotRecord::from).collect(),
        }
    }
}

impl From<&Spot> for SpotRecord {
    fn from(spot: &Spot) -> Self {
        Self {
            number: spot.number(),
            vehicles: spot
                .vehicles()
                .map(|vehicle| VehicleRecord {
                    category: vehicle.category(),
                    registration: vehicle.registration().to_string(),
                    arrival: vehicle.arrival(),
                })
                .collect(),
            secondary_block: spot.is_blocked(),
            block_owner: spot
                .block_owner()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

/// A multi-spot vehicle whose block is still being read.
struct OpenBlock {
    owner: Registration,
    category: VehicleCategory,
    spot: usize,
    remaining: usize,
}

impl OpenBlock {
    fn ensure_closed(&self) -> Result<(), RestoreError> {
        if self.remaining == 0 {
            return Ok(());
        }
        Err(RestoreError::IncompleteBlock {
            registration: self.owner.to_string(),
            spot: self.spot,
            missing: self.remaining,
        })
    }
}

impl Snapshot {
    /// Rebuilds the garage this snapshot was taken from.
    ///
    /// The spot count comes from the snapshot, not from the rules. Every
    /// vehicle and block is checked against `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::Empty`] if the snapshot holds no spots, and
    /// another [`RestoreError`] if the stored state breaks any garage
    /// invariant.
    pub fn restore(self, rules: &CategoryTable) -> Result<Garage, RestoreError> {
        if self.spots.is_empty() {
            return Err(RestoreError::Empty);
        }

        let mut seen = HashSet::new();
        let mut block: Option<OpenBlock> = None;
        let mut spots = Vec::with_capacity(self.spots.len());

        for (index, record) in self.spots.into_iter().enumerate() {
            let number = record.number;
            if number != index + 1 {
                return Err(RestoreError::Numbering {
                    expected: index + 1,
                    found: number,
                });
            }

            if record.secondary_block {
                if !record.vehicles.is_empty() {
                    return Err(RestoreError::BlockedAndOccupied(number));
                }
                let state = match block.as_mut() {
                    Some(open) if open.remaining > 0 && open.owner.matches(&record.block_owner) => {
                        open.remaining -= 1;
                        SpotState::Blocked {
                            owner: open.owner.clone(),
                            category: open.category,
                        }
                    }
                    _ => {
                        return Err(RestoreError::OrphanedBlock {
                            spot: number,
                            owner: record.block_owner,
                        });
                    }
                };
                spots.push(Spot::with_state(number, state));
                continue;
            }

            if let Some(open) = block.take() {
                open.ensure_closed()?;
            }

            let vehicles = record
                .vehicles
                .into_iter()
                .map(|stored| {
                    let registration = Registration::parse(stored.category, &stored.registration)
                        .map_err(|source| RestoreError::Registration {
                            spot: number,
                            source,
                        })?;
                    if !seen.insert(registration.key()) {
                        return Err(RestoreError::Duplicate {
                            registration: stored.registration,
                            spot: number,
                        });
                    }
                    Ok(Vehicle::from_parts(
                        registration,
                        stored.category,
                        stored.arrival,
                    ))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let Some(vehicles) = NonEmpty::from_vec(vehicles) else {
                spots.push(Spot::new(number));
                continue;
            };

            let category = vehicles.head.category();
            if vehicles.iter().any(|vehicle| vehicle.category() != category) {
                return Err(RestoreError::MixedCategories(number));
            }
            let spec = rules.spec(category);
            if vehicles.len() > spec.capacity_per_spot {
                return Err(RestoreError::OverCapacity {
                    spot: number,
                    count: vehicles.len(),
                    capacity: spec.capacity_per_spot,
                });
            }
            if spec.is_multi_spot() {
                block = Some(OpenBlock {
                    owner: vehicles.head.registration().clone(),
                    category,
                    spot: number,
                    remaining: spec.spots_required - 1,
                });
            }
            spots.push(Spot::with_state(number, SpotState::Occupied(vehicles)));
        }

        if let Some(open) = block {
            open.ensure_closed()?;
        }

        tracing::debug!(spots = spots.len(), "restored garage from snapshot");
        Ok(Garage::from_spots(self.name, spots, rules.clone()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum SnapshotVersion {
    #[serde(rename = "1")]
    V1 {
        name: String,
        #[serde(default)]
        spots: Vec<SpotRecord>,
    },
}

impl From<SnapshotVersion> for Snapshot {
    fn from(version: SnapshotVersion) -> Self {
        match version {
            SnapshotVersion::V1 { name, spots } => Self { name, spots },
        }
    }
}

impl From<Snapshot> for SnapshotVersion {
    fn from(snapshot: Snapshot) -> Self {
        let Snapshot { name, spots } = snapshot;
        Self::V1 { name, spots }
    }
}
