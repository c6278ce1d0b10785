use std::fmt;

use nonempty::NonEmpty;

use crate::domain::{CategoryTable, Registration, Vehicle, VehicleCategory};

/// Map glyph for a spot with nothing in it.
pub const GLYPH_EMPTY: char = '□';
/// Map glyph for a shared spot with room left.
pub const GLYPH_PARTIAL: char = '◐';
/// Map glyph for a full or blocked spot.
pub const GLYPH_FULL: char = '■';

/// What a spot currently holds.
///
/// Occupied and blocked are mutually exclusive: a spot claimed as part of a
/// multi-spot vehicle's block never holds vehicles of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotState {
    /// Nothing parked, not claimed.
    Empty,
    /// One or more vehicles, all of the same category.
    Occupied(NonEmpty<Vehicle>),
    /// A secondary spot of a multi-spot vehicle parked at a lower spot.
    Blocked {
        /// Registration of the vehicle that claimed this spot.
        owner: Registration,
        /// Category of that vehicle.
        category: VehicleCategory,
    },
}

/// A numbered parking spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    number: usize,
    state: SpotState,
}

impl Spot {
    /// Creates an empty spot.
    #[must_use]
    pub const fn new(number: usize) -> Self {
        Self {
            number,
            state: SpotState::Empty,
        }
    }

    pub(crate) const fn with_state(number: usize, state: SpotState) -> Self {
        Self { number, state }
    }

    /// The spot's number, starting at 1.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.number
    }

    /// The spot's current contents.
    #[must_use]
    pub const fn state(&self) -> &SpotState {
        &self.state
    }

    /// True if nothing is parked here and the spot is not blocked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.state, SpotState::Empty)
    }

    /// True if the spot is a secondary block of a multi-spot vehicle.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self.state, SpotState::Blocked { .. })
    }

    /// True if the spot is a secondary block claimed by `registration`.
    #[must_use]
    pub fn is_blocked_by(&self, registration: &str) -> bool {
        matches!(&self.state, SpotState::Blocked { owner, .. } if owner.matches(registration))
    }

    /// The registration that claimed this spot as a secondary block.
    #[must_use]
    pub const fn block_owner(&self) -> Option<&Registration> {
        match &self.state {
            SpotState::Blocked { owner, .. } => Some(owner),
            _ => None,
        }
    }

    /// The vehicles parked here, in arrival order.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        let occupants = match &self.state {
            SpotState::Occupied(vehicles) => Some(vehicles.iter()),
            _ => None,
        };
        occupants.into_iter().flatten()
    }

    /// Number of vehicles parked here.
    #[must_use]
    pub fn occupant_count(&self) -> usize {
        match &self.state {
            SpotState::Occupied(vehicles) => vehicles.len(),
            _ => 0,
        }
    }

    /// The category of the vehicles parked here, if any.
    #[must_use]
    pub const fn category(&self) -> Option<VehicleCategory> {
        match &self.state {
            SpotState::Occupied(vehicles) => Some(vehicles.head.category()),
            _ => None,
        }
    }

    /// How many vehicles this spot holds in its current state.
    ///
    /// An empty spot reports 1; an occupied spot reports its category's
    /// sharing capacity; a blocked spot reports 0.
    #[must_use]
    pub fn capacity(&self, rules: &CategoryTable) -> usize {
        match &self.state {
            SpotState::Empty => 1,
            SpotState::Occupied(vehicles) => {
                rules.spec(vehicles.head.category()).capacity_per_spot
            }
            SpotState::Blocked { .. } => 0,
        }
    }

    /// Room left for more vehicles.
    #[must_use]
    pub fn remaining(&self, rules: &CategoryTable) -> usize {
        self.capacity(rules).saturating_sub(self.occupant_count())
    }

    /// True if at least one more vehicle could be parked here.
    #[must_use]
    pub fn is_available(&self, rules: &CategoryTable) -> bool {
        self.remaining(rules) > 0
    }

    /// Whether `vehicle` could be parked here right now.
    ///
    /// Blocked spots accept nothing and empty spots accept anything. An
    /// occupied spot only accepts another vehicle of the same, shareable
    /// category while there is room.
    #[must_use]
    pub fn can_accept(&self, vehicle: &Vehicle, rules: &CategoryTable) -> bool {
        match &self.state {
            SpotState::Empty => true,
            SpotState::Blocked { .. } => false,
            SpotState::Occupied(vehicles) => {
                let category = vehicles.head.category();
                let spec = rules.spec(category);
                category == vehicle.category()
                    && spec.is_shareable()
                    && !spec.is_multi_spot()
                    && vehicles.len() < spec.capacity_per_spot
            }
        }
    }

    /// Parks a vehicle here.
    ///
    /// # Errors
    ///
    /// Returns the vehicle inside [`SpotFull`] if [`Self::can_accept`] is
    /// false. The spot is left unchanged.
    pub fn park(&mut self, vehicle: Vehicle, rules: &CategoryTable) -> Result<(), SpotFull> {
        if !self.can_accept(&vehicle, rules) {
            return Err(SpotFull {
                spot: self.number,
                vehicle,
            });
        }
        match &mut self.state {
            SpotState::Occupied(vehicles) => vehicles.push(vehicle),
            state => *state = SpotState::Occupied(NonEmpty::new(vehicle)),
        }
        Ok(())
    }

    /// Removes and returns the vehicle with a matching registration.
    ///
    /// Matching is case-insensitive.
    pub fn remove(&mut self, registration: &str) -> Option<Vehicle> {
        let vehicles = match std::mem::replace(&mut self.state, SpotState::Empty) {
            SpotState::Occupied(vehicles) => vehicles,
            other => {
                self.state = other;
                return None;
            }
        };
        let mut remaining = Vec::from(vehicles);
        let position = remaining
            .iter()
            .position(|vehicle| vehicle.registration().matches(registration));
        let removed = position.map(|position| remaining.remove(position));
        self.state = NonEmpty::from_vec(remaining).map_or(SpotState::Empty, SpotState::Occupied);
        removed
    }

    /// Finds the vehicle with a matching registration.
    #[must_use]
    pub fn find(&self, registration: &str) -> Option<&Vehicle> {
        self.vehicles()
            .find(|vehicle| vehicle.registration().matches(registration))
    }

    /// Claims this spot as a secondary block of `owner`.
    ///
    /// Returns `false` and leaves the spot unchanged unless it is empty.
    pub fn mark_secondary_block(&mut self, owner: Registration, category: VehicleCategory) -> bool {
        if !self.is_empty() {
            return false;
        }
        self.state = SpotState::Blocked { owner, category };
        true
    }

    /// Releases a secondary block claimed by `owner`.
    ///
    /// A block claimed by a different registration is left in place.
    /// Returns `true` if the block was released.
    pub fn clear_secondary_block(&mut self, owner: &str) -> bool {
        if !self.is_blocked_by(owner) {
            return false;
        }
        self.state = SpotState::Empty;
        true
    }

    /// Status glyph: empty, partially occupied, or full/blocked.
    #[must_use]
    pub fn glyph(&self, rules: &CategoryTable) -> char {
        match &self.state {
            SpotState::Empty => GLYPH_EMPTY,
            SpotState::Blocked { .. } => GLYPH_FULL,
            SpotState::Occupied(_) if self.is_available(rules) => GLYPH_PARTIAL,
            SpotState::Occupied(_) => GLYPH_FULL,
        }
    }

    /// Registration column of the detailed map.
    ///
    /// `Empty`, the single registration, `REG(+n)` when `n` more vehicles
    /// share the spot, or `Label:REG` for a secondary block.
    #[must_use]
    pub fn registration_summary(&self, rules: &CategoryTable) -> String {
        match &self.state {
            SpotState::Empty => "Empty".to_string(),
            SpotState::Blocked { owner, category } => {
                format!("{}:{owner}", rules.label(*category))
            }
            SpotState::Occupied(vehicles) if vehicles.len() == 1 => {
                vehicles.head.registration().to_string()
            }
            SpotState::Occupied(vehicles) => {
                format!("{}(+{})", vehicles.head.registration(), vehicles.len() - 1)
            }
        }
    }

    /// Category column of the detailed map.
    ///
    /// `---` when empty, the category code, or `CODExN` when `N` vehicles
    /// share the spot. Blocks show their owner's code.
    #[must_use]
    pub fn category_summary(&self) -> String {
        match &self.state {
            SpotState::Empty => "---".to_string(),
            SpotState::Blocked { category, .. } => category.code().to_string(),
            SpotState::Occupied(vehicles) if vehicles.len() == 1 => {
                vehicles.head.category().code().to_string()
            }
            SpotState::Occupied(vehicles) => {
                format!("{}x{}", vehicles.head.category().code(), vehicles.len())
            }
        }
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            SpotState::Empty => f.write_str("Empty"),
            SpotState::Blocked { owner, .. } => write!(f, "Blocked by {owner}"),
            SpotState::Occupied(vehicles) => {
                for (i, vehicle) in vehicles.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{vehicle}")?;
                }
                Ok(())
            }
        }
    }
}

/// Error returned when a vehicle does not fit in a spot.
///
/// Carries the rejected vehicle so the caller can place it elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("spot {spot} cannot accept {vehicle}")]
pub struct SpotFull {
    spot: usize,
    vehicle: Vehicle,
}

impl SpotFull {
    /// The spot that refused the vehicle.
    #[must_use]
    pub const fn spot(&self) -> usize {
        self.spot
    }

    /// Takes back the rejected vehicle.
    #[must_use]
    pub fn into_vehicle(self) -> Vehicle {
        self.vehicle
    }
}
