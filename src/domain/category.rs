use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of vehicle categories the garage accepts.
///
/// Each category carries a fixed registration rule and a default
/// [`CategorySpec`]; the spec can be overridden through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    /// A passenger car. Takes a whole spot.
    #[serde(rename = "CAR")]
    Car,
    /// A motorcycle. Two can share a spot.
    #[serde(rename = "MC")]
    Motorcycle,
    /// A bus. Claims four consecutive spots.
    #[serde(rename = "BUS")]
    Bus,
    /// A bicycle. Five can share a spot.
    #[serde(rename = "BIKE")]
    Bicycle,
}

impl VehicleCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [Self::Car, Self::Motorcycle, Self::Bus, Self::Bicycle];

    /// The short code used in snapshots and on the garage map.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Motorcycle => "MC",
            Self::Bus => "BUS",
            Self::Bicycle => "BIKE",
        }
    }

    /// The human-readable name used when no label is configured.
    #[must_use]
    pub const fn default_label(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Motorcycle => "Motorcycle",
            Self::Bus => "Bus",
            Self::Bicycle => "Bicycle",
        }
    }

    /// The longest registration (in characters) this category accepts.
    #[must_use]
    pub const fn max_registration_len(self) -> usize {
        match self {
            Self::Car | Self::Motorcycle => 10,
            Self::Bus => 12,
            Self::Bicycle => 8,
        }
    }

    /// The built-in rates and spot rules for this category.
    #[must_use]
    pub fn default_spec(self) -> CategorySpec {
        let (hourly_rate, spots_required, capacity_per_spot) = match self {
            Self::Car => (20, 1, 1),
            Self::Motorcycle => (10, 1, 2),
            Self::Bus => (50, 4, 1),
            Self::Bicycle => (5, 1, 5),
        };
        CategorySpec {
            label: self.default_label().to_string(),
            hourly_rate,
            spots_required,
            capacity_per_spot,
        }
    }

    /// Looks up a category by its short code (`CAR`, `MC`, `BUS`, `BIKE`).
    ///
    /// Matching is case-insensitive.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_label())
    }
}

impl FromStr for VehicleCategory {
    type Err = UnknownCategory;

    /// Accepts either the short code or the default label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_code(s)
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|category| category.default_label().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Error returned when a string names no known vehicle category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vehicle category '{0}'")]
pub struct UnknownCategory(String);

/// Rates and spot rules for one vehicle category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpec {
    /// Name shown to operators.
    pub label: String,
    /// Price per started hour, in whole currency units.
    pub hourly_rate: u32,
    /// How many consecutive spots one vehicle claims.
    pub spots_required: usize,
    /// How many vehicles of this category may share one spot.
    pub capacity_per_spot: usize,
}

impl CategorySpec {
    /// Whether more than one vehicle of this category fits in a spot.
    #[must_use]
    pub const fn is_shareable(&self) -> bool {
        self.capacity_per_spot > 1
    }

    /// Whether one vehicle of this category claims a block of spots.
    #[must_use]
    pub const fn is_multi_spot(&self) -> bool {
        self.spots_required > 1
    }

    /// Checks that the spec describes a placeable vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec requires no spots, fits no vehicles, or
    /// claims several spots while also sharing them.
    pub const fn validate(&self, category: VehicleCategory) -> Result<(), InvalidCategorySpec> {
        if self.spots_required == 0 {
            return Err(InvalidCategorySpec::NoSpots(category));
        }
        if self.capacity_per_spot == 0 {
            return Err(InvalidCategorySpec::NoCapacity(category));
        }
        if self.is_multi_spot() && self.is_shareable() {
            return Err(InvalidCategorySpec::SharedBlock {
                category,
                spots_required: self.spots_required,
                capacity_per_spot: self.capacity_per_spot,
            });
        }
        Ok(())
    }
}

/// Errors describing an unusable [`CategorySpec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCategorySpec {
    /// The category claims zero spots.
    #[error("{0} must require at least one spot")]
    NoSpots(VehicleCategory),

    /// The category fits zero vehicles per spot.
    #[error("{0} must fit at least one vehicle per spot")]
    NoCapacity(VehicleCategory),

    /// A multi-spot category was configured to share its spots.
    #[error(
        "{category} claims {spots_required} spots and cannot share them \
         (capacity_per_spot = {capacity_per_spot})"
    )]
    SharedBlock {
        /// The offending category.
        category: VehicleCategory,
        /// Configured spots per vehicle.
        spots_required: usize,
        /// Configured vehicles per spot.
        capacity_per_spot: usize,
    },
}

/// The rule table for every category.
///
/// Defaults to [`VehicleCategory::default_spec`] for each category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    car: CategorySpec,
    motorcycle: CategorySpec,
    bus: CategorySpec,
    bicycle: CategorySpec,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            car: VehicleCategory::Car.default_spec(),
            motorcycle: VehicleCategory::Motorcycle.default_spec(),
            bus: VehicleCategory::Bus.default_spec(),
            bicycle: VehicleCategory::Bicycle.default_spec(),
        }
    }
}

impl CategoryTable {
    /// Returns the spec for a category.
    #[must_use]
    pub const fn spec(&self, category: VehicleCategory) -> &CategorySpec {
        match category {
            VehicleCategory::Car => &self.car,
            VehicleCategory::Motorcycle => &self.motorcycle,
            VehicleCategory::Bus => &self.bus,
            VehicleCategory::Bicycle => &self.bicycle,
        }
    }

    /// Replaces the spec for a category.
    ///
    /// # Errors
    ///
    /// Returns an error (and leaves the table unchanged) if the spec fails
    /// [`CategorySpec::validate`].
    pub fn set(
        &mut self,
        category: VehicleCategory,
        spec: CategorySpec,
    ) -> Result<(), InvalidCategorySpec> {
        spec.validate(category)?;
        let slot = match category {
            VehicleCategory::Car => &mut self.car,
            VehicleCategory::Motorcycle => &mut self.motorcycle,
            VehicleCategory::Bus => &mut self.bus,
            VehicleCategory::Bicycle => &mut self.bicycle,
        };
        *slot = spec;
        Ok(())
    }

    /// Iterates over every category with its spec, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (VehicleCategory, &CategorySpec)> {
        VehicleCategory::ALL
            .into_iter()
            .map(move |category| (category, self.spec(category)))
    }

    /// Resolves an operator-supplied name to a category.
    ///
    /// Accepts the short code, the configured label or the default label,
    /// ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<VehicleCategory> {
        let name = name.trim();
        self.iter()
            .find(|(_, spec)| spec.label.eq_ignore_ascii_case(name))
            .map(|(category, _)| category)
            .or_else(|| name.parse().ok())
    }

    /// The configured label for a category.
    #[must_use]
    pub fn label(&self, category: VehicleCategory) -> &str {
        &self.spec(category).label
    }
}
