use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::{
    CategorySpec, CategoryTable, InvalidCategorySpec, VehicleCategory, garage::DEFAULT_NAME,
};

/// Configuration for a garage.
///
/// Controls the garage's size, where its state and price list live, and the
/// rates and spot rules of each vehicle category. Every key is optional; a
/// missing key takes its built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// Name shown in status output.
    pub name: String,

    /// Number of spots. Fixed once the garage is initialized.
    spots: usize,

    /// The price list file, relative to the garage directory.
    pub price_list: PathBuf,

    /// The snapshot file, relative to the garage directory.
    pub snapshot: PathBuf,

    /// Per-category rates and spot rules.
    categories: CategoryTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            spots: default_spots(),
            price_list: default_price_list(),
            snapshot: default_snapshot(),
            categories: CategoryTable::default(),
        }
    }
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not a valid configuration.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write config file {path}")]
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// A configuration value that describes an unusable garage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfig {
    /// The garage would have no spots.
    #[error("a garage needs at least one spot")]
    NoSpots,

    /// A category override is inconsistent.
    #[error(transparent)]
    Category(#[from] InvalidCategorySpec),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if its content is not a
    /// valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the configuration, falling back to the defaults if the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            result => result,
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the number of spots.
    #[must_use]
    pub const fn spots(&self) -> usize {
        self.spots
    }

    /// Sets the number of spots.
    ///
    /// # Errors
    ///
    /// Returns an error if `spots` is zero.
    pub const fn set_spots(&mut self, spots: usize) -> Result<(), InvalidConfig> {
        if spots == 0 {
            return Err(InvalidConfig::NoSpots);
        }
        self.spots = spots;
        Ok(())
    }

    /// Returns the category rules.
    #[must_use]
    pub const fn categories(&self) -> &CategoryTable {
        &self.categories
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

const fn default_spots() -> usize {
    100
}

fn default_price_list() -> PathBuf {
    PathBuf::from("prices.txt")
}

fn default_snapshot() -> PathBuf {
    PathBuf::from("garage.json")
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_name")]
        name: String,

        #[serde(default = "default_spots")]
        spots: usize,

        #[serde(default = "default_price_list")]
        price_list: PathBuf,

        #[serde(default = "default_snapshot")]
        snapshot: PathBuf,

        #[serde(default)]
        categories: Categories,
    },
}

/// Category tables, one per vehicle category. Omitted tables keep the
/// built-in rules.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Categories {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    car: Option<CategoryOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    motorcycle: Option<CategoryOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bus: Option<CategoryOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bicycle: Option<CategoryOverride>,
}

impl Categories {
    const fn get(&self, category: VehicleCategory) -> Option<&CategoryOverride> {
        match category {
            VehicleCategory::Car => self.car.as_ref(),
            VehicleCategory::Motorcycle => self.motorcycle.as_ref(),
            VehicleCategory::Bus => self.bus.as_ref(),
            VehicleCategory::Bicycle => self.bicycle.as_ref(),
        }
    }

    fn resolve(&self) -> Result<CategoryTable, InvalidCategorySpec> {
        let mut table = CategoryTable::default();
        for category in VehicleCategory::ALL {
            if let Some(overrides) = self.get(category) {
                table.set(category, overrides.apply(category.default_spec()))?;
            }
        }
        Ok(table)
    }
}

impl From<&CategoryTable> for Categories {
    fn from(table: &CategoryTable) -> Self {
        let full = |category| Some(CategoryOverride::from(table.spec(category)));
        Self {
            car: full(VehicleCategory::Car),
            motorcycle: full(VehicleCategory::Motorcycle),
            bus: full(VehicleCategory::Bus),
            bicycle: full(VehicleCategory::Bicycle),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hourly_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spots_required: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity_per_spot: Option<usize>,
}

impl CategoryOverride {
    fn apply(&self, base: CategorySpec) -> CategorySpec {
        CategorySpec {
            label: self.label.clone().unwrap_or(base.label),
            hourly_rate: self.hourly_rate.unwrap_or(base.hourly_rate),
            spots_required: self.spots_required.unwrap_or(base.spots_required),
            capacity_per_spot: self.capacity_per_spot.unwrap_or(base.capacity_per_spot),
        }
    }
}

impl From<&CategorySpec> for CategoryOverride {
    fn from(spec: &CategorySpec) -> Self {
        Self {
            label: Some(spec.label.clone()),
            hourly_rate: Some(spec.hourly_rate),
            spots_required: Some(spec.spots_required),
            capacity_per_spot: Some(spec.capacity_per_spot),
        }
    }
}

impl TryFrom<Versions> for Config {
    type Error = InvalidConfig;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                name,
                spots,
                price_list,
                snapshot,
                categories,
            } => {
                let mut config = Self {
                    name,
                    spots: default_spots(),
                    price_list,
                    snapshot,
                    categories: categories.resolve()?,
                };
                config.set_spots(spots)?;
                Ok(config)
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            categories: Categories::from(&config.categories),
            name: config.name,
            spots: config.spots,
            price_list: config.price_list,
            snapshot: config.snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nname = \"Old Town\"\nspots = 40\n\n[categories.motorcycle]\nlabel = \"Moped\"\nhourly_rate = 15\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.name, "Old Town");
        assert_eq!(config.spots(), 40);
        let motorcycle = config.categories().spec(VehicleCategory::Motorcycle);
        assert_eq!(motorcycle.label, "Moped");
        assert_eq!(motorcycle.hourly_rate, 15);
        assert_eq!(motorcycle.capacity_per_spot, 2);
        assert_eq!(
            config.categories().spec(VehicleCategory::Car),
            &VehicleCategory::Car.default_spec()
        );
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("config.toml");

        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nspots = \"many\"\n").unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_spots_is_rejected() {
        let result: Result<Config, _> = toml::from_str("_version = \"1\"\nspots = 0\n");
        assert!(result.is_err());

        let mut config = Config::default();
        assert_eq!(config.set_spots(0), Err(InvalidConfig::NoSpots));
        assert_eq!(config.spots(), 100);
    }

    #[test]
    fn shared_multi_spot_category_is_rejected() {
        let result: Result<Config, _> =
            toml::from_str("_version = \"1\"\n[categories.bus]\ncapacity_per_spot = 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config: Config =
            toml::from_str("_version = \"1\"\n[categories.bicycle]\ncapacity_per_spot = 8\n")
                .unwrap();
        config.set_spots(25).unwrap();

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(
            loaded
                .categories()
                .spec(VehicleCategory::Bicycle)
                .capacity_per_spot,
            8
        );
    }

    #[test]
    fn empty_file_returns_default() {
        // Tests that deserialising an empty file returns the default configuration.
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
