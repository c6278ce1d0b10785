use std::{
    io,
    path::{Path, PathBuf},
};

use crate::domain::CategoryTable;

/// The operator-facing price list.
///
/// The content is free text shown as-is. If the file is missing or empty, a
/// list generated from the category rates is written in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    path: PathBuf,
    content: String,
}

/// Errors raised while reading or writing a [`PriceList`].
#[derive(Debug, thiserror::Error)]
pub enum PriceListError {
    /// The price list exists but could not be read.
    #[error("failed to read price list {path}")]
    Read {
        /// The price list file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The price list could not be written.
    #[error("failed to write price list {path}")]
    Write {
        /// The price list file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl PriceList {
    /// Reads the price list at `path`, creating it from `rules` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if a default list
    /// needs to be written and cannot be.
    pub fn load(path: impl Into<PathBuf>, rules: &CategoryTable) -> Result<Self, PriceListError> {
        let path = path.into();
        let content = read_or_create(&path, rules)?;
        Ok(Self { path, content })
    }

    /// Reads the file again, picking up edits made since it was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or recreated. The previous
    /// content is kept in that case.
    pub fn reload(&mut self, rules: &CategoryTable) -> Result<(), PriceListError> {
        self.content = read_or_create(&self.path, rules)?;
        tracing::debug!(path = %self.path.display(), "reloaded price list");
        Ok(())
    }

    /// The price list text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The file the list is read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The list written when no price list exists yet.
    #[must_use]
    pub fn default_content(rules: &CategoryTable) -> String {
        let rates: String = rules
            .iter()
            .map(|(_, spec)| format!("{}: {} CZK/hour\n", spec.label, spec.hourly_rate))
            .collect();
        format!(
            "# Prague Parking Price List\n\
             # All prices in CZK per started hour\n\
             # First 10 minutes are free\n\n\
             {rates}"
        )
    }

    /// Writes the default list to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn write_default(path: &Path, rules: &CategoryTable) -> Result<(), PriceListError> {
        let write_error = |source| PriceListError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, Self::default_content(rules)).map_err(write_error)
    }
}

fn read_or_create(path: &Path, rules: &CategoryTable) -> Result<String, PriceListError> {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => Ok(content),
        Ok(_) => create(path, rules),
        Err(e) if e.kind() == io::ErrorKind::NotFound => create(path, rules),
        Err(source) => Err(PriceListError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn create(path: &Path, rules: &CategoryTable) -> Result<String, PriceListError> {
    tracing::info!(path = %path.display(), "writing default price list");
    PriceList::write_default(path, rules)?;
    Ok(PriceList::default_content(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VehicleCategory;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config").join("prices.txt");

        let prices = PriceList::load(&path, &CategoryTable::default()).unwrap();

        assert!(prices.content().contains("Car: 20 CZK/hour"));
        assert!(prices.content().contains("Bicycle: 5 CZK/hour"));
        assert!(prices.content().contains("First 10 minutes are free"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), prices.content());
    }

    #[test]
    fn default_list_uses_configured_labels_and_rates() {
        let mut rules = CategoryTable::default();
        let mut spec = VehicleCategory::Bus.default_spec();
        spec.label = "Coach".to_string();
        spec.hourly_rate = 80;
        rules.set(VehicleCategory::Bus, spec).unwrap();

        let content = PriceList::default_content(&rules);

        assert!(content.contains("Coach: 80 CZK/hour"));
        assert!(!content.contains("Bus:"));
    }

    #[test]
    fn existing_file_is_shown_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prices.txt");
        std::fs::write(&path, "Everything is free today\n").unwrap();

        let prices = PriceList::load(&path, &CategoryTable::default()).unwrap();

        assert_eq!(prices.content(), "Everything is free today\n");
    }

    #[test]
    fn reload_picks_up_edits() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prices.txt");
        let rules = CategoryTable::default();
        let mut prices = PriceList::load(&path, &rules).unwrap();

        std::fs::write(&path, "Car: 25 CZK/hour\n").unwrap();
        prices.reload(&rules).unwrap();

        assert_eq!(prices.content(), "Car: 25 CZK/hour\n");
    }

    #[test]
    fn unwritable_location_reports_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-directory");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("prices.txt");

        let error = PriceList::load(&path, &CategoryTable::default()).unwrap_err();

        assert!(matches!(&error, PriceListError::Write { path: p, .. } if *p == path));
        assert!(error.to_string().contains("prices.txt"));
    }

    #[test]
    fn default_list_ends_each_rate_with_a_newline() {
        let content = PriceList::default_content(&CategoryTable::default());

        assert!(content.contains("First 10 minutes are free\n\nCar: 20 CZK/hour\n"));
        assert!(content.ends_with(" CZK/hour\n"));
    }

    #[test]
    fn empty_file_is_replaced_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("prices.txt");
        std::fs::write(&path, "").unwrap();

        let prices = PriceList::load(&path, &CategoryTable::default()).unwrap();

        assert!(prices.content().starts_with("# Prague Parking Price List"));
    }
}
