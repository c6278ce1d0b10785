use chrono::{DateTime, Utc};

use crate::{
    domain::{Config, Departure, Garage, GarageError, Placement, Relocation, VehicleCategory},
    storage::{PersistenceError, RestoreError, Snapshot, SnapshotStore},
};

/// A garage bound to the store it is saved to.
///
/// Every successful mutation is followed by a save. A failed save does not
/// undo the mutation: the in-memory garage stays authoritative and the save
/// error is handed back next to the outcome.
///
/// A stored snapshot that cannot be used is moved aside before the garage
/// starts fresh. If that fails, saving is refused until [`Self::initialize`]
/// so the unusable data is never overwritten.
#[derive(Debug)]
pub struct PersistentGarage<S> {
    garage: Garage,
    store: S,
    origin: Origin,
    protected: bool,
}

/// Where a [`PersistentGarage`]'s state came from.
#[derive(Debug)]
pub enum Origin {
    /// Restored from the store's snapshot.
    Restored,
    /// Created empty from the configuration.
    Fresh(FreshReason),
}

/// Why a [`PersistentGarage`] started empty.
#[derive(Debug)]
pub enum FreshReason {
    /// The store held no snapshot.
    NoSnapshot,
    /// The snapshot held no spots.
    EmptySnapshot,
    /// The snapshot could not be read.
    Unreadable(PersistenceError),
    /// The snapshot describes an impossible garage.
    Invalid(RestoreError),
}

/// The outcome of a mutation together with the result of saving it.
#[derive(Debug)]
#[must_use]
pub struct Persisted<T> {
    /// What the garage reported.
    pub outcome: T,
    /// Whether the new state reached the store.
    pub saved: Result<(), PersistenceError>,
}

impl<S: SnapshotStore> PersistentGarage<S> {
    /// Opens the garage saved in `store`.
    ///
    /// Falls back to an empty garage built from `config` when the store has
    /// nothing usable. This never fails; [`Self::origin`] says which path was
    /// taken.
    #[must_use]
    pub fn open(mut store: S, config: &Config) -> Self {
        let restored = match store.load() {
            Ok(Some(snapshot)) => snapshot
                .restore(config.categories())
                .map_err(|e| match e {
                    RestoreError::Empty => FreshReason::EmptySnapshot,
                    e => FreshReason::Invalid(e),
                }),
            Ok(None) => Err(FreshReason::NoSnapshot),
            Err(e) => Err(FreshReason::Unreadable(e)),
        };

        let (garage, origin, protected) = match restored {
            Ok(garage) => {
                tracing::debug!(spots = garage.total_spots_count(), "restored saved garage");
                (garage, Origin::Restored, false)
            }
            Err(reason) => {
                let protected = match &reason {
                    FreshReason::NoSnapshot | FreshReason::EmptySnapshot => {
                        tracing::debug!("no saved garage, starting fresh");
                        false
                    }
                    FreshReason::Unreadable(e) => {
                        tracing::warn!("could not read saved garage, starting fresh: {e}");
                        !set_aside(&mut store)
                    }
                    FreshReason::Invalid(e) => {
                        tracing::warn!("saved garage is invalid, starting fresh: {e}");
                        !set_aside(&mut store)
                    }
                };
                (Garage::from_config(config), Origin::Fresh(reason), protected)
            }
        };

        Self {
            garage,
            store,
            origin,
            protected,
        }
    }

    /// The garage.
    #[must_use]
    pub const fn garage(&self) -> &Garage {
        &self.garage
    }

    /// Where the garage's state came from.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Parks a vehicle and saves. See [`Garage::park`].
    ///
    /// # Errors
    ///
    /// Returns the garage's error; nothing is saved in that case.
    pub fn park(
        &mut self,
        category: VehicleCategory,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Persisted<Placement>, GarageError> {
        let outcome = self.garage.park(category, registration, now)?;
        Ok(self.persist(outcome))
    }

    /// Removes a vehicle and saves. See [`Garage::remove`].
    ///
    /// # Errors
    ///
    /// Returns the garage's error; nothing is saved in that case.
    pub fn remove(
        &mut self,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Persisted<Departure>, GarageError> {
        let outcome = self.garage.remove(registration, now)?;
        Ok(self.persist(outcome))
    }

    /// Moves a vehicle and saves. See [`Garage::relocate`].
    ///
    /// # Errors
    ///
    /// Returns the garage's error; nothing is saved in that case.
    pub fn relocate(
        &mut self,
        registration: &str,
        target: usize,
    ) -> Result<Persisted<Relocation>, GarageError> {
        let outcome = self.garage.relocate(registration, target)?;
        Ok(self.persist(outcome))
    }

    /// Replaces the garage with `spot_count` empty spots and saves.
    ///
    /// This lifts any refusal to save left by an unusable snapshot.
    pub fn initialize(&mut self, spot_count: usize) -> Persisted<()> {
        self.garage.initialize(spot_count);
        self.protected = false;
        self.persist(())
    }

    /// Saves the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written, or
    /// [`PersistenceError::Protected`] if an unusable snapshot could not be
    /// moved aside when the garage was opened.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        if self.protected {
            return Err(PersistenceError::Protected);
        }
        self.store.save(&Snapshot::from(&self.garage))
    }

    /// Releases the garage and its store.
    #[must_use]
    pub fn into_parts(self) -> (Garage, S) {
        (self.garage, self.store)
    }

    fn persist<T>(&mut self, outcome: T) -> Persisted<T> {
        let saved = self.save();
        if let Err(e) = &saved {
            tracing::error!("failed to save garage: {e}");
        }
        Persisted { outcome, saved }
    }
}

/// Moves an unusable snapshot aside, returning whether that worked.
fn set_aside(store: &mut impl SnapshotStore) -> bool {
    match store.set_aside() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{e}: saving is disabled until the garage is reinitialized");
            false
        }
    }
}
