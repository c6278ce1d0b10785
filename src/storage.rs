mod price_list;
mod session;
/// The serialized form of a garage.
pub mod snapshot;
mod store;

pub use price_list::{PriceList, PriceListError};
pub use session::{FreshReason, Origin, Persisted, PersistentGarage};
pub use snapshot::{RestoreError, Snapshot, SpotRecord, VehicleRecord};
pub use store::{JsonFileStore, MemoryStore, PersistenceError, SnapshotStore};
