//! Parks and picks up vehicles in a large, partly filled garage, and saves
//! its state through the file store.

#![allow(missing_docs)]

use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use garage::{Garage, JsonFileStore, Snapshot, SnapshotStore, VehicleCategory};
use tempfile::TempDir;

const SPOTS: usize = 1_000;

/// Fills every other spot with a car so multi-spot searches have to scan.
fn preseed_garage() -> Garage {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let mut garage = Garage::new(SPOTS);
    for i in 0..SPOTS / 2 {
        garage.park(VehicleCategory::Car, &format!("C{i}"), now).unwrap();
    }
    for i in (0..SPOTS / 2).step_by(2) {
        garage.remove(&format!("C{i}"), now).unwrap();
    }
    garage
}

fn park_and_pickup(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    c.bench_function("park and pick up mixed vehicles", |b| {
        b.iter_batched(
            preseed_garage,
            |mut garage| {
                garage.park(VehicleCategory::Bus, "BUS001", now).unwrap();
                garage.park(VehicleCategory::Motorcycle, "MC1", now).unwrap();
                garage.park(VehicleCategory::Bicycle, "bike1", now).unwrap();
                let later = now + TimeDelta::hours(2);
                for registration in ["BUS001", "MC1", "bike1"] {
                    garage.remove(registration, later).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn save_snapshot(c: &mut Criterion) {
    let garage = preseed_garage();

    c.bench_function("save snapshot", |b| {
        b.iter_batched(
            || {
                let tmp_dir = TempDir::new().unwrap();
                let store = JsonFileStore::new(tmp_dir.path().join("garage.json"));
                (tmp_dir, store)
            },
            |(_tmp_dir, mut store)| {
                store.save(&Snapshot::from(&garage)).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, park_and_pickup, save_snapshot);
criterion_main!(benches);
