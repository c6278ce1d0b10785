use std::path::{Path, PathBuf};

mod init;
mod map;
mod menu;
mod prices;
mod status;
mod terminal;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use clap::ArgAction;
use garage::{
    Config, JsonFileStore, PersistentGarage, VehicleCategory,
    storage::{FreshReason, Origin, PersistenceError, Persisted},
};
use terminal::Colorize;
use tracing::instrument;

/// Name of the configuration file inside the garage directory.
const CONFIG_FILE: &str = "config.toml";

/// Currency shown next to fees.
const CURRENCY: &str = "CZK";

/// Shown when an unusable snapshot was moved aside.
const SET_ASIDE_NOTE: &str =
    "The old snapshot was kept with a .rejected suffix; fix it or the config to restore it.";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The garage directory, holding config.toml, the price list and the
    /// saved state
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(status::Command::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show occupancy (default)
    Status(status::Command),

    /// Create a garage directory with a default config and price list
    Init(init::Command),

    /// Park a vehicle at the first spot that fits
    Park(Park),

    /// Pick up a vehicle and show its fee
    Pickup(Pickup),

    /// Move a vehicle to another spot
    ///
    /// Vehicles that occupy several spots cannot be moved.
    Move(Move),

    /// Find a vehicle by registration
    Find(Find),

    /// Show the parking map
    Map(map::Command),

    /// Show the price list
    Prices(prices::Command),

    /// Run the interactive operator menu
    Menu,
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(root)?,
            Self::Status(command) => command.run(&Session::open(root)?)?,
            Self::Park(command) => command.run(&mut Session::open(root)?)?,
            Self::Pickup(command) => command.run(&mut Session::open(root)?)?,
            Self::Move(command) => command.run(&mut Session::open(root)?)?,
            Self::Find(command) => command.run(&Session::open(root)?)?,
            Self::Map(command) => command.run(&Session::open(root)?),
            Self::Prices(command) => command.run(&Session::open(root)?)?,
            Self::Menu => menu::run(Session::open(root)?)?,
        }
        Ok(())
    }
}

/// The garage directory opened for one command or one menu session.
#[derive(Debug)]
pub struct Session {
    root: PathBuf,
    config: Config,
    garage: PersistentGarage<JsonFileStore>,
}

impl Session {
    fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load_or_default(&root.join(CONFIG_FILE))
            .with_context(|| format!("failed to load configuration from {}", root.display()))?;
        let store = JsonFileStore::new(root.join(&config.snapshot));
        let garage = PersistentGarage::open(store, &config);

        match garage.origin() {
            Origin::Fresh(FreshReason::Unreadable(e)) => {
                eprintln!("{}", format!("Saved state unreadable, starting empty: {e}").warning());
                eprintln!("{}", SET_ASIDE_NOTE.warning());
            }
            Origin::Fresh(FreshReason::Invalid(e)) => {
                eprintln!("{}", format!("Saved state invalid, starting empty: {e}").warning());
                eprintln!("{}", SET_ASIDE_NOTE.warning());
            }
            _ => {}
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            garage,
        })
    }

    fn price_list_path(&self) -> PathBuf {
        self.root.join(&self.config.price_list)
    }

    fn category(&self, name: &str) -> anyhow::Result<VehicleCategory> {
        let categories = self.config.categories();
        categories.find_by_name(name).with_context(|| {
            let known: Vec<_> = categories.iter().map(|(_, spec)| spec.label.as_str()).collect();
            format!("unknown vehicle category '{name}' (expected one of: {})", known.join(", "))
        })
    }

    fn label(&self, category: VehicleCategory) -> &str {
        self.config.categories().label(category)
    }
}

/// Warns when a change was applied but could not be written to disk.
fn report_save(saved: &Result<(), PersistenceError>) {
    if let Err(e) = saved {
        eprintln!("{}", format!("Warning: change not saved: {e}").warning());
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[derive(Debug, clap::Parser)]
pub struct Park {
    /// The vehicle category: a code (CAR, MC, BUS, BIKE) or a label
    category: String,

    /// The registration number
    registration: String,
}

impl Park {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let category = session.category(&self.category)?;
        let registration = self.registration.trim();

        let Persisted { outcome, saved } =
            session.garage.park(category, registration, Utc::now())?;

        let label = session.label(category);
        println!(
            "{}",
            format!("Parked {label} {registration} at spot {}", outcome.spot).success()
        );
        if outcome.spots > 1 {
            println!(
                "{}",
                format!("Occupies spots {} to {}", outcome.spot, outcome.last_spot()).info()
            );
        }
        println!("Arrival: {}", format_time(outcome.arrival));
        report_save(&saved);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Pickup {
    /// The registration number
    registration: String,
}

impl Pickup {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let Persisted { outcome, saved } = session
            .garage
            .remove(self.registration.trim(), Utc::now())?;

        println!(
            "{}",
            format!(
                "{} picked up from spot {}",
                outcome.vehicle.registration(),
                outcome.spot
            )
            .success()
        );
        println!("Arrived:  {}", format_time(outcome.vehicle.arrival()));
        println!("Duration: {}", outcome.duration);
        println!("Fee:      {} {CURRENCY}", outcome.fee);
        report_save(&saved);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Move {
    /// The registration number
    registration: String,

    /// The spot to move the vehicle to
    spot: usize,
}

impl Move {
    #[instrument(skip(session))]
    fn run(self, session: &mut Session) -> anyhow::Result<()> {
        let registration = self.registration.trim();
        let Persisted { outcome, saved } = session.garage.relocate(registration, self.spot)?;

        if outcome.from == outcome.to {
            println!("{registration} is already at spot {}", outcome.to);
        } else {
            println!(
                "{}",
                format!(
                    "Moved {registration} from spot {} to spot {}",
                    outcome.from, outcome.to
                )
                .success()
            );
        }
        report_save(&saved);
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Find {
    /// The registration number
    registration: String,
}

impl Find {
    #[instrument(skip(session))]
    fn run(self, session: &Session) -> anyhow::Result<()> {
        let registration = self.registration.trim();
        let garage = session.garage.garage();
        let Some(located) = garage.find(registration) else {
            anyhow::bail!("vehicle {registration} not found");
        };

        let vehicle = located.vehicle;
        let now = Utc::now();
        println!(
            "{} ({}) is at spot {}",
            vehicle.registration(),
            session.label(vehicle.category()),
            located.spot
        );
        println!("Arrived:     {}", format_time(vehicle.arrival()));
        println!("Parked for:  {}", vehicle.parking_duration(now));
        println!(
            "Fee so far:  {} {CURRENCY}",
            vehicle.fee(garage.rules(), now)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use garage::{Config, Snapshot, SnapshotStore};
    use tempfile::tempdir;

    use super::*;

    fn session(root: &Path) -> Session {
        let mut config = Config::default();
        config.set_spots(10).unwrap();
        config.save(&root.join(CONFIG_FILE)).unwrap();
        Session::open(root).unwrap()
    }

    fn park(session: &mut Session, category: &str, registration: &str) {
        Park {
            category: category.to_string(),
            registration: registration.to_string(),
        }
        .run(session)
        .expect("park should succeed");
    }

    #[test]
    fn park_saves_to_snapshot_file() {
        let tmp = tempdir().unwrap();
        let mut session = session(tmp.path());

        park(&mut session, "bus", "BUS001");

        let stored = JsonFileStore::new(tmp.path().join("garage.json"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(stored.spots.len(), 10);
        assert_eq!(stored.spots[0].vehicles[0].registration, "BUS001");
        assert!(stored.spots[3].secondary_block);
    }

    #[test]
    fn park_accepts_category_labels_and_codes() {
        let tmp = tempdir().unwrap();
        let mut session = session(tmp.path());

        park(&mut session, "Motorcycle", "MC1");
        park(&mut session, "mc", "MC2");

        let garage = session.garage.garage();
        assert_eq!(garage.find("MC1").unwrap().spot, 1);
        assert_eq!(garage.find("MC2").unwrap().spot, 1);
    }

    #[test]
    fn park_rejects_unknown_category() {
        let tmp = tempdir().unwrap();
        let mut session = session(tmp.path());

        let error = Park {
            category: "tractor".to_string(),
            registration: "AB1".to_string(),
        }
        .run(&mut session)
        .unwrap_err();

        assert!(error.to_string().contains("unknown vehicle category 'tractor'"));
    }

    #[test]
    fn state_survives_between_sessions() {
        let tmp = tempdir().unwrap();
        park(&mut session(tmp.path()), "car", "AB123");

        let mut reopened = Session::open(tmp.path()).unwrap();
        Move {
            registration: "ab123".to_string(),
            spot: 4,
        }
        .run(&mut reopened)
        .unwrap();

        let reopened = Session::open(tmp.path()).unwrap();
        assert_eq!(reopened.garage.garage().find("AB123").unwrap().spot, 4);
    }

    #[test]
    fn pickup_removes_vehicle() {
        let tmp = tempdir().unwrap();
        let mut session = session(tmp.path());
        park(&mut session, "car", "AB123");

        Pickup {
            registration: " AB123 ".to_string(),
        }
        .run(&mut session)
        .unwrap();

        assert!(session.garage.garage().find("AB123").is_none());
        assert_eq!(session.garage.garage().available_spots_count(), 10);
    }

    #[test]
    fn find_missing_vehicle_is_an_error() {
        let tmp = tempdir().unwrap();
        let session = session(tmp.path());

        let error = Find {
            registration: "ZZ9".to_string(),
        }
        .run(&session)
        .unwrap_err();

        assert_eq!(error.to_string(), "vehicle ZZ9 not found");
    }

    #[test]
    fn corrupt_snapshot_opens_empty_garage() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("garage.json"), "not json").unwrap();

        let session = Session::open(tmp.path()).unwrap();

        assert_eq!(session.garage.garage().total_spots_count(), 100);
        let kept = std::fs::read_to_string(tmp.path().join("garage.json.rejected")).unwrap();
        assert_eq!(kept, "not json");
    }

    #[test]
    fn restored_garage_ignores_configured_size() {
        let tmp = tempdir().unwrap();
        let mut store = JsonFileStore::new(tmp.path().join("garage.json"));
        store.save(&Snapshot::from(&garage::Garage::new(12))).unwrap();

        let session = session(tmp.path());

        assert_eq!(session.garage.garage().total_spots_count(), 12);
    }
}
