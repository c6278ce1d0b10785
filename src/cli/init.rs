use std::{fs, path::Path};

use garage::{Config, Garage, JsonFileStore, Snapshot, SnapshotStore, storage::PriceList};
use tracing::instrument;

use super::CONFIG_FILE;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Number of spots in the garage
    #[arg(long, value_name = "N")]
    spots: Option<usize>,

    /// Overwrite an existing garage, discarding everything parked in it
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Garage already initialized (found existing {CONFIG_FILE}); use --force to start over"
            );
        }

        fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        let mut config = Config::default();
        if let Some(spots) = self.spots {
            config.set_spots(spots)?;
        }
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        let prices_path = root.join(&config.price_list);
        PriceList::write_default(&prices_path, config.categories())?;

        let mut store = JsonFileStore::new(root.join(&config.snapshot));
        store.save(&Snapshot::from(&Garage::from_config(&config)))?;

        println!(
            "Initialized garage with {} spots in {}",
            config.spots(),
            root.display()
        );
        println!("  Created: {CONFIG_FILE}");
        println!("  Created: {}", config.price_list.display());
        println!("  Created: {}", config.snapshot.display());
        println!();
        println!("Next steps:");
        println!("  park park car AB123");
        println!("  park menu");

        Ok(())
    }
}
