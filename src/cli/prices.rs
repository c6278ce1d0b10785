use clap::Parser;
use garage::storage::PriceList;
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser, Default)]
pub struct Command {
    /// Regenerate the price list from the configured rates before showing it
    #[arg(long)]
    reset: bool,
}

impl Command {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let path = session.price_list_path();
        let rules = session.config.categories();

        if self.reset {
            PriceList::write_default(&path, rules)?;
            println!("{}", format!("Reset {}", path.display()).success());
        }

        let prices = PriceList::load(&path, rules)?;
        show(&prices);
        Ok(())
    }
}

/// Prints a price list under a heading.
pub fn show(prices: &PriceList) {
    println!("{}", "Price list".info());
    println!("{}", "──────────".dim());
    println!("{}", prices.content().trim_end());
}
