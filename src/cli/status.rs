use clap::Parser;
use garage::{Garage, VehicleCategory};
use tracing::instrument;

use super::{
    Session,
    terminal::{Colorize, is_narrow},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Show spot totals and the vehicles currently parked")]
pub struct Command {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let garage = session.garage.garage();
        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&to_json(garage))?),
            OutputFormat::Table => Self::output_table(garage),
        }
        Ok(())
    }

    fn output_table(garage: &Garage) {
        let title = garage.name();
        println!("{title}");
        println!("{}", "─".repeat(title.chars().count()).dim());

        let total = garage.total_spots_count();
        let available = garage.available_spots_count();
        let occupied = garage.occupied_spots_count();
        let available_text = format!("{available}");
        let available_text = if available == 0 {
            available_text.failure()
        } else {
            available_text.success()
        };

        if is_narrow() {
            println!("Total: {total}");
            println!("Available: {available_text}");
            println!("Occupied: {occupied}");
        } else {
            println!("{:<16} {total}", "Total spots");
            println!("{:<16} {available_text}", "Available");
            println!("{:<16} {occupied}", "Occupied");
        }

        let counts = garage.vehicle_counts();
        if counts.is_empty() {
            println!();
            println!("{}", "No vehicles parked.".dim());
            return;
        }

        println!();
        println!("Vehicles parked");
        for (category, count) in counts {
            let spec = garage.rules().spec(category);
            let note = if spec.is_multi_spot() {
                format!(" ({} spots each)", spec.spots_required).dim()
            } else {
                String::new()
            };
            println!("  {:<14} {count}{note}", spec.label);
        }
    }
}

fn to_json(garage: &Garage) -> serde_json::Value {
    use serde_json::json;

    let counts = garage.vehicle_counts();
    let vehicles: Vec<_> = VehicleCategory::ALL
        .into_iter()
        .map(|category| {
            let spec = garage.rules().spec(category);
            json!({
                "category": category.code(),
                "label": spec.label,
                "count": counts.get(&category).copied().unwrap_or(0),
                "spots_each": spec.spots_required,
            })
        })
        .collect();

    json!({
        "name": garage.name(),
        "spots": {
            "total": garage.total_spots_count(),
            "available": garage.available_spots_count(),
            "occupied": garage.occupied_spots_count(),
        },
        "vehicles": vehicles,
    })
}
