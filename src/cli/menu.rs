//! The interactive operator menu.

use dialoguer::{Input, Select, theme::ColorfulTheme};
use garage::{Registration, storage::PriceList};

use super::{Find, Move, Park, Pickup, Session, map, prices, terminal::Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Park,
    Pickup,
    Move,
    Find,
    Map,
    ShowPrices,
    ReloadPrices,
    Save,
    Exit,
}

impl Action {
    const ALL: [Self; 9] = [
        Self::Park,
        Self::Pickup,
        Self::Move,
        Self::Find,
        Self::Map,
        Self::ShowPrices,
        Self::ReloadPrices,
        Self::Save,
        Self::Exit,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Park => "Park a vehicle",
            Self::Pickup => "Pick up a vehicle",
            Self::Move => "Move a vehicle",
            Self::Find => "Find a vehicle by registration",
            Self::Map => "Show parking map",
            Self::ShowPrices => "View price list",
            Self::ReloadPrices => "Reload price list",
            Self::Save => "Save now",
            Self::Exit => "Exit",
        }
    }
}

/// Runs the menu until the operator exits, then saves.
///
/// Failed actions are reported and the menu carries on.
pub fn run(mut session: Session) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();
    let mut price_list = load_prices(&session);
    let labels: Vec<_> = Action::ALL.iter().map(|action| action.label()).collect();

    loop {
        println!();
        let choice = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;
        let action = Action::ALL[choice];

        let result = match action {
            Action::Park => park(&mut session, &theme),
            Action::Pickup => prompt_registration(&theme)
                .and_then(|registration| Pickup { registration }.run(&mut session)),
            Action::Move => relocate(&mut session, &theme),
            Action::Find => prompt_registration(&theme)
                .and_then(|registration| Find { registration }.run(&session)),
            Action::Map => {
                map::Command::default().run(&session);
                Ok(())
            }
            Action::ShowPrices => {
                match &price_list {
                    Some(prices) => prices::show(prices),
                    None => println!("{}", "No price list available.".warning()),
                }
                Ok(())
            }
            Action::ReloadPrices => reload_prices(&session, &mut price_list),
            Action::Save | Action::Exit => save(&mut session),
        };

        if let Err(e) = result {
            eprintln!("{}", format!("{e:#}").failure());
        }
        if action == Action::Exit {
            return Ok(());
        }
    }
}

fn park(session: &mut Session, theme: &ColorfulTheme) -> anyhow::Result<()> {
    let categories: Vec<_> = session.config.categories().iter().collect();
    let labels: Vec<_> = categories.iter().map(|(_, spec)| spec.label.as_str()).collect();
    let choice = Select::with_theme(theme)
        .with_prompt("Vehicle type")
        .items(&labels)
        .default(0)
        .interact()?;
    let (category, spec) = categories[choice];

    if spec.is_multi_spot() {
        println!(
            "{}",
            format!(
                "Note: a {} needs {} empty spots in a row.",
                spec.label, spec.spots_required
            )
            .info()
        );
    }

    let registration = Input::<String>::with_theme(theme)
        .with_prompt(format!("Registration ({})", Registration::rule(category)))
        .interact_text()?;

    Park {
        category: category.code().to_string(),
        registration,
    }
    .run(session)
}

fn relocate(session: &mut Session, theme: &ColorfulTheme) -> anyhow::Result<()> {
    let registration = prompt_registration(theme)?;
    let Some(located) = session.garage.garage().find(registration.trim()) else {
        anyhow::bail!("vehicle {} not found", registration.trim());
    };
    println!("{}", format!("Currently at spot {}", located.spot).info());

    let total = session.garage.garage().total_spots_count();
    let spot = Input::<usize>::with_theme(theme)
        .with_prompt(format!("New spot (1-{total})"))
        .interact_text()?;

    Move { registration, spot }.run(session)
}

fn prompt_registration(theme: &ColorfulTheme) -> anyhow::Result<String> {
    Ok(Input::<String>::with_theme(theme)
        .with_prompt("Registration")
        .interact_text()?)
}

fn load_prices(session: &Session) -> Option<PriceList> {
    PriceList::load(session.price_list_path(), session.config.categories())
        .inspect_err(|e| {
            tracing::warn!("price list unavailable: {e}");
        })
        .ok()
}

fn reload_prices(session: &Session, price_list: &mut Option<PriceList>) -> anyhow::Result<()> {
    let rules = session.config.categories();
    match price_list {
        Some(prices) => prices.reload(rules)?,
        None => *price_list = Some(PriceList::load(session.price_list_path(), rules)?),
    }
    println!("{}", "Price list reloaded.".success());
    Ok(())
}

fn save(session: &mut Session) -> anyhow::Result<()> {
    session.garage.save()?;
    println!("{}", "Garage saved.".success());
    Ok(())
}
