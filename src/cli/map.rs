use clap::Parser;
use garage::domain::spot::{GLYPH_EMPTY, GLYPH_FULL, GLYPH_PARTIAL};
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser, Default)]
pub struct Command {
    /// One glyph per spot, ten spots per row
    #[arg(long)]
    compact: bool,
}

impl Command {
    #[instrument(level = "debug", skip(self, session))]
    pub fn run(self, session: &Session) {
        let garage = session.garage.garage();
        let lines = if self.compact {
            garage.compact_map()
        } else {
            garage.detailed_map()
        };

        for line in lines {
            println!("{}", highlight(&line));
        }
        println!("{}", legend().dim());
    }
}

fn legend() -> String {
    format!("{GLYPH_EMPTY} empty   {GLYPH_PARTIAL} room for more   {GLYPH_FULL} full or blocked")
}

/// Colours every status glyph in a map line.
fn highlight(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            GLYPH_EMPTY => out.push_str(&c.to_string().success()),
            GLYPH_PARTIAL => out.push_str(&c.to_string().warning()),
            GLYPH_FULL => out.push_str(&c.to_string().failure()),
            _ => out.push(c),
        }
    }
    out
}
