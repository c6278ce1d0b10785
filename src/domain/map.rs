//! Text renderings of the garage layout.

use crate::domain::{Garage, Spot};

const COMPACT_ROW: usize = 10;
const COMPACT_CELL: usize = 4;
const DETAILED_ROW: usize = 5;
const CELL_WIDTH: usize = 12;
const CELL_GAP: &str = "    ";

impl Garage {
    /// A dense overview: one glyph per spot, ten spots per row.
    ///
    /// Each row is a glyph line followed by the zero-padded spot numbers and
    /// a blank separator line.
    #[must_use]
    pub fn compact_map(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for row in self.spots().chunks(COMPACT_ROW) {
            let (Some(first), Some(last)) = (row.first(), row.last()) else {
                continue;
            };
            let header = format!("Spots {:03}-{:03}: ", first.number(), last.number());
            let glyphs: String = row
                .iter()
                .map(|spot| format!("{:<COMPACT_CELL$}", spot.glyph(self.rules())))
                .collect();
            let numbers: String = row
                .iter()
                .map(|spot| format!("{:03} ", spot.number()))
                .collect();
            lines.push(format!("{header}{glyphs}").trim_end().to_string());
            let numbers = format!("{:<width$}{numbers}", "Numbers:", width = header.len());
            lines.push(numbers.trim_end().to_string());
            lines.push(String::new());
        }
        lines
    }

    /// A wide view: five spots per row with their glyph, registrations and
    /// categories.
    #[must_use]
    pub fn detailed_map(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for row in self.spots().chunks(DETAILED_ROW) {
            lines.push(render_row(row, |spot| format!("Spot {:03}", spot.number())));
            lines.push(render_row(row, |spot| spot.glyph(self.rules()).to_string()));
            lines.push(render_row(row, |spot| spot.registration_summary(self.rules())));
            lines.push(render_row(row, Spot::category_summary));
            lines.push(String::new());
        }
        lines
    }
}

fn render_row(row: &[Spot], cell: impl Fn(&Spot) -> String) -> String {
    row.iter()
        .map(|spot| format!("{:<CELL_WIDTH$}", fit(&cell(spot))))
        .collect::<Vec<_>>()
        .join(CELL_GAP)
        .trim_end()
        .to_string()
}

/// Truncates text wider than a cell, marking the cut with an ellipsis.
fn fit(text: &str) -> String {
    if text.chars().count() <= CELL_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}
