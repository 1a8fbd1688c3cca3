//! Table columns and the display modes that select them.

use clap::ValueEnum;

use super::decorate::{join_words, Decorator};
use crate::diff::DiffPair;
use crate::model::Metric;
use crate::severity::{level_for_absolute, level_for_delta, Color};

/// How much detail the coverage tables show. Each mode includes every
/// column of the modes before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum DisplayMode {
    /// File label and statement percentage.
    StatementsOnly,
    /// Percentages of all four metrics.
    Simple,
    /// Percentages plus raw covered/total counts.
    #[default]
    All,
}

#[derive(Debug, Clone, Copy)]
enum Cell {
    Label,
    Percent(Metric),
    Ratio(Metric),
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    min_mode: DisplayMode,
    cell: Cell,
}

const COLUMNS: [Column; 9] = [
    Column {
        title: "File",
        min_mode: DisplayMode::StatementsOnly,
        cell: Cell::Label,
    },
    Column {
        title: "Stmts (%)",
        min_mode: DisplayMode::StatementsOnly,
        cell: Cell::Percent(Metric::Statements),
    },
    Column {
        title: "Stmts",
        min_mode: DisplayMode::All,
        cell: Cell::Ratio(Metric::Statements),
    },
    Column {
        title: "Branch (%)",
        min_mode: DisplayMode::Simple,
        cell: Cell::Percent(Metric::Branches),
    },
    Column {
        title: "Branch",
        min_mode: DisplayMode::All,
        cell: Cell::Ratio(Metric::Branches),
    },
    Column {
        title: "Funcs (%)",
        min_mode: DisplayMode::Simple,
        cell: Cell::Percent(Metric::Functions),
    },
    Column {
        title: "Funcs",
        min_mode: DisplayMode::All,
        cell: Cell::Ratio(Metric::Functions),
    },
    Column {
        title: "Lines (%)",
        min_mode: DisplayMode::Simple,
        cell: Cell::Percent(Metric::Lines),
    },
    Column {
        title: "Lines",
        min_mode: DisplayMode::All,
        cell: Cell::Ratio(Metric::Lines),
    },
];

/// Columns shown in `mode`, in table order.
pub fn columns_for(mode: DisplayMode) -> Vec<Column> {
    COLUMNS
        .iter()
        .filter(|c| c.min_mode <= mode)
        .copied()
        .collect()
}

impl Column {
    /// Text of this column for one row. `label` is used verbatim by the
    /// label column.
    pub fn render(&self, decorator: &Decorator, label: &str, pair: &DiffPair<'_>) -> String {
        match self.cell {
            Cell::Label => label.to_string(),
            Cell::Percent(metric) => {
                let value = format_pct(decorator, pair.current.pct(metric));
                let delta = format_delta(decorator, pair.delta(metric));
                format!("<nobr>{}</nobr>", join_words([value, delta]))
            }
            Cell::Ratio(metric) => {
                let counter = pair.current.counter(metric);
                decorator.text(
                    &format!("{}/{}", counter.covered, counter.total),
                    Color::Default,
                )
            }
        }
    }
}

/// One-decimal percentage colored by its tier, `N/A` when undefined.
pub fn format_pct(decorator: &Decorator, pct: f64) -> String {
    let level = level_for_absolute(pct);
    let text = if pct.is_nan() {
        "N/A".to_string()
    } else {
        format!("{pct:.1}%")
    };
    decorator.text(&text, level.color())
}

/// Signed change in parentheses, empty when there is nothing to compare.
/// The tier is picked from the value as displayed, so a change that rounds
/// to zero reads as unchanged.
pub fn format_delta(decorator: &Decorator, delta: Option<f64>) -> String {
    let rounded = delta.map(|d| (d * 10.0).round() / 10.0);
    match (rounded, level_for_delta(rounded).color()) {
        (Some(d), Some(color)) => {
            let text = if d > 0.0 {
                format!("(+{d:.1}%)")
            } else if d == 0.0 {
                "(0.0%)".to_string()
            } else {
                format!("({d:.1}%)")
            };
            decorator.text(&text, color)
        }
        _ => String::new(),
    }
}
