//! Statistics calculation engine.
//!
//! Computes derived views from loaded event records:
//! - Champion standings per format over a trailing window
//! - Monthly deck distributions (all participants or champions only)
//! - Host-by-week event counts
//! - Pie chart shaping with "Other" collapsing and palettes
//!
//! Every function here is pure: the reference date is always passed in.

mod chart;
mod distribution;
mod hosts;
mod standings;

pub use chart::{
    collapse_other, palette_color, pie_chart, ChartEntry, ColorError, PaletteSeed, PieSlice, Rgb,
    DEFAULT_PALETTE, OTHER_COLOR,
};
pub use distribution::{
    champion_deck_distribution, count_decks, deck_distribution, CHAMPION_WINDOW_MONTHS,
    UNKNOWN_DECK,
};
pub use hosts::host_weekly_extract;
pub use standings::{rank_top_players, within_month_window};
