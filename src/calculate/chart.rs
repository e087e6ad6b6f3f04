//! Chart shaping: "Other" bucket collapsing and palette generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DeckCount;

/// Color parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid hex color: {0}")]
    InvalidHex(String),
}

/// An RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    /// Parse `#rgb` or `#rrggbb`; the leading `#` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(ColorError::InvalidHex(s.to_string())),
        };
        let num =
            u32::from_str_radix(&expanded, 16).map_err(|_| ColorError::InvalidHex(s.to_string()))?;

        Ok(Self::new(
            ((num >> 16) & 0xff) as u8,
            ((num >> 8) & 0xff) as u8,
            (num & 0xff) as u8,
        ))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Color of the collapsed "Other" bucket, outside every palette.
pub const OTHER_COLOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

pub const DEFAULT_PALETTE: [Rgb; 20] = [
    Rgb::new(0x60, 0xa5, 0xfa),
    Rgb::new(0xfb, 0xbf, 0x24),
    Rgb::new(0x34, 0xd3, 0x99),
    Rgb::new(0xf8, 0x71, 0x71),
    Rgb::new(0xa7, 0x8b, 0xfa),
    Rgb::new(0xf4, 0x72, 0xb6),
    Rgb::new(0xfa, 0xcc, 0x15),
    Rgb::new(0x38, 0xbd, 0xf8),
    Rgb::new(0x4a, 0xde, 0x80),
    Rgb::new(0xfc, 0xa5, 0xa5),
    Rgb::new(0x63, 0x66, 0xf1),
    Rgb::new(0x22, 0xd3, 0xee),
    Rgb::new(0xea, 0xb3, 0x08),
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0x10, 0xb9, 0x81),
    Rgb::new(0xa3, 0xe6, 0x35),
    Rgb::new(0xf4, 0x3f, 0x5e),
    Rgb::new(0x81, 0x8c, 0xf8),
    Rgb::new(0xfd, 0xe6, 0x8a),
    Rgb::new(0xc0, 0x84, 0xfc),
];

/// How chart colors are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteSeed {
    /// Cycle through [`DEFAULT_PALETTE`]
    #[default]
    Default,
    /// Step each channel away from a starting color
    From(Rgb),
}

/// Color for the `index`-th chart entry.
pub fn palette_color(seed: PaletteSeed, index: usize) -> Rgb {
    match seed {
        PaletteSeed::Default => DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()],
        PaletteSeed::From(base) => {
            let step = index % 256;
            let channel = |c: u8, k: usize| ((c as usize + step * k) % 256) as u8;
            Rgb::new(channel(base.r, 17), channel(base.g, 31), channel(base.b, 23))
        }
    }
}

/// A chart entry after collapsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartEntry {
    Item { name: String, value: u32 },
    /// Sum of the collapsed tail
    Other { value: u32 },
}

impl ChartEntry {
    pub fn name(&self) -> &str {
        match self {
            ChartEntry::Item { name, .. } => name,
            ChartEntry::Other { value: 1 } => "Other",
            ChartEntry::Other { .. } => "Others",
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            ChartEntry::Item { value, .. } | ChartEntry::Other { value } => *value,
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, ChartEntry::Other { .. })
    }
}

/// Collapse the smallest entries into one "Other" bucket so at most
/// `max_items` entries remain.
///
/// Lists already within the cap, or where every value ties, are returned
/// as-is. When folding only the minimum-valued entries is enough they alone
/// are folded; otherwise the top `max_items - 1` are kept and the rest folded.
pub fn collapse_other(items: Vec<(String, u32)>, max_items: usize) -> Vec<ChartEntry> {
    let mut entries: Vec<ChartEntry> = items
        .into_iter()
        .map(|(name, value)| ChartEntry::Item { name, value })
        .collect();

    if entries.len() <= max_items {
        return entries;
    }

    entries.sort_by(|a, b| b.value().cmp(&a.value()));

    let (Some(max), Some(min)) = (
        entries.first().map(ChartEntry::value),
        entries.last().map(ChartEntry::value),
    ) else {
        return entries;
    };
    if min == max {
        return entries;
    }

    let tied = entries.iter().filter(|e| e.value() == min).count();
    let keep = if entries.len() - tied + 1 <= max_items {
        entries.len() - tied
    } else {
        max_items.saturating_sub(1)
    };

    let value = entries.split_off(keep).iter().map(ChartEntry::value).sum();
    entries.push(ChartEntry::Other { value });
    entries
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: u32,
    pub color: Rgb,

    /// Legend text, e.g. "Yubel (4)"
    pub label: String,
}

/// Build pie slices from deck counts: collapse, then color by position.
pub fn pie_chart(decks: &[DeckCount], seed: PaletteSeed, max_items: usize) -> Vec<PieSlice> {
    let items = decks.iter().map(|d| (d.name.clone(), d.count)).collect();

    collapse_other(items, max_items)
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let color = if entry.is_other() {
                OTHER_COLOR
            } else {
                palette_color(seed, idx)
            };
            PieSlice {
                name: entry.name().to_string(),
                value: entry.value(),
                color,
                label: format!("{} ({})", entry.name(), entry.value()),
            }
        })
        .collect()
}
