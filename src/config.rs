use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::color::{default_palette, parse_rgb, Color, DEFAULT_PALETTE};
use crate::data::impute::impute_missing;
use crate::data::model::{Accessors, NormalizedDataset};
use crate::data::parser::ParserOptions;

// ---------------------------------------------------------------------------
// ChartKind – the closed set of chart variants
// ---------------------------------------------------------------------------

/// Chart variants selectable by configuration.
///
/// Both drive the same projection/extrema interface; they differ in how
/// gaps in the source are treated before projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Development indicators, gaps forward-filled from the previous year.
    #[default]
    Indicators,
    /// Indices plotted as reported; gaps simply drop the region for that year.
    Indices,
}

impl ChartKind {
    /// Apply this variant's gap policy to a freshly normalized dataset.
    pub fn prepare(self, dataset: NormalizedDataset) -> NormalizedDataset {
        match self {
            ChartKind::Indicators => impute_missing(dataset),
            ChartKind::Indices => dataset,
        }
    }
}

// ---------------------------------------------------------------------------
// ChartConfig
// ---------------------------------------------------------------------------

/// Static chart configuration, loadable from JSON. Missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub kind: ChartKind,
    /// Region colours as `rgb(r,g,b)` or `#rrggbb`.
    pub palette: Vec<String>,
    /// Fraction by which the low end of each axis domain is lowered.
    pub domain_margin: f64,
    /// Round axis domains outward to tidy tick steps.
    pub nice: bool,
    /// Output range of the z (radius) scale.
    pub z_range: [f64; 2],
    pub missing_sentinel: String,
    pub delimiter: char,
    pub default_accessors: Option<Accessors>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            kind: ChartKind::default(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            domain_margin: 0.05,
            nice: true,
            z_range: [5.0, 30.0],
            missing_sentinel: "NA".to_string(),
            delimiter: ',',
            default_accessors: None,
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing chart config JSON")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn parser_options(&self) -> Result<ParserOptions> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .with_context(|| format!("delimiter '{}' is not a single ASCII byte", self.delimiter))?;
        Ok(ParserOptions {
            delimiter,
            missing_sentinel: self.missing_sentinel.clone(),
        })
    }

    /// Parsed palette; unparseable entries are skipped with a warning, and
    /// an empty result falls back to the built-in palette.
    pub fn colors(&self) -> Vec<Color> {
        let colors: Vec<Color> = self
            .palette
            .iter()
            .filter_map(|entry| {
                let parsed = parse_rgb(entry);
                if parsed.is_none() {
                    warn!("ignoring palette entry '{entry}'");
                }
                parsed
            })
            .collect();
        if colors.is_empty() {
            default_palette()
        } else {
            colors
        }
    }
}
