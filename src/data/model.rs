use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::metadata::IndicatorMetadata;
use super::parser::is_year_column;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// RawCell / RawRow – output of the tabular parser
// ---------------------------------------------------------------------------

/// A single cell as read from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCell {
    /// The source's missing-data sentinel (`NA`).
    Missing,
    Text(String),
}

impl RawCell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCell::Text(s) => Some(s),
            RawCell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawCell::Missing)
    }
}

/// One data row of the source: column name → cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source text, for error reporting.
    pub line: usize,
    pub cells: BTreeMap<String, RawCell>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&RawCell> {
        self.cells.get(column)
    }
}

// ---------------------------------------------------------------------------
// NormalizedDataset – region → indicator → year → value
// ---------------------------------------------------------------------------

/// One indicator's values for one region, aligned index-for-index with
/// [`NormalizedDataset::years`].
pub type Series = Vec<Option<f64>>;

/// The rectangular, queryable dataset.
///
/// Fields are private: once built (and imputed) the dataset is shared
/// read-only, typically behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
    regions: Vec<String>,
    indicators: BTreeMap<String, IndicatorMetadata>,
    years: Vec<String>,
    values: BTreeMap<String, BTreeMap<String, Series>>,
}

impl NormalizedDataset {
    pub(crate) fn from_parts(
        regions: Vec<String>,
        indicators: BTreeMap<String, IndicatorMetadata>,
        years: Vec<String>,
        values: BTreeMap<String, BTreeMap<String, Series>>,
    ) -> Self {
        NormalizedDataset {
            regions,
            indicators,
            years,
            values,
        }
    }

    /// Regions in order of first appearance in the source.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn indicators(&self) -> &BTreeMap<String, IndicatorMetadata> {
        &self.indicators
    }

    pub fn metadata(&self, indicator: &str) -> Option<&IndicatorMetadata> {
        self.indicators.get(indicator)
    }

    /// Years in ascending numeric order.
    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn year_index(&self, year: &str) -> Option<usize> {
        self.years.iter().position(|y| y == year)
    }

    pub fn has_indicator(&self, indicator: &str) -> bool {
        self.indicators.contains_key(indicator)
    }

    pub fn series(&self, region: &str, indicator: &str) -> Option<&[Option<f64>]> {
        self.values
            .get(region)
            .and_then(|by_indicator| by_indicator.get(indicator))
            .map(Vec::as_slice)
    }

    /// Value for a (region, indicator, year) cell; `None` when missing or unknown.
    pub fn value(&self, region: &str, indicator: &str, year: &str) -> Option<f64> {
        let idx = self.year_index(year)?;
        self.value_at(region, indicator, idx)
    }

    pub(crate) fn value_at(&self, region: &str, indicator: &str, year_idx: usize) -> Option<f64> {
        self.series(region, indicator)
            .and_then(|series| series.get(year_idx).copied().flatten())
    }

    /// Number of missing cells across the whole table.
    pub fn missing_count(&self) -> usize {
        self.values
            .values()
            .flat_map(|by_indicator| by_indicator.values())
            .map(|series| series.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    pub(crate) fn series_mut(&mut self) -> impl Iterator<Item = &mut Series> {
        self.values
            .values_mut()
            .flat_map(|by_indicator| by_indicator.values_mut())
    }

    /// Check the rectangular-schema invariants. Used for datasets that did
    /// not come through the normalizer (e.g. decoded from JSON).
    pub fn validate(&self) -> Result<()> {
        for (idx, year) in self.years.iter().enumerate() {
            if !is_year_column(year) {
                return Err(PipelineError::MalformedInput {
                    line: idx + 1,
                    reason: format!("'{year}' is not a four-digit year"),
                });
            }
            // Four ASCII digits: string order is numeric order.
            if idx > 0 && self.years[idx - 1] >= *year {
                return Err(PipelineError::MalformedInput {
                    line: idx + 1,
                    reason: format!(
                        "year '{year}' follows '{}'; years must be strictly ascending",
                        self.years[idx - 1]
                    ),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for (row, region) in self.regions.iter().enumerate() {
            if !seen.insert(region.as_str()) {
                return Err(PipelineError::MalformedInput {
                    line: row + 1,
                    reason: format!("duplicate region '{region}'"),
                });
            }
        }

        let expected = self.years.join(", ");
        for (row, region) in self.regions.iter().enumerate() {
            let by_indicator =
                self.values
                    .get(region)
                    .ok_or_else(|| PipelineError::MalformedInput {
                        line: row + 1,
                        reason: format!("region '{region}' has no values"),
                    })?;
            for indicator in self.indicators.keys() {
                let series =
                    by_indicator
                        .get(indicator)
                        .ok_or_else(|| PipelineError::MalformedInput {
                            line: row + 1,
                            reason: format!("region '{region}' has no series for '{indicator}'"),
                        })?;
                if series.len() != self.years.len() {
                    return Err(PipelineError::SchemaMismatch {
                        row: row + 1,
                        expected: expected.clone(),
                        found: format!("{} values", series.len()),
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Accessors – the caller's current selection
// ---------------------------------------------------------------------------

/// Which indicator drives each axis, plus the selected year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessors {
    pub x: String,
    pub y: String,
    pub z: String,
    pub year: String,
}

impl Accessors {
    pub fn same_indicators(&self, other: &Accessors) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

/// A partial accessor change; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorsUpdate {
    pub x: Option<String>,
    pub y: Option<String>,
    pub z: Option<String>,
    pub year: Option<String>,
}

impl AccessorsUpdate {
    /// Merge onto `current`, returning the resulting accessors.
    pub fn apply_to(&self, current: &Accessors) -> Accessors {
        Accessors {
            x: self.x.clone().unwrap_or_else(|| current.x.clone()),
            y: self.y.clone().unwrap_or_else(|| current.y.clone()),
            z: self.z.clone().unwrap_or_else(|| current.z.clone()),
            year: self.year.clone().unwrap_or_else(|| current.year.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived output
// ---------------------------------------------------------------------------

/// One region's (x, y, z) triple for the selected year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub region: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Global bounds of an indicator triple over every region and year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremes {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Extremes {
    /// Extremes seeded from a single observation.
    pub fn from_point(x: f64, y: f64, z: f64) -> Self {
        Extremes {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            min_z: z,
            max_z: z,
        }
    }

    pub fn include(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }
}
