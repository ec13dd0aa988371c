use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use super::metadata::extract_metadata;
use super::model::{NormalizedDataset, RawCell, RawRow, Series};
use super::parser::is_year_column;
use crate::error::{PipelineError, Result};

/// Column holding the indicator key.
pub const SERIES_NAME: &str = "Series Name";
/// Column holding the region name.
pub const COUNTRY_NAME: &str = "Country Name";

/// Reshape flat rows into `region → indicator → year → value`.
///
/// Regions keep their order of first appearance; years are sorted
/// ascending. Every (region, indicator) pair ends up with a full-length
/// series, all-missing when the source had no row for it.
pub fn normalize(rows: &[RawRow]) -> Result<NormalizedDataset> {
    let first = rows.first().ok_or_else(|| PipelineError::MalformedInput {
        line: 1,
        reason: "no data rows".to_string(),
    })?;

    let years = year_columns(first);
    if years.is_empty() {
        return Err(PipelineError::MalformedInput {
            line: first.line,
            reason: "no year columns".to_string(),
        });
    }

    let mut regions: Vec<String> = Vec::new();
    let mut seen_regions: BTreeSet<String> = BTreeSet::new();
    let mut indicators = BTreeMap::new();
    let mut values: BTreeMap<String, BTreeMap<String, Series>> = BTreeMap::new();

    for row in rows {
        let row_years = year_columns(row);
        if row_years != years {
            return Err(PipelineError::SchemaMismatch {
                row: row.line,
                expected: years.join(", "),
                found: row_years.join(", "),
            });
        }

        let region = required_text(row, COUNTRY_NAME)?;
        let indicator = required_text(row, SERIES_NAME)?;

        if seen_regions.insert(region.to_string()) {
            regions.push(region.to_string());
        }
        indicators
            .entry(indicator.to_string())
            .or_insert_with(|| extract_metadata(indicator));

        let series: Series = years
            .iter()
            .map(|year| parse_value(row.get(year), row.line, year))
            .collect();

        match values
            .entry(region.to_string())
            .or_default()
            .entry(indicator.to_string())
        {
            Entry::Vacant(slot) => {
                slot.insert(series);
            }
            Entry::Occupied(mut slot) => {
                debug!("line {}: repeated row for {region} / {indicator}", row.line);
                merge_series(slot.get_mut(), &series, region, indicator, &years)?;
            }
        }
    }

    for region in &regions {
        let by_indicator = values.entry(region.clone()).or_default();
        for key in indicators.keys() {
            by_indicator
                .entry(key.clone())
                .or_insert_with(|| vec![None; years.len()]);
        }
    }

    info!(
        "normalized {} regions × {} indicators × {} years ({}–{})",
        regions.len(),
        indicators.len(),
        years.len(),
        years[0],
        years[years.len() - 1]
    );

    Ok(NormalizedDataset::from_parts(
        regions, indicators, years, values,
    ))
}

/// Year-labelled columns of a row, ascending.
fn year_columns(row: &RawRow) -> Vec<String> {
    let mut years: Vec<&String> = row
        .cells
        .keys()
        .filter(|name| is_year_column(name))
        .collect();
    years.sort_by_key(|year| year.parse::<u32>().unwrap_or(u32::MAX));
    years.into_iter().cloned().collect()
}

fn required_text<'a>(row: &'a RawRow, column: &str) -> Result<&'a str> {
    row.get(column)
        .and_then(RawCell::as_text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| PipelineError::MalformedInput {
            line: row.line,
            reason: format!("missing '{column}'"),
        })
}

fn parse_value(cell: Option<&RawCell>, line: usize, year: &str) -> Option<f64> {
    let text = cell?.as_text()?.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!("line {line}, {year}: '{text}' is not a number, treated as missing");
            None
        }
    }
}

/// Fold a repeated row into the existing series. Gaps are filled from
/// either side; two different numbers for the same year are an error.
fn merge_series(
    existing: &mut Series,
    incoming: &Series,
    region: &str,
    indicator: &str,
    years: &[String],
) -> Result<()> {
    for ((slot, new), year) in existing.iter_mut().zip(incoming).zip(years) {
        match (*slot, *new) {
            (Some(current), Some(conflicting)) if current != conflicting => {
                return Err(PipelineError::DuplicateEntry {
                    region: region.to_string(),
                    indicator: indicator.to_string(),
                    year: year.clone(),
                    existing: current,
                    conflicting,
                });
            }
            (None, Some(value)) => *slot = Some(value),
            _ => {}
        }
    }
    Ok(())
}
