use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::model::{RawCell, RawRow};
use super::normalize::{COUNTRY_NAME, SERIES_NAME};
use crate::error::{PipelineError, Result};

/// Columns every DataBank export header carries.
const REQUIRED_COLUMNS: [&str; 2] = [SERIES_NAME, COUNTRY_NAME];

/// Footer lines the World Bank DataBank appends after the data rows.
const FOOTER_PREFIXES: [&str; 2] = ["data from database", "last updated"];

// ---------------------------------------------------------------------------
// Parser options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    pub delimiter: u8,
    /// Cell text that stands for "no observation".
    pub missing_sentinel: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            delimiter: b',',
            missing_sentinel: "NA".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse a World Bank export with the default options.
pub fn parse(raw_text: &str) -> Result<Vec<RawRow>> {
    parse_with(raw_text, &ParserOptions::default())
}

/// Parse delimited text into flat rows keyed by (cleaned) column name.
///
/// Blank records and DataBank footer lines are dropped before the
/// field-count check, so a trailing footer never counts as a short row.
pub fn parse_with(raw_text: &str, options: &ParserOptions) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(options.delimiter)
        .from_reader(raw_text.trim_start_matches('\u{feff}').as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 1);

        if is_blank(&record) || is_footer(&record) {
            skipped += 1;
            continue;
        }

        let columns = match &header {
            Some(columns) => columns,
            None => {
                header = Some(parse_header(&record, line, options)?);
                continue;
            }
        };

        if record.len() != columns.len() {
            return Err(PipelineError::MalformedInput {
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    columns.len(),
                    record.len()
                ),
            });
        }

        let cells: BTreeMap<String, RawCell> = columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.clone(), parse_cell(value, options)))
            .collect();
        rows.push(RawRow { line, cells });
    }

    if header.is_none() {
        return Err(PipelineError::MalformedInput {
            line: 1,
            reason: "no header row".to_string(),
        });
    }

    debug!(
        "parsed {} data rows, skipped {skipped} blank/footer lines",
        rows.len()
    );
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Strip a DataBank year code: `1960 [YR1960]` → `1960`.
/// Other column names are returned unchanged.
pub fn clean_column_name(name: &str) -> &str {
    let name = name.trim();
    match name.split_once('[') {
        Some((year, rest)) if rest.ends_with(']') && is_year_column(year.trim()) => year.trim(),
        _ => name,
    }
}

/// Whether a (cleaned) column name is a bare four-digit year.
pub fn is_year_column(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

fn parse_header(record: &csv::StringRecord, line: usize, options: &ParserOptions) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(record.len());

    for (idx, raw) in record.iter().enumerate() {
        let name = clean_column_name(raw);
        if name.is_empty() {
            return Err(PipelineError::MalformedInput {
                line,
                reason: format!("header column {} is empty", idx + 1),
            });
        }
        if looks_like_value(name, options) {
            return Err(PipelineError::MalformedInput {
                line,
                reason: format!("no header row: first row contains the value '{name}'"),
            });
        }
        if !seen.insert(name.to_string()) {
            return Err(PipelineError::MalformedInput {
                line,
                reason: format!("duplicate header column '{name}'"),
            });
        }
        columns.push(name.to_string());
    }
    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !seen.contains(**c)) {
        return Err(PipelineError::MalformedInput {
            line,
            reason: format!("no header row: column '{missing}' not found"),
        });
    }
    Ok(columns)
}

/// A header cell that is a sentinel or a non-year number means the first
/// record is data, i.e. the header row is absent.
fn looks_like_value(name: &str, options: &ParserOptions) -> bool {
    name == options.missing_sentinel || (!is_year_column(name) && name.parse::<f64>().is_ok())
}

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

fn parse_cell(value: &str, options: &ParserOptions) -> RawCell {
    if value == options.missing_sentinel {
        RawCell::Missing
    } else {
        RawCell::Text(value.to_string())
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn is_footer(record: &csv::StringRecord) -> bool {
    record.get(0).is_some_and(|first| {
        let first = first.trim().to_ascii_lowercase();
        FOOTER_PREFIXES.iter().any(|prefix| first.starts_with(prefix))
    })
}
