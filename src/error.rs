use thiserror::Error;

use crate::data::model::Accessors;

// ---------------------------------------------------------------------------
// PipelineError – fatal conditions
// ---------------------------------------------------------------------------

/// Errors raised while loading a dataset or building scales.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Structurally invalid input text.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    /// A row does not carry the same year columns as the first row.
    #[error("row {row} has year columns [{found}], expected [{expected}]")]
    SchemaMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// The same (region, indicator, year) cell was given two different numbers.
    #[error(
        "conflicting values for {region} / {indicator} / {year}: {existing} vs {conflicting}"
    )]
    DuplicateEntry {
        region: String,
        indicator: String,
        year: String,
        existing: f64,
        conflicting: f64,
    },

    /// A linear scale was asked to map a zero-width (or non-finite) domain.
    #[error("cannot build a linear scale over the degenerate domain [{low}, {high}]")]
    DegenerateDomain { low: f64, high: f64 },

    /// An accessor names an indicator or year the dataset does not have.
    #[error("unknown {kind} '{name}'")]
    UnknownAccessor { kind: &'static str, name: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ---------------------------------------------------------------------------
// PipelineWarning – valid but noteworthy outcomes
// ---------------------------------------------------------------------------

/// Non-fatal conditions surfaced alongside a (possibly empty) result.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// No region has all three values for the selected year.
    EmptyResult { accessors: Accessors },
    /// No (region, year) has all three indicators present.
    NoExtremes { x: String, y: String, z: String },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::EmptyResult { accessors } => write!(
                f,
                "no complete data for x='{}', y='{}', z='{}' in {}",
                accessors.x, accessors.y, accessors.z, accessors.year
            ),
            PipelineWarning::NoExtremes { x, y, z } => {
                write!(f, "no year has complete data for x='{x}', y='{y}', z='{z}'")
            }
        }
    }
}
