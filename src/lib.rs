//! Turns World Bank DataBank exports into a per-region, per-year model and
//! derives the three-indicator projections, extremes and scales a bubble
//! chart needs.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod scale;
pub mod state;

pub use config::{ChartConfig, ChartKind};
pub use data::impute::impute_missing;
pub use data::loader::{load_file, load_str};
pub use data::metadata::{extract_metadata, IndicatorMetadata, Symbol};
pub use data::model::{Accessors, AccessorsUpdate, DataPoint, Extremes, NormalizedDataset};
pub use data::normalize::normalize;
pub use data::parser::{parse, parse_with, ParserOptions};
pub use data::projection::{compute_extremes, derive_data_points};
pub use error::{PipelineError, PipelineWarning};
pub use state::ChartState;
