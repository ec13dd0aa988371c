use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::color::OrdinalColorScale;
use crate::config::ChartConfig;
use crate::data::model::{Accessors, AccessorsUpdate, DataPoint, Extremes, NormalizedDataset};
use crate::data::projection::{compute_extremes, derive_data_points};
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::scale::{Domain, LinearScale};

/// Target tick count used when rounding axis domains.
const NICE_TICKS: usize = 10;

// ---------------------------------------------------------------------------
// Chart state
// ---------------------------------------------------------------------------

/// Everything a renderer needs for the current selection, independent of
/// rendering: accessors, derived points, cached extremes and region colours.
#[derive(Debug, Clone)]
pub struct ChartState {
    dataset: Arc<NormalizedDataset>,
    config: ChartConfig,
    accessors: Accessors,

    /// Points for the current accessors (cached).
    points: Vec<DataPoint>,

    /// Extremes for the current x/y/z; independent of the year.
    extremes: Option<Extremes>,
    extremes_revision: u64,

    color_scale: OrdinalColorScale,
}

impl ChartState {
    /// Ingest a loaded dataset and select the initial accessors: the
    /// configured defaults, else the first three indicators and the last year.
    pub fn new(dataset: Arc<NormalizedDataset>, config: ChartConfig) -> Result<Self> {
        let accessors = match &config.default_accessors {
            Some(defaults) => {
                check_accessors(&dataset, defaults)?;
                defaults.clone()
            }
            None => fallback_accessors(&dataset)?,
        };
        let color_scale = OrdinalColorScale::new(dataset.regions(), &config.colors());

        let mut state = ChartState {
            dataset,
            config,
            accessors,
            points: Vec::new(),
            extremes: None,
            extremes_revision: 0,
            color_scale,
        };
        state.recompute_extremes();
        state.rederive();
        Ok(state)
    }

    pub fn dataset(&self) -> &NormalizedDataset {
        &self.dataset
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn accessors(&self) -> &Accessors {
        &self.accessors
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn extremes(&self) -> Option<Extremes> {
        self.extremes
    }

    /// Incremented each time the extremes are recomputed; axes only need
    /// redrawing when it changes.
    pub fn extremes_revision(&self) -> u64 {
        self.extremes_revision
    }

    pub fn color_scale(&self) -> &OrdinalColorScale {
        &self.color_scale
    }

    /// Conditions worth showing to the user for the current selection.
    pub fn warnings(&self) -> Vec<PipelineWarning> {
        let mut warnings = Vec::new();
        if self.points.is_empty() {
            warnings.push(PipelineWarning::EmptyResult {
                accessors: self.accessors.clone(),
            });
        }
        if self.extremes.is_none() {
            warnings.push(PipelineWarning::NoExtremes {
                x: self.accessors.x.clone(),
                y: self.accessors.y.clone(),
                z: self.accessors.z.clone(),
            });
        }
        warnings
    }

    // -- Accessor updates --

    /// Merge a partial update into the current accessors.
    ///
    /// Returns `Ok(false)` without doing anything when nothing changes.
    /// Extremes are only recomputed when x, y or z change.
    pub fn update_accessors(&mut self, update: AccessorsUpdate) -> Result<bool> {
        let next = update.apply_to(&self.accessors);
        if next == self.accessors {
            return Ok(false);
        }
        check_accessors(&self.dataset, &next)?;

        let indicators_changed = !next.same_indicators(&self.accessors);
        self.accessors = next;
        if indicators_changed {
            self.recompute_extremes();
        }
        self.rederive();
        Ok(true)
    }

    pub fn set_year(&mut self, year: &str) -> Result<bool> {
        self.update_accessors(AccessorsUpdate {
            year: Some(year.to_string()),
            ..Default::default()
        })
    }

    // -- Year playback --

    /// Step to the following year. Returns `false` at the last year.
    pub fn advance_year(&mut self) -> bool {
        let years = self.dataset.years();
        let next = self
            .dataset
            .year_index(&self.accessors.year)
            .map(|idx| idx + 1)
            .and_then(|idx| years.get(idx))
            .cloned();
        match next {
            Some(year) => self.set_year(&year).is_ok(),
            None => false,
        }
    }

    /// Go back to the first year.
    pub fn rewind(&mut self) {
        if let Some(first) = self.dataset.years().first().cloned() {
            if let Err(err) = self.set_year(&first) {
                warn!("rewind to {first} failed: {err}");
            }
        }
    }

    /// Before playing: rewind when already at the last year.
    pub fn restart_if_finished(&mut self) -> bool {
        let at_end = self.dataset.years().last() == Some(&self.accessors.year);
        if at_end {
            self.rewind();
        }
        at_end
    }

    // -- Scales --

    /// Linear scales for a `width × height` plot area. The y range is
    /// inverted so larger values sit higher. `None` without extremes.
    pub fn scales(&self, width: f64, height: f64) -> Result<Option<ChartScales>> {
        let Some(ext) = self.extremes else {
            return Ok(None);
        };
        let [z_low, z_high] = self.config.z_range;
        Ok(Some(ChartScales {
            x: LinearScale::from_domain(self.axis_domain(ext.min_x, ext.max_x), 0.0, width)?,
            y: LinearScale::from_domain(self.axis_domain(ext.min_y, ext.max_y), height, 0.0)?,
            z: LinearScale::from_domain(self.axis_domain(ext.min_z, ext.max_z), z_low, z_high)?,
        }))
    }

    fn axis_domain(&self, min: f64, max: f64) -> Domain {
        let domain = Domain::from_extent(min, max)
            .widen_low(self.config.domain_margin)
            .or_fallback();
        if self.config.nice {
            domain.nice(NICE_TICKS)
        } else {
            domain
        }
    }

    // -- Internals --

    fn rederive(&mut self) {
        self.points = derive_data_points(&self.dataset, &self.accessors);
        debug!(
            "{} points for {} ({} regions)",
            self.points.len(),
            self.accessors.year,
            self.dataset.regions().len()
        );
    }

    fn recompute_extremes(&mut self) {
        self.extremes = compute_extremes(
            &self.dataset,
            &self.accessors.x,
            &self.accessors.y,
            &self.accessors.z,
        );
        self.extremes_revision += 1;
    }
}

fn check_accessors(dataset: &NormalizedDataset, accessors: &Accessors) -> Result<()> {
    for indicator in [&accessors.x, &accessors.y, &accessors.z] {
        if !dataset.has_indicator(indicator) {
            return Err(PipelineError::UnknownAccessor {
                kind: "indicator",
                name: indicator.clone(),
            });
        }
    }
    if dataset.year_index(&accessors.year).is_none() {
        return Err(PipelineError::UnknownAccessor {
            kind: "year",
            name: accessors.year.clone(),
        });
    }
    Ok(())
}

fn fallback_accessors(dataset: &NormalizedDataset) -> Result<Accessors> {
    let keys: Vec<&String> = dataset.indicators().keys().collect();
    let (Some(x), Some(year)) = (keys.first(), dataset.years().last()) else {
        return Err(PipelineError::UnknownAccessor {
            kind: "indicator",
            name: "<none>".to_string(),
        });
    };
    let y = keys.get(1).unwrap_or(x);
    let z = keys.get(2).unwrap_or(y);
    Ok(Accessors {
        x: x.to_string(),
        y: y.to_string(),
        z: z.to_string(),
        year: year.clone(),
    })
}

// ---------------------------------------------------------------------------
// Scales for the three axes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartScales {
    pub x: LinearScale,
    pub y: LinearScale,
    /// Marker radius.
    pub z: LinearScale,
}

/// A data point mapped into plot coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPoint {
    pub region: String,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl ChartScales {
    pub fn place(&self, point: &DataPoint) -> PlacedPoint {
        PlacedPoint {
            region: point.region.clone(),
            cx: self.x.apply(point.x),
            cy: self.y.apply(point.y),
            r: self.z.apply(point.z),
        }
    }
}
