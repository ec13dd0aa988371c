use log::warn;

use super::model::{Accessors, DataPoint, Extremes, NormalizedDataset};

// ---------------------------------------------------------------------------
// Per-year projection
// ---------------------------------------------------------------------------

/// One point per region for `accessors.year`, in `regions` order.
///
/// A region is left out when any of its x, y or z values is missing or not
/// finite. An empty result is valid; it is logged as a warning.
pub fn derive_data_points(dataset: &NormalizedDataset, accessors: &Accessors) -> Vec<DataPoint> {
    let points: Vec<DataPoint> = match dataset.year_index(&accessors.year) {
        Some(year_idx) => dataset
            .regions()
            .iter()
            .filter_map(|region| {
                let (x, y, z) = triple(dataset, region, accessors, year_idx)?;
                Some(DataPoint {
                    region: region.clone(),
                    x,
                    y,
                    z,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    if points.is_empty() {
        warn!("no complete data for accessors {accessors:?}");
    }
    points
}

// ---------------------------------------------------------------------------
// Extremes over all regions and years
// ---------------------------------------------------------------------------

/// Running min/max per axis over every (region, year) where all three
/// indicators have a finite value. `None` when there is no such pair.
///
/// Independent of the selected year.
pub fn compute_extremes(
    dataset: &NormalizedDataset,
    x: &str,
    y: &str,
    z: &str,
) -> Option<Extremes> {
    let mut extremes: Option<Extremes> = None;

    for region in dataset.regions() {
        let (Some(xs), Some(ys), Some(zs)) = (
            dataset.series(region, x),
            dataset.series(region, y),
            dataset.series(region, z),
        ) else {
            continue;
        };

        for ((xv, yv), zv) in xs.iter().zip(ys).zip(zs) {
            let (Some(xv), Some(yv), Some(zv)) = (finite(*xv), finite(*yv), finite(*zv)) else {
                continue;
            };
            match extremes.as_mut() {
                Some(ext) => ext.include(xv, yv, zv),
                None => extremes = Some(Extremes::from_point(xv, yv, zv)),
            }
        }
    }

    if extremes.is_none() {
        warn!("no year has complete data for x='{x}', y='{y}', z='{z}'");
    }
    extremes
}

fn triple(
    dataset: &NormalizedDataset,
    region: &str,
    accessors: &Accessors,
    year_idx: usize,
) -> Option<(f64, f64, f64)> {
    let x = finite(dataset.value_at(region, &accessors.x, year_idx))?;
    let y = finite(dataset.value_at(region, &accessors.y, year_idx))?;
    let z = finite(dataset.value_at(region, &accessors.z, year_idx))?;
    Some((x, y, z))
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::metadata::extract_metadata;

    const X: &str = "GDP growth (annual %)";
    const Y: &str = "Population, total";
    const Z: &str = "Life expectancy (years)";

    /// Two regions, three indicators, years 1964–1966.
    fn dataset() -> NormalizedDataset {
        let indicators = [X, Y, Z]
            .iter()
            .map(|key| (key.to_string(), extract_metadata(key)))
            .collect();
        let mut values = BTreeMap::new();
        values.insert(
            "Arab World".to_string(),
            BTreeMap::from([
                (X.to_string(), vec![Some(1.0), None, Some(3.0)]),
                (Y.to_string(), vec![Some(10.0), Some(20.0), Some(30.0)]),
                (Z.to_string(), vec![Some(50.0), Some(51.0), Some(52.0)]),
            ]),
        );
        values.insert(
            "East Asia & Pacific".to_string(),
            BTreeMap::from([
                (X.to_string(), vec![Some(-2.0), Some(8.0), None]),
                (Y.to_string(), vec![Some(100.0), Some(200.0), Some(300.0)]),
                (Z.to_string(), vec![None, Some(60.0), Some(61.0)]),
            ]),
        );
        NormalizedDataset::from_parts(
            vec!["Arab World".to_string(), "East Asia & Pacific".to_string()],
            indicators,
            vec!["1964".to_string(), "1965".to_string(), "1966".to_string()],
            values,
        )
    }

    fn accessors(year: &str) -> Accessors {
        Accessors {
            x: X.to_string(),
            y: Y.to_string(),
            z: Z.to_string(),
            year: year.to_string(),
        }
    }

    #[test]
    fn test_missing_x_excludes_region() {
        let points = derive_data_points(&dataset(), &accessors("1965"));
        assert_eq!(
            points,
            vec![DataPoint {
                region: "East Asia & Pacific".to_string(),
                x: 8.0,
                y: 200.0,
                z: 60.0,
            }]
        );
    }

    #[test]
    fn test_points_follow_region_order() {
        let ds = dataset();
        let mut acc = accessors("1965");
        acc.x = Y.to_string();
        let regions: Vec<String> = derive_data_points(&ds, &acc)
            .into_iter()
            .map(|p| p.region)
            .collect();
        assert_eq!(regions, ds.regions());
    }

    #[test]
    fn test_unknown_year_or_indicator_is_empty() {
        let ds = dataset();
        assert!(derive_data_points(&ds, &accessors("1999")).is_empty());
        let mut acc = accessors("1965");
        acc.z = "Unknown".to_string();
        assert!(derive_data_points(&ds, &acc).is_empty());
    }

    #[test]
    fn test_extremes_skip_incomplete_tuples() {
        let ext = compute_extremes(&dataset(), X, Y, Z).unwrap();
        // Complete tuples: AW 1964, AW 1966, EAP 1965.
        assert_eq!(ext.min_x, 1.0);
        assert_eq!(ext.max_x, 8.0);
        assert_eq!(ext.min_y, 10.0);
        assert_eq!(ext.max_y, 200.0);
        assert_eq!(ext.min_z, 50.0);
        assert_eq!(ext.max_z, 60.0);
    }

    #[test]
    fn test_extremes_absent() {
        assert_eq!(compute_extremes(&dataset(), X, Y, "Unknown"), None);
    }

    #[test]
    fn test_extremes_independent_of_year() {
        let ds = dataset();
        let a = accessors("1964");
        let b = accessors("1966");
        assert_eq!(
            compute_extremes(&ds, &a.x, &a.y, &a.z),
            compute_extremes(&ds, &b.x, &b.y, &b.z)
        );
    }
}
