use proptest::prelude::*;

use wdi_pipeline::data::impute::forward_fill;
use wdi_pipeline::scale::LinearScale;
use wdi_pipeline::{impute_missing, normalize, parse};

fn cell() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![Just(None), (-1.0e6..1.0e6f64).prop_map(Some)]
}

fn render(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())
}

/// A DataBank-style export with the given year columns and one indicator
/// row per region.
fn export(years: &[u16], series: &[Vec<Option<f64>>]) -> String {
    let mut text = String::from("Series Name,Series Code,Country Name,Country Code");
    for year in years {
        text.push_str(&format!(",{year} [YR{year}]"));
    }
    text.push('\n');
    for (idx, values) in series.iter().enumerate() {
        text.push_str(&format!("GDP growth (annual %),NY.GDP,Region {idx},R{idx}"));
        for value in values {
            text.push(',');
            text.push_str(&render(*value));
        }
        text.push('\n');
    }
    text.push_str("Data from database: World Development Indicators\n");
    text
}

proptest! {
    #[test]
    fn forward_fill_is_idempotent(mut series in prop::collection::vec(cell(), 0..40)) {
        forward_fill(&mut series);
        let once = series.clone();
        prop_assert_eq!(forward_fill(&mut series), 0);
        prop_assert_eq!(series, once);
    }

    #[test]
    fn forward_fill_only_carries_the_latest_earlier_value(original in prop::collection::vec(cell(), 0..40)) {
        let mut filled = original.clone();
        forward_fill(&mut filled);
        let mut latest: Option<f64> = None;
        for (before, after) in original.iter().zip(&filled) {
            if before.is_some() {
                latest = *before;
            }
            prop_assert_eq!(*after, latest);
        }
    }

    #[test]
    fn normalized_years_are_sorted_and_unique(
        years in prop::collection::hash_set(1900u16..2100, 1..20),
        regions in 1usize..4,
    ) {
        let years: Vec<u16> = years.into_iter().collect();
        let series = vec![vec![Some(1.0); years.len()]; regions];
        let ds = normalize(&parse(&export(&years, &series)).unwrap()).unwrap();

        let parsed: Vec<u16> = ds.years().iter().map(|y| y.parse().unwrap()).collect();
        prop_assert!(parsed.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(parsed.len(), years.len());
        prop_assert_eq!(ds.regions().len(), regions);
    }

    #[test]
    fn dataset_imputation_is_idempotent(
        series in prop::collection::vec(prop::collection::vec(cell(), 6), 1..5),
    ) {
        let years: Vec<u16> = (2000..2006).collect();
        let ds = normalize(&parse(&export(&years, &series)).unwrap()).unwrap();
        let once = impute_missing(ds);
        let twice = impute_missing(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn linear_scale_maps_domain_onto_range(
        low in -1.0e3..1.0e3f64,
        width in 1.0e-3..1.0e3f64,
        range_low in -1.0e3..1.0e3f64,
        range_high in -1.0e3..1.0e3f64,
    ) {
        let high = low + width;
        let scale = LinearScale::new(low, high, range_low, range_high).unwrap();
        let tolerance = 1e-6 * (1.0 + range_low.abs() + range_high.abs());
        prop_assert!((scale.apply(low) - range_low).abs() <= tolerance);
        prop_assert!((scale.apply(high) - range_high).abs() <= tolerance);
    }
}
