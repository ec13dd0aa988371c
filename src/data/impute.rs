use log::debug;

use super::model::NormalizedDataset;

/// Fill missing observations by carrying the previous year's value forward.
///
/// Each (region, indicator) series is repaired on its own. Leading gaps stay
/// missing; nothing is ever carried backwards.
pub fn impute_missing(mut dataset: NormalizedDataset) -> NormalizedDataset {
    let before = dataset.missing_count();
    let filled: usize = dataset.series_mut().map(|series| forward_fill(series)).sum();
    debug!("imputed {filled} of {before} missing cells");
    dataset
}

/// Forward-carry over one series in a single left-to-right pass; a value
/// carried into `Y-1` is carried on into `Y`. Returns the number of cells
/// filled.
pub fn forward_fill(series: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    for idx in 1..series.len() {
        if series[idx].is_none() {
            if let Some(previous) = series[idx - 1] {
                series[idx] = Some(previous);
                filled += 1;
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_fill_chains() {
        let mut series = vec![None, Some(5.0), None, None];
        assert_eq!(forward_fill(&mut series), 2);
        assert_eq!(series, vec![None, Some(5.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn test_forward_fill_never_goes_backwards() {
        let mut series = vec![None, None, Some(1.0), None, Some(3.0), None];
        forward_fill(&mut series);
        assert_eq!(
            series,
            vec![None, None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn test_forward_fill_edge_cases() {
        let mut empty: Vec<Option<f64>> = vec![];
        assert_eq!(forward_fill(&mut empty), 0);
        let mut all_missing = vec![None, None];
        assert_eq!(forward_fill(&mut all_missing), 0);
        assert_eq!(all_missing, vec![None, None]);
    }
}
