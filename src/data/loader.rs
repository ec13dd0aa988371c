use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use super::model::NormalizedDataset;
use super::normalize::normalize;
use super::parser::{parse_with, ParserOptions};
use crate::config::{ChartConfig, ChartKind};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – World Bank DataBank export (parsed, normalized and
///   prepared for the configured chart kind)
/// * `.json`         – a dataset previously written by [`to_json`]
///
/// The dataset is returned behind an `Arc` so it can be shared read-only.
pub fn load_file(path: &Path, config: &ChartConfig) -> Result<Arc<NormalizedDataset>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => load_csv(path, config)?,
        "json" => load_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    info!(
        "loaded {}: {} regions, {} indicators, {} years",
        path.display(),
        dataset.regions().len(),
        dataset.indicators().len(),
        dataset.years().len()
    );
    Ok(Arc::new(dataset))
}

/// Run the whole pipeline over in-memory text: parse → normalize → the
/// chart kind's gap policy.
pub fn load_str(
    raw_text: &str,
    options: &ParserOptions,
    kind: ChartKind,
) -> std::result::Result<NormalizedDataset, PipelineError> {
    let rows = parse_with(raw_text, options)?;
    let dataset = normalize(&rows)?;
    Ok(kind.prepare(dataset))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, config: &ChartConfig) -> Result<NormalizedDataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let options = config.parser_options()?;
    load_str(&text, &options, config.kind).with_context(|| format!("loading {}", path.display()))
}

// ---------------------------------------------------------------------------
// JSON re-encoding
// ---------------------------------------------------------------------------

/// The JSON shape is the serde encoding of [`NormalizedDataset`]:
///
/// ```json
/// {
///   "regions": ["Arab World", ...],
///   "indicators": {"GDP growth (annual %)": {"descriptor": "GDP growth", "unit": "annual %", "symbol": "%"}},
///   "years": ["1960", ...],
///   "values": {"Arab World": {"GDP growth (annual %)": [null, ..., 12.8045655586639, ...]}}
/// }
/// ```
fn load_json(path: &Path) -> Result<NormalizedDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    from_json(&text).context("decoding dataset JSON")
}

pub fn from_json(text: &str) -> std::result::Result<NormalizedDataset, PipelineError> {
    let dataset: NormalizedDataset = serde_json::from_str(text)?;
    dataset.validate()?;
    Ok(dataset)
}

pub fn to_json(dataset: &NormalizedDataset) -> std::result::Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(dataset)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TEXT: &str = "\
Series Name,Series Code,Country Name,Country Code,2000 [YR2000],2001 [YR2001],2002 [YR2002]
GDP growth (annual %),G,Arab World,ARB,NA,5,NA
";

    #[test]
    fn test_load_str_by_kind() {
        let options = ParserOptions::default();
        let imputed = load_str(TEXT, &options, ChartKind::Indicators).unwrap();
        let raw = load_str(TEXT, &options, ChartKind::Indices).unwrap();
        let key = "GDP growth (annual %)";
        assert_eq!(imputed.value("Arab World", key, "2002"), Some(5.0));
        assert_eq!(raw.value("Arab World", key, "2002"), None);
        assert_eq!(imputed.value("Arab World", key, "2000"), None);
    }

    #[test]
    fn test_load_file_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("wdi.csv");
        std::fs::File::create(&csv_path)
            .unwrap()
            .write_all(TEXT.as_bytes())
            .unwrap();

        let config = ChartConfig::default();
        let from_csv = load_file(&csv_path, &config).unwrap();

        let json_path = dir.path().join("wdi.json");
        std::fs::write(&json_path, to_json(&from_csv).unwrap()).unwrap();
        let from_json = load_file(&json_path, &config).unwrap();
        assert_eq!(from_csv, from_json);
    }

    #[test]
    fn test_load_file_rejects_unknown_extension() {
        let err = load_file(Path::new("data.xlsx"), &ChartConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn test_pipeline_error_survives_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Series Name,Country Name,2000\nX,A\n").unwrap();
        let err = load_file(&path, &ChartConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_from_json_validates_shape() {
        let text = r#"{"regions": ["A"], "indicators": {"X": {"descriptor": "X", "unit": null, "symbol": null}},
            "years": ["2000", "2001"], "values": {"A": {"X": [1.0]}}}"#;
        assert!(matches!(
            from_json(text),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    const X_META: &str = r#""indicators": {"X": {"descriptor": "X", "unit": null, "symbol": null}}"#;

    #[test]
    fn test_from_json_rejects_unsorted_years() {
        let text = format!(
            r#"{{"regions": ["A"], {X_META}, "years": ["2001", "2000", "2000"],
                "values": {{"A": {{"X": [null, 1.0, null]}}}}}}"#
        );
        let err = from_json(&text).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { line: 2, .. }));
        assert!(err.to_string().contains("ascending"));
    }

    #[test]
    fn test_from_json_rejects_repeated_year() {
        let text = format!(
            r#"{{"regions": ["A"], {X_META}, "years": ["2000", "2000"],
                "values": {{"A": {{"X": [1.0, null]}}}}}}"#
        );
        assert!(matches!(
            from_json(&text),
            Err(PipelineError::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_duplicate_regions() {
        let text = format!(
            r#"{{"regions": ["A", "A"], {X_META}, "years": ["2000", "2001"],
                "values": {{"A": {{"X": [1.0, null]}}}}}}"#
        );
        let err = from_json(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate region 'A'"));
    }
}
