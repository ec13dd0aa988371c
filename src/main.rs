use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use wdi_pipeline::color::{darker, to_hex};
use wdi_pipeline::data::loader::to_json;
use wdi_pipeline::data::metadata::format_value;
use wdi_pipeline::state::PlacedPoint;
use wdi_pipeline::{load_file, AccessorsUpdate, ChartConfig, ChartKind, ChartState, NormalizedDataset};

#[derive(Parser, Debug)]
#[command(
    name = "wdi-pipeline",
    about = "Parse World Bank indicator exports and derive bubble-chart projections"
)]
struct Cli {
    /// Chart configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Chart kind; overrides the configuration file
    #[arg(long, global = true, value_enum)]
    kind: Option<ChartKind>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, normalize and impute a CSV export and write it as JSON
    Convert {
        input: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List regions, indicators and years
    Describe { input: PathBuf },
    /// Print the points for one year, scaled to a plot area
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
struct ProjectArgs {
    input: PathBuf,
    #[arg(long)]
    x: Option<String>,
    #[arg(long)]
    y: Option<String>,
    #[arg(long)]
    z: Option<String>,
    /// Defaults to the last year in the data
    #[arg(long)]
    year: Option<String>,
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    #[arg(long, default_value_t = 500.0)]
    height: f64,
}

#[derive(Serialize)]
struct ProjectedPoint {
    #[serde(flatten)]
    placed: PlacedPoint,
    x: f64,
    y: f64,
    z: f64,
    label_x: String,
    label_y: String,
    label_z: String,
    fill: String,
    stroke: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => ChartConfig::from_json_file(path)?,
        None => ChartConfig::default(),
    };
    if let Some(kind) = cli.kind {
        config.kind = kind;
    }

    match cli.command {
        Command::Convert { input, output } => convert(&input, output, &config),
        Command::Describe { input } => {
            let dataset = load_file(&input, &config)?;
            describe(&dataset)
        }
        Command::Project(args) => project(args, config),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn convert(input: &Path, output: Option<PathBuf>, config: &ChartConfig) -> Result<()> {
    let dataset = load_file(input, config)?;
    let json = to_json(&dataset)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn describe(dataset: &NormalizedDataset) -> Result<()> {
    println!("Regions ({}):", dataset.regions().len());
    for region in dataset.regions() {
        println!("  {region}");
    }
    println!("Indicators ({}):", dataset.indicators().len());
    for (key, meta) in dataset.indicators() {
        let symbol = meta.symbol.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        println!("  {key}");
        println!(
            "    descriptor: {}, unit: {}, symbol: {symbol}",
            meta.descriptor,
            meta.unit.as_deref().unwrap_or("-")
        );
    }
    if let (Some(first), Some(last)) = (dataset.years().first(), dataset.years().last()) {
        println!("Years: {first}–{last} ({})", dataset.years().len());
    }
    println!("Missing cells: {}", dataset.missing_count());
    Ok(())
}

fn project(args: ProjectArgs, config: ChartConfig) -> Result<()> {
    let dataset: Arc<NormalizedDataset> = load_file(&args.input, &config)?;
    let mut state = ChartState::new(dataset, config)?;
    state
        .update_accessors(AccessorsUpdate {
            x: args.x,
            y: args.y,
            z: args.z,
            year: args.year,
        })
        .context("selecting indicators")?;

    for warning in state.warnings() {
        warn!("{warning}");
    }

    let Some(scales) = state.scales(args.width, args.height)? else {
        println!("[]");
        return Ok(());
    };

    let accessors = state.accessors();
    let symbol_of = |key: &str| state.dataset().metadata(key).and_then(|m| m.symbol);
    let projected: Vec<ProjectedPoint> = state
        .points()
        .iter()
        .map(|point| {
            let fill = state.color_scale().color_for(&point.region);
            ProjectedPoint {
                placed: scales.place(point),
                x: point.x,
                y: point.y,
                z: point.z,
                label_x: format_value(symbol_of(&accessors.x), point.x),
                label_y: format_value(symbol_of(&accessors.y), point.y),
                label_z: format_value(symbol_of(&accessors.z), point.z),
                fill: to_hex(fill),
                stroke: to_hex(darker(fill)),
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&projected)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdi_pipeline::{load_str, ParserOptions};

    const TEXT: &str = "\
Series Name,Series Code,Country Name,Country Code,2000 [YR2000],2001 [YR2001]
GDP growth (annual %),G,Arab World,ARB,NA,5
";

    #[test]
    fn test_describe_shared_dataset() {
        let dataset: Arc<NormalizedDataset> = Arc::new(
            load_str(TEXT, &ParserOptions::default(), ChartKind::Indicators).unwrap(),
        );
        assert!(describe(&dataset).is_ok());
    }

    #[test]
    fn test_describe_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wdi.csv");
        std::fs::write(&path, TEXT).unwrap();
        let dataset = load_file(&path, &ChartConfig::default()).unwrap();
        assert!(describe(&dataset).is_ok());
    }
}
