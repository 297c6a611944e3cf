use super::CliError;
use super::helpers::{DEFAULT_INPUT_PATTERN, print_json, resolve_inputs};
use anyhow::Context;
use ndarray::{Ix1, Ix2};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use xas_core::calibration::{CalibrationOptions, CalibrationReport};
use xas_core::common::config::ProcessingConfig;
use xas_core::export::{ExportFormat, ExportOptions, export_xas};
use xas_core::io::load_combined;
use xas_core::normalization::Normalization;
use xas_core::{Aggregate, ChannelRole, DataQuery, ScanId, Xas};

#[derive(clap::Args)]
pub(super) struct InputFlags {
    /// Scan files or directories of scan files, accumulated in the order given
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// File-name glob applied inside input directories
    #[arg(long, default_value = DEFAULT_INPUT_PATTERN)]
    pattern: String,
}

impl InputFlags {
    fn load(&self, config: &ProcessingConfig) -> Result<Xas, CliError> {
        let paths = resolve_inputs(&self.inputs, &self.pattern)?;
        let xas = load_combined(&paths, config.accumulation.channel_mismatch)?;
        info!(files = paths.len(), scans = xas.n_scans(), "loaded inputs");
        Ok(xas)
    }
}

#[derive(clap::Args)]
pub(super) struct InfoArgs {
    #[command(flatten)]
    input: InputFlags,
}

#[derive(clap::Args)]
pub(super) struct CalibrateArgs {
    #[command(flatten)]
    input: InputFlags,

    /// Element symbol or literal energy in eV the reference peak is aligned to
    #[arg(long)]
    edge: Option<String>,

    /// Reference channel searched for the peak
    #[arg(long)]
    channel: Option<String>,

    /// Search window half-width in eV
    #[arg(long)]
    width: Option<f64>,

    /// Smooth the reference before the peak search
    #[arg(long)]
    smooth: bool,

    /// Extra shift added to the nominal edge before the search
    #[arg(long)]
    shift: Option<f64>,

    /// Write the mono-corrected export into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Export format used with --output-dir
    #[arg(long)]
    format: Option<ExportFormat>,
}

#[derive(clap::Args)]
pub(super) struct ExportArgs {
    #[command(flatten)]
    input: InputFlags,

    /// Destination directory
    #[arg(long)]
    output_dir: PathBuf,

    /// yaml, ssrl or athena
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Flux channel the detectors are divided by
    #[arg(long)]
    norm: Option<String>,

    /// Apply stored monochromator offsets
    #[arg(long)]
    offset_mono: bool,

    /// Scan numbers left out of the average
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<ScanId>,

    /// File-name template filled from scan-info fields
    #[arg(long)]
    name_format: Option<String>,

    /// Never overwrite; append _N before the extension instead
    #[arg(long)]
    increment: bool,
}

#[derive(clap::Args)]
pub(super) struct NormalizeArgs {
    #[command(flatten)]
    input: InputFlags,

    /// Detector channels to print
    #[arg(long, required = true, value_delimiter = ',')]
    cols: Vec<String>,

    /// pp, area or tail; anything else leaves the curves unscaled
    #[arg(long, default_value = "pp")]
    method: String,

    /// Channels whose product divides the curves
    #[arg(long, value_delimiter = ',')]
    divisor: Vec<String>,

    /// Scan numbers left out of the aggregate
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<ScanId>,

    /// Apply stored monochromator offsets
    #[arg(long)]
    offset_mono: bool,

    /// Average the scans instead of summing them
    #[arg(long)]
    mean: bool,

    /// Write the table here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ChannelSummary<'a> {
    name: &'a str,
    role: ChannelRole,
}

#[derive(Serialize)]
struct SpectrumSummary<'a> {
    kind: String,
    points: usize,
    scans: &'a [ScanId],
    channels: Vec<ChannelSummary<'a>>,
    sample: Option<&'a str>,
    date: Option<&'a str>,
    command: Option<&'a str>,
    loadid: Option<&'a str>,
    motors: &'a BTreeMap<String, f64>,
}

impl<'a> SpectrumSummary<'a> {
    fn of(xas: &'a Xas) -> Self {
        let metadata = xas.metadata();
        Self {
            kind: xas.kind().to_string(),
            points: xas.n_points(),
            scans: xas.scans(),
            channels: xas
                .channels()
                .iter()
                .zip(xas.channel_roles())
                .map(|(name, role)| ChannelSummary { name, role: *role })
                .collect(),
            sample: metadata.sample.as_deref(),
            date: metadata.date.as_deref(),
            command: metadata.command.as_deref(),
            loadid: metadata.loadid.as_deref(),
            motors: &metadata.motors,
        }
    }
}

#[derive(Serialize)]
struct CalibrationOutput {
    #[serde(flatten)]
    report: CalibrationReport,
    exported: Option<PathBuf>,
}

pub(super) fn run_info_command(args: InfoArgs, config: &ProcessingConfig) -> Result<i32, CliError> {
    let xas = args.input.load(config)?;
    print_json(&SpectrumSummary::of(&xas))?;
    Ok(0)
}

pub(super) fn run_calibrate_command(
    args: CalibrateArgs,
    config: &ProcessingConfig,
) -> Result<i32, CliError> {
    let defaults = &config.calibration;
    let edge = args.edge.or_else(|| defaults.edge.clone()).ok_or_else(|| {
        CliError::Usage("an edge is required: pass --edge or set calibration.edge".to_string())
    })?;
    let options = CalibrationOptions {
        col: args.channel.unwrap_or_else(|| defaults.channel.clone()),
        width: args.width.unwrap_or(defaults.width),
        smooth: args.smooth || defaults.smooth,
        shift: args.shift.unwrap_or(defaults.shift),
    };

    let mut xas = args.input.load(config)?;
    let report = xas.find_mono_offset(&edge, &options)?;

    let exported = match &args.output_dir {
        Some(folder) => {
            let export_options = ExportOptions {
                offset_mono: true,
                ..ExportOptions::from(&config.export)
            };
            let format = args.format.unwrap_or(config.export.format);
            Some(export_xas(&xas, folder, format, &export_options)?)
        }
        None => None,
    };

    print_json(&CalibrationOutput { report, exported })?;
    Ok(0)
}

pub(super) fn run_export_command(
    args: ExportArgs,
    config: &ProcessingConfig,
) -> Result<i32, CliError> {
    let defaults = ExportOptions::from(&config.export);
    let options = ExportOptions {
        norm: args.norm.or(defaults.norm),
        offset_mono: args.offset_mono || defaults.offset_mono,
        exclude: args.exclude,
        name_format: args.name_format.or(defaults.name_format),
        increment: args.increment || defaults.increment,
    };
    let format = args.format.unwrap_or(config.export.format);

    let xas = args.input.load(config)?;
    let path = export_xas(&xas, &args.output_dir, format, &options)?;
    println!("{}", path.display());
    Ok(0)
}

pub(super) fn run_normalize_command(
    args: NormalizeArgs,
    config: &ProcessingConfig,
) -> Result<i32, CliError> {
    let normalization = Normalization::from_name(&args.method);
    if matches!(normalization, Normalization::PassThrough) {
        warn!(method = %args.method, "unrecognized normalization; printing unscaled curves");
    }

    let xas = args.input.load(config)?;
    let aggregate = if args.mean {
        Aggregate::Mean
    } else {
        Aggregate::Sum
    };
    let query = DataQuery::default()
        .divisor(args.divisor.iter().cloned())
        .offset_mono(args.offset_mono)
        .exclude(&args.exclude)
        .aggregate(aggregate)
        .squeeze(false);
    let selection = xas.get_data(&args.cols, &query)?;

    let x = selection
        .x
        .context("query did not return the energy axis")?
        .into_dimensionality::<Ix1>()
        .context("aggregated energy axis is not one-dimensional")?;
    let y = selection
        .y
        .into_dimensionality::<Ix2>()
        .context("aggregated curves are not (points, cols)")?;
    let normalized = normalization.apply_columns(x.view(), y.view())?;

    let mut table = format!("# {} {}\n", query.xcol, args.cols.join(" "));
    for (energy, row) in x.iter().zip(normalized.rows()) {
        table.push_str(&format!("{energy:e}"));
        for value in row {
            table.push_str(&format!(" {value:e}"));
        }
        table.push('\n');
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &table)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), method = normalization.name(), "wrote normalized table");
        }
        None => print!("{table}"),
    }
    Ok(0)
}
