use anyhow::{anyhow, bail, Result};
use cagesig_lib::{
    config::{load_config, ConditioningConfig},
    detectors::{
        artifacts::{clamp_wheel_rate, DEFAULT_MAX_RPS},
        runs::{stable_sequences, unstable_sequences, valued_sequences},
        spikes::{detect_positive_spikes_with_config, smooth_spikes, SpikeConfig},
    },
    io::{columns as columns_io, text as text_io},
    metrics::windowed::{
        centered_moving_average, moving_function, rearing_over_window,
        wheel_distance_over_window, xy_distance_over_window, Boundary, WindowFunction,
    },
    pipeline::{condition_weight_trace, hopper_observations},
    signal::TimedSeries,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "cagesig",
    version,
    about = "Condition per-second cage sensor traces into cleaned signals and runs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FunctionArg {
    Sum,
    Average,
}

impl From<FunctionArg> for WindowFunction {
    fn from(arg: FunctionArg) -> Self {
        match arg {
            FunctionArg::Sum => WindowFunction::Sum,
            FunctionArg::Average => WindowFunction::Average,
        }
    }
}

/// Where a single sample series comes from.
#[derive(Args, Debug, Clone)]
struct SeriesArgs {
    /// Newline-delimited samples (stdin when neither --input nor --csv is given)
    #[arg(long, conflicts_with = "csv")]
    input: Option<PathBuf>,
    /// Delimited file with a header row
    #[arg(long, requires = "column")]
    csv: Option<PathBuf>,
    /// Column of --csv holding the samples
    #[arg(long)]
    column: Option<String>,
    /// Field delimiter of --csv
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

/// Elapsed seconds paired with a series; one-second spacing when omitted.
#[derive(Args, Debug, Clone)]
struct TimeArgs {
    /// Newline-delimited elapsed seconds
    #[arg(long, conflicts_with = "time_column")]
    times: Option<PathBuf>,
    /// Column of --csv holding elapsed seconds
    #[arg(long)]
    time_column: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find positive spikes in a weight trace
    Spikes {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        time: TimeArgs,
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,
        #[arg(long, default_value_t = 1.0)]
        max_gap_s: f64,
    },
    /// Replace listed spikes with the mean of the preceding samples
    SmoothSpikes {
        #[command(flatten)]
        series: SeriesArgs,
        /// Newline-delimited spike indices
        #[arg(long)]
        spikes: PathBuf,
        #[arg(long, default_value_t = 10)]
        backward_window: usize,
        #[arg(long, default_value_t = 5)]
        forward_window: usize,
    },
    /// Cap wheel revolutions per second
    ClampWheel {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long, default_value_t = DEFAULT_MAX_RPS)]
        max_rps: f64,
    },
    /// Centred moving sum or average
    Moving {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        window: usize,
        #[arg(long, value_enum, default_value = "sum")]
        function: FunctionArg,
        /// 1 keeps partial edge windows, 2 copies raw samples at the edges
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        boundary: u8,
    },
    /// Mean over 2r+1 samples, zero near the edges
    CenteredAverage {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        radius: usize,
    },
    /// Per-axis path length over a sliding window
    XyDistance {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "XPos")]
        x_column: String,
        #[arg(long, default_value = "YPos")]
        y_column: String,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        #[arg(long)]
        window: usize,
    },
    /// Distance run on the wheel per window
    WheelDistance {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        window: usize,
        /// Wheel radius, in the unit the distance should be reported in
        #[arg(long)]
        radius: f64,
    },
    /// Rearing samples (z > 0) per window
    Rearing {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        window: usize,
    },
    /// Runs where consecutive samples differ by at most --diff
    StableRuns {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long, default_value_t = 0.0)]
        diff: f64,
        #[arg(long, default_value_t = 1)]
        stability_duration: usize,
    },
    /// Runs of samples equal to --value
    ValuedRuns {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        value: f64,
        #[arg(long, default_value_t = 1)]
        stability_duration: usize,
    },
    /// Runs from a jump above --u-diff until the trace settles again
    UnstableRuns {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        u_diff: f64,
        #[arg(long)]
        s_diff: Option<f64>,
        #[arg(long, default_value_t = 10)]
        stability_duration: usize,
    },
    /// Spike removal plus run segmentation of a weight trace
    Condition {
        #[command(flatten)]
        series: SeriesArgs,
        #[command(flatten)]
        time: TimeArgs,
        /// TOML configuration (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Discrete per-interval observations from a hopper trace
    Observations {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Spikes {
            series,
            time,
            threshold,
            max_gap_s,
        } => cmd_spikes(&series, &time, threshold, max_gap_s)?,
        Commands::SmoothSpikes {
            series,
            spikes,
            backward_window,
            forward_window,
        } => cmd_smooth_spikes(&series, &spikes, backward_window, forward_window)?,
        Commands::ClampWheel { series, max_rps } => {
            emit(&clamp_wheel_rate(&read_series(&series)?, max_rps)?)?
        }
        Commands::Moving {
            series,
            window,
            function,
            boundary,
        } => {
            let data = read_series(&series)?;
            let boundary = Boundary::try_from(boundary)?;
            emit(&moving_function(&data, window, function.into(), boundary)?)?
        }
        Commands::CenteredAverage { series, radius } => {
            emit(&centered_moving_average(&read_series(&series)?, radius)?)?
        }
        Commands::XyDistance {
            csv,
            x_column,
            y_column,
            delimiter,
            window,
        } => cmd_xy_distance(&csv, &x_column, &y_column, delimiter, window)?,
        Commands::WheelDistance {
            series,
            window,
            radius,
        } => emit(&wheel_distance_over_window(
            &read_series(&series)?,
            window,
            radius,
        )?)?,
        Commands::Rearing { series, window } => {
            emit(&rearing_over_window(&read_series(&series)?, window)?)?
        }
        Commands::StableRuns {
            series,
            diff,
            stability_duration,
        } => emit(&stable_sequences(
            &read_series(&series)?,
            diff,
            stability_duration,
        )?)?,
        Commands::ValuedRuns {
            series,
            value,
            stability_duration,
        } => emit(&valued_sequences(
            &read_series(&series)?,
            value,
            stability_duration,
        )?)?,
        Commands::UnstableRuns {
            series,
            u_diff,
            s_diff,
            stability_duration,
        } => emit(&unstable_sequences(
            &read_series(&series)?,
            u_diff,
            s_diff,
            stability_duration,
        )?)?,
        Commands::Condition {
            series,
            time,
            config,
        } => cmd_condition(&series, &time, config.as_deref())?,
        Commands::Observations { series, config } => {
            let cfg = read_config(config.as_deref())?;
            emit(&hopper_observations(&read_series(&series)?, &cfg.observations)?)?
        }
    }
    Ok(())
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter).map_err(|_| anyhow!("delimiter must be a single ASCII character"))
}

fn read_series(args: &SeriesArgs) -> Result<Vec<f64>> {
    let data = match (&args.input, &args.csv, &args.column) {
        (Some(path), _, _) => text_io::read_f64_series(path)?,
        (None, Some(path), Some(column)) => {
            columns_io::read_column(path, column, delimiter_byte(args.delimiter)?)?
        }
        (None, Some(_), None) => bail!("--csv needs --column"),
        (None, None, _) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)?
        }
    };
    debug!("read {} samples", data.len());
    Ok(data)
}

fn read_timed_series(series: &SeriesArgs, time: &TimeArgs) -> Result<TimedSeries> {
    let data = read_series(series)?;
    let times = match (&time.times, &time.time_column, &series.csv) {
        (Some(path), _, _) => text_io::read_f64_series(path)?,
        (None, Some(column), Some(path)) => {
            columns_io::read_column(path, column, delimiter_byte(series.delimiter)?)?
        }
        (None, Some(_), None) => bail!("--time-column needs --csv"),
        (None, None, _) => return Ok(TimedSeries::contiguous(data)),
    };
    Ok(TimedSeries::new(data, times)?)
}

fn read_config(path: Option<&Path>) -> Result<ConditioningConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ConditioningConfig::default()),
    }
}

fn cmd_spikes(series: &SeriesArgs, time: &TimeArgs, threshold: f64, max_gap_s: f64) -> Result<()> {
    let ts = read_timed_series(series, time)?;
    let cfg = SpikeConfig {
        threshold,
        max_gap_s,
        ..SpikeConfig::default()
    };
    let events = detect_positive_spikes_with_config(&ts.data, &ts.times, &cfg)?;
    emit(&events)
}

fn cmd_smooth_spikes(
    series: &SeriesArgs,
    spikes: &Path,
    backward_window: usize,
    forward_window: usize,
) -> Result<()> {
    let data = read_series(series)?;
    let indices = text_io::read_index_list(spikes)?;
    let smoothed = smooth_spikes(&data, &indices, backward_window, forward_window)?;
    emit(&smoothed)
}

fn cmd_xy_distance(
    csv: &Path,
    x_column: &str,
    y_column: &str,
    delimiter: char,
    window: usize,
) -> Result<()> {
    let mut columns =
        columns_io::read_columns(csv, &[x_column, y_column], delimiter_byte(delimiter)?)?;
    let ys = columns.pop().unwrap_or_default();
    let xs = columns.pop().unwrap_or_default();
    let (x, y) = xy_distance_over_window(&xs, &ys, window)?;
    emit(&serde_json::json!({ "x": x, "y": y }))
}

fn cmd_condition(series: &SeriesArgs, time: &TimeArgs, config: Option<&Path>) -> Result<()> {
    let ts = read_timed_series(series, time)?;
    let cfg = read_config(config)?;
    let summary = condition_weight_trace(&ts, &cfg)?;
    emit(&summary)
}
