use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tilecorr::{FillConfig, RunConfig, RunReport, TileShape, TiledConfig};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiled correlation kernel with baseline verification")]
struct Cli {
    /// Optional JSON configuration file; flags override its values.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output extent N (outputs are N x N).
    #[arg(long)]
    n: Option<usize>,
    /// Template extent W (the field is N + W - 1 square).
    #[arg(long)]
    template_size: Option<usize>,
    /// Output rows per tile.
    #[arg(long)]
    tile_rows: Option<usize>,
    /// Output columns per tile.
    #[arg(long)]
    tile_cols: Option<usize>,
    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    workers: Option<usize>,
    /// Seed for the generated field and template.
    #[arg(long)]
    seed: Option<u64>,
    /// Timed repetitions of the tiled kernel.
    #[arg(long)]
    iterations: Option<usize>,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    n: usize,
    template_size: usize,
    tile_rows: usize,
    tile_cols: usize,
    workers: Option<usize>,
    seed: u64,
    value_min: f32,
    value_max: f32,
    iterations: usize,
    tolerance: f32,
    report_path: Option<String>,
    output_image_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = RunConfig::default();
        Self {
            n: cfg.n,
            template_size: cfg.template_size,
            tile_rows: cfg.tiled.tile.rows,
            tile_cols: cfg.tiled.tile.cols,
            workers: cfg.tiled.workers,
            seed: cfg.fill.seed,
            value_min: cfg.fill.low,
            value_max: cfg.fill.high,
            iterations: cfg.iterations,
            tolerance: cfg.tolerance,
            report_path: None,
            output_image_path: None,
        }
    }
}

impl Config {
    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(n) = cli.n {
            self.n = n;
        }
        if let Some(template_size) = cli.template_size {
            self.template_size = template_size;
        }
        if let Some(tile_rows) = cli.tile_rows {
            self.tile_rows = tile_rows;
        }
        if let Some(tile_cols) = cli.tile_cols {
            self.tile_cols = tile_cols;
        }
        if cli.workers.is_some() {
            self.workers = cli.workers;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(iterations) = cli.iterations {
            self.iterations = iterations;
        }
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            n: self.n,
            template_size: self.template_size,
            tiled: TiledConfig {
                tile: TileShape {
                    rows: self.tile_rows,
                    cols: self.tile_cols,
                },
                workers: self.workers,
            },
            fill: FillConfig {
                seed: self.seed,
                low: self.value_min,
                high: self.value_max,
            },
            iterations: self.iterations,
            tolerance: self.tolerance,
        }
    }
}

#[derive(Debug, Serialize)]
struct MismatchRecord {
    row: usize,
    col: usize,
    baseline: f32,
    optimized: f32,
}

#[derive(Debug, Serialize)]
struct ReportRecord {
    n: usize,
    template_size: usize,
    tile_rows: usize,
    tile_cols: usize,
    workers: usize,
    seed: u64,
    iterations: usize,
    mean_elapsed_secs: f64,
    total_elapsed_secs: f64,
    passed: bool,
    mismatch: Option<MismatchRecord>,
    checksum: f64,
}

impl ReportRecord {
    fn new(config: &Config, report: &RunReport) -> Self {
        Self {
            n: config.n,
            template_size: config.template_size,
            tile_rows: config.tile_rows,
            tile_cols: config.tile_cols,
            workers: report.workers,
            seed: config.seed,
            iterations: report.timing.iterations,
            mean_elapsed_secs: report.timing.mean().as_secs_f64(),
            total_elapsed_secs: report.timing.total.as_secs_f64(),
            passed: report.passed(),
            mismatch: report.verdict.mismatch().map(|m| MismatchRecord {
                row: m.row,
                col: m.col,
                baseline: m.expected,
                optimized: m.actual,
            }),
            checksum: report.checksum,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("tilecorr=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut config: Config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    config.apply_overrides(&cli);

    tracing::info!(
        n = config.n,
        template_size = config.template_size,
        tile_rows = config.tile_rows,
        tile_cols = config.tile_cols,
        seed = config.seed,
        "starting run"
    );
    let (report, output) = tilecorr::run(&config.run_config())?;

    for line in report.console_lines() {
        println!("{line}");
    }

    if let Some(path) = &config.report_path {
        let json = serde_json::to_string_pretty(&ReportRecord::new(&config, &report))?;
        fs::write(path, json)?;
    }

    if let Some(path) = &config.output_image_path {
        save_output_image(&output, path)?;
    }

    Ok(ExitCode::from(exit_status(&report)))
}

/// Process status for a finished run: 0 on PASS, 1 on FAIL.
fn exit_status(report: &RunReport) -> u8 {
    if report.passed() {
        0
    } else {
        1
    }
}

#[cfg(feature = "image-io")]
fn save_output_image(output: &tilecorr::Grid, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    tilecorr::io::save_gray_image(output, path)?;
    Ok(())
}

#[cfg(not(feature = "image-io"))]
fn save_output_image(_output: &tilecorr::Grid, _path: &str) -> Result<(), Box<dyn std::error::Error>> {
    Err("output_image_path requires the image-io feature".into())
}
