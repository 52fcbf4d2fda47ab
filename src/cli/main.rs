//! Command-line front end
//!
//! Runs the pipeline over image files and directories and writes the edge
//! map and the transparent image for each input.

use super::config::CliConfigBuilder;
use crate::{
    processor::Pipeline,
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    types::{Region, SizeSpec},
    utils::DEFAULT_MAX_FACTOR,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

#[cfg(feature = "webp-support")]
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];
#[cfg(not(feature = "webp-support"))]
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "visubee")]
pub struct Cli {
    /// Input image files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output directory (defaults to the save path from the settings file)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<String>,

    /// Output size: XS, S, M, L or XL (defaults to the settings file)
    #[arg(short, long, value_name = "SIZE")]
    pub size: Option<SizeSpec>,

    /// First Canny hysteresis threshold
    #[arg(long, default_value_t = 50.0)]
    pub threshold1: f32,

    /// Second Canny hysteresis threshold
    #[arg(long, default_value_t = 150.0)]
    pub threshold2: f32,

    /// Hue tolerance around the background color
    #[arg(long, default_value_t = 30, allow_hyphen_values = true)]
    pub tolerance: i32,

    /// Brightness adjustment (stored, not applied)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub brightness: i32,

    /// Image whose mean color is the background
    #[arg(long, value_name = "IMAGE", conflicts_with = "region")]
    pub reference: Option<PathBuf>,

    /// Sample the background from a rectangle of each input: x,y,width,height
    #[arg(long, value_name = "X,Y,W,H")]
    pub region: Option<Region>,

    /// How the input is scaled before processing
    #[arg(long, value_enum, default_value_t = CliScaling::Adaptive)]
    pub scaling: CliScaling,

    /// Largest downscale factor for adaptive scaling
    #[arg(long, default_value_t = DEFAULT_MAX_FACTOR)]
    pub max_factor: u32,

    /// Settings file (defaults to the user configuration directory)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// File name glob applied to directory inputs (e.g. "*.png")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliLogFormat {
    /// Colored human-readable output
    Console,
    /// Uncolored compact output for CI logs
    Compact,
    /// JSON lines with span context
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => Self::Console,
            CliLogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => Self::Json,
        }
    }
}

/// Input scaling mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliScaling {
    /// Integer box-filter downscale towards the output size
    Adaptive,
    /// Resize to the output size before both stages
    Exact,
    /// Process at full resolution
    Original,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;

    let settings = CliConfigBuilder::load_settings(&cli)?;
    let config = CliConfigBuilder::from_cli(&cli, &settings)
        .context("Failed to build configuration")?;
    let output_dir = CliConfigBuilder::output_dir(&cli, &settings);

    let session = spans::session(
        &session_id,
        config.selected_size.name(),
        &config.input_scaling.to_string(),
    );
    let _session = session.clone().entered();

    info!("Input(s): {}", cli.input.join(", "));
    info!(
        "Size: {}, scaling: {}, reference: {}",
        config.selected_size,
        config.input_scaling,
        config.background_reference.kind()
    );

    debug!(
        threshold1 = config.threshold1,
        threshold2 = config.threshold2,
        tolerance = config.tolerance,
        brightness = config.brightness,
        "Processing parameters"
    );

    let pipeline = Pipeline::new(config).context("Failed to create processing pipeline")?;

    let start_time = Instant::now();
    // CPU-bound batch runs on the blocking pool
    let processed_count = tokio::task::spawn_blocking(move || {
        let _session = session.entered();
        process_inputs(&cli, &pipeline, &output_dir)
    })
    .await
    .context("Processing task failed")??;

    info!(
        "Processed {} image(s) in {:.2}s",
        processed_count,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Process every input file and directory, returning the number of successes
fn process_inputs(cli: &Cli, pipeline: &Pipeline, output_dir: &Path) -> Result<usize> {
    let mut all_files = Vec::new();

    for input in &cli.input {
        let path = PathBuf::from(input);

        if path.is_file() {
            if is_image_file(&path, IMAGE_EXTENSIONS) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, cli.recursive, cli.pattern.as_deref())?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    if all_files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(0);
    }

    // Alphanumerical order for reproducible batches
    all_files.sort();
    let file_count = all_files.len();
    info!("Found {} image file(s) to process", file_count);

    if output_dir.is_file() {
        anyhow::bail!(
            "Output path exists and is a file, not a directory: {}",
            output_dir.display()
        );
    }
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    let progress = if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let _batch = spans::batch_processing(file_count).entered();
    let batch_start_time = Instant::now();
    let mut processed_count = 0;
    let mut failed_count = 0;

    for input_file in &all_files {
        if let Some(pb) = &progress {
            pb.set_message(format!("Processing {}", input_file.display()));
        }

        match process_single_file(pipeline, input_file, output_dir) {
            Ok(()) => {
                processed_count += 1;
                debug!(file = %input_file.display(), "Processed");
            },
            Err(e) => {
                failed_count += 1;
                events::error_with_context(e.as_ref(), &input_file.display().to_string());
            },
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Completed! Processed: {processed_count}, Failed: {failed_count}"
        ));
    }

    if file_count > 1 {
        let batch_total_time = batch_start_time.elapsed();
        events::progress(&format!(
            "Batch complete: {} processed, {} failed in {:.2}s",
            processed_count,
            failed_count,
            batch_total_time.as_secs_f64()
        ));
    }

    if processed_count == 0 {
        anyhow::bail!("All {} input(s) failed to process", failed_count);
    }
    if failed_count > 0 {
        warn!("Some files failed to process. Processed: {processed_count}, Failed: {failed_count}");
    }

    Ok(processed_count)
}

/// Decode one file, run the pipeline and write both results
fn process_single_file(pipeline: &Pipeline, input_path: &Path, output_dir: &Path) -> Result<()> {
    let _span = spans::file_processing(input_path).entered();

    let input = crate::load_image(input_path)
        .with_context(|| format!("Failed to decode {}", input_path.display()))?;
    let result = pipeline
        .process(Some(&input))
        .context("Failed to process image")?;
    let timings = result.timings.clone();

    let size = pipeline.config().selected_size;
    let (edges_path, transparent_path) = generate_output_paths(input_path, output_dir, size);
    let (edges, transparent) = result.into_pair();

    if let Some(edges) = edges {
        edges
            .to_rgba_image()
            .save_with_format(&edges_path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to save {}", edges_path.display()))?;
    }
    if let Some(transparent) = transparent {
        transparent
            .to_rgba_image()
            .save_with_format(&transparent_path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to save {}", transparent_path.display()))?;
    }

    info!("{}: {}", input_path.display(), timings.timing_summary());
    for (stage, duration_ms) in [
        ("input_scaling", timings.input_scaling_ms),
        ("edge_detection", timings.edge_detection_ms),
        ("background_removal", timings.background_removal_ms),
        ("output_resize", timings.output_resize_ms),
    ] {
        events::performance_metric(stage, duration_ms);
    }
    debug!(
        edges = %edges_path.display(),
        transparent = %transparent_path.display(),
        "Saved results"
    );

    Ok(())
}

/// Find image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if is_image_file(path, IMAGE_EXTENSIONS) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if is_image_file(&path, IMAGE_EXTENSIONS) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    Ok(files)
}

/// Check if file is an image based on extension
fn is_image_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}

/// Check if the file name matches the given glob
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            }),
        None => true,
    }
}

/// `<stem>_edges.png` and `<stem>_transparent-<SIZE>.png` inside `output_dir`
fn generate_output_paths(input_path: &Path, output_dir: &Path, size: SizeSpec) -> (PathBuf, PathBuf) {
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    (
        output_dir.join(format!("{}_edges.png", stem)),
        output_dir.join(format!("{}_transparent-{}.png", stem, size.name())),
    )
}
