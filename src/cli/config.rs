//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliScaling};
use crate::{
    config::{InputScaling, ProcessingConfig},
    settings::AppSettings,
    utils::ConfigValidator,
};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Convert CLI arguments to a `ProcessingConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the processing configuration, seeded from the user settings
    pub(crate) fn from_cli(cli: &Cli, settings: &AppSettings) -> Result<ProcessingConfig> {
        let mut builder = settings
            .config_builder()
            .thresholds(cli.threshold1, cli.threshold2)
            .tolerance(cli.tolerance)
            .brightness(cli.brightness)
            .input_scaling(Self::input_scaling(cli));

        if let Some(size) = cli.size {
            builder = builder.selected_size(size);
        }

        if let Some(region) = cli.region {
            builder = builder.reference_region(region);
        } else if let Some(path) = &cli.reference {
            let reference = crate::load_image(path).with_context(|| {
                format!("Failed to load reference image: {}", path.display())
            })?;
            builder = builder.reference_image(reference);
        }

        builder.build().context("Invalid configuration")
    }

    fn input_scaling(cli: &Cli) -> InputScaling {
        match cli.scaling {
            CliScaling::Adaptive => InputScaling::Adaptive {
                max_factor: cli.max_factor,
            },
            CliScaling::Exact => InputScaling::Exact,
            CliScaling::Original => InputScaling::Original,
        }
    }

    /// Load the settings file named on the command line, or the default one
    pub(crate) fn load_settings(cli: &Cli) -> Result<AppSettings> {
        match &cli.settings {
            Some(path) => AppSettings::load(path)
                .with_context(|| format!("Failed to load settings: {}", path.display())),
            None => AppSettings::load_default().context("Failed to load default settings"),
        }
    }

    /// Output directory: `--output`, else the settings save path
    pub(crate) fn output_dir(cli: &Cli, settings: &AppSettings) -> PathBuf {
        cli.output
            .as_ref()
            .map_or_else(|| settings.resolved_save_path(), PathBuf::from)
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        ConfigValidator::validate_thresholds(cli.threshold1, cli.threshold2)
            .context("Invalid Canny thresholds")?;
        ConfigValidator::validate_tolerance(cli.tolerance).context("Invalid tolerance")?;

        if cli.scaling == CliScaling::Adaptive {
            ConfigValidator::validate_max_factor(cli.max_factor)
                .context("Invalid adaptive scaling factor")?;
        }

        if let Some(reference) = &cli.reference {
            if !reference.is_file() {
                anyhow::bail!("Reference image not found: {}", reference.display());
            }
        }

        Ok(())
    }
}
