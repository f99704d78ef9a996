//! Run settings assembled from flags, environment and `critpath.toml`.

use crate::cli::{Cli, CliError};
use critpath_render::OutputFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "critpath.toml";
/// Plan read when no input is given anywhere.
pub const DEFAULT_INPUT: &str = "input/dependencies.yaml";
/// Image written when no output is given anywhere.
pub const DEFAULT_OUTPUT: &str = "output/path.svg";

/// Contents of a `critpath.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Plan file, relative to the config file.
    pub input: Option<PathBuf>,
    /// Image file, relative to the config file.
    pub output: Option<PathBuf>,
    /// `svg` or `dot`.
    pub format: Option<String>,
    /// Whether to write the image at all.
    pub render: Option<bool>,
}

impl FileConfig {
    /// Read and parse a config file, anchoring relative paths at its directory.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| {
            CliError::config_with_help(
                format!("failed to parse {}: {e}", path.display()),
                "Supported keys are input, output, format and render",
            )
        })?;

        if let Some(base) = path.parent() {
            config.input = config.input.map(|p| anchor(base, p));
            config.output = config.output.map(|p| anchor(base, p));
        }

        debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(config)
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Plan to read.
    pub input: PathBuf,
    /// Image to write.
    pub output: PathBuf,
    /// Image format.
    pub format: OutputFormat,
    /// Whether to write the image.
    pub render: bool,
}

impl Settings {
    /// Resolve settings for a run started in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the config file or output format is invalid.
    pub fn resolve(cli: &Cli) -> Result<Self, CliError> {
        let cwd = std::env::current_dir()
            .map_err(|e| CliError::config(format!("cannot determine working directory: {e}")))?;
        Self::resolve_in(cli, &cwd)
    }

    /// Resolve settings, looking for `critpath.toml` in `dir` when no
    /// `--config` is given.
    ///
    /// Flags and their environment variables win over the config file, which
    /// wins over the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the config file or output format is invalid.
    pub fn resolve_in(cli: &Cli, dir: &Path) -> Result<Self, CliError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    FileConfig::load(&candidate)?
                } else {
                    FileConfig::default()
                }
            }
        };

        let input = cli
            .input
            .clone()
            .or(file.input)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
        let output = cli
            .output
            .clone()
            .or(file.output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let render = !cli.no_render && !cli.check && file.render.unwrap_or(true);

        let format = if let Some(flag) = cli.format {
            OutputFormat::from(flag)
        } else if let Some(name) = file.format.as_deref() {
            name.parse::<OutputFormat>().map_err(|e| {
                CliError::config_with_help(e.to_string(), "Use 'svg' or 'dot'")
            })?
        } else if render {
            OutputFormat::from_path(&output).map_err(|e| {
                CliError::config_with_help(
                    format!("{e} (output {})", output.display()),
                    "Pass --format or use an output path ending in .svg, .dot or .gv",
                )
            })?
        } else {
            OutputFormat::from_path(&output).unwrap_or_default()
        };

        Ok(Self {
            input,
            output,
            format,
            render,
        })
    }
}
