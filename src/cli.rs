use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::config::{self, ConverterConfig, HistoryEntry};
use crate::commands::convert::{convert_in_background, ConvertOptions, Converter};
use crate::mapper::ScriptExtension;
use crate::util::expand_tilde;

#[derive(Debug, Parser)]
#[command(name = "rbxmx-to-rojo", version, about = "Convert Roblox XML places and models into Rojo projects")]
pub struct Cli {
    /// Log every file written.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a .rbxmx/.rbxlx file into a Rojo project.
    Convert {
        input: String,
        /// Project directory. Defaults to a folder named after the input file.
        #[arg(short, long)]
        output: Option<String>,
        /// Write `.luau` files instead of `.lua`.
        #[arg(long)]
        luau: bool,
    },
    /// Check whether a file can be converted.
    Probe { input: String },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Output directory for `input` when none was given: a sibling folder named
/// after the file stem, placed in the last used output directory if known.
fn default_output(input: &Path, config: &ConverterConfig) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "rojo_project".to_string());
    let parent = match &config.last_output_dir {
        Some(dir) => expand_tilde(dir),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    parent.join(stem)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);
    let config = config::load_config();

    match cli.command {
        Command::Convert {
            input,
            output,
            luau,
        } => {
            let input = expand_tilde(&input);
            let output = match output {
                Some(output) => expand_tilde(&output),
                None => default_output(&input, &config),
            };
            let script_extension = if luau {
                ScriptExtension::Luau
            } else {
                config.script_extension
            };

            let converter = Converter::new(&output).with_options(ConvertOptions { script_extension });
            let report = convert_in_background(converter, input.clone())
                .await
                .with_context(|| format!("failed to convert {}", input.display()))?;

            let entry = HistoryEntry {
                input: input.to_string_lossy().to_string(),
                output: output.to_string_lossy().to_string(),
                converted_at: unix_timestamp(),
            };
            if let Err(e) = config::save_conversion(entry) {
                tracing::warn!("Could not save conversion history: {e}");
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Probe { input } => {
            let input = expand_tilde(&input);
            let format = Converter::new(PathBuf::new())
                .probe(&input)
                .with_context(|| format!("cannot convert {}", input.display()))?;
            println!("{}: {format:?}", input.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::parse_from(["rbxmx-to-rojo", "convert", "place.rbxlx", "-o", "out", "--luau"]);
        match cli.command {
            Command::Convert { input, output, luau } => {
                assert_eq!(input, "place.rbxlx");
                assert_eq!(output.as_deref(), Some("out"));
                assert!(luau);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_output_uses_stem() {
        let config = ConverterConfig::default();
        assert_eq!(
            default_output(Path::new("/games/Obby.rbxlx"), &config),
            PathBuf::from("/games/Obby")
        );

        let config = ConverterConfig {
            last_output_dir: Some("/projects".into()),
            ..ConverterConfig::default()
        };
        assert_eq!(
            default_output(Path::new("/games/Obby.rbxlx"), &config),
            PathBuf::from("/projects/Obby")
        );
    }
}
