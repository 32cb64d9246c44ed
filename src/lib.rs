//! Converts Roblox XML places and models (`.rbxmx`/`.rbxlx`) into Rojo
//! projects: a `src/` tree of scripts and `.meta.json` sidecars plus a
//! `default.project.json`.
//!
//! Only instances that are scripts, or contain scripts somewhere below them,
//! are written out.

pub mod classify;
pub mod cli;
pub mod commands;
pub mod error;
pub mod instance;
pub mod mapper;
pub mod parser;
pub mod project;
pub mod util;

pub use commands::convert::{convert_in_background, ConversionReport, ConvertOptions, Converter};
pub use error::{ConvertError, Result};
pub use instance::{Instance, InstanceId, InstanceTree, Variant};
pub use mapper::{NodeDescriptor, ProjectMapper, ScriptExtension};
pub use parser::{parse_xml, BinaryDecoder, SceneFormat};

/// Entry point for the `rbxmx-to-rojo` binary.
pub async fn run() -> anyhow::Result<()> {
    use clap::Parser;
    cli::run(cli::Cli::parse()).await
}
