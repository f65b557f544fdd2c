//! trm-codec CLI
//!
//! Convert TRM files to JSON and back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use trm_codec::{Converter, TrmOutput};

#[derive(Parser, Debug)]
#[command(name = "trm-codec")]
#[command(version)]
#[command(about = "Convert between TRM and JSON files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a TRM file (binary or legacy text) to JSON
    ToJson {
        /// Path to the source TRM file
        input: PathBuf,

        /// Path to write the JSON output
        output: PathBuf,
    },

    /// Convert a JSON file back to TRM
    ToTrm {
        /// Path to the source JSON file
        input: PathBuf,

        /// Path to write the TRM output
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ToJson { input, output } => to_json(&input, &output),
        Commands::ToTrm { input, output } => to_trm(&input, &output),
    }
}

fn to_json(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read(input)
        .with_context(|| format!("Failed to read TRM file: {}", input.display()))?;

    let document = Converter::new().decode(&data)?;
    let mut json = serde_json::to_string_pretty(&document)?;
    json.push('\n');

    fs::write(output, json)
        .with_context(|| format!("Failed to write JSON file: {}", output.display()))?;
    Ok(())
}

fn to_trm(input: &Path, output: &Path) -> Result<()> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read JSON file: {}", input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .with_context(|| format!("Invalid JSON in {}", input.display()))?;

    match Converter::new().encode(&value)? {
        TrmOutput::Bytes(bytes) => fs::write(output, bytes)
            .with_context(|| format!("Failed to write TRM file: {}", output.display()))?,
        TrmOutput::Text(text) => fs::write(output, text)
            .with_context(|| format!("Failed to write TRM file: {}", output.display()))?,
    }
    Ok(())
}
