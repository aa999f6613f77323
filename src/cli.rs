//! # CLI Module
//!
//! This module provides the command-line interface for subx2nc, including:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variable support with the SUBX2NC_ prefix
//! - Subcommands for fetching, validating, inspecting and templating
//! - Shell completions

use crate::input::{FieldConfig, JobConfig, MetadataConfig, ModelConfig};
use crate::catalog::{DEFAULT_BASE_URL, DEFAULT_FORECAST_TYPE};
use crate::input::DEFAULT_FILL_VALUE;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fetch SubX subseasonal forecast fields into per-member NetCDF files
#[derive(Parser, Debug)]
#[command(name = "subx2nc")]
#[command(about = "Fetch SubX forecast fields over OPeNDAP into per-member NetCDF files")]
#[command(version)]
#[command(long_about = "
subx2nc reads SubX subseasonal hindcast fields from the IRI Data Library over OPeNDAP
and writes one NetCDF file per model, variable, ensemble member and start date.

FEATURES:
  • Axis discovery: X, Y, L, M, S and optional P axes are classified at runtime
  • Pressure levels: the requested level is resolved to its index on the P axis
  • Resilient batches: failed variables and files are skipped and summarized
  • Configuration files: JSON and YAML format support with templates
  • Shell completions: Auto-completion for bash, zsh, fish, and PowerShell

EXAMPLES:
  # Fetch everything a config file names
  subx2nc --config subx.yaml fetch

  # Plan the run without downloading anything
  subx2nc --config subx.yaml fetch --dry-run

  # Inspect one remote field
  subx2nc info --group GMAO --model GEOS_V2p1 --variable ua --plev 850

  # Start from a template
  subx2nc template pressure-levels --format yaml -o subx.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "SUBX2NC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every configured field and write the output files
    #[command(long_about = "
Fetch every (model, field) pair named in the configuration.

For each field the remote axes are inspected once, then one NetCDF file is
written per ensemble member and start date. Existing files are replaced.
A variable or file that fails is reported and skipped unless --fail-fast is given.

EXAMPLES:
  # Fetch using a config file
  subx2nc --config subx.json fetch

  # Write somewhere else than the configured out_path
  subx2nc --config subx.json fetch --out-path /scratch/subx

  # Check what would be written
  subx2nc --config subx.json fetch --dry-run
")]
    Fetch {
        /// Override the output base path from config
        #[arg(long, env = "SUBX2NC_OUT_PATH")]
        out_path: Option<PathBuf>,

        /// Inspect fields and list output files without downloading or writing
        #[arg(long, env = "SUBX2NC_DRY_RUN")]
        dry_run: bool,

        /// Stop at the first failing variable or file
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration file
    #[command(long_about = "
Validate a configuration file without contacting the server.

EXAMPLES:
  # Validate a configuration file
  subx2nc validate subx.json

  # Also list every remote field and output directory
  subx2nc validate subx.yaml --detailed
")]
    Validate {
        /// Configuration file to validate
        config_file: Option<PathBuf>,

        /// Show the remote fields and output directories of the job
        #[arg(long)]
        detailed: bool,
    },

    /// Show the axes of one remote field
    #[command(long_about = "
Open one SubX field and display its axes, attributes and start-date range.
When --plev is given the pressure level is resolved to its index as well.

EXAMPLES:
  subx2nc info --group GMAO --model GEOS_V2p1 --variable ua --plev 850
  subx2nc info --group RSMAS --model CCSM4 --variable tas --format json
")]
    Info {
        /// Modeling group, e.g. GMAO
        #[arg(long)]
        group: String,

        /// Model name, e.g. GEOS_V2p1
        #[arg(long)]
        model: String,

        /// Variable name, e.g. ua
        #[arg(short = 'n', long)]
        variable: String,

        /// Pressure level to resolve, e.g. 850
        #[arg(long)]
        plev: Option<String>,

        /// Root of the SubX catalog
        #[arg(long, default_value = DEFAULT_BASE_URL, env = "SUBX2NC_BASE_URL")]
        base_url: String,

        /// Catalog branch
        #[arg(long, default_value = DEFAULT_FORECAST_TYPE)]
        forecast_type: String,

        /// Output format for field information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate configuration templates
    #[command(long_about = "
Generate configuration file templates for common use cases.

Available templates:
• basic: One surface field from one model
• pressure-levels: Upper-air fields on several pressure levels
• multi-model: Several fields from several modeling groups

EXAMPLES:
  subx2nc template basic
  subx2nc template multi-model --format yaml -o subx.yaml
")]
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    #[command(long_about = "
Generate shell completion scripts for bash, zsh, fish, and PowerShell.

EXAMPLES:
  subx2nc completions bash > ~/.bash_completion.d/subx2nc
  subx2nc completions zsh -o _subx2nc
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output (where applicable)
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// One surface field from one model
    Basic,
    /// Upper-air fields on pressure levels
    PressureLevels,
    /// Several fields from several modeling groups
    MultiModel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

fn field(variable: &str, plev: &str) -> FieldConfig {
    FieldConfig {
        variable: variable.to_string(),
        plev: plev.to_string(),
    }
}

fn model(group: &str, model: &str) -> ModelConfig {
    ModelConfig {
        group: group.to_string(),
        model: model.to_string(),
    }
}

/// Builds the configuration for a template.
pub fn template_config(template: TemplateType) -> JobConfig {
    let (fields, models) = match template {
        TemplateType::Basic => (vec![field("tas", "2m")], vec![model("GMAO", "GEOS_V2p1")]),
        TemplateType::PressureLevels => (
            vec![
                field("ua", "850"),
                field("ua", "200"),
                field("va", "850"),
                field("va", "200"),
                field("zg", "500"),
            ],
            vec![model("GMAO", "GEOS_V2p1")],
        ),
        TemplateType::MultiModel => (
            vec![field("pr", "sfc"), field("tas", "2m"), field("zg", "500")],
            vec![
                model("GMAO", "GEOS_V2p1"),
                model("RSMAS", "CCSM4"),
                model("ESRL", "FIMr1p1"),
                model("ECCC", "GEM"),
                model("NRL", "NESM"),
                model("EMC", "GEFS"),
            ],
        ),
    };

    JobConfig {
        out_path: PathBuf::from("./subx"),
        fields,
        models,
        base_url: DEFAULT_BASE_URL.to_string(),
        forecast_type: DEFAULT_FORECAST_TYPE.to_string(),
        fill_value: DEFAULT_FILL_VALUE,
        metadata: MetadataConfig::default(),
    }
}

/// Serializes a configuration in the requested format.
pub fn render_config(config: &JobConfig, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
