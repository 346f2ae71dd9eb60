use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tagsync")]
#[command(about = "tagsync — plan and rehearse tag reconciliation for cloud resources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./tagsync.toml when present)
    #[arg(short, long, global = true, env = "TAGSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Record shape used when printing tags as JSON.
#[derive(Clone, Copy, ValueEnum, Default)]
pub enum WireShape {
    /// `{"key": "value"}`
    #[default]
    Map,
    /// `[{"Key": .., "Value": ..}]`
    KeyValue,
    /// `[{"TagKey": .., "TagValue": ..}]`
    Kms,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the changes needed to move from one desired tag set to another
    Plan(PlanArgs),
    /// List known service profiles
    Services,
    /// Apply a change against an in-memory resource and report what happened
    Rehearse(RehearseArgs),
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Service profile (see `tagsync services`)
    #[arg(short, long, default_value = "generic")]
    pub service: String,
    /// Previously applied tags (JSON file)
    #[arg(long)]
    pub previous: Option<PathBuf>,
    /// Desired tags (JSON file, reads from stdin if omitted)
    #[arg(long)]
    pub current: Option<PathBuf>,
    /// Shape of the upsert records in JSON output
    #[arg(long, default_value = "map")]
    pub shape: WireShape,
}

#[derive(clap::Args)]
pub struct RehearseArgs {
    /// Service profile (see `tagsync services`)
    #[arg(short, long, default_value = "generic")]
    pub service: String,
    /// Resource identifier
    #[arg(short, long, default_value = "rehearsal-resource")]
    pub resource_id: String,
    /// Previously applied tags (JSON file)
    #[arg(long)]
    pub previous: Option<PathBuf>,
    /// Desired tags (JSON file, reads from stdin if omitted)
    #[arg(long)]
    pub current: Option<PathBuf>,
    /// Tags currently on the resource (defaults to the previous tags)
    #[arg(long)]
    pub remote: Option<PathBuf>,
    /// Seconds before the resource becomes visible to the tagging API
    #[arg(long, default_value_t = 0)]
    pub visible_after_secs: u64,
}
