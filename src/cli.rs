use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{RawSourceConfig, SourceConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build `gallery-index.json` from an ImgBed listing.
    Generate(GenerateArgs),
    /// Print the directory tree of an ImgBed listing.
    Directories(DirectoriesArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file path for the gallery index.
    #[arg(long, default_value = "gallery-index.json")]
    pub out: PathBuf,

    /// Overwrite `--out` if it already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct DirectoriesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print only this subtree (falls back to the root when not found).
    #[arg(long)]
    pub select: Option<String>,
}

/// ImgBed source flags. Each one overrides the matching `IMGBED_*`
/// environment variable.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// ImgBed origin, e.g. `https://img.example.com`.
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub token: Option<String>,

    #[arg(long)]
    pub list_endpoint: Option<String>,

    #[arg(long)]
    pub random_endpoint: Option<String>,

    /// One of auto, landscape, portrait, square.
    #[arg(long)]
    pub random_orientation: Option<String>,

    #[arg(long)]
    pub file_route_prefix: Option<String>,

    /// Only list files under this directory.
    #[arg(long)]
    pub list_dir: Option<String>,

    #[arg(long)]
    pub preview_dir: Option<String>,

    /// Category for files directly under the listed directory.
    #[arg(long)]
    pub default_category: Option<String>,

    /// Records requested per page (1..=500).
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Ask the listing API to descend into subdirectories.
    #[arg(long)]
    pub recursive: Option<String>,

    /// Pair originals with thumbnails under the preview directory.
    #[arg(long)]
    pub preview_mapping: Option<String>,

    /// Per-request timeout for listing calls.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl SourceArgs {
    pub fn as_raw(&self) -> RawSourceConfig {
        let loose = |v: &Option<String>| v.clone().map(serde_json::Value::String);
        RawSourceConfig {
            base_url: self.base_url.clone(),
            list_endpoint: self.list_endpoint.clone(),
            random_endpoint: self.random_endpoint.clone(),
            random_orientation: self.random_orientation.clone(),
            file_route_prefix: self.file_route_prefix.clone(),
            api_token: self.token.clone(),
            list_dir: self.list_dir.clone(),
            preview_dir: self.preview_dir.clone(),
            default_category: self.default_category.clone(),
            recursive: loose(&self.recursive),
            page_size: self.page_size.map(serde_json::Value::from),
            enable_preview_mapping: loose(&self.preview_mapping),
        }
    }

    /// Flags layered over `env`.
    pub fn resolve(&self, env: &RawSourceConfig) -> SourceConfig {
        SourceConfig::from_raw(&self.as_raw().merged_over(env))
    }
}
