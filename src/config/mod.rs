pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use std::path::{Path, PathBuf};

/// 預設的人物簡介檔，與模型輸出放在同一目錄
pub const DEFAULT_BIO_FILE: &str = "char_bio_merged.jsonl";

fn default_bio_file(model_outputs: &Path) -> PathBuf {
    model_outputs
        .parent()
        .map(|dir| dir.join(DEFAULT_BIO_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BIO_FILE))
}

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "keyword-annotate")]
#[command(about = "Prepare, serve and score human keyword validation annotations")]
pub struct CliConfig {
    /// Path to annotation.toml (defaults to ./annotation.toml or built-in targets)
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log process CPU and memory usage per pipeline phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[cfg(feature = "cli")]
#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show the annotation targets and their URLs
    List,
    /// Verify config files, ports and output directories of all targets
    Check(CheckArgs),
    /// Start the annotation server for one target
    Launch(LaunchArgs),
    /// Build the annotation data file from model outputs and biographies
    Prepare(PrepareArgs),
    /// Append unseen characters to an existing annotation data file
    AddSamples(AddSamplesArgs),
    /// Score human annotations against model keywords
    Overlap(OverlapArgs),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct CheckArgs {
    /// Directory the target config paths are relative to
    #[cfg_attr(feature = "cli", arg(long, default_value = "."))]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct LaunchArgs {
    /// Target name or model name
    pub target: String,

    /// Port override
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub port: Option<u16>,

    /// Print the command line without starting the server
    #[cfg_attr(feature = "cli", arg(long))]
    pub dry_run: bool,

    /// Wait until the server answers HTTP before reporting it started
    #[cfg_attr(feature = "cli", arg(long))]
    pub wait_ready: bool,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct PrepareArgs {
    /// Path to model outputs JSONL
    #[cfg_attr(
        feature = "cli",
        arg(long, default_value = "model_outputs/char_personality_gpt5_mini_v2.jsonl")
    )]
    pub model_outputs: PathBuf,

    /// Character biography file (JSON/JSONL/CSV); defaults to char_bio_merged.jsonl next to the model outputs
    #[cfg_attr(feature = "cli", arg(long))]
    pub bio_file: Option<PathBuf>,

    /// Output path for the annotation data
    #[cfg_attr(feature = "cli", arg(long, default_value = "data/keyword_annotation.jsonl"))]
    pub output: PathBuf,

    /// Number of characters to sample
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 100))]
    pub sample_size: usize,

    /// Total number of keywords to show per character
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 20))]
    pub candidate_pool_size: usize,

    /// Append a "None of the above" candidate
    #[cfg_attr(feature = "cli", arg(long))]
    pub include_none_option: bool,

    /// Seed for reproducible sampling
    #[cfg_attr(feature = "cli", arg(long))]
    pub seed: Option<u64>,
}

impl PrepareArgs {
    pub fn bio_file(&self) -> PathBuf {
        self.bio_file
            .clone()
            .unwrap_or_else(|| default_bio_file(&self.model_outputs))
    }
}

impl Default for PrepareArgs {
    fn default() -> Self {
        Self {
            model_outputs: PathBuf::from("model_outputs/char_personality_gpt5_mini_v2.jsonl"),
            bio_file: None,
            output: PathBuf::from("data/keyword_annotation.jsonl"),
            sample_size: 100,
            candidate_pool_size: 20,
            include_none_option: false,
            seed: None,
        }
    }
}

impl Validate for PrepareArgs {
    fn validate(&self) -> Result<()> {
        validate_path("model_outputs", &self.model_outputs)?;
        validate_path("output", &self.output)?;
        validate_positive_number("sample_size", self.sample_size, 1)?;
        validate_positive_number("candidate_pool_size", self.candidate_pool_size, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct AddSamplesArgs {
    /// Path to existing annotation JSONL file
    #[cfg_attr(feature = "cli", arg(long))]
    pub existing_file: PathBuf,

    /// Path to model outputs JSONL
    #[cfg_attr(
        feature = "cli",
        arg(long, default_value = "model_outputs/char_personality_qwen3_32b_fp8.jsonl")
    )]
    pub model_outputs: PathBuf,

    /// Character biography file; defaults to char_bio_merged.jsonl next to the model outputs
    #[cfg_attr(feature = "cli", arg(long))]
    pub bio_file: Option<PathBuf>,

    /// Number of new samples to add
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 20))]
    pub num_samples: usize,

    /// Total number of keywords to show per character
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 20))]
    pub candidate_pool_size: usize,

    /// Seed for reproducible sampling
    #[cfg_attr(feature = "cli", arg(long))]
    pub seed: Option<u64>,
}

impl AddSamplesArgs {
    pub fn new(existing_file: impl Into<PathBuf>) -> Self {
        Self {
            existing_file: existing_file.into(),
            model_outputs: PathBuf::from("model_outputs/char_personality_qwen3_32b_fp8.jsonl"),
            bio_file: None,
            num_samples: 20,
            candidate_pool_size: 20,
            seed: None,
        }
    }

    pub fn bio_file(&self) -> PathBuf {
        self.bio_file
            .clone()
            .unwrap_or_else(|| default_bio_file(&self.model_outputs))
    }
}

impl Validate for AddSamplesArgs {
    fn validate(&self) -> Result<()> {
        validate_path("existing_file", &self.existing_file)?;
        validate_path("model_outputs", &self.model_outputs)?;
        validate_positive_number("num_samples", self.num_samples, 1)?;
        validate_positive_number("candidate_pool_size", self.candidate_pool_size, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct OverlapArgs {
    /// Derive the data and annotation paths from this target's model and output directory
    #[cfg_attr(feature = "cli", arg(long))]
    pub target: Option<String>,

    /// Annotation data JSONL given to the server
    #[cfg_attr(feature = "cli", arg(long))]
    pub original_data: Option<PathBuf>,

    /// annotated_instances.jsonl written by the server
    #[cfg_attr(feature = "cli", arg(long))]
    pub annotated_data: Option<PathBuf>,

    /// Where to write the metrics report
    #[cfg_attr(
        feature = "cli",
        arg(long, default_value = "output/annotation_overlap_metrics.json")
    )]
    pub output: PathBuf,
}

impl Default for OverlapArgs {
    fn default() -> Self {
        Self {
            target: None,
            original_data: None,
            annotated_data: None,
            output: PathBuf::from("output/annotation_overlap_metrics.json"),
        }
    }
}

/// Fully resolved inputs of the overlap computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapPaths {
    pub original_data: PathBuf,
    pub annotated_data: PathBuf,
    pub output: PathBuf,
}

impl OverlapArgs {
    /// 明確指定的路徑優先，其次為目標推導的路徑，最後是 qwen3_32b_fp8 的預設值
    pub fn resolve(&self, manifest: &toml_config::Manifest) -> Result<OverlapPaths> {
        let model = match &self.target {
            Some(name) => Some(manifest.find(name)?),
            None => None,
        };

        let original_data = self.original_data.clone().unwrap_or_else(|| {
            let model_name = model.map(|t| t.model.as_str()).unwrap_or("qwen3_32b_fp8");
            PathBuf::from(format!("data/keyword_annotation_{}.jsonl", model_name))
        });
        let annotated_data = self.annotated_data.clone().unwrap_or_else(|| {
            let output_dir = model.map(|t| t.output_dir.clone()).unwrap_or_else(|| {
                PathBuf::from("annotation_output/keyword_annotation_qwen3_32b_fp8")
            });
            output_dir.join("annotated_instances.jsonl")
        });

        validate_path("output", &self.output)?;

        Ok(OverlapPaths {
            original_data,
            annotated_data,
            output: self.output.clone(),
        })
    }
}
