pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::Manifest};

pub use adapters::launcher::{LaunchOptions, LaunchOutcome, Launcher};
pub use app::pipelines::{AddSamplesPipeline, OverlapPipeline, PreparePipeline};
pub use crate::core::engine::PipelineEngine;
pub use utils::error::{AnnotateError, Result};
