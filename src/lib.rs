pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

pub use adapters::LocalStorage;
pub use app::{LabelPipeline, SortPipeline};
pub use config::{toml_config::JobConfig, CliConfig, Command};
pub use core::etl::EtlEngine;
pub use domain::model::{GenerationReport, SortReport};
pub use utils::error::{LabelError, Result};
