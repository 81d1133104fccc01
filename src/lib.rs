pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;

pub use adapters::fred::FredClient;
pub use core::{etl::EtlEngine, pipeline::RatePipeline};
pub use utils::error::{EtlError, Result};
