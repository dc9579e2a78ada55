//! Shared types, error model, and configuration for hotdogjobs.
//!
//! This crate is the foundation depended on by all other hotdogjobs crates.
//! It provides:
//! - [`HotdogError`], the unified error type
//! - Domain types ([`Job`] and its enrichment enums)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GeneratorConfig, PipelineConfig, ServerConfig, SinkConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HotdogError, Result};
pub use types::{
    BRAZILIAN_COMPLEMENTS, BreadType, Complement, Job, SausageType, Style, new_job_id,
};
