//! Staged enrichment pipeline for hot-dog jobs.
//!
//! This crate ties together the job generator, the enrichment stages, and
//! the finalizer that materializes jobs into the store (see [`pipeline`]).

pub mod generator;
pub mod pipeline;
pub mod sink;
pub mod stages;

pub use generator::Generator;
pub use pipeline::{JobSubmitter, Pipeline, PipelineReport};
pub use sink::{CompletionSink, FanoutSink, JsonLinesSink, LogSink, NullSink};
pub use stages::{Stage, StageReport};
