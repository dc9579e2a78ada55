//! Pipeline wiring: entry → ingestion → bread → sausage → style → finalizer → store.
//!
//! [`Pipeline::start`] creates one bounded channel per hop and spawns one
//! worker per stage. Every channel has exactly one consumer, so jobs are
//! materialized in the order they entered.

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use hotdogjobs_shared::{GeneratorConfig, HotdogError, Job, PipelineConfig, Result};
use hotdogjobs_storage::{StoreReader, StoreWriter};

use crate::generator::Generator;
use crate::sink::CompletionSink;
use crate::stages::{Stage, StageReport, run_finalizer, run_stage};

/// A running pipeline. Built once at startup and shut down once.
pub struct Pipeline {
    entry: Option<mpsc::Sender<Job>>,
    store: StoreReader,
    workers: Vec<JoinHandle<StageReport>>,
    generator: Option<JoinHandle<u64>>,
    cancel: CancellationToken,
}

/// Cloneable handle for feeding externally submitted jobs into the pipeline.
///
/// Holds only a weak reference to the entry channel, so outstanding handles
/// never keep a shut-down pipeline open.
#[derive(Clone)]
pub struct JobSubmitter {
    entry: mpsc::WeakSender<Job>,
}

impl JobSubmitter {
    /// Validate that `job` is fresh and enqueue it. Suspends while the entry
    /// channel is full.
    pub async fn submit(&self, job: Job) -> Result<()> {
        job.ensure_fresh()?;
        let entry = self
            .entry
            .upgrade()
            .ok_or(HotdogError::SendFailure { stage: "entry" })?;
        entry
            .send(job)
            .await
            .map_err(|_| HotdogError::SendFailure { stage: "entry" })
    }
}

impl fmt::Debug for JobSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSubmitter").finish_non_exhaustive()
    }
}

/// Counters collected when the pipeline drains.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Jobs produced by the generator timer.
    pub generated: u64,
    /// One report per stage, in pipeline order.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Jobs written to the store.
    pub fn materialized(&self) -> u64 {
        self.stages
            .iter()
            .find(|r| r.stage == Stage::Finalizer)
            .map_or(0, |r| r.forwarded)
    }

    /// Jobs dropped anywhere in the pipeline.
    pub fn dropped(&self) -> u64 {
        self.stages.iter().map(|r| r.dropped).sum()
    }
}

impl Pipeline {
    /// Create the channels and store, and spawn one worker per stage.
    /// Must be called from within a tokio runtime.
    pub fn start(config: &PipelineConfig, sink: Box<dyn CompletionSink>) -> Self {
        let capacity = config.channel_capacity.max(1);

        let (entry_tx, entry_rx) = mpsc::channel(capacity);
        let (bread_tx, bread_rx) = mpsc::channel(capacity);
        let (sausage_tx, sausage_rx) = mpsc::channel(capacity);
        let (style_tx, style_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);

        let store = StoreWriter::open_in_memory();
        let reader = store.reader();

        let workers = vec![
            tokio::spawn(run_stage(Stage::Ingestion, entry_rx, bread_tx)),
            tokio::spawn(run_stage(Stage::Bread, bread_rx, sausage_tx)),
            tokio::spawn(run_stage(Stage::Sausage, sausage_rx, style_tx)),
            tokio::spawn(run_stage(Stage::Style, style_rx, output_tx)),
            tokio::spawn(run_finalizer(output_rx, store, sink)),
        ];

        info!(capacity, stages = workers.len(), "pipeline started");

        Self {
            entry: Some(entry_tx),
            store: reader,
            workers,
            generator: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Start the job timer. Does nothing if it is disabled or already running.
    /// Fails on a zero interval.
    pub fn spawn_generator(&mut self, config: &GeneratorConfig) -> Result<()> {
        self.spawn_generator_with(config, |generator| generator)
    }

    /// Start the job timer after letting the caller adjust the generator.
    pub fn spawn_generator_with(
        &mut self,
        config: &GeneratorConfig,
        customize: impl FnOnce(Generator) -> Generator,
    ) -> Result<()> {
        if !config.enabled {
            info!("generator disabled");
            return Ok(());
        }
        if self.generator.is_some() {
            warn!("generator already running");
            return Ok(());
        }
        let Some(entry) = self.entry.clone() else {
            return Ok(());
        };

        let generator = customize(Generator::new(config.interval(), entry));
        if generator.interval().is_zero() {
            return Err(HotdogError::config(
                "generator interval must be greater than zero",
            ));
        }
        info!(interval = ?generator.interval(), "generator started");
        self.generator = Some(tokio::spawn(generator.run(self.cancel.child_token())));
        Ok(())
    }

    /// Handle for submitting jobs from outside the pipeline.
    pub fn submitter(&self) -> JobSubmitter {
        let entry = self
            .entry
            .as_ref()
            .map(mpsc::Sender::downgrade)
            .unwrap_or_else(|| mpsc::channel::<Job>(1).0.downgrade());
        JobSubmitter { entry }
    }

    /// Read-only view of the materialized store.
    pub fn store(&self) -> StoreReader {
        self.store.clone()
    }

    /// Stop the generator, close the entry channel, and wait for every stage
    /// to drain its inbound channel.
    #[instrument(skip_all)]
    pub async fn shutdown(mut self) -> PipelineReport {
        self.cancel.cancel();

        let mut report = PipelineReport::default();
        if let Some(generator) = self.generator.take() {
            match generator.await {
                Ok(generated) => report.generated = generated,
                Err(e) => warn!(error = %e, "generator task failed"),
            }
        }

        drop(self.entry.take());

        for worker in self.workers.drain(..) {
            match worker.await {
                Ok(stage_report) => report.stages.push(stage_report),
                Err(e) => warn!(error = %e, "stage task failed"),
            }
        }

        info!(
            generated = report.generated,
            materialized = report.materialized(),
            dropped = report.dropped(),
            stored = self.store.len(),
            "pipeline drained"
        );
        report
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("open", &self.entry.is_some())
            .field("workers", &self.workers.len())
            .field("generator", &self.generator.is_some())
            .field("store", &self.store)
            .finish()
    }
}
