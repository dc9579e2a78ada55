//! Enrichment stages and their worker loops.
//!
//! Each stage owns exactly one inbound channel and forwards every job it
//! accepts to exactly one outbound channel, so FIFO order is preserved end to
//! end. A job that fails enrichment, or cannot be handed downstream, is logged
//! and dropped; the stage keeps consuming.

use std::fmt;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use hotdogjobs_shared::{BreadType, HotdogError, Job, Result, SausageType, Style, new_job_id};
use hotdogjobs_storage::StoreWriter;

use crate::sink::CompletionSink;

/// The enrichment steps a job passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingestion,
    Bread,
    Sausage,
    Style,
    Finalizer,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Ingestion,
        Stage::Bread,
        Stage::Sausage,
        Stage::Style,
        Stage::Finalizer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Bread => "bread",
            Stage::Sausage => "sausage",
            Stage::Style => "style",
            Stage::Finalizer => "finalizer",
        }
    }

    /// Apply this stage's field assignments to `job`.
    pub fn apply(self, job: &mut Job) -> Result<()> {
        match self {
            Stage::Ingestion => ingest(job),
            Stage::Bread => choose_bread(job),
            Stage::Sausage => choose_sausage(job),
            Stage::Style => choose_style(job),
            Stage::Finalizer => finish(job),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Stage transformations
// ---------------------------------------------------------------------------

/// Assign a fresh id and the creation time.
pub fn ingest(job: &mut Job) -> Result<()> {
    job.assign_identity(new_job_id(), Utc::now())
}

pub fn choose_bread(job: &mut Job) -> Result<()> {
    job.assign_bread_type(BreadType::for_health(job.health()))
}

pub fn choose_sausage(job: &mut Job) -> Result<()> {
    job.assign_sausage_type(SausageType::for_health(job.health()))
}

/// Pick the style; Brazilian style also brings its complements.
pub fn choose_style(job: &mut Job) -> Result<()> {
    let style = Style::for_health(job.health());
    if !job.complements().is_empty() {
        return Err(HotdogError::AlreadyAssigned {
            field: "complements",
        });
    }
    job.assign_style(style)?;
    let complements = style.complements();
    if !complements.is_empty() {
        job.assign_complements(complements.to_vec())?;
    }
    Ok(())
}

/// Stamp the completion time. The job must already carry an id.
pub fn finish(job: &mut Job) -> Result<()> {
    if job.id().is_none() {
        return Err(HotdogError::MissingField { field: "id" });
    }
    job.assign_finished_at(Utc::now())
}

// ---------------------------------------------------------------------------
// Worker loops
// ---------------------------------------------------------------------------

/// Counters reported by a stage worker once its inbound channel closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    /// Jobs handed downstream (or materialized, for the finalizer).
    pub forwarded: u64,
    /// Jobs logged and discarded.
    pub dropped: u64,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            forwarded: 0,
            dropped: 0,
        }
    }
}

/// Consume `rx` until it closes, enrich each job with `stage`, forward to `tx`.
pub async fn run_stage(
    stage: Stage,
    mut rx: mpsc::Receiver<Job>,
    tx: mpsc::Sender<Job>,
) -> StageReport {
    let mut report = StageReport::new(stage);

    while let Some(mut job) = rx.recv().await {
        debug!(%stage, id = job.id().unwrap_or("-"), health = job.health(), "processing job");

        if let Err(e) = stage.apply(&mut job) {
            warn!(%stage, id = job.id().unwrap_or("-"), error = %e, "enrichment failed, dropping job");
            report.dropped += 1;
            continue;
        }

        if tx.send(job).await.is_err() {
            let e = HotdogError::SendFailure { stage: stage.name() };
            warn!(%stage, error = %e, "dropping job");
            report.dropped += 1;
            continue;
        }
        report.forwarded += 1;
    }

    let closed = HotdogError::ChannelClosed {
        channel: stage.name(),
    };
    debug!(%stage, reason = %closed, "stage stopping");
    report
}

/// Consume fully enriched jobs, stamp them, write them to the store, then
/// publish them to `sink`. The store write is never undone by a sink failure.
pub async fn run_finalizer(
    mut rx: mpsc::Receiver<Job>,
    store: StoreWriter,
    mut sink: Box<dyn CompletionSink>,
) -> StageReport {
    let stage = Stage::Finalizer;
    let mut report = StageReport::new(stage);

    while let Some(mut job) = rx.recv().await {
        if let Err(e) = stage.apply(&mut job).and_then(|()| store.materialize(job.clone())) {
            warn!(%stage, id = job.id().unwrap_or("-"), error = %e, "could not materialize job, dropping");
            report.dropped += 1;
            continue;
        }
        report.forwarded += 1;
        info!(
            id = job.id().unwrap_or("-"),
            health = job.health(),
            stored = store.len(),
            "job materialized"
        );

        if let Err(e) = sink.publish(&job) {
            warn!(id = job.id().unwrap_or("-"), error = %e, "completion sink failed");
        }
    }

    if let Err(e) = sink.flush() {
        warn!(error = %e, "completion sink flush failed");
    }
    debug!(%stage, "stage stopping");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use hotdogjobs_shared::BRAZILIAN_COMPLEMENTS;

    fn enrich_all(health: bool) -> Job {
        let mut job = Job::new(health);
        for stage in Stage::ALL {
            stage.apply(&mut job).expect("stage applies");
        }
        job
    }

    #[test]
    fn healthy_job_is_american() {
        let job = enrich_all(true);
        assert!(job.is_complete());
        assert_eq!(job.bread_type(), Some(BreadType::Whole));
        assert_eq!(job.sausage_type(), Some(SausageType::Vegan));
        assert_eq!(job.style(), Some(Style::American));
        assert!(job.complements().is_empty());
    }

    #[test]
    fn unhealthy_job_is_brazilian_with_complements() {
        let job = enrich_all(false);
        assert!(job.is_complete());
        assert_eq!(job.bread_type(), Some(BreadType::Milk));
        assert_eq!(job.sausage_type(), Some(SausageType::Pork));
        assert_eq!(job.style(), Some(Style::Brazilian));
        assert_eq!(job.complements(), &BRAZILIAN_COMPLEMENTS);
    }

    #[test]
    fn created_before_finished() {
        let job = enrich_all(true);
        assert!(job.created_at().unwrap() <= job.finished_at().unwrap());
    }

    #[test]
    fn stages_refuse_to_run_twice() {
        let mut job = enrich_all(false);
        for stage in Stage::ALL {
            assert!(stage.apply(&mut job).is_err(), "{stage} overwrote a field");
        }
    }

    #[test]
    fn finish_requires_identity() {
        let mut job = Job::new(true);
        let err = finish(&mut job).unwrap_err();
        assert!(matches!(err, HotdogError::MissingField { field: "id" }));
        assert!(job.finished_at().is_none());
    }

    #[test]
    fn stage_names_are_ordered() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["ingestion", "bread", "sausage", "style", "finalizer"]);
    }

    #[tokio::test]
    async fn stage_worker_forwards_in_order() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let worker = tokio::spawn(run_stage(Stage::Bread, in_rx, out_tx));

        in_tx.send(Job::new(true)).await.unwrap();
        in_tx.send(Job::new(false)).await.unwrap();
        drop(in_tx);

        let report = worker.await.unwrap();
        assert_eq!(report.forwarded, 2);
        assert_eq!(report.dropped, 0);
        assert_eq!(out_rx.recv().await.unwrap().bread_type(), Some(BreadType::Whole));
        assert_eq!(out_rx.recv().await.unwrap().bread_type(), Some(BreadType::Milk));
        assert!(out_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stage_worker_drops_invalid_jobs() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let worker = tokio::spawn(run_stage(Stage::Sausage, in_rx, out_tx));

        let mut already = Job::new(true);
        already.assign_sausage_type(SausageType::Pork).unwrap();
        in_tx.send(already).await.unwrap();
        in_tx.send(Job::new(true)).await.unwrap();
        drop(in_tx);

        let report = worker.await.unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(report.forwarded, 1);
        assert_eq!(out_rx.recv().await.unwrap().sausage_type(), Some(SausageType::Vegan));
    }

    #[tokio::test]
    async fn stage_worker_drops_when_downstream_closed() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (out_tx, out_rx) = mpsc::channel(4);
        drop(out_rx);
        let worker = tokio::spawn(run_stage(Stage::Style, in_rx, out_tx));

        in_tx.send(Job::new(false)).await.unwrap();
        drop(in_tx);

        let report = worker.await.unwrap();
        assert_eq!(report.forwarded, 0);
        assert_eq!(report.dropped, 1);
    }

    #[tokio::test]
    async fn finalizer_materializes_into_store() {
        let store = StoreWriter::open_in_memory();
        let reader = store.reader();
        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(run_finalizer(rx, store, Box::new(NullSink)));

        let mut job = Job::new(true);
        for stage in [Stage::Ingestion, Stage::Bread, Stage::Sausage, Stage::Style] {
            stage.apply(&mut job).unwrap();
        }
        let id = job.id().unwrap().to_owned();
        tx.send(job).await.unwrap();
        tx.send(Job::new(false)).await.unwrap();
        drop(tx);

        let report = worker.await.unwrap();
        assert_eq!(report.forwarded, 1);
        assert_eq!(report.dropped, 1);
        let stored = reader.get(&id).expect("stored");
        assert!(stored.is_complete());
        assert_eq!(reader.len(), 1);
    }
}
