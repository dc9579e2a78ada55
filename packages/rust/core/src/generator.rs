//! Timer that fabricates new jobs and feeds them into the pipeline.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hotdogjobs_shared::{HotdogError, Job};

type HealthSource = Box<dyn FnMut() -> bool + Send>;

/// Emits one fresh [`Job`] per tick into the entry channel.
pub struct Generator {
    interval: Duration,
    entry: mpsc::Sender<Job>,
    health: HealthSource,
}

impl Generator {
    /// A generator drawing `health` uniformly at random.
    pub fn new(interval: Duration, entry: mpsc::Sender<Job>) -> Self {
        Self {
            interval,
            entry,
            health: Box::new(rand::random::<bool>),
        }
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace the random health draw with a caller-provided source.
    pub fn with_health_source(mut self, source: impl FnMut() -> bool + Send + 'static) -> Self {
        self.health = Box::new(source);
        self
    }

    /// Tick until `cancel` fires or the entry channel closes.
    /// Returns the number of jobs handed to the pipeline.
    ///
    /// The first job is emitted one full interval after start. A full entry
    /// channel suspends the generator; ticks missed meanwhile are not replayed
    /// in a burst.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut generated = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let job = Job::new((self.health)());
            let health = job.health();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = self.entry.send(job) => {
                    if sent.is_err() {
                        let e = HotdogError::SendFailure { stage: "generator" };
                        warn!(error = %e, health, "entry channel closed, stopping generator");
                        break;
                    }
                    generated += 1;
                    debug!(health, generated, "generated job");
                }
            }
        }

        debug!(generated, "generator stopped");
        generated
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
