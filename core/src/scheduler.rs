//! # Worker pool scheduler
//!
//! Fans a [`Pipeline`] out over every domain of a batch.
//!
//! * At most `workers` pipelines run at once (a semaphore guards the slots).
//! * Each job gets its own deadline. An expired job is dropped: its future is
//!   cancelled, which also cancels its in-flight network calls.
//! * In double-pass mode every domain is submitted twice. Both jobs share the
//!   domain's record behind a mutex, so the passes run one after the other.
//! * A stop signal abandons every job still pending; those count as dropped.

use std::sync::Arc;
use std::time::Duration;

use cdnmap_common::record::DomainRecord;
use cdnmap_common::{debug, warn};
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;

use crate::pipeline::{JobError, Pipeline, PipelineStatus};

/// Observes progress: called with the number of finished jobs so far.
pub type ProgressFn = Box<dyn Fn(usize) + Send + Sync>;

/// How the jobs of a batch ended. `completed + dropped + failed == submitted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobTally {
    pub submitted: usize,
    pub completed: usize,
    /// Timed out or abandoned by a stop request.
    pub dropped: usize,
    /// Aborted by a fault inside an analyzer.
    pub failed: usize,
}

impl JobTally {
    pub fn finished(&self) -> usize {
        self.completed + self.dropped + self.failed
    }
}

enum JobOutcome {
    Completed(PipelineStatus),
    Dropped(Duration),
    Failed(JobError),
}

enum Event {
    Joined(Option<Result<(String, JobOutcome), JoinError>>),
    Stop,
    SignalClosed,
}

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    workers: usize,
    double: bool,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, workers: usize, double: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
            double,
        }
    }

    /// Runs every record through the pipeline and hands them back, in input
    /// order, together with the job tally.
    pub async fn run(
        &self,
        records: Vec<DomainRecord>,
        on_progress: Option<ProgressFn>,
        mut stop: Option<watch::Receiver<bool>>,
    ) -> (Vec<DomainRecord>, JobTally) {
        let job_timeout = self.pipeline.budget().total();
        let slots = Arc::new(Semaphore::new(self.workers));
        let shared: Vec<Arc<Mutex<DomainRecord>>> = records
            .into_iter()
            .map(|record| Arc::new(Mutex::new(record)))
            .collect();

        let passes = if self.double { 2 } else { 1 };
        let mut jobs = JoinSet::new();
        for _ in 0..passes {
            for record in &shared {
                let record = record.clone();
                let slots = slots.clone();
                let pipeline = self.pipeline.clone();

                jobs.spawn(async move {
                    // the record lock comes first so the two passes of one
                    // domain never hold two slots at once
                    let mut guard = record.lock().await;
                    let name = guard.name().to_string();
                    let Ok(_permit) = slots.acquire_owned().await else {
                        return (name, JobOutcome::Dropped(Duration::ZERO));
                    };

                    let outcome = match timeout(job_timeout, pipeline.execute(&mut guard)).await {
                        Ok(Ok(status)) => JobOutcome::Completed(status),
                        Ok(Err(e)) => JobOutcome::Failed(e),
                        Err(_elapsed) => {
                            guard.finalize();
                            JobOutcome::Dropped(job_timeout)
                        }
                    };
                    (name, outcome)
                });
            }
        }

        let mut tally = JobTally {
            submitted: shared.len() * passes,
            ..JobTally::default()
        };
        let report = |tally: &mut JobTally, joined: Result<(String, JobOutcome), JoinError>| {
            record_outcome(tally, joined);
            if let Some(cb) = &on_progress {
                cb(tally.finished());
            }
        };

        loop {
            let event = match stop.as_mut() {
                Some(rx) => tokio::select! {
                    biased;
                    signal = rx.wait_for(|stopped| *stopped) => {
                        if signal.is_ok() { Event::Stop } else { Event::SignalClosed }
                    }
                    joined = jobs.join_next() => Event::Joined(joined),
                },
                None => Event::Joined(jobs.join_next().await),
            };

            match event {
                Event::Joined(Some(joined)) => report(&mut tally, joined),
                Event::Joined(None) => break,
                Event::SignalClosed => stop = None,
                Event::Stop => {
                    warn!("Stop requested, abandoning {} pending jobs", jobs.len());
                    jobs.abort_all();
                    while let Some(joined) = jobs.join_next().await {
                        report(&mut tally, joined);
                    }
                    break;
                }
            }
        }

        let mut records = Vec::with_capacity(shared.len());
        for record in shared {
            let record = match Arc::try_unwrap(record) {
                Ok(mutex) => mutex.into_inner(),
                Err(still_shared) => still_shared.lock().await.clone(),
            };
            records.push(record);
        }

        (records, tally)
    }
}

fn record_outcome(tally: &mut JobTally, joined: Result<(String, JobOutcome), JoinError>) {
    match joined {
        Ok((name, JobOutcome::Completed(status))) => {
            debug!("{name}: {status:?}");
            tally.completed += 1;
        }
        Ok((name, JobOutcome::Dropped(after))) => {
            warn!("{name}: job dropped after {after:?}");
            tally.dropped += 1;
        }
        Ok((name, JobOutcome::Failed(e))) => {
            warn!("{name}: {e}");
            tally.failed += 1;
        }
        Err(e) if e.is_panic() => {
            warn!("Worker panicked: {e}");
            tally.failed += 1;
        }
        Err(_cancelled) => tally.dropped += 1,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
