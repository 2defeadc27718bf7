use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use ezcut_core::{JobId, JobStatus, StatusKind, DEFAULT_FAILURE_MESSAGE};
use ezcut_logging::{ezcut_debug, ezcut_info, ezcut_warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{ClientError, ErrorKind, JobTransport, PollEvent};

/// Receives poll results for the jobs a [`JobPoller`] is watching.
pub trait PollSink {
    fn on_update(&mut self, status: &JobStatus);
    fn on_complete(&mut self, status: &JobStatus);
    fn on_error(&mut self, job_id: &str, error: &ClientError);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("job {0} is already being polled")]
    AlreadyPolling(JobId),
    #[error("job {0} already finished")]
    Finished(JobId),
    #[error("job id is empty")]
    EmptyJobId,
}

struct Tagged {
    job_id: JobId,
    generation: u64,
    event: PollEvent,
    /// Completed once the consumer has taken the event; the loop waits on it.
    ack: Option<oneshot::Sender<()>>,
}

struct Delivery {
    event: PollEvent,
    ack: Option<oneshot::Sender<()>>,
}

impl Delivery {
    fn finish(self) -> PollEvent {
        if let Some(ack) = self.ack {
            let _ = ack.send(());
        }
        self.event
    }
}

struct ActivePoll {
    generation: u64,
    cancel: CancellationToken,
}

/// Polls job status at a fixed interval until each job reaches a terminal state.
///
/// Every `start` gets a fresh generation number. Events are tagged with it and
/// dropped on arrival unless the job is still registered under the same
/// generation, so nothing surfaces after `stop` even when a response was
/// already in flight. A loop schedules its next request only after the
/// previous update has been delivered. Jobs that completed or failed remotely
/// cannot be started again. Must be used from within a tokio runtime.
pub struct JobPoller<T: ?Sized> {
    transport: Arc<T>,
    interval: Duration,
    active: HashMap<JobId, ActivePoll>,
    finished: HashSet<JobId>,
    next_generation: u64,
    events_tx: mpsc::UnboundedSender<Tagged>,
    events_rx: mpsc::UnboundedReceiver<Tagged>,
}

impl<T: JobTransport + ?Sized + 'static> JobPoller<T> {
    pub fn new(transport: Arc<T>, interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            interval,
            active: HashMap::new(),
            finished: HashSet::new(),
            next_generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Begins polling `job_id`. The first request is issued immediately.
    pub fn start(&mut self, job_id: &str) -> Result<(), PollError> {
        if job_id.trim().is_empty() {
            return Err(PollError::EmptyJobId);
        }
        if self.finished.contains(job_id) {
            ezcut_warn!("Job {} already finished; not polling again", job_id);
            return Err(PollError::Finished(job_id.to_string()));
        }
        if self.active.contains_key(job_id) {
            ezcut_warn!("Already polling job {}", job_id);
            return Err(PollError::AlreadyPolling(job_id.to_string()));
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();
        self.active.insert(
            job_id.to_string(),
            ActivePoll {
                generation,
                cancel: cancel.clone(),
            },
        );

        ezcut_info!(
            "Start polling job {} every {:?} (generation {})",
            job_id,
            self.interval,
            generation
        );
        tokio::spawn(poll_loop(
            self.transport.clone(),
            job_id.to_string(),
            self.interval,
            generation,
            cancel,
            self.events_tx.clone(),
        ));
        Ok(())
    }

    /// Stops polling `job_id`. Returns false if it was not being polled.
    pub fn stop(&mut self, job_id: &str) -> bool {
        match self.active.remove(job_id) {
            Some(active) => {
                active.cancel.cancel();
                ezcut_info!("Stop polling job {}", job_id);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for (job_id, active) in self.active.drain() {
            active.cancel.cancel();
            ezcut_debug!("Stop polling job {}", job_id);
        }
    }

    pub fn is_polling(&self, job_id: &str) -> bool {
        self.active.contains_key(job_id)
    }

    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut jobs: Vec<JobId> = self.active.keys().cloned().collect();
        jobs.sort();
        jobs
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Whether `job_id` reached `completed` or a remote `error`.
    pub fn is_finished(&self, job_id: &str) -> bool {
        self.finished.contains(job_id)
    }

    fn accept(&mut self, tagged: Tagged) -> Option<Delivery> {
        let job_id = tagged.job_id.as_str();
        let current = self.active.get(job_id).map(|active| active.generation);
        if current != Some(tagged.generation) {
            ezcut_debug!(
                "Discarding stale poll event for job {} (generation {})",
                job_id,
                tagged.generation
            );
            return None;
        }
        if tagged.event.is_terminal() {
            self.active.remove(job_id);
            if finishes_job(&tagged.event) {
                self.finished.insert(tagged.job_id.clone());
            }
        }
        Some(Delivery {
            event: tagged.event,
            ack: tagged.ack,
        })
    }

    fn try_next_delivery(&mut self) -> Option<Delivery> {
        while let Ok(tagged) = self.events_rx.try_recv() {
            if let Some(delivery) = self.accept(tagged) {
                return Some(delivery);
            }
        }
        None
    }

    async fn next_delivery(&mut self) -> Option<Delivery> {
        while !self.active.is_empty() {
            let tagged = self.events_rx.recv().await?;
            if let Some(delivery) = self.accept(tagged) {
                return Some(delivery);
            }
        }
        None
    }

    /// Next event that is already queued, without waiting.
    ///
    /// Taking the event counts as delivery and lets its loop schedule the next
    /// request.
    pub fn try_next_event(&mut self) -> Option<PollEvent> {
        self.try_next_delivery().map(Delivery::finish)
    }

    /// Waits for the next event. Returns `None` once no job is being polled.
    ///
    /// Cancel safe: dropping the future loses no accepted event.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.next_delivery().await.map(Delivery::finish)
    }

    /// Delivers every queued event to `sink`. Returns how many were delivered.
    pub fn pump(&mut self, sink: &mut dyn PollSink) -> usize {
        let mut delivered = 0;
        while let Some(delivery) = self.try_next_delivery() {
            dispatch(&delivery.event, sink);
            delivery.finish();
            delivered += 1;
        }
        delivered
    }

    /// Delivers events to `sink` until every job has stopped or finished.
    pub async fn run_until_idle(&mut self, sink: &mut dyn PollSink) {
        while let Some(delivery) = self.next_delivery().await {
            dispatch(&delivery.event, sink);
            delivery.finish();
        }
    }
}

impl<T: ?Sized> Drop for JobPoller<T> {
    fn drop(&mut self) {
        for active in self.active.values() {
            active.cancel.cancel();
        }
    }
}

/// Transport failures leave the job restartable; remote outcomes do not.
fn finishes_job(event: &PollEvent) -> bool {
    match event {
        PollEvent::Completed(_) => true,
        PollEvent::Failed { error, .. } => error.kind == ErrorKind::Application,
        PollEvent::Update(_) => false,
    }
}

pub fn dispatch(event: &PollEvent, sink: &mut dyn PollSink) {
    match event {
        PollEvent::Update(status) => sink.on_update(status),
        PollEvent::Completed(status) => sink.on_complete(status),
        PollEvent::Failed { job_id, error } => sink.on_error(job_id, error),
    }
}

async fn poll_loop<T: JobTransport + ?Sized>(
    transport: Arc<T>,
    job_id: JobId,
    interval: Duration,
    generation: u64,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<Tagged>,
) {
    let tag = job_id.clone();
    let send = |event: PollEvent, ack: Option<oneshot::Sender<()>>| {
        events
            .send(Tagged {
                job_id: tag.clone(),
                generation,
                event,
                ack,
            })
            .is_ok()
    };
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                ezcut_debug!("Polling job {} cancelled during request #{}", job_id, attempt);
                return;
            }
            response = transport.get_status(&job_id) => response,
        };
        if cancel.is_cancelled() {
            return;
        }

        match response {
            Ok(status) => match status.status {
                StatusKind::Completed => {
                    ezcut_info!("Job {} completed after {} polls", job_id, attempt);
                    send(PollEvent::Update(status.clone()), None);
                    send(PollEvent::Completed(status), None);
                    return;
                }
                StatusKind::Error => {
                    let message = status
                        .error
                        .clone()
                        .filter(|error| !error.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                    ezcut_warn!("Job {} failed: {}", job_id, message);
                    send(PollEvent::Update(status), None);
                    send(
                        PollEvent::Failed {
                            job_id,
                            error: ClientError::application("get_status", message),
                        },
                        None,
                    );
                    return;
                }
                _ => {
                    let (ack, delivered) = oneshot::channel();
                    if !send(PollEvent::Update(status), Some(ack)) {
                        return;
                    }
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        // Dropped unacknowledged: stale generation or poller gone.
                        result = delivered => {
                            if result.is_err() {
                                return;
                            }
                        }
                    }
                }
            },
            Err(error) => {
                ezcut_warn!("Polling job {} stopped: {}", job_id, error);
                send(PollEvent::Failed { job_id, error }, None);
                return;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
