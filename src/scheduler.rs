//! Debounced background recomputation for one document.
//!
//! ```text
//! schedule(text)
//!       │
//!       ├─► capture generation token, replace any queued request
//!       │
//!       └─► worker
//!               ├─► wait until no newer request arrived for `debounce`
//!               ├─► run the producer on a blocking thread
//!               └─► merge into the engine, push the paint update to the sink
//! ```
//!
//! At most one producer run is in flight per document. Requests arriving
//! while it runs are coalesced so only the newest is computed next; the
//! result of the running one is discarded by the engine if an edit made it
//! stale.

use crate::cancellation::GenerationToken;
use crate::config::EngineSettings;
use crate::engine::{HighlightEngine, ReconcileOutcome};
use crate::error::EngineError;
use crate::presentation::PaintUpdate;
use crate::producer::CandidateProducer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "irodori::scheduler";

/// Text snapshot plus the generation it belongs to.
#[derive(Clone)]
struct Request {
    text: Arc<str>,
    token: GenerationToken,
}

pub struct RecomputeScheduler {
    engine: Arc<HighlightEngine>,
    requests: watch::Sender<Option<Request>>,
    debounce: Duration,
    worker: JoinHandle<()>,
}

impl RecomputeScheduler {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Paint updates of applied recomputations are sent to `sink`. The worker
    /// stops when the engine is uninstalled, the sink is closed, or the
    /// scheduler is shut down.
    pub fn spawn(
        engine: Arc<HighlightEngine>,
        producer: Arc<dyn CandidateProducer>,
        debounce: Duration,
        sink: mpsc::Sender<PaintUpdate>,
    ) -> Self {
        let (requests, receiver) = watch::channel(None);
        let worker = tokio::spawn(run_worker(
            Arc::clone(&engine),
            producer,
            debounce,
            receiver,
            sink,
        ));
        Self {
            engine,
            requests,
            debounce,
            worker,
        }
    }

    /// Spawn the worker with the debounce configured in `settings`.
    pub fn from_settings(
        engine: Arc<HighlightEngine>,
        producer: Arc<dyn CandidateProducer>,
        settings: &EngineSettings,
        sink: mpsc::Sender<PaintUpdate>,
    ) -> Self {
        Self::spawn(engine, producer, settings.debounce, sink)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Queue a recomputation of `text`.
    ///
    /// Call right after the engine saw the edit producing `text`, so the
    /// captured generation matches the snapshot.
    pub fn schedule(&self, text: impl Into<Arc<str>>) {
        let token = self.engine.begin_recompute();
        log::trace!(
            target: LOG_TARGET,
            "scheduled recompute for generation {}",
            token.generation()
        );
        self.requests.send_replace(Some(Request {
            text: text.into(),
            token,
        }));
    }

    /// Recompute the last scheduled text without an edit, e.g. after the
    /// producer's inputs changed. Returns false if nothing was ever scheduled.
    pub fn refresh(&self) -> bool {
        let text = self
            .requests
            .borrow()
            .as_ref()
            .map(|request| Arc::clone(&request.text));
        match text {
            Some(text) => {
                self.schedule(text);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Stop accepting requests and wait for the worker to exit.
    ///
    /// A recomputation already running finishes first.
    pub async fn shutdown(self) {
        drop(self.requests);
        if let Err(err) = self.worker.await {
            log::warn!(target: LOG_TARGET, "recompute worker ended abnormally: {}", err);
        }
    }
}

async fn run_worker(
    engine: Arc<HighlightEngine>,
    producer: Arc<dyn CandidateProducer>,
    debounce: Duration,
    mut receiver: watch::Receiver<Option<Request>>,
    sink: mpsc::Sender<PaintUpdate>,
) {
    let lifetime = engine.current_token();

    loop {
        tokio::select! {
            _ = lifetime.detached() => break,
            changed = receiver.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Every newer request restarts the settle timer.
        loop {
            tokio::select! {
                _ = lifetime.detached() => return,
                _ = tokio::time::sleep(debounce) => break,
                changed = receiver.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let Some(request) = receiver.borrow_and_update().clone() else {
            continue;
        };
        if !request.token.is_current() {
            log::trace!(
                target: LOG_TARGET,
                "generation {} superseded before computing",
                request.token.generation()
            );
            engine.abandon_recompute(request.token.generation());
            continue;
        }

        match recompute(&engine, &producer, request).await {
            ReconcileOutcome::Applied(applied) => {
                let Some(update) = applied.update else {
                    continue;
                };
                if !engine.is_current(applied.generation) {
                    // An edit already repainted this text with moved offsets.
                    engine.finish_presenting(applied.generation);
                    log::trace!(
                        target: LOG_TARGET,
                        "dropping paint update of generation {}",
                        applied.generation
                    );
                    continue;
                }
                let sent = sink.send(update).await;
                engine.finish_presenting(applied.generation);
                if sent.is_err() {
                    log::debug!(target: LOG_TARGET, "paint sink closed; stopping worker");
                    break;
                }
            }
            ReconcileOutcome::Discarded(reason) => {
                log::debug!(target: LOG_TARGET, "recompute discarded: {:?}", reason);
            }
        }
    }
    log::debug!(target: LOG_TARGET, "recompute worker stopped");
}

async fn recompute(
    engine: &HighlightEngine,
    producer: &Arc<dyn CandidateProducer>,
    request: Request,
) -> ReconcileOutcome {
    let generation = request.token.generation();
    let producer = Arc::clone(producer);
    let output = tokio::task::spawn_blocking(move || {
        producer.compute(&request.text, &request.token)
    })
    .await
    .unwrap_or_else(|err| Err(EngineError::internal(format!("producer task failed: {}", err))));

    engine.on_producer_output(output, generation)
}
