//! One engine per open document.

use crate::config::EngineSettings;
use crate::engine::HighlightEngine;
use crate::error::{EngineError, EngineResult};
use crate::presentation::PaintUpdate;
use crate::producer::CandidateProducer;
use crate::scheduler::RecomputeScheduler;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

const LOG_TARGET: &str = "irodori::registry";

/// Concurrent map from document URL to its engine.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: DashMap<Url, Arc<HighlightEngine>>,
    settings: EngineSettings,
}

impl EngineRegistry {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            engines: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Install a fresh engine for `url`.
    ///
    /// An engine already attached to `url` is uninstalled and replaced;
    /// its invalidation is returned alongside the new engine.
    pub fn attach(
        &self,
        url: Url,
    ) -> EngineResult<(Arc<HighlightEngine>, Option<PaintUpdate>)> {
        let engine = Arc::new(HighlightEngine::new(&self.settings));
        engine.install()?;
        let invalidated = self
            .engines
            .insert(url.clone(), Arc::clone(&engine))
            .map(|previous| previous.uninstall());
        log::debug!(target: LOG_TARGET, "attached {}", url);
        Ok((engine, invalidated))
    }

    pub fn get(&self, url: &Url) -> Option<Arc<HighlightEngine>> {
        self.engines.get(url).map(|entry| Arc::clone(entry.value()))
    }

    /// Engine for `url`, or [`EngineError::Detached`].
    pub fn require(&self, url: &Url) -> EngineResult<Arc<HighlightEngine>> {
        self.get(url)
            .ok_or_else(|| EngineError::detached(url.as_str()))
    }

    /// Uninstall and forget the engine of `url`.
    ///
    /// Returns the invalidation to paint, or `None` if nothing was attached.
    pub fn detach(&self, url: &Url) -> Option<PaintUpdate> {
        let (_, engine) = self.engines.remove(url)?;
        log::debug!(target: LOG_TARGET, "detached {}", url);
        Some(engine.uninstall())
    }

    /// Start a recompute worker for `engine` with the configured debounce.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn_scheduler(
        &self,
        engine: Arc<HighlightEngine>,
        producer: Arc<dyn CandidateProducer>,
        sink: mpsc::Sender<PaintUpdate>,
    ) -> RecomputeScheduler {
        RecomputeScheduler::from_settings(engine, producer, &self.settings, sink)
    }

    /// Replace the styles of every attached engine.
    pub fn set_styles(&self, styles: &crate::config::StyleMap) {
        for entry in self.engines.iter() {
            entry.value().set_styles(styles);
        }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
