//! Generation-based cancellation for recomputations.
//!
//! Every document attachment owns one [`GenerationClock`]. Edits advance the
//! clock; a recomputation captures a [`GenerationToken`] when it starts and
//! its results are only applied while the token is still current. Uninstall
//! moves the clock to a permanent sentinel after which no token is ever
//! current again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Sentinel generation of an uninstalled attachment.
pub const UNINSTALLED: u64 = u64::MAX;

/// Monotonic per-document generation counter.
#[derive(Debug, Clone)]
pub struct GenerationClock {
    current: Arc<AtomicU64>,
    detached: CancellationToken,
}

impl Default for GenerationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationClock {
    /// Creates a clock at generation 0.
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            detached: CancellationToken::new(),
        }
    }

    /// Current generation, or [`UNINSTALLED`].
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Invalidate every outstanding token.
    ///
    /// Returns the new generation, or `None` once uninstalled.
    pub fn advance(&self) -> Option<u64> {
        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |g| {
                g.checked_add(1).filter(|next| *next < UNINSTALLED)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Permanently cancel this attachment.
    pub fn uninstall(&self) {
        self.current.store(UNINSTALLED, Ordering::Release);
        self.detached.cancel();
    }

    pub fn is_uninstalled(&self) -> bool {
        self.current() == UNINSTALLED
    }

    /// Capture the current generation.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            generation: self.current(),
            clock: self.clone(),
        }
    }

    /// Token for an explicitly supplied generation, e.g. one reported back
    /// by a worker.
    pub fn token_for(&self, generation: u64) -> GenerationToken {
        GenerationToken {
            generation,
            clock: self.clone(),
        }
    }
}

/// A generation captured when a recomputation started.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    generation: u64,
    clock: GenerationClock,
}

impl GenerationToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no edit or uninstall happened since capture.
    pub fn is_current(&self) -> bool {
        self.generation != UNINSTALLED && self.clock.current() == self.generation
    }

    /// True once the attachment was uninstalled.
    pub fn is_detached(&self) -> bool {
        self.clock.is_uninstalled()
    }

    /// Resolves when the attachment is uninstalled.
    pub async fn detached(&self) {
        self.clock.detached.cancelled().await;
    }
}
