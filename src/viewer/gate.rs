//! One-shot visibility gate.
//!
//! Pages are not loaded until they are about to scroll into view. The gate
//! watches a proximity signal for one instance and fires its callback exactly
//! once, slightly before the instance becomes visible. Dropping the gate
//! releases the watch unconditionally, whether or not it ever fired; the
//! observation resource must never outlive the instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

/// Expansion margin applied around the visible region, in pixels.
///
/// Loading starts when the instance comes within this distance of the
/// viewport, so the page is usually ready by the time it is actually seen.
pub const DEFAULT_VISIBILITY_MARGIN_PX: u32 = 300;

/// Viewport-proximity primitive supplied by the embedder.
///
/// `entered` resolves once, when the observed region comes within
/// `margin_px` of the viewport. Detachment is expressed by dropping the
/// [`VisibilityGate`] that consumed the signal; implementations must
/// tolerate being dropped mid-wait.
#[async_trait]
pub trait ProximitySignal: Send + Sync + 'static {
    /// Resolve once the region is within `margin_px` of the viewport.
    async fn entered(&self, margin_px: u32);
}

/// One-shot trigger tied to an instance's on-screen region.
///
/// The gate owns a background task awaiting the proximity signal. When the
/// signal resolves, the callback runs exactly once and the watch ends. The
/// `Drop` impl aborts the task, so teardown releases the subscription even
/// if the instance never became visible.
pub struct VisibilityGate {
    /// Watch task awaiting the proximity signal
    handle: JoinHandle<()>,

    /// Set just before the callback runs
    fired: Arc<AtomicBool>,
}

impl VisibilityGate {
    /// Attach to a proximity signal and fire `on_enter` once it resolves.
    ///
    /// The signal is consumed by the watch task. The callback runs on the
    /// runtime, not on the caller; anything it needs must be moved in.
    pub fn attach<S, C>(signal: S, margin_px: u32, on_enter: C) -> Self
    where
        S: ProximitySignal,
        C: FnOnce() + Send + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let task_fired = fired.clone();

        let handle = tokio::spawn(async move {
            signal.entered(margin_px).await;
            task_fired.store(true, Ordering::SeqCst);
            on_enter();
        });

        Self { handle, fired }
    }

    /// Whether the gate has already fired.
    ///
    /// Once true it stays true; the gate never fires again.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for VisibilityGate {
    fn drop(&mut self) {
        // Guaranteed release: the watch must not leak past the instance
        self.handle.abort();
    }
}

// =============================================================================
// Tests
// =============================================================================
