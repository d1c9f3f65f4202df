//! Per-page composition of gate and load slot.
//!
//! A [`PageInstance`] is one rendered page image: one visibility
//! subscription, one load token counter, one raster slot. None of these are
//! shared between instances. Mounting attaches the gate; the first load
//! runs when the gate fires; later source changes re-enter the load
//! directly once the instance is visible. Dropping the instance releases
//! the gate's watch through its `Drop` impl, fired or not.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::gate::{ProximitySignal, VisibilityGate, DEFAULT_VISIBILITY_MARGIN_PX};
use super::session::{PageDescriptor, PageSlot, PageView, RasterSource};

/// One displayed page: bound descriptor, visibility gate, load slot.
pub struct PageInstance<S: RasterSource> {
    /// Load pipeline with last-start-wins semantics
    slot: Arc<PageSlot<S>>,

    /// Currently bound source identifiers
    bound: Arc<Mutex<PageDescriptor>>,

    /// One-shot visibility trigger; released on drop
    gate: VisibilityGate,
}

impl<S: RasterSource> PageInstance<S> {
    /// Mount an instance with the default visibility margin.
    pub fn mount<P>(source: S, signal: P, descriptor: PageDescriptor) -> Self
    where
        P: ProximitySignal,
    {
        Self::mount_with_margin(source, signal, descriptor, DEFAULT_VISIBILITY_MARGIN_PX)
    }

    /// Mount an instance, attaching the visibility gate immediately.
    ///
    /// No load runs until the gate fires; the gate fire loads whatever
    /// descriptor is bound at that moment, which may be a later one than
    /// `descriptor` if [`set_descriptor`](Self::set_descriptor) ran first.
    pub fn mount_with_margin<P>(
        source: S,
        signal: P,
        descriptor: PageDescriptor,
        margin_px: u32,
    ) -> Self
    where
        P: ProximitySignal,
    {
        let slot = Arc::new(PageSlot::new(source));
        let bound = Arc::new(Mutex::new(descriptor));

        let gate = {
            let slot = slot.clone();
            let bound = bound.clone();
            VisibilityGate::attach(signal, margin_px, move || {
                tokio::spawn(async move {
                    let descriptor = bound.lock().await.clone();
                    slot.start(descriptor).await;
                });
            })
        };

        Self { slot, bound, gate }
    }

    /// Replace the bound source identifiers.
    ///
    /// Before the gate has fired the new binding simply waits its turn.
    /// Once the instance is visible, the change re-enters the load
    /// directly, bypassing the gate; the token protocol in the slot
    /// supersedes whatever was in flight.
    pub async fn set_descriptor(&self, descriptor: PageDescriptor) {
        {
            let mut bound = self.bound.lock().await;
            *bound = descriptor.clone();
        }

        if self.gate.has_fired() {
            self.slot.start(descriptor).await;
        }
    }

    /// Snapshot what should currently be displayed.
    pub async fn view(&self) -> PageView {
        self.slot.view().await
    }

    /// Whether the instance has come within the visibility margin yet.
    pub fn is_visible(&self) -> bool {
        self.gate.has_fired()
    }

    /// The currently bound descriptor.
    pub async fn descriptor(&self) -> PageDescriptor {
        self.bound.lock().await.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
