//! Visibility sensor and infinite scroll
//!
//! A sentinel element sits below the last loaded row. The sensor reports
//! whether it is within the lookahead margin of the viewport, and the
//! infinite scroll driver turns a visible sentinel into a page load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::paginator::{LoadOutcome, Paginator};

type Callback = Arc<dyn Fn(bool) + Send + Sync>;
type Observers = Mutex<HashMap<u64, Callback>>;

/// Scroll geometry of the list container and its sentinel, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollViewport {
    pub scroll_top: f64,
    pub viewport_height: f64,

    /// Offset of the sentinel from the top of the content
    pub sentinel_top: f64,
    pub sentinel_height: f64,
}

impl ScrollViewport {
    /// Share of the sentinel inside the viewport grown by `margin_px`
    pub fn intersection_ratio(&self, margin_px: f64) -> f64 {
        let root_top = self.scroll_top - margin_px;
        let root_bottom = self.scroll_top + self.viewport_height + margin_px;
        let top = self.sentinel_top;
        let bottom = self.sentinel_top + self.sentinel_height;

        if self.sentinel_height <= 0.0 {
            return if top >= root_top && top <= root_bottom { 1.0 } else { 0.0 };
        }

        let overlap = (bottom.min(root_bottom) - top.max(root_top)).max(0.0);
        overlap / self.sentinel_height
    }

    /// True when at least `threshold` of the sentinel is within `margin_px` of the viewport
    pub fn sentinel_in_view(&self, margin_px: f64, threshold: f64) -> bool {
        let ratio = self.intersection_ratio(margin_px);
        ratio > 0.0 && ratio >= threshold
    }
}

/// Subscription to a sensor; unregisters on drop
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().remove(&self.id);
            trace!(id = self.id, "Visibility observer removed");
        }
    }
}

/// Broadcasts in-view changes of the sentinel to registered callbacks
#[derive(Default)]
pub struct VisibilitySensor {
    observers: Arc<Observers>,
    next_id: AtomicU64,
}

impl VisibilitySensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, callback: impl Fn(bool) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers.lock().insert(id, Arc::new(callback));
        Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn report(&self, in_view: bool) {
        // Callbacks run outside the lock so they may register or drop subscriptions
        let callbacks: Vec<Callback> = self.observers.lock().values().cloned().collect();
        for callback in callbacks {
            callback(in_view);
        }
    }

    /// Report from scroll geometry
    pub fn report_geometry(&self, viewport: &ScrollViewport, margin_px: f64, threshold: f64) {
        self.report(viewport.sentinel_in_view(margin_px, threshold));
    }
}

/// Loads the next page whenever the sentinel comes into view
///
/// Holds its own pending flag from trigger to completion, so repeated
/// triggers before the spawned load starts do not queue extra loads.
pub struct InfiniteScroll {
    pending: Arc<AtomicBool>,
    _subscription: Subscription,
}

impl InfiniteScroll {
    /// Attach to `sensor`; loads are spawned on `runtime`
    pub fn attach(paginator: Arc<Paginator>, sensor: &VisibilitySensor, runtime: Handle) -> Self {
        let pending = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&pending);

        let subscription = sensor.observe(move |in_view| {
            if !in_view || !paginator.should_load() {
                return;
            }
            if flag
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                trace!("Scroll trigger ignored, load pending");
                return;
            }

            let paginator = Arc::clone(&paginator);
            let flag = Arc::clone(&flag);
            runtime.spawn(async move {
                match paginator.load_next_page().await {
                    Ok(LoadOutcome::Loaded { count, .. }) => {
                        debug!(count, "Infinite scroll loaded page");
                    }
                    Ok(outcome) => trace!(?outcome, "Infinite scroll load"),
                    Err(err) => warn!("Infinite scroll load failed: {}", err),
                }
                flag.store(false, Ordering::Release);
            });
        });

        Self {
            pending,
            _subscription: subscription,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Stop reacting to the sensor
    pub fn detach(self) {}
}
