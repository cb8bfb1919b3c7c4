//! State shared between interrupt context and the cooperative main loop.
//!
//! This is the only memory an interrupt handler may touch besides the tick
//! counter. Every field is a single lock-free word, and the interrupt side
//! only ever sets flags and stores a timestamp. All gesture and power state
//! lives in main-loop-owned structs that drain these flags when polled.

use crate::time::Tick;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Where a button edge was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeRoute {
    /// Recorded for the gesture recognizer.
    Gesture,
    /// The core was sleeping; the edge was turned into a wake request.
    Wake,
}

/// Flags written from interrupt context.
///
/// Declare one `static` per board and hand references to the recognizer and
/// the sleep coordinator:
///
/// ```
/// use smart_blinker::{EdgeRoute, InterruptShared, Tick};
///
/// static SHARED: InterruptShared = InterruptShared::new();
///
/// // EXTI handler for the button pin
/// let route = SHARED.on_edge_interrupt(Tick(42));
/// assert_eq!(route, EdgeRoute::Gesture);
/// ```
pub struct InterruptShared {
    edge_pending: AtomicBool,
    edge_at: AtomicU32,
    sleeping: AtomicBool,
    wake_requested: AtomicBool,
}

impl InterruptShared {
    /// Creates the flag set with nothing pending.
    pub const fn new() -> Self {
        Self {
            edge_pending: AtomicBool::new(false),
            edge_at: AtomicU32::new(0),
            sleeping: AtomicBool::new(false),
            wake_requested: AtomicBool::new(false),
        }
    }

    /// Clears every flag.
    pub fn init(&self) {
        self.edge_pending.store(false, Ordering::Relaxed);
        self.edge_at.store(0, Ordering::Relaxed);
        self.wake_requested.store(false, Ordering::Relaxed);
        self.sleeping.store(false, Ordering::Release);
    }

    /// Button edge interrupt entry point.
    ///
    /// While the core is sleeping the edge becomes a wake request and gesture
    /// processing is skipped, since the tick source is suspended and any
    /// timestamp would be meaningless. Otherwise the edge time is recorded for
    /// the recognizer to pick up on its next `update()`. Carries no level
    /// information; the recognizer samples the pin itself.
    pub fn on_edge_interrupt(&self, now: Tick) -> EdgeRoute {
        if self.sleeping.load(Ordering::Acquire) {
            self.request_wake();
            return EdgeRoute::Wake;
        }

        self.edge_at.store(now.0, Ordering::Relaxed);
        self.edge_pending.store(true, Ordering::Release);
        EdgeRoute::Gesture
    }

    /// Requests a wake-up. Safe to call from interrupt context.
    ///
    /// Only sets a flag; the sleeping coordinator notices it after the
    /// low-power wait returns. Ignored unless the coordinator is sleeping, so
    /// a request made while awake can't cut the next sleep short.
    pub fn request_wake(&self) {
        if self.sleeping.load(Ordering::Acquire) {
            self.wake_requested.store(true, Ordering::Release);
        }
    }

    /// Returns true while the coordinator is parked in a low-power mode.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping.load(Ordering::Acquire)
    }

    /// Returns true if a wake-up was requested and not yet acknowledged.
    pub fn wake_requested(&self) -> bool {
        self.wake_requested.load(Ordering::Acquire)
    }

    pub(crate) fn set_sleeping(&self, sleeping: bool) {
        self.sleeping.store(sleeping, Ordering::Release);
    }

    pub(crate) fn clear_wake_request(&self) {
        self.wake_requested.store(false, Ordering::Release);
    }

    /// Takes the pending edge timestamp, if any.
    pub(crate) fn take_edge(&self) -> Option<Tick> {
        if self.edge_pending.swap(false, Ordering::Acquire) {
            Some(Tick(self.edge_at.load(Ordering::Relaxed)))
        } else {
            None
        }
    }

    /// Drops any edge recorded before now.
    pub(crate) fn discard_edge(&self) {
        self.edge_pending.store(false, Ordering::Release);
    }
}

impl Default for InterruptShared {
    fn default() -> Self {
        Self::new()
    }
}
