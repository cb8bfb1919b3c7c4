//! Millisecond time base shared by every state machine in the crate.
//!
//! All timestamps are [`Tick`] values taken from a free-running 32-bit counter.
//! The counter wraps after ~49.7 days, so every comparison goes through
//! [`Tick::wrapping_since`], which stays correct across the overflow as long as
//! the two stamps are less than `u32::MAX` milliseconds apart.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// A point in time, in milliseconds since the tick source was initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(pub u32);

impl Tick {
    /// Tick zero.
    pub const ZERO: Self = Tick(0);

    /// Milliseconds elapsed from `earlier` to `self`, using wrapping subtraction.
    #[inline]
    pub const fn wrapping_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns this tick shifted forward by `millis`, wrapping on overflow.
    #[inline]
    pub const fn wrapping_add(self, millis: u32) -> Tick {
        Tick(self.0.wrapping_add(millis))
    }

    /// Returns the raw millisecond count.
    #[inline]
    pub const fn as_millis(self) -> u32 {
        self.0
    }
}

/// Trait for abstracting the millisecond tick source.
///
/// Implement this for your platform timer. Only [`now`](TickSource::now) is
/// required; the elapsed-time query and the blocking delay are derived from it.
pub trait TickSource {
    /// Returns the current tick.
    fn now(&self) -> Tick;

    /// Returns true once at least `duration_ms` have passed since `stamp`.
    ///
    /// Wrap-safe: `stamp = u32::MAX - 5`, `now = 10` is 16 ms elapsed.
    #[inline]
    fn elapsed_at_least(&self, stamp: Tick, duration_ms: u32) -> bool {
        self.now().wrapping_since(stamp) >= duration_ms
    }

    /// Busy-waits for `duration_ms`.
    ///
    /// Only meant for startup and the sleep indication sequences. Never returns
    /// if the tick interrupt is suspended.
    fn block_for(&self, duration_ms: u32) {
        let start = self.now();
        while !self.elapsed_at_least(start, duration_ms) {
            core::hint::spin_loop();
        }
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }

    fn elapsed_at_least(&self, stamp: Tick, duration_ms: u32) -> bool {
        (**self).elapsed_at_least(stamp, duration_ms)
    }

    fn block_for(&self, duration_ms: u32) {
        (**self).block_for(duration_ms)
    }
}

/// A tick source whose periodic interrupt can be masked while the core sleeps.
pub trait SuspendableTick: TickSource {
    /// Stops the periodic tick interrupt. `now()` stops advancing.
    fn suspend(&self);

    /// Re-enables the periodic tick interrupt.
    fn resume(&self);

    /// Returns true while the tick interrupt is suspended.
    fn is_suspended(&self) -> bool;
}

/// Process-wide millisecond counter driven by a periodic interrupt.
///
/// Declare one as a `static` and call [`on_tick`](TickCounter::on_tick) from
/// the timer interrupt handler. Reads from the main loop are lock-free; on
/// targets without native 32-bit atomics enable the `critical-section`
/// feature so the counter is synchronized explicitly.
///
/// ```
/// use smart_blinker::{TickCounter, TickSource};
///
/// static TICKS: TickCounter = TickCounter::new();
///
/// // SysTick handler
/// TICKS.on_tick();
/// assert_eq!(TICKS.now().as_millis(), 1);
/// ```
pub struct TickCounter {
    count: AtomicU32,
    suspended: AtomicBool,
}

impl TickCounter {
    /// Creates a counter starting at zero with the interrupt enabled.
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter starting at an arbitrary value.
    pub const fn starting_at(millis: u32) -> Self {
        Self {
            count: AtomicU32::new(millis),
            suspended: AtomicBool::new(false),
        }
    }

    /// Advances the counter by one period. Call from the tick interrupt only.
    ///
    /// Ignored while suspended, mirroring a masked interrupt.
    #[inline]
    pub fn on_tick(&self) {
        if !self.suspended.load(Ordering::Relaxed) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Resets the counter to zero and re-enables it.
    pub fn init(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.suspended.store(false, Ordering::Release);
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for TickCounter {
    #[inline]
    fn now(&self) -> Tick {
        Tick(self.count.load(Ordering::Relaxed))
    }
}

impl SuspendableTick for TickCounter {
    fn suspend(&self) {
        self.suspended.store(true, Ordering::Release);
    }

    fn resume(&self) {
        self.suspended.store(false, Ordering::Release);
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }
}

/// Largest reload value a 24-bit SysTick-style down-counter accepts.
pub const SYSTICK_MAX_RELOAD: u32 = 0x00FF_FFFF;

/// Tick frequency the whole crate assumes: one tick per millisecond.
pub const TICK_HZ: u32 = 1_000;

/// Errors raised while configuring the hardware tick.
///
/// These are configuration faults with no degraded mode: a board that gets one
/// has no working clock and should halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickConfigError {
    /// The core clock or tick rate is zero, or the clock is slower than the tick.
    ZeroFrequency,

    /// The reload value for the requested period doesn't fit the timer.
    ReloadOutOfRange {
        /// Reload value that would be required.
        reload: u32,
        /// Largest value the timer accepts.
        max: u32,
    },
}

impl core::fmt::Display for TickConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TickConfigError::ZeroFrequency => {
                write!(f, "core clock is too slow for the requested tick rate")
            }
            TickConfigError::ReloadOutOfRange { reload, max } => {
                write!(
                    f,
                    "tick reload value {} exceeds timer maximum {}",
                    reload, max
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TickConfigError {}

/// Validated timer configuration for the periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickConfig {
    core_clock_hz: u32,
    tick_hz: u32,
    reload: u32,
}

impl TickConfig {
    /// Computes the reload value for a 1 ms tick from the core clock.
    pub fn new(core_clock_hz: u32) -> Result<Self, TickConfigError> {
        Self::with_rate(core_clock_hz, TICK_HZ)
    }

    /// Computes the reload value for an arbitrary tick rate.
    ///
    /// # Errors
    /// * `ZeroFrequency` - The clock can't produce even one count per tick
    /// * `ReloadOutOfRange` - The period doesn't fit in 24 bits
    pub fn with_rate(core_clock_hz: u32, tick_hz: u32) -> Result<Self, TickConfigError> {
        if tick_hz == 0 {
            return Err(TickConfigError::ZeroFrequency);
        }

        let counts = core_clock_hz / tick_hz;
        if counts == 0 {
            return Err(TickConfigError::ZeroFrequency);
        }

        let reload = counts - 1;
        if reload > SYSTICK_MAX_RELOAD {
            return Err(TickConfigError::ReloadOutOfRange {
                reload,
                max: SYSTICK_MAX_RELOAD,
            });
        }

        Ok(Self {
            core_clock_hz,
            tick_hz,
            reload,
        })
    }

    /// Value to load into the timer's reload register.
    pub fn reload(&self) -> u32 {
        self.reload
    }

    /// Core clock this configuration was computed for.
    pub fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Tick interrupt rate.
    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }
}
