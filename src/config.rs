//! Timing and behavior tunables.
//!
//! Every state machine takes its configuration by value at construction. The
//! defaults match the reference board: a 1 ms tick, four LEDs and a single
//! active-high push button.

use crate::sleep::SleepMode;

/// Button gesture timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonTiming {
    /// How long the raw level must hold still before it is trusted.
    pub debounce_ms: u32,

    /// Hold time after which a press becomes a long press.
    pub long_press_ms: u32,

    /// Maximum gap between a release and the next press for a double click.
    pub double_click_ms: u32,
}

impl ButtonTiming {
    /// 50 ms debounce and a 2 s long press.
    pub const DEFAULT: Self = Self {
        debounce_ms: 50,
        long_press_ms: 2_000,
        double_click_ms: 400,
    };
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pattern cadences, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatternTiming {
    /// Half-period of the slow blink (~1 Hz).
    pub slow_blink_ms: u32,

    /// Half-period of the fast blink (~4 Hz).
    pub fast_blink_ms: u32,

    /// Step interval of both chase directions.
    pub chase_ms: u32,

    /// Step interval of the scanner.
    pub scanner_ms: u32,

    /// Length of one brightening or dimming half of a breath.
    pub breathe_cycle_ms: u32,

    /// Number of equal steps a breath half is divided into.
    pub breathe_steps: u8,

    /// Step interval of the color cycle.
    pub color_cycle_ms: u32,

    /// Shortest twinkle interval.
    pub twinkle_min_ms: u32,

    /// Upper bound (exclusive) of the twinkle interval.
    pub twinkle_max_ms: u32,
}

impl PatternTiming {
    /// Blinks at 500 and 125 ms, chase steps every 150 ms.
    pub const DEFAULT: Self = Self {
        slow_blink_ms: 500,
        fast_blink_ms: 125,
        chase_ms: 150,
        scanner_ms: 80,
        breathe_cycle_ms: 3_000,
        breathe_steps: 10,
        color_cycle_ms: 500,
        twinkle_min_ms: 100,
        twinkle_max_ms: 800,
    };

    /// Interval between two breathe steps. Never zero.
    pub fn breathe_step_ms(&self) -> u32 {
        (self.breathe_cycle_ms / u32::from(self.breathe_steps.max(1))).max(1)
    }
}

impl Default for PatternTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sleep coordinator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepConfig {
    /// Low-power depth used by `enter()`.
    pub mode: SleepMode,

    /// Play the entry/exit light sequences around sleep.
    pub indicate: bool,
}

impl SleepConfig {
    /// Balanced sleep with indication sequences.
    pub const DEFAULT: Self = Self {
        mode: SleepMode::Balanced,
        indicate: true,
    };
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
