//! Non-blocking LED pattern engine.
//!
//! Provides [`PatternEngine`], which owns the LED sink and runs one of the
//! [`Pattern`]s at its own cadence. Every pattern has the same shape: when its
//! step interval has elapsed since the last step, render a frame and advance a
//! pattern-local cursor. Nothing ever waits.
//!
//! Each pattern carries its own animation state, so switching patterns can't
//! leak a cursor or direction from one pattern into another. Switching also
//! never blanks the outputs first; the new pattern takes over from whatever is
//! lit, which avoids a visible flash while cycling.

use crate::command::PatternAction;
use crate::config::PatternTiming;
use crate::led::{ALL_CHANNELS, CHANNEL_COUNT, Channel, LedSink};
use crate::time::{Tick, TickSource};
use heapless::Vec;
use nanorand::{Rng, WyRand};

/// Seed used by [`PatternEngine::new`]. Boards with an entropy source should
/// pass their own through [`PatternEngine::with_timing`].
pub const DEFAULT_SEED: u64 = 0x5EED_B1E4_C0FF_EE00;

/// Bitmasks the color cycle walks through, in order.
pub const COLOR_CYCLE_MASKS: [u8; 8] = [
    0b0001, // green
    0b0011, // green + orange
    0b0110, // orange + red
    0b1100, // red + blue
    0b1001, // blue + green
    0b0101, // green + red
    0b1010, // orange + blue
    0b1111, // all
];

/// The available LED patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// All LEDs steadily on.
    Solid,
    /// All LEDs blinking at ~1 Hz.
    SlowBlink,
    /// All LEDs blinking at ~4 Hz.
    FastBlink,
    /// One LED lit, moving green → orange → red → blue.
    ChaseClockwise,
    /// One LED lit, moving blue → red → orange → green.
    ChaseCounterClockwise,
    /// One LED lit, bouncing between both ends.
    Scanner,
    /// Simulated brightness ramp by lighting more, then fewer, LEDs.
    Breathe,
    /// Walks a fixed table of LED combinations.
    ColorCycle,
    /// One or two random LEDs at random intervals.
    Twinkle,
}

impl Pattern {
    /// Number of patterns.
    pub const COUNT: usize = 9;

    /// All patterns in selector order.
    pub const ALL: [Pattern; Self::COUNT] = [
        Pattern::Solid,
        Pattern::SlowBlink,
        Pattern::FastBlink,
        Pattern::ChaseClockwise,
        Pattern::ChaseCounterClockwise,
        Pattern::Scanner,
        Pattern::Breathe,
        Pattern::ColorCycle,
        Pattern::Twinkle,
    ];

    /// Position of this pattern in [`Pattern::ALL`].
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The following pattern, wrapping from the last to the first.
    pub fn next(self) -> Pattern {
        Self::ALL[(self as usize + 1) % Self::COUNT]
    }

    /// The preceding pattern, wrapping from the first to the last.
    pub fn prev(self) -> Pattern {
        Self::ALL[(self as usize + Self::COUNT - 1) % Self::COUNT]
    }

    /// Short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Pattern::Solid => "solid",
            Pattern::SlowBlink => "slow blink",
            Pattern::FastBlink => "fast blink",
            Pattern::ChaseClockwise => "chase cw",
            Pattern::ChaseCounterClockwise => "chase ccw",
            Pattern::Scanner => "scanner",
            Pattern::Breathe => "breathe",
            Pattern::ColorCycle => "color cycle",
            Pattern::Twinkle => "twinkle",
        }
    }
}

/// A pattern selector outside `0..Pattern::COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPattern(pub u8);

impl core::fmt::Display for InvalidPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "pattern index {} out of range (0..{})",
            self.0,
            Pattern::COUNT
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidPattern {}

impl TryFrom<u8> for Pattern {
    type Error = InvalidPattern;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(InvalidPattern(index))
    }
}

/// Run state of the pattern engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Not running. All LEDs were turned off.
    Stopped,
    /// Animating on every `update()`.
    Running,
    /// Frozen on the current frame.
    Paused,
}

/// Per-pattern animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Animation {
    Solid,
    Blink { half_period_ms: u32 },
    Chase { step: usize, reverse: bool },
    Scanner { position: usize, forward: bool },
    Breathe { step: u8, brightening: bool },
    ColorCycle { index: usize },
    Twinkle { wait_ms: u32 },
}

impl Animation {
    fn new(pattern: Pattern, timing: &PatternTiming, rng: &mut WyRand) -> Self {
        match pattern {
            Pattern::Solid => Animation::Solid,
            Pattern::SlowBlink => Animation::Blink {
                half_period_ms: timing.slow_blink_ms,
            },
            Pattern::FastBlink => Animation::Blink {
                half_period_ms: timing.fast_blink_ms,
            },
            Pattern::ChaseClockwise => Animation::Chase {
                step: 0,
                reverse: false,
            },
            Pattern::ChaseCounterClockwise => Animation::Chase {
                step: 0,
                reverse: true,
            },
            Pattern::Scanner => Animation::Scanner {
                position: 0,
                forward: true,
            },
            Pattern::Breathe => Animation::Breathe {
                step: 0,
                brightening: true,
            },
            Pattern::ColorCycle => Animation::ColorCycle { index: 0 },
            Pattern::Twinkle => Animation::Twinkle {
                wait_ms: twinkle_wait(timing, rng),
            },
        }
    }

    /// Step interval, or `None` for patterns that render on every update.
    fn period_ms(&self, timing: &PatternTiming) -> Option<u32> {
        match self {
            Animation::Solid => None,
            Animation::Blink { half_period_ms } => Some(*half_period_ms),
            Animation::Chase { .. } => Some(timing.chase_ms),
            Animation::Scanner { .. } => Some(timing.scanner_ms),
            Animation::Breathe { .. } => Some(timing.breathe_step_ms()),
            Animation::ColorCycle { .. } => Some(timing.color_cycle_ms),
            Animation::Twinkle { wait_ms } => Some(*wait_ms),
        }
    }

    /// Whether the first frame is drawn as soon as the pattern starts.
    ///
    /// Blink toggles whatever is lit and twinkle waits for its first random
    /// interval, so both leave the outputs alone until their first step.
    fn renders_on_start(&self) -> bool {
        !matches!(self, Animation::Blink { .. } | Animation::Twinkle { .. })
    }

    /// Renders the frame at the cursor, then advances the cursor.
    fn step<L: LedSink>(&mut self, led: &mut L, timing: &PatternTiming, rng: &mut WyRand) {
        match self {
            Animation::Solid => led.set_all(true),
            Animation::Blink { .. } => led.toggle_all(),
            Animation::Chase { step, reverse } => {
                let index = if *reverse {
                    CHANNEL_COUNT - 1 - *step
                } else {
                    *step
                };
                led.set_mask(Channel::ALL[index].mask());
                *step = (*step + 1) % CHANNEL_COUNT;
            }
            Animation::Scanner { position, forward } => {
                led.set_mask(Channel::ALL[*position].mask());
                *position = if *forward { *position + 1 } else { *position - 1 };
                if *position == 0 || *position == CHANNEL_COUNT - 1 {
                    *forward = !*forward;
                }
            }
            Animation::Breathe { step, brightening } => {
                led.set_mask(breathe_mask(*step, *brightening));
                *step += 1;
                if *step >= timing.breathe_steps.max(1) {
                    *step = 0;
                    *brightening = !*brightening;
                }
            }
            Animation::ColorCycle { index } => {
                led.set_mask(COLOR_CYCLE_MASKS[*index]);
                *index = (*index + 1) % COLOR_CYCLE_MASKS.len();
            }
            Animation::Twinkle { wait_ms } => {
                led.set_mask(twinkle_mask(rng));
                *wait_ms = twinkle_wait(timing, rng);
            }
        }
    }
}

/// Brightening lights channels `0..=step`; dimming lights `step..`.
fn breathe_mask(step: u8, brightening: bool) -> u8 {
    let step = usize::from(step);
    if brightening {
        let lit = (step + 1).min(CHANNEL_COUNT);
        ALL_CHANNELS >> (CHANNEL_COUNT - lit)
    } else if step >= CHANNEL_COUNT {
        0
    } else {
        (ALL_CHANNELS << step) & ALL_CHANNELS
    }
}

fn twinkle_mask(rng: &mut WyRand) -> u8 {
    let count = rng.generate_range(1usize..3);
    let mut picked: Vec<Channel, 2> = Vec::new();
    for _ in 0..count {
        let channel = Channel::ALL[rng.generate_range(0..CHANNEL_COUNT)];
        // Capacity equals the largest count
        let _ = picked.push(channel);
    }
    picked.iter().fold(0, |mask, channel| mask | channel.mask())
}

fn twinkle_wait(timing: &PatternTiming, rng: &mut WyRand) -> u32 {
    if timing.twinkle_max_ms > timing.twinkle_min_ms {
        rng.generate_range(timing.twinkle_min_ms..timing.twinkle_max_ms)
    } else {
        timing.twinkle_min_ms
    }
}

/// Runs LED patterns on a fixed set of channels without blocking.
///
/// The engine owns the LED sink and is its only writer while the device is
/// awake. Call [`update`](PatternEngine::update) on every main-loop cycle; it
/// does nothing unless the engine is [`RunState::Running`].
///
/// # Type Parameters
/// * `'t` - Lifetime of the tick source reference
/// * `T` - Tick source implementation type
/// * `L` - LED sink implementation type
pub struct PatternEngine<'t, T: TickSource, L: LedSink> {
    led: L,
    tick_source: &'t T,
    timing: PatternTiming,
    pattern: Pattern,
    animation: Animation,
    run_state: RunState,
    last_step_at: Tick,
    started: bool,
    paused_at: Option<Tick>,
    rng: WyRand,
}

impl<'t, T: TickSource, L: LedSink> PatternEngine<'t, T, L> {
    /// Creates a stopped engine showing `Solid`, with LEDs turned off.
    pub fn new(led: L, tick_source: &'t T) -> Self {
        Self::with_timing(led, tick_source, PatternTiming::DEFAULT, DEFAULT_SEED)
    }

    /// Creates a stopped engine with custom cadences and twinkle seed.
    pub fn with_timing(mut led: L, tick_source: &'t T, timing: PatternTiming, seed: u64) -> Self {
        led.set_all(false);

        let mut rng = WyRand::new_seed(seed);
        let animation = Animation::new(Pattern::Solid, &timing, &mut rng);

        Self {
            led,
            tick_source,
            timing,
            pattern: Pattern::Solid,
            animation,
            run_state: RunState::Stopped,
            last_step_at: tick_source.now(),
            started: false,
            paused_at: None,
            rng,
        }
    }

    /// Returns to `Solid` and `Stopped` without touching the LEDs.
    pub fn init(&mut self) {
        self.pattern = Pattern::Solid;
        self.animation = Animation::new(Pattern::Solid, &self.timing, &mut self.rng);
        self.run_state = RunState::Stopped;
        self.last_step_at = self.tick_source.now();
        self.started = false;
        self.paused_at = None;
    }

    /// Dispatches a pattern action to the matching method.
    pub fn handle_action(&mut self, action: PatternAction) {
        match action {
            PatternAction::Set(pattern) => self.set_pattern(pattern),
            PatternAction::Next => self.next(),
            PatternAction::Prev => self.prev(),
            PatternAction::Start => self.start(),
            PatternAction::Stop => self.stop(),
            PatternAction::Pause => self.pause(),
            PatternAction::Resume => self.resume(),
            PatternAction::TogglePause => self.toggle_pause(),
        }
    }

    /// Switches to `pattern` and starts running it.
    ///
    /// Resets the pattern's animation state and step timer. The LEDs keep
    /// whatever they show until the new pattern draws its first frame.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
        self.animation = Animation::new(pattern, &self.timing, &mut self.rng);
        self.last_step_at = self.tick_source.now();
        self.started = false;
        self.paused_at = None;
        self.run_state = RunState::Running;
        info!("pattern: {}", pattern);
    }

    /// Switches by numeric selector. Out-of-range values change nothing.
    ///
    /// Returns true if the pattern was applied.
    pub fn set_pattern_index(&mut self, index: u8) -> bool {
        match Pattern::try_from(index) {
            Ok(pattern) => {
                self.set_pattern(pattern);
                true
            }
            Err(_err) => {
                warn!("ignoring pattern index {}", index);
                false
            }
        }
    }

    /// Switches to the following pattern, wrapping around.
    pub fn next(&mut self) {
        self.set_pattern(self.pattern.next());
    }

    /// Switches to the preceding pattern, wrapping around.
    pub fn prev(&mut self) {
        self.set_pattern(self.pattern.prev());
    }

    /// Starts, or restarts, the current pattern's cadence.
    pub fn start(&mut self) {
        self.run_state = RunState::Running;
        self.last_step_at = self.tick_source.now();
        self.started = false;
        self.paused_at = None;
        info!("pattern engine started");
    }

    /// Stops animating and turns every LED off.
    pub fn stop(&mut self) {
        self.run_state = RunState::Stopped;
        self.paused_at = None;
        self.led.set_all(false);
        info!("pattern engine stopped");
    }

    /// Freezes the current frame. Only valid while running.
    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
            self.paused_at = Some(self.tick_source.now());
            info!("pattern engine paused");
        }
    }

    /// Continues a paused pattern where it left off. Only valid while paused.
    ///
    /// The step timer is shifted by the time spent paused, so the step that
    /// was in progress finishes with its remaining time instead of firing
    /// immediately.
    pub fn resume(&mut self) {
        if self.run_state != RunState::Paused {
            return;
        }

        if let Some(paused_at) = self.paused_at.take() {
            let paused_ms = self.tick_source.now().wrapping_since(paused_at);
            self.last_step_at = self.last_step_at.wrapping_add(paused_ms);
        }
        self.run_state = RunState::Running;
        info!("pattern engine resumed");
    }

    /// Pauses when running, resumes when paused, starts when stopped.
    pub fn toggle_pause(&mut self) {
        match self.run_state {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Stopped => self.start(),
        }
    }

    /// Advances the current pattern if its step interval has elapsed.
    ///
    /// No-op unless running.
    pub fn update(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }

        let now = self.tick_source.now();

        if !self.started {
            self.started = true;
            self.last_step_at = now;
            if self.animation.renders_on_start() {
                self.animation.step(&mut self.led, &self.timing, &mut self.rng);
            }
            return;
        }

        match self.animation.period_ms(&self.timing) {
            None => self.animation.step(&mut self.led, &self.timing, &mut self.rng),
            Some(period_ms) => {
                if self.tick_source.elapsed_at_least(self.last_step_at, period_ms) {
                    self.animation.step(&mut self.led, &self.timing, &mut self.rng);
                    self.last_step_at = now;
                }
            }
        }
    }

    /// Returns the selected pattern.
    pub fn current_pattern(&self) -> Pattern {
        self.pattern
    }

    /// Returns the run state.
    pub fn get_state(&self) -> RunState {
        self.run_state
    }

    /// Returns true if the engine is running.
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Returns true if the engine is paused.
    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    /// Returns the cadences in use.
    pub fn timing(&self) -> &PatternTiming {
        &self.timing
    }

    /// Returns a reference to the LED sink.
    pub fn led(&self) -> &L {
        &self.led
    }

    /// Returns a mutable reference to the LED sink.
    ///
    /// Used by the sleep coordinator for its indication sequences. The borrow
    /// keeps the engine from updating while someone else drives the LEDs.
    pub fn led_mut(&mut self) -> &mut L {
        &mut self.led
    }
}
