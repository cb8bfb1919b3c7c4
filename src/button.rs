//! Push-button gesture recognition.
//!
//! Provides [`ButtonRecognizer`], which turns a bouncing raw input level and
//! edge interrupts into discrete [`ButtonEvent`]s: press, release, long press
//! and double click. The recognizer never blocks; call
//! [`update`](ButtonRecognizer::update) once per main-loop cycle and drain the
//! result with [`get_event`](ButtonRecognizer::get_event).
//!
//! # Debouncing
//!
//! Every transition goes through a debounce window. The window is entered from
//! the edge interrupt (using the recorded edge time) and from polling, so a
//! missed edge is still caught. Any level change inside the window restarts
//! it; a press is only reported once the level held still for the full window.
//!
//! # Clicks
//!
//! A short press-and-release arms a double-click window instead of reporting
//! `Released` right away. A second press starting inside the window turns into
//! `DoubleClick` when it is released. If the window runs out first, the single
//! click is reported as `Released`. Long presses always end with `Released`.

use crate::config::ButtonTiming;
use crate::shared::InterruptShared;
use crate::time::{Tick, TickSource};

/// Gesture events reported to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// No event pending.
    #[default]
    None,
    /// The button went down and stayed down for the debounce window.
    Pressed,
    /// A single click completed, or a long press ended.
    Released,
    /// The button has been held past the long-press threshold.
    LongPress,
    /// Two short clicks in quick succession.
    DoubleClick,
}

/// Observable state of the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Released and settled.
    Idle,
    /// Waiting for the level to hold still.
    Debouncing,
    /// Held, below the long-press threshold.
    Pressed,
    /// Release settled; returns to `Idle` on the next update.
    Released,
    /// Held past the long-press threshold.
    LongPress,
}

/// Trait for abstracting the raw button input.
pub trait ButtonInput {
    /// Returns true if the button is physically pressed right now.
    ///
    /// Translate active-low wiring here. No debouncing expected.
    fn is_pressed(&self) -> bool;
}

impl<B: ButtonInput + ?Sized> ButtonInput for &B {
    fn is_pressed(&self) -> bool {
        (**self).is_pressed()
    }
}

/// What a debounce window is trying to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settling {
    Press,
    Release { held_long: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Debouncing(Settling),
    Pressed,
    Released,
    LongPress,
}

/// Debounced gesture recognizer for a single push button.
///
/// # Type Parameters
/// * `'t` - Lifetime of the tick source and interrupt flag references
/// * `T` - Tick source implementation type
/// * `B` - Raw button input type
pub struct ButtonRecognizer<'t, T: TickSource, B: ButtonInput> {
    input: B,
    tick_source: &'t T,
    shared: &'t InterruptShared,
    timing: ButtonTiming,
    phase: Phase,
    last_raw_level: bool,
    state_entered_at: Tick,
    press_started_at: Tick,
    pending_event: ButtonEvent,
    click_pending: bool,
    click_released_at: Tick,
}

impl<'t, T: TickSource, B: ButtonInput> ButtonRecognizer<'t, T, B> {
    /// Creates a recognizer with default timing.
    pub fn new(input: B, tick_source: &'t T, shared: &'t InterruptShared) -> Self {
        Self::with_timing(input, tick_source, shared, ButtonTiming::DEFAULT)
    }

    /// Creates a recognizer with custom timing.
    pub fn with_timing(
        input: B,
        tick_source: &'t T,
        shared: &'t InterruptShared,
        timing: ButtonTiming,
    ) -> Self {
        let now = tick_source.now();
        let mut recognizer = Self {
            input,
            tick_source,
            shared,
            timing,
            phase: Phase::Idle,
            last_raw_level: false,
            state_entered_at: now,
            press_started_at: now,
            pending_event: ButtonEvent::None,
            click_pending: false,
            click_released_at: now,
        };
        recognizer.init();
        recognizer
    }

    /// Resets to `Idle` with no pending event or click.
    ///
    /// A button that is already held is swallowed: it reports nothing until
    /// released, then a plain `Released`.
    pub fn init(&mut self) {
        self.pending_event = ButtonEvent::None;
        self.resync();
    }

    /// Re-baselines after the tick source was suspended.
    ///
    /// Drops edges recorded before now and cancels any half-finished gesture,
    /// since their timestamps no longer line up with the clock. A button still
    /// held from the wake-up press is swallowed like in [`init`](Self::init).
    /// An undelivered event is kept.
    pub fn resync(&mut self) {
        let now = self.tick_source.now();
        let raw = self.input.is_pressed();

        self.shared.discard_edge();
        self.phase = if raw { Phase::LongPress } else { Phase::Idle };
        self.last_raw_level = raw;
        self.state_entered_at = now;
        self.press_started_at = now;
        self.click_pending = false;
    }

    /// Advances the state machine. Call once per main-loop cycle.
    pub fn update(&mut self) {
        let now = self.tick_source.now();
        let raw = self.input.is_pressed();

        if let Some(edge_at) = self.shared.take_edge() {
            self.on_edge(raw, edge_at);
        }

        match self.phase {
            Phase::Idle => {
                // Missed edge: the pin is down but nothing started settling
                if raw {
                    self.begin_settling(Settling::Press, now, raw);
                }
            }
            Phase::Debouncing(settling) => {
                if raw != self.last_raw_level {
                    self.state_entered_at = now;
                } else if self
                    .tick_source
                    .elapsed_at_least(self.state_entered_at, self.timing.debounce_ms)
                {
                    self.settle(settling, raw, now);
                }
            }
            Phase::Pressed => {
                if self
                    .tick_source
                    .elapsed_at_least(self.press_started_at, self.timing.long_press_ms)
                {
                    self.phase = Phase::LongPress;
                    self.state_entered_at = now;
                    self.emit(ButtonEvent::LongPress);
                }

                if !raw {
                    let held_long = self.phase == Phase::LongPress;
                    self.begin_settling(Settling::Release { held_long }, now, raw);
                }
            }
            Phase::LongPress => {
                if !raw {
                    self.begin_settling(Settling::Release { held_long: true }, now, raw);
                }
            }
            Phase::Released => {
                self.phase = Phase::Idle;
                self.state_entered_at = now;
            }
        }

        self.last_raw_level = raw;
        self.expire_click(now);
    }

    /// Returns and clears the pending event.
    ///
    /// Only one event is held at a time; a newer event overwrites an
    /// undelivered one. Returns [`ButtonEvent::None`] when already drained.
    pub fn get_event(&mut self) -> ButtonEvent {
        core::mem::take(&mut self.pending_event)
    }

    /// Returns true while a debounced press is held.
    pub fn is_pressed(&self) -> bool {
        matches!(self.phase, Phase::Pressed | Phase::LongPress)
    }

    /// Returns the undebounced input level.
    pub fn is_pressed_raw(&self) -> bool {
        self.input.is_pressed()
    }

    /// Returns the current state.
    pub fn state(&self) -> ButtonState {
        match self.phase {
            Phase::Idle => ButtonState::Idle,
            Phase::Debouncing(_) => ButtonState::Debouncing,
            Phase::Pressed => ButtonState::Pressed,
            Phase::Released => ButtonState::Released,
            Phase::LongPress => ButtonState::LongPress,
        }
    }

    /// Returns true while a first click waits for a possible second one.
    pub fn click_pending(&self) -> bool {
        self.click_pending
    }

    /// Returns the timing in use.
    pub fn timing(&self) -> ButtonTiming {
        self.timing
    }

    /// Applies the coarse transition an interrupt edge stands for.
    fn on_edge(&mut self, raw: bool, edge_at: Tick) {
        match self.phase {
            Phase::Idle if raw => self.begin_settling(Settling::Press, edge_at, raw),
            Phase::Pressed if !raw => {
                self.begin_settling(Settling::Release { held_long: false }, edge_at, raw)
            }
            Phase::LongPress if !raw => {
                self.begin_settling(Settling::Release { held_long: true }, edge_at, raw)
            }
            Phase::Debouncing(_) => {
                // Bounce: the window restarts at the latest edge
                self.state_entered_at = edge_at;
                self.last_raw_level = raw;
            }
            _ => {}
        }
    }

    fn begin_settling(&mut self, settling: Settling, at: Tick, raw: bool) {
        self.phase = Phase::Debouncing(settling);
        self.state_entered_at = at;
        self.last_raw_level = raw;
    }

    /// Concludes a debounce window with the level that held still.
    fn settle(&mut self, settling: Settling, raw: bool, now: Tick) {
        self.phase = match (settling, raw) {
            (Settling::Press, true) => {
                self.press_started_at = now;
                self.emit(ButtonEvent::Pressed);
                Phase::Pressed
            }
            // Too short to be a press
            (Settling::Press, false) => Phase::Idle,
            (Settling::Release { held_long }, false) => {
                self.on_release(held_long, now);
                Phase::Released
            }
            (Settling::Release { held_long: false }, true) => Phase::Pressed,
            (Settling::Release { held_long: true }, true) => Phase::LongPress,
        };
        self.state_entered_at = now;
    }

    fn on_release(&mut self, held_long: bool, now: Tick) {
        let held_ms = now.wrapping_since(self.press_started_at);

        if held_long || held_ms >= self.timing.long_press_ms {
            self.click_pending = false;
            self.emit(ButtonEvent::Released);
        } else if self.click_pending {
            self.click_pending = false;
            self.emit(ButtonEvent::DoubleClick);
        } else {
            self.click_pending = true;
            self.click_released_at = now;
        }
    }

    /// Reports a lone click once the double-click window has passed.
    ///
    /// Only runs while idle; a second press that has started settling
    /// cancels the timeout.
    fn expire_click(&mut self, now: Tick) {
        if self.click_pending
            && self.phase == Phase::Idle
            && now.wrapping_since(self.click_released_at) >= self.timing.double_click_ms
        {
            self.click_pending = false;
            self.emit(ButtonEvent::Released);
        }
    }

    fn emit(&mut self, event: ButtonEvent) {
        debug!("button: {}", event);
        self.pending_event = event;
    }
}
