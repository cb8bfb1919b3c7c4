//! One cooperative main-loop cycle wiring the three state machines together.

use crate::button::{ButtonEvent, ButtonInput, ButtonRecognizer};
use crate::command::Command;
use crate::led::LedSink;
use crate::pattern::PatternEngine;
use crate::sleep::{PowerControl, SleepCoordinator, SleepState};
use crate::time::SuspendableTick;

/// Owns the button recognizer, pattern engine and sleep coordinator and runs
/// them in the right order.
///
/// ```ignore
/// let mut controller = Controller::new(button, patterns, sleep);
/// controller.init();
/// loop {
///     controller.poll();
/// }
/// ```
pub struct Controller<'t, T, B, L, P>
where
    T: SuspendableTick,
    B: ButtonInput,
    L: LedSink,
    P: PowerControl,
{
    button: ButtonRecognizer<'t, T, B>,
    patterns: PatternEngine<'t, T, L>,
    sleep: SleepCoordinator<'t, T, P>,
}

impl<'t, T, B, L, P> Controller<'t, T, B, L, P>
where
    T: SuspendableTick,
    B: ButtonInput,
    L: LedSink,
    P: PowerControl,
{
    /// Creates a controller from its three state machines.
    pub fn new(
        button: ButtonRecognizer<'t, T, B>,
        patterns: PatternEngine<'t, T, L>,
        sleep: SleepCoordinator<'t, T, P>,
    ) -> Self {
        Self {
            button,
            patterns,
            sleep,
        }
    }

    /// Resets every state machine and starts the current pattern.
    pub fn init(&mut self) {
        self.sleep.init();
        self.button.init();
        self.patterns.init();
        self.patterns.start();
    }

    /// Runs one cycle: advance the button, dispatch at most one event, then
    /// animate.
    ///
    /// Returns the event that was dispatched. Patterns only update while the
    /// coordinator is awake.
    pub fn poll(&mut self) -> ButtonEvent {
        self.button.update();

        let event = self.button.get_event();
        if let Some(command) = Command::from_event(event) {
            self.dispatch(command);
        }

        if self.sleep.get_state() == SleepState::Awake {
            self.patterns.update();
        }

        event
    }

    /// Executes a command.
    ///
    /// `Sleep` blocks until the device wakes, then re-baselines the button,
    /// whose timestamps went stale while the tick was suspended.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Pattern(action) => self.patterns.handle_action(action),
            Command::Sleep => {
                self.sleep.enter(self.patterns.led_mut());
                self.button.resync();
            }
        }
    }

    /// Returns the button recognizer.
    pub fn button(&self) -> &ButtonRecognizer<'t, T, B> {
        &self.button
    }

    /// Returns the pattern engine.
    pub fn patterns(&self) -> &PatternEngine<'t, T, L> {
        &self.patterns
    }

    /// Returns the pattern engine mutably.
    pub fn patterns_mut(&mut self) -> &mut PatternEngine<'t, T, L> {
        &mut self.patterns
    }

    /// Returns the sleep coordinator.
    pub fn sleep(&self) -> &SleepCoordinator<'t, T, P> {
        &self.sleep
    }

    /// Returns the sleep coordinator mutably.
    pub fn sleep_mut(&mut self) -> &mut SleepCoordinator<'t, T, P> {
        &mut self.sleep
    }
}
