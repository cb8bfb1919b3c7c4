//! Command-based control of the pattern engine and sleep coordinator.

use crate::button::ButtonEvent;
use crate::pattern::Pattern;

/// Actions for controlling the pattern engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternAction {
    /// Switch to a pattern.
    Set(Pattern),
    /// Switch to the next pattern.
    Next,
    /// Switch to the previous pattern.
    Prev,
    /// Start running.
    Start,
    /// Stop and turn LEDs off.
    Stop,
    /// Pause.
    Pause,
    /// Resume.
    Resume,
    /// Pause or resume, whichever applies.
    TogglePause,
}

/// Command routed by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Goes to the pattern engine.
    Pattern(PatternAction),
    /// Enter sleep.
    Sleep,
}

impl Command {
    /// Maps a button gesture to the command it triggers.
    ///
    /// Press pauses or resumes, long press advances the pattern and double
    /// click puts the device to sleep. `Released` and `None` trigger nothing.
    pub fn from_event(event: ButtonEvent) -> Option<Command> {
        match event {
            ButtonEvent::Pressed => Some(Command::Pattern(PatternAction::TogglePause)),
            ButtonEvent::LongPress => Some(Command::Pattern(PatternAction::Next)),
            ButtonEvent::DoubleClick => Some(Command::Sleep),
            ButtonEvent::Released | ButtonEvent::None => None,
        }
    }
}

impl From<PatternAction> for Command {
    fn from(action: PatternAction) -> Self {
        Command::Pattern(action)
    }
}
