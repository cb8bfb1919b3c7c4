#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`TickSource`**: Trait to implement for your millisecond timer; `TickCounter` is a ready-made interrupt-driven one
//! - **`LedSink`**: Trait to implement for your LED outputs (per channel or as a bitmask)
//! - **`ButtonInput`**: Trait to implement for the raw button pin
//! - **`PowerControl`**: Trait to implement for the processor's low-power instructions
//! - **`InterruptShared`**: The flags interrupt handlers write; the only state shared across contexts
//! - **`ButtonRecognizer`**: Turns bouncing input into `ButtonEvent`s (press, release, long press, double click)
//! - **`PatternEngine`**: Runs one `Pattern` at a time without blocking
//! - **`SleepCoordinator`**: Moves the device between awake and a low-power `SleepMode`
//! - **`Controller`**: One main-loop cycle wiring the three together
//!
//! All timestamps are 32-bit millisecond `Tick`s compared with wrapping
//! arithmetic, so the core keeps working across counter overflow.

#[macro_use]
mod fmt;

pub mod time;
pub mod led;
pub mod config;
pub mod shared;
pub mod button;
pub mod pattern;
pub mod command;
pub mod sleep;
pub mod controller;

pub use time::{
    SuspendableTick, Tick, TickConfig, TickConfigError, TickCounter, TickSource,
    SYSTICK_MAX_RELOAD, TICK_HZ,
};
pub use led::{ALL_CHANNELS, CHANNEL_COUNT, Channel, LedSink};
pub use config::{ButtonTiming, PatternTiming, SleepConfig};
pub use shared::{EdgeRoute, InterruptShared};
pub use button::{ButtonEvent, ButtonInput, ButtonRecognizer, ButtonState};
pub use pattern::{InvalidPattern, Pattern, PatternEngine, RunState};
pub use command::{Command, PatternAction};
pub use sleep::{InvalidMode, PowerControl, SleepCoordinator, SleepMode, SleepState};
pub use controller::Controller;
