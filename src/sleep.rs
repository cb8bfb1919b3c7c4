//! Sleep and power coordination.
//!
//! Provides [`SleepCoordinator`], which moves the device through
//! `Awake → Entering → Sleeping → Waking → Awake`. While sleeping the periodic
//! tick is suspended, the button edge interrupt is rerouted to a wake request
//! (see [`InterruptShared::on_edge_interrupt`]), and the processor is parked in
//! the low-power mode chosen by [`SleepMode`].
//!
//! The LED sink is borrowed for the duration of [`enter`](SleepCoordinator::enter),
//! so the pattern engine that normally owns it can't run until the device is
//! awake again.

use crate::config::SleepConfig;
use crate::led::{ALL_CHANNELS, Channel, LedSink};
use crate::shared::InterruptShared;
use crate::time::{SuspendableTick, Tick, TickSource};

/// Low-power depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepMode {
    /// Core clock stopped, everything else running. Wakes on any interrupt.
    Light,
    /// Clocks and regulator reduced before waiting. Wakes on an enabled interrupt.
    Balanced,
    /// Everything powered down. Waking is a reset; execution never returns.
    Deep,
}

impl SleepMode {
    /// Numeric selector of this mode.
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// A sleep mode selector outside `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidMode(pub u8);

impl core::fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sleep mode index {} out of range (0..=2)", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidMode {}

impl TryFrom<u8> for SleepMode {
    type Error = InvalidMode;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(SleepMode::Light),
            1 => Ok(SleepMode::Balanced),
            2 => Ok(SleepMode::Deep),
            other => Err(InvalidMode(other)),
        }
    }
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepState {
    /// Running normally.
    Awake,
    /// Playing the entry sequence and shutting things down.
    Entering,
    /// Parked in a low-power mode with the tick suspended.
    Sleeping,
    /// Restoring the tick and outputs after a wake-up.
    Waking,
}

/// Trait for abstracting the processor's low-power instructions.
///
/// Each method parks the core until an interrupt fires. Implementations should
/// make the wait race-free against an interrupt that arrives just before it,
/// e.g. by masking interrupts around the wait (a pending interrupt still ends
/// `WFI`).
pub trait PowerControl {
    /// Waits for an interrupt with clocks running (`WFI`).
    fn wait_for_interrupt(&mut self);

    /// Puts the regulator in low-power mode, sets deep sleep, waits for an
    /// interrupt, then restores the clock configuration.
    fn stop(&mut self);

    /// Enters the deepest mode. Waking from it resets the processor, so this
    /// never returns.
    fn standby(&mut self) -> !;
}

/// State captured before sleeping and restored after waking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    entered_at: Tick,
    outputs: u8,
}

/// Arbitrates transitions between awake and sleeping.
///
/// # Type Parameters
/// * `'t` - Lifetime of the tick source and interrupt flag references
/// * `T` - Suspendable tick source type
/// * `P` - Power control implementation type
pub struct SleepCoordinator<'t, T: SuspendableTick, P: PowerControl> {
    power: P,
    tick_source: &'t T,
    shared: &'t InterruptShared,
    config: SleepConfig,
    state: SleepState,
    snapshot: Option<Snapshot>,
}

impl<'t, T: SuspendableTick, P: PowerControl> SleepCoordinator<'t, T, P> {
    /// Creates an awake coordinator with default configuration.
    pub fn new(power: P, tick_source: &'t T, shared: &'t InterruptShared) -> Self {
        Self::with_config(power, tick_source, shared, SleepConfig::DEFAULT)
    }

    /// Creates an awake coordinator with custom configuration.
    pub fn with_config(
        power: P,
        tick_source: &'t T,
        shared: &'t InterruptShared,
        config: SleepConfig,
    ) -> Self {
        Self {
            power,
            tick_source,
            shared,
            config,
            state: SleepState::Awake,
            snapshot: None,
        }
    }

    /// Returns to `Awake` and clears any wake request.
    pub fn init(&mut self) {
        self.state = SleepState::Awake;
        self.snapshot = None;
        self.shared.set_sleeping(false);
        self.shared.clear_wake_request();
    }

    /// Puts the device to sleep and blocks until it is awake again.
    ///
    /// Only acts when `Awake`; otherwise does nothing. The LED sink is used
    /// for the entry and exit light sequences and handed back showing what it
    /// showed before sleeping.
    ///
    /// # Deep mode
    /// With [`SleepMode::Deep`] this function does not return. Waking up
    /// restarts the firmware from reset, so callers must not rely on any code
    /// after `enter()` running in that mode.
    pub fn enter<L: LedSink>(&mut self, led: &mut L) {
        if self.state != SleepState::Awake {
            return;
        }

        self.state = SleepState::Entering;
        info!("sleep: entering ({})", self.config.mode);

        let outputs = led.mask();
        if self.config.indicate {
            indication::entry(led, self.tick_source);
        }
        self.snapshot = Some(Snapshot {
            entered_at: self.tick_source.now(),
            outputs,
        });
        led.set_all(false);

        // Edges from here on are wake requests, including one that races the suspend
        self.shared.set_sleeping(true);
        self.tick_source.suspend();
        self.state = SleepState::Sleeping;
        self.park();

        self.state = SleepState::Waking;
        self.shared.set_sleeping(false);
        self.tick_source.resume();

        let restore = self.restore();
        if self.config.indicate {
            indication::exit(led, self.tick_source);
        }
        led.set_mask(restore);

        self.state = SleepState::Awake;
        self.shared.clear_wake_request();
        info!("sleep: awake");
    }

    /// Requests a wake-up. Safe to call from interrupt context.
    ///
    /// Only sets the flag; the coordinator resumes after the low-power wait
    /// returns. Does nothing while awake.
    pub fn wake(&self) {
        self.shared.request_wake();
    }

    /// Enters sleep when awake, otherwise requests a wake-up.
    pub fn toggle<L: LedSink>(&mut self, led: &mut L) {
        if self.state == SleepState::Awake {
            self.enter(led);
        } else {
            self.wake();
        }
    }

    /// Returns true while parked in a low-power mode.
    pub fn is_sleeping(&self) -> bool {
        self.state == SleepState::Sleeping
    }

    /// Returns the current state.
    pub fn get_state(&self) -> SleepState {
        self.state
    }

    /// Returns the low-power depth used by `enter()`.
    pub fn mode(&self) -> SleepMode {
        self.config.mode
    }

    /// Sets the low-power depth for the next `enter()`.
    pub fn set_mode(&mut self, mode: SleepMode) {
        self.config.mode = mode;
    }

    /// Sets the depth by numeric selector. Out-of-range values change nothing.
    ///
    /// Returns true if the mode was applied.
    pub fn set_mode_index(&mut self, index: u8) -> bool {
        match SleepMode::try_from(index) {
            Ok(mode) => {
                self.set_mode(mode);
                true
            }
            Err(_err) => {
                warn!("ignoring sleep mode index {}", index);
                false
            }
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> SleepConfig {
        self.config
    }

    /// Returns the power control implementation.
    pub fn power(&self) -> &P {
        &self.power
    }

    /// Waits in the configured mode until a wake-up is requested.
    ///
    /// Interrupts other than the wake source end the wait too; the core goes
    /// straight back down for those.
    fn park(&mut self) {
        while !self.shared.wake_requested() {
            match self.config.mode {
                SleepMode::Light => self.power.wait_for_interrupt(),
                SleepMode::Balanced => self.power.stop(),
                SleepMode::Deep => self.power.standby(),
            }
        }
    }

    /// Returns the outputs to show once awake.
    fn restore(&mut self) -> u8 {
        match self.snapshot.take() {
            Some(snapshot) => {
                debug!(
                    "sleep: restoring outputs {=u8} from {}",
                    snapshot.outputs,
                    snapshot.entered_at
                );
                snapshot.outputs
            }
            None => 0,
        }
    }
}

/// Light sequences played around sleep. They block, using the tick source.
mod indication {
    use super::*;

    const ENTRY_HOLD_MS: u32 = 150;
    const SWEEP_STEP_MS: u32 = 30;
    const SWEEPS: usize = 3;
    const PULSES: usize = 5;
    const PULSE_ON_MS: u32 = 15;
    const PULSE_OFF_MS: u32 = 60;

    const FLASHES: usize = 3;
    const FLASH_MS: u32 = 20;
    const FILL_STEP_MS: u32 = 100;
    const EXIT_HOLD_MS: u32 = 150;

    /// All on, three fill-and-drain sweeps, five green pulses, all off.
    pub(super) fn entry<L: LedSink, T: TickSource>(led: &mut L, tick: &T) {
        led.set_all(true);
        tick.block_for(ENTRY_HOLD_MS);
        led.set_all(false);

        for _ in 0..SWEEPS {
            for channel in Channel::ALL {
                led.on(channel);
                tick.block_for(SWEEP_STEP_MS);
            }
            for channel in Channel::ALL.iter().rev() {
                led.off(*channel);
                tick.block_for(SWEEP_STEP_MS);
            }
        }

        for _ in 0..PULSES {
            led.on(Channel::Green);
            tick.block_for(PULSE_ON_MS);
            led.off(Channel::Green);
            tick.block_for(PULSE_OFF_MS);
        }

        led.set_all(false);
    }

    /// Three quick flashes, then fill from the center outward and hold.
    pub(super) fn exit<L: LedSink, T: TickSource>(led: &mut L, tick: &T) {
        for _ in 0..FLASHES {
            led.set_all(true);
            tick.block_for(FLASH_MS);
            led.set_all(false);
            tick.block_for(FLASH_MS);
        }

        led.set_mask(Channel::Orange.mask() | Channel::Red.mask());
        tick.block_for(FILL_STEP_MS);
        led.set_mask(ALL_CHANNELS);
        tick.block_for(FILL_STEP_MS);
        tick.block_for(EXIT_HOLD_MS);
    }
}
