//! Shared test infrastructure for smart-blinker integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::Cell;
use smart_blinker::{
    ALL_CHANNELS, ButtonEvent, ButtonInput, ButtonRecognizer, Channel, EdgeRoute, InterruptShared,
    LedSink, PowerControl, SuspendableTick, Tick, TickSource,
};

// ============================================================================
// Mock Tick Source
// ============================================================================

/// Mock millisecond tick with controllable advancement.
///
/// Like the hardware counter, time stands still while suspended.
pub struct MockTick {
    now: Cell<u32>,
    suspended: Cell<bool>,
    blocked_ms: Cell<u32>,
}

impl MockTick {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(millis: u32) -> Self {
        Self {
            now: Cell::new(millis),
            suspended: Cell::new(false),
            blocked_ms: Cell::new(0),
        }
    }

    /// Advance time by `ms`, unless suspended.
    pub fn advance(&self, ms: u32) {
        if !self.suspended.get() {
            self.now.set(self.now.get().wrapping_add(ms));
        }
    }

    pub fn set_time(&self, millis: u32) {
        self.now.set(millis);
    }

    /// Total time spent in `block_for`.
    pub fn blocked_ms(&self) -> u32 {
        self.blocked_ms.get()
    }
}

impl TickSource for MockTick {
    fn now(&self) -> Tick {
        Tick(self.now.get())
    }

    // A real busy-wait would hang here; advance time instead
    fn block_for(&self, duration_ms: u32) {
        assert!(
            !self.suspended.get(),
            "block_for while the tick is suspended never returns"
        );
        self.blocked_ms.set(self.blocked_ms.get() + duration_ms);
        self.advance(duration_ms);
    }
}

impl SuspendableTick for MockTick {
    fn suspend(&self) {
        self.suspended.set(true);
    }

    fn resume(&self) {
        self.suspended.set(false);
    }

    fn is_suspended(&self) -> bool {
        self.suspended.get()
    }
}

// ============================================================================
// Mock LEDs
// ============================================================================

/// One write to the LED sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedOp {
    Set(Channel, bool),
    SetAll(bool),
    SetMask(u8),
    ToggleAll,
}

/// Mock LED bank that records every write.
pub struct MockLeds {
    mask: u8,
    history: heapless::Vec<LedOp, 512>,
}

impl MockLeds {
    pub fn new() -> Self {
        Self {
            mask: 0,
            history: heapless::Vec::new(),
        }
    }

    /// Starts with `mask` lit and an empty history.
    pub fn showing(mask: u8) -> Self {
        Self {
            mask: mask & ALL_CHANNELS,
            history: heapless::Vec::new(),
        }
    }

    pub fn history(&self) -> &[LedOp] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// The only lit channel, if exactly one is lit.
    pub fn single_lit(&self) -> Option<Channel> {
        let mut lit = Channel::ALL.iter().filter(|c| self.mask & c.mask() != 0);
        match (lit.next(), lit.next()) {
            (Some(channel), None) => Some(*channel),
            _ => None,
        }
    }

    fn record(&mut self, op: LedOp) {
        let _ = self.history.push(op);
    }
}

impl LedSink for MockLeds {
    fn set(&mut self, channel: Channel, on: bool) {
        if on {
            self.mask |= channel.mask();
        } else {
            self.mask &= !channel.mask();
        }
        self.record(LedOp::Set(channel, on));
    }

    fn is_on(&self, channel: Channel) -> bool {
        self.mask & channel.mask() != 0
    }

    fn set_all(&mut self, on: bool) {
        self.mask = if on { ALL_CHANNELS } else { 0 };
        self.record(LedOp::SetAll(on));
    }

    fn toggle_all(&mut self) {
        self.mask = !self.mask & ALL_CHANNELS;
        self.record(LedOp::ToggleAll);
    }

    fn set_mask(&mut self, mask: u8) {
        self.mask = mask & ALL_CHANNELS;
        self.record(LedOp::SetMask(mask));
    }

    fn mask(&self) -> u8 {
        self.mask
    }
}

// ============================================================================
// Mock Button
// ============================================================================

/// Mock button pin; share it by reference with the recognizer.
pub struct MockButton {
    pressed: Cell<bool>,
}

impl MockButton {
    pub fn new() -> Self {
        Self {
            pressed: Cell::new(false),
        }
    }

    pub fn press(&self) {
        self.pressed.set(true);
    }

    pub fn release(&self) {
        self.pressed.set(false);
    }

    pub fn set(&self, pressed: bool) {
        self.pressed.set(pressed);
    }
}

impl ButtonInput for MockButton {
    fn is_pressed(&self) -> bool {
        self.pressed.get()
    }
}

// ============================================================================
// Mock Power Control
// ============================================================================

/// Mock power control.
///
/// Each wait stands in for one interrupt arriving. Waits before the
/// `wake_after`-th one are spurious; that one simulates the button edge
/// interrupt, which the shared flags route to a wake request.
pub struct MockPower<'a> {
    shared: &'a InterruptShared,
    tick: &'a MockTick,
    wake_after: u32,
    pub waits: u32,
    pub stops: u32,
    pub saw_sleeping: bool,
    pub saw_tick_running: bool,
    pub routes: heapless::Vec<EdgeRoute, 8>,
}

impl<'a> MockPower<'a> {
    pub fn new(shared: &'a InterruptShared, tick: &'a MockTick) -> Self {
        Self::waking_after(shared, tick, 1)
    }

    pub fn waking_after(shared: &'a InterruptShared, tick: &'a MockTick, wake_after: u32) -> Self {
        Self {
            shared,
            tick,
            wake_after,
            waits: 0,
            stops: 0,
            saw_sleeping: false,
            saw_tick_running: false,
            routes: heapless::Vec::new(),
        }
    }

    /// Total low-power waits of any kind.
    pub fn parks(&self) -> u32 {
        self.waits + self.stops
    }

    fn interrupt(&mut self) {
        self.saw_sleeping |= self.shared.is_sleeping();
        self.saw_tick_running |= !self.tick.is_suspended();
        if self.parks() >= self.wake_after {
            let route = self.shared.on_edge_interrupt(self.tick.now());
            let _ = self.routes.push(route);
        }
    }
}

impl PowerControl for MockPower<'_> {
    fn wait_for_interrupt(&mut self) {
        self.waits += 1;
        self.interrupt();
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.interrupt();
    }

    fn standby(&mut self) -> ! {
        panic!("standby entered");
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub type Events = heapless::Vec<ButtonEvent, 32>;

pub type TestButton<'a> = ButtonRecognizer<'a, MockTick, &'a MockButton>;

/// Polls the recognizer once per millisecond for `ms` milliseconds and
/// collects every event it reports.
pub fn poll_for(button: &mut TestButton<'_>, tick: &MockTick, ms: u32) -> Events {
    let mut events = Events::new();
    for _ in 0..ms {
        tick.advance(1);
        button.update();
        let event = button.get_event();
        if event != ButtonEvent::None {
            let _ = events.push(event);
        }
    }
    events
}

/// Presses for `hold_ms`, then releases and polls for `after_ms`.
pub fn click(
    button: &mut TestButton<'_>,
    pin: &MockButton,
    tick: &MockTick,
    hold_ms: u32,
    after_ms: u32,
) -> Events {
    let mut events = Events::new();
    pin.press();
    events.extend(poll_for(button, tick, hold_ms));
    pin.release();
    events.extend(poll_for(button, tick, after_ms));
    events
}
