//! Integration tests for SleepCoordinator

mod common;
use common::*;

use core::cell::Cell;
use smart_blinker::{
    EdgeRoute, InterruptShared, LedSink, SleepConfig, SleepCoordinator, SleepMode, SleepState,
    SuspendableTick, Tick, TickSource,
};

const QUIET_LIGHT: SleepConfig = SleepConfig {
    mode: SleepMode::Light,
    indicate: false,
};

#[test]
fn light_sleep_parks_until_button_wakes() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::showing(0b0101);
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, QUIET_LIGHT);

    sleep.enter(&mut leds);

    assert_eq!(sleep.get_state(), SleepState::Awake);
    assert!(!sleep.is_sleeping());
    assert!(!shared.is_sleeping());
    assert!(!shared.wake_requested());
    assert!(!tick.is_suspended());

    let power = sleep.power();
    assert_eq!(power.waits, 1);
    assert_eq!(power.stops, 0);
    assert_eq!(power.routes.as_slice(), &[EdgeRoute::Wake]);
}

#[test]
fn parked_only_with_tick_suspended_and_flag_set() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let mut sleep = SleepCoordinator::new(MockPower::new(&shared, &tick), &tick, &shared);

    sleep.enter(&mut leds);

    assert!(sleep.power().saw_sleeping);
    assert!(!sleep.power().saw_tick_running);
}

#[test]
fn outputs_go_dark_and_come_back() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::showing(0b0101);
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, QUIET_LIGHT);

    sleep.enter(&mut leds);

    assert_eq!(leds.mask(), 0b0101);
    assert_eq!(
        leds.history(),
        &[LedOp::SetAll(false), LedOp::SetMask(0b0101)]
    );
}

#[test]
fn spurious_interrupts_go_back_to_sleep() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let power = MockPower::waking_after(&shared, &tick, 3);
    let mut sleep = SleepCoordinator::with_config(power, &tick, &shared, QUIET_LIGHT);

    sleep.enter(&mut leds);

    assert_eq!(sleep.power().waits, 3);
    assert_eq!(sleep.get_state(), SleepState::Awake);
}

#[test]
fn wake_request_while_awake_does_not_skip_sleep() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, QUIET_LIGHT);

    sleep.wake();
    assert!(!shared.wake_requested());

    sleep.enter(&mut leds);
    assert_eq!(sleep.power().waits, 1);
    assert_eq!(sleep.get_state(), SleepState::Awake);
}

#[test]
#[should_panic(expected = "standby entered")]
fn deep_mode_after_early_wake_request_still_never_returns() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let config = SleepConfig {
        mode: SleepMode::Deep,
        indicate: false,
    };
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, config);

    sleep.wake();
    sleep.enter(&mut leds);
}

/// Tick source whose suspend races a button edge.
struct EdgeOnSuspend<'a> {
    tick: &'a MockTick,
    shared: &'a InterruptShared,
    route: Cell<Option<EdgeRoute>>,
}

impl TickSource for EdgeOnSuspend<'_> {
    fn now(&self) -> Tick {
        self.tick.now()
    }

    fn block_for(&self, duration_ms: u32) {
        self.tick.block_for(duration_ms);
    }
}

impl SuspendableTick for EdgeOnSuspend<'_> {
    fn suspend(&self) {
        self.route.set(Some(self.shared.on_edge_interrupt(self.tick.now())));
        self.tick.suspend();
    }

    fn resume(&self) {
        self.tick.resume();
    }

    fn is_suspended(&self) -> bool {
        self.tick.is_suspended()
    }
}

#[test]
fn edge_racing_tick_suspend_wakes_instead_of_being_lost() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let racing = EdgeOnSuspend {
        tick: &tick,
        shared: &shared,
        route: Cell::new(None),
    };
    let mut leds = MockLeds::new();
    let power = MockPower::waking_after(&shared, &tick, 5);
    let mut sleep = SleepCoordinator::with_config(power, &racing, &shared, QUIET_LIGHT);

    sleep.enter(&mut leds);

    // BEHAVIOR: the press is a wake request, so the core never parks
    assert_eq!(racing.route.get(), Some(EdgeRoute::Wake));
    assert_eq!(sleep.power().parks(), 0);
    assert_eq!(sleep.get_state(), SleepState::Awake);
}

#[test]
fn balanced_mode_uses_stop() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let mut sleep = SleepCoordinator::new(MockPower::new(&shared, &tick), &tick, &shared);

    assert_eq!(sleep.mode(), SleepMode::Balanced);
    sleep.enter(&mut leds);

    assert_eq!(sleep.power().stops, 1);
    assert_eq!(sleep.power().waits, 0);
}

#[test]
#[should_panic(expected = "standby entered")]
fn deep_mode_never_returns() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let config = SleepConfig {
        mode: SleepMode::Deep,
        indicate: false,
    };
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, config);

    sleep.enter(&mut leds);
}

#[test]
fn indication_plays_around_sleep_and_restores_outputs() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::showing(0b0011);
    let mut sleep = SleepCoordinator::new(MockPower::new(&shared, &tick), &tick, &shared);

    sleep.enter(&mut leds);

    // BEHAVIOR: indications block on the running tick, never a suspended one
    assert!(tick.blocked_ms() > 0);
    assert_eq!(tick.now().as_millis(), tick.blocked_ms());
    assert_eq!(leds.mask(), 0b0011);
    assert_eq!(leds.history().last(), Some(&LedOp::SetMask(0b0011)));
}

#[test]
fn toggle_from_awake_sleeps_and_wakes() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut leds = MockLeds::new();
    let mut sleep =
        SleepCoordinator::with_config(MockPower::new(&shared, &tick), &tick, &shared, QUIET_LIGHT);

    sleep.toggle(&mut leds);

    assert_eq!(sleep.power().parks(), 1);
    assert_eq!(sleep.get_state(), SleepState::Awake);
}

#[test]
fn mode_index_out_of_range_is_ignored() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut sleep = SleepCoordinator::new(MockPower::new(&shared, &tick), &tick, &shared);

    assert!(!sleep.set_mode_index(3));
    assert_eq!(sleep.mode(), SleepMode::Balanced);

    assert!(sleep.set_mode_index(0));
    assert_eq!(sleep.mode(), SleepMode::Light);
    assert!(sleep.set_mode_index(2));
    assert_eq!(sleep.mode(), SleepMode::Deep);
}

#[test]
fn edge_while_awake_is_a_gesture() {
    let tick = MockTick::new();
    let shared = InterruptShared::new();
    let mut sleep = SleepCoordinator::new(MockPower::new(&shared, &tick), &tick, &shared);
    sleep.init();

    assert_eq!(shared.on_edge_interrupt(tick.now()), EdgeRoute::Gesture);
    assert!(!shared.wake_requested());
}
