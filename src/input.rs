//! Input actuation. The platform-specific key/mouse synthesis lives behind
//! [`InputBackend`]; this module owns the logic layered on top of it:
//! debounced directional holds, aim-and-fire, and the weighted upgrade-slot
//! selector.

use crate::detect::Point2;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const UPGRADE_SLOT_COUNT: usize = 8;
/// Relative pick weight per upgrade slot, slot 1 first.
const SLOT_WEIGHTS: [f64; UPGRADE_SLOT_COUNT] = [1.0, 1.0, 0.1, 0.5, 1.0, 1.0, 0.5, 0.5];
/// A slot stops being eligible after this many uses.
const SLOT_USE_CAP: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Move(Direction),
    /// Upgrade slots are numbered 1 through 8.
    UpgradeSlot(u8),
}

/// Raw synthetic input events. Implementations wrap a platform facility and
/// carry no decision logic of their own.
pub trait InputBackend: Send {
    fn key_down(&mut self, key: Key);
    fn key_up(&mut self, key: Key);
    fn click_at(&mut self, x: i32, y: i32);
}

/// Movement/aim/upgrade commands as the pipeline issues them.
pub trait Actuator: Send {
    fn apply_movement(&mut self, move_x: f64, move_y: f64);
    fn apply_fire(&mut self, target: Option<Point2>);
    fn trigger_upgrade(&mut self);
}

/// Translates [`MoveAction`](crate::control::MoveAction) components into
/// debounced key transitions and upgrade commands into weighted slot taps.
pub struct InputDriver<B: InputBackend> {
    backend: B,
    held: [bool; 4],
    slot_uses: [u32; UPGRADE_SLOT_COUNT],
    rng: StdRng,
}

impl<B: InputBackend> InputDriver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            held: [false; 4],
            slot_uses: [0; UPGRADE_SLOT_COUNT],
            rng: StdRng::from_os_rng(),
        }
    }

    #[cfg(test)]
    fn with_seed(backend: B, seed: u64) -> Self {
        Self {
            backend,
            held: [false; 4],
            slot_uses: [0; UPGRADE_SLOT_COUNT],
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Press or release a direction key only on a state transition, so a
    /// direction held across many cycles produces a single key-down.
    fn set_held(&mut self, direction: Direction, want: bool) {
        let index = direction as usize;
        if want && !self.held[index] {
            self.backend.key_down(Key::Move(direction));
            self.held[index] = true;
        } else if !want && self.held[index] {
            self.backend.key_up(Key::Move(direction));
            self.held[index] = false;
        }
    }
}

impl<B: InputBackend> Actuator for InputDriver<B> {
    fn apply_movement(&mut self, move_x: f64, move_y: f64) {
        self.set_held(Direction::Up, move_y < 0.0);
        self.set_held(Direction::Down, move_y > 0.0);
        self.set_held(Direction::Left, move_x < 0.0);
        self.set_held(Direction::Right, move_x > 0.0);
    }

    fn apply_fire(&mut self, target: Option<Point2>) {
        if let Some(target) = target {
            self.backend
                .click_at(target.x.round() as i32, target.y.round() as i32);
        }
    }

    fn trigger_upgrade(&mut self) {
        let eligible: Vec<usize> = (0..UPGRADE_SLOT_COUNT)
            .filter(|&slot| self.slot_uses[slot] < SLOT_USE_CAP)
            .collect();
        if eligible.is_empty() {
            tracing::info!("all upgrade slots are exhausted");
            return;
        }

        let weights: Vec<f64> = eligible.iter().map(|&slot| SLOT_WEIGHTS[slot]).collect();
        let Ok(distribution) = WeightedIndex::new(&weights) else {
            return;
        };
        let slot = eligible[distribution.sample(&mut self.rng)];

        let key = Key::UpgradeSlot(slot as u8 + 1);
        self.backend.key_down(key);
        self.backend.key_up(key);
        self.slot_uses[slot] += 1;
        tracing::debug!(
            slot = slot + 1,
            uses = self.slot_uses[slot],
            "upgrade slot pressed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Down(Key),
        Up(Key),
        Click(i32, i32),
    }

    #[derive(Default)]
    struct RecordingBackend {
        events: Vec<Event>,
    }

    impl InputBackend for RecordingBackend {
        fn key_down(&mut self, key: Key) {
            self.events.push(Event::Down(key));
        }

        fn key_up(&mut self, key: Key) {
            self.events.push(Event::Up(key));
        }

        fn click_at(&mut self, x: i32, y: i32) {
            self.events.push(Event::Click(x, y));
        }
    }

    fn driver() -> InputDriver<RecordingBackend> {
        InputDriver::with_seed(RecordingBackend::default(), 42)
    }

    #[test]
    fn held_directions_are_debounced() {
        let mut d = driver();
        d.apply_movement(1.0, -1.0);
        d.apply_movement(1.0, -1.0);
        d.apply_movement(0.7, -0.7);
        assert_eq!(
            d.backend().events,
            vec![
                Event::Down(Key::Move(Direction::Up)),
                Event::Down(Key::Move(Direction::Right)),
            ]
        );
    }

    #[test]
    fn leaving_an_axis_releases_its_key() {
        let mut d = driver();
        d.apply_movement(-1.0, 0.0);
        d.apply_movement(1.0, 0.0);
        assert_eq!(
            d.backend().events,
            vec![
                Event::Down(Key::Move(Direction::Left)),
                Event::Up(Key::Move(Direction::Left)),
                Event::Down(Key::Move(Direction::Right)),
            ]
        );
    }

    #[test]
    fn zero_movement_releases_everything() {
        let mut d = driver();
        d.apply_movement(1.0, 1.0);
        d.apply_movement(0.0, 0.0);
        let releases = d
            .backend()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Up(_)))
            .count();
        assert_eq!(releases, 2);
    }

    #[test]
    fn fire_clicks_at_the_target_and_no_target_is_a_no_op() {
        let mut d = driver();
        d.apply_fire(Some(Point2::new(320.6, 200.4)));
        d.apply_fire(None);
        assert_eq!(d.backend().events, vec![Event::Click(321, 200)]);
    }

    #[test]
    fn upgrade_taps_one_slot_key() {
        let mut d = driver();
        d.trigger_upgrade();
        let events = &d.backend().events;
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (Event::Down(Key::UpgradeSlot(a)), Event::Up(Key::UpgradeSlot(b))) => {
                assert_eq!(a, b);
                assert!((1..=8).contains(a));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn slots_exhaust_after_the_use_cap() {
        let mut d = driver();
        // 8 slots x 8 uses each.
        for _ in 0..(UPGRADE_SLOT_COUNT as u32 * SLOT_USE_CAP) {
            d.trigger_upgrade();
        }
        let taps = d
            .backend()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Down(Key::UpgradeSlot(_))))
            .count();
        assert_eq!(taps, 64);
        for slot in 1..=8u8 {
            let uses = d
                .backend()
                .events
                .iter()
                .filter(|e| **e == Event::Down(Key::UpgradeSlot(slot)))
                .count();
            assert_eq!(uses, 8);
        }

        // Every slot is used up; further triggers emit nothing.
        d.trigger_upgrade();
        assert_eq!(d.backend().events.len(), 64 * 2);
    }
}
