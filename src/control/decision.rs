//! Rule-based controller. Turns one frame's observation set plus the player
//! position into a steering vector and an optional fire target.
//!
//! Priorities per cycle: threat avoidance overrides target approach, which
//! overrides idle wander. Target selection runs independently of avoidance,
//! so the tank can flee a bullet while still aiming at a block it had picked.

use crate::config::DecisionConfig;
use crate::detect::{Category, Detection, Point2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Movement intent for one cycle. Components are normalized to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveAction {
    pub move_x: f64,
    pub move_y: f64,
    pub fire_target: Option<Point2>,
}

impl MoveAction {
    pub fn idle() -> Self {
        Self {
            move_x: 0.0,
            move_y: 0.0,
            fire_target: None,
        }
    }
}

/// State the control law carries across cycles. Owned by the decision
/// engine; nothing else reads or writes it.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    wander: (f64, f64),
    wander_refreshed_at: Option<Instant>,
    last_upgrade_at: Option<Instant>,
}

pub struct DecisionEngine {
    config: DecisionConfig,
    state: ControlState,
    rng: StdRng,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            config,
            state: ControlState::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    #[cfg(test)]
    fn with_seed(config: DecisionConfig, seed: u64) -> Self {
        Self {
            config,
            state: ControlState::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn decide(&mut self, detections: &[Detection], player: Point2, now: Instant) -> MoveAction {
        let mut avoidance = (0.0, 0.0);
        let mut target: Option<(usize, f64)> = None;

        for (index, detection) in detections.iter().enumerate() {
            let distance = player.distance_to(detection.position);

            if detection.category.is_threat() {
                let (ax, ay) =
                    self.avoidance_vector(player, detection.position, distance, detection.category);
                avoidance.0 += ax;
                avoidance.1 += ay;
            }

            if is_target_candidate(detection.category)
                && distance < self.config.target_approach_distance
                && distance > self.config.min_target_distance
            {
                let better = match target {
                    None => true,
                    Some((current, current_distance)) => {
                        let current_priority = priority(detections[current].category);
                        let candidate_priority = priority(detection.category);
                        candidate_priority > current_priority
                            || (candidate_priority == current_priority
                                && distance < current_distance)
                    }
                };
                if better {
                    target = Some((index, distance));
                }
            }
        }

        // Fire at the selected target even when avoidance ends up steering
        // the movement.
        let fire_target = target.map(|(index, _)| detections[index].position);

        let (move_x, move_y) = if avoidance != (0.0, 0.0) {
            normalize(avoidance.0, avoidance.1)
        } else if let Some((index, distance)) = target {
            self.approach(detections, index, distance, player)
        } else {
            self.wander(now)
        };

        MoveAction {
            move_x,
            move_y,
            fire_target,
        }
    }

    /// Movement toward a chosen target, repelled by other blocks standing in
    /// the way, or a full stop when already close enough.
    fn approach(
        &self,
        detections: &[Detection],
        target_index: usize,
        target_distance: f64,
        player: Point2,
    ) -> (f64, f64) {
        if target_distance <= self.config.block_avoid_distance {
            return (0.0, 0.0);
        }

        let target = detections[target_index].position;
        let mut move_x = target.x - player.x;
        let mut move_y = target.y - player.y;

        for (index, other) in detections.iter().enumerate() {
            if index == target_index || !other.category.is_block() {
                continue;
            }
            let block_distance = player.distance_to(other.position);
            if block_distance < self.config.block_avoid_distance {
                let avoid_factor = self.config.block_avoid_distance - block_distance;
                move_x += (player.x - other.position.x) * avoid_factor;
                move_y += (player.y - other.position.y) * avoid_factor;
            }
        }

        normalize(move_x, move_y)
    }

    fn avoidance_vector(
        &self,
        player: Point2,
        threat: Point2,
        distance: f64,
        category: Category,
    ) -> (f64, f64) {
        // Distant bullets get a 10x weaker push so the tank does not
        // overreact to projectiles that will never reach it.
        let force = if category == Category::EnemyBullet
            && distance > self.config.bullet_safety_distance
        {
            0.1 / distance.max(1.0)
        } else {
            1.0 / distance.max(1.0)
        };
        ((player.x - threat.x) * force, (player.y - threat.y) * force)
    }

    /// Persisted random unit vector, regenerated once the wander interval
    /// elapses or when the current vector is exactly zero.
    fn wander(&mut self, now: Instant) -> (f64, f64) {
        let interval = Duration::from_millis(self.config.wander_interval_ms);
        let expired = self
            .state
            .wander_refreshed_at
            .is_none_or(|at| now.saturating_duration_since(at) > interval);
        if expired || self.state.wander == (0.0, 0.0) {
            let x = self.rng.random_range(-1.0..1.0);
            let y = self.rng.random_range(-1.0..1.0);
            self.state.wander = normalize(x, y);
            self.state.wander_refreshed_at = Some(now);
        }
        self.state.wander
    }

    /// Cooldown gate for the upgrade action. Returns true at most once per
    /// cooldown window; extra availability windows are silently skipped.
    pub fn should_upgrade(&mut self, now: Instant) -> bool {
        let cooldown = Duration::from_millis(self.config.upgrade_cooldown_ms);
        match self.state.last_upgrade_at {
            Some(at) if now.saturating_duration_since(at) < cooldown => false,
            _ => {
                self.state.last_upgrade_at = Some(now);
                true
            }
        }
    }
}

/// Unit-length version of (x, y); the zero vector stays zero.
pub fn normalize(x: f64, y: f64) -> (f64, f64) {
    let magnitude = (x * x + y * y).sqrt();
    if magnitude == 0.0 {
        (0.0, 0.0)
    } else {
        (x / magnitude, y / magnitude)
    }
}

fn is_target_candidate(category: Category) -> bool {
    !category.is_threat() && category != Category::Upgrade
}

/// Approach priority. Enemy categories keep their historical rank even
/// though the candidate filter never lets them through; the table stays
/// exhaustive so a filter change surfaces here.
fn priority(category: Category) -> u8 {
    match category {
        Category::EnemyTank | Category::EnemyDrone => 4,
        Category::BlockPurple => 3,
        Category::BlockRed => 2,
        Category::BlockYellow => 1,
        Category::EnemyBullet
        | Category::SelfTank
        | Category::PossibleDeath
        | Category::Upgrade => 0,
    }
}
