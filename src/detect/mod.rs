pub mod annotate;
pub mod discs;
pub mod engine;
pub mod geometry;
pub mod hough;
pub mod hsv;
pub mod indicator;
pub mod shapes;

pub use engine::DetectionEngine;

use crate::detect::annotate::Annotation;

/// Everything this bot knows how to recognize on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The player's own tank.
    SelfTank,
    EnemyTank,
    EnemyBullet,
    /// Small fast-moving triangular enemy.
    EnemyDrone,
    /// Triangle obstacle.
    BlockRed,
    /// Square obstacle.
    BlockYellow,
    /// Pentagon obstacle.
    BlockPurple,
    /// Full-screen overlay signature shown when the tank dies.
    PossibleDeath,
    /// The upgrade indicator bar is visible.
    Upgrade,
}

impl Category {
    /// Hostile categories that exert avoidance force.
    pub fn is_threat(self) -> bool {
        matches!(
            self,
            Category::EnemyTank | Category::EnemyBullet | Category::EnemyDrone
        )
    }

    /// Static obstacle categories.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Category::BlockRed | Category::BlockYellow | Category::BlockPurple
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::SelfTank => "self",
            Category::EnemyTank => "enemy_tank",
            Category::EnemyBullet => "enemy_bullet",
            Category::EnemyDrone => "enemy_drone",
            Category::BlockRed => "block_red",
            Category::BlockYellow => "block_yellow",
            Category::BlockPurple => "block_purple",
            Category::PossibleDeath => "possible_death",
            Category::Upgrade => "upgrade",
        }
    }
}

/// A point in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One classified entity observation for a single frame. Category and
/// position are always both present; absence of an entity is absence of a
/// detection, never a placeholder value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub category: Category,
    pub position: Point2,
}

impl Detection {
    pub fn new(category: Category, position: Point2) -> Self {
        Self { category, position }
    }
}

/// Output of a single detector over one frame: the detections plus the debug
/// geometry the engine may draw onto the displayed frame.
#[derive(Debug, Clone, Default)]
pub struct DetectorOutput {
    pub detections: Vec<Detection>,
    pub annotations: Vec<Annotation>,
}

impl DetectorOutput {
    pub fn push(&mut self, detection: Detection, annotation: Annotation) {
        self.detections.push(detection);
        self.annotations.push(annotation);
    }

    pub fn merge(&mut self, other: DetectorOutput) {
        self.detections.extend(other.detections);
        self.annotations.extend(other.annotations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_and_block_partitions() {
        assert!(Category::EnemyBullet.is_threat());
        assert!(Category::EnemyDrone.is_threat());
        assert!(!Category::BlockRed.is_threat());
        assert!(Category::BlockPurple.is_block());
        assert!(!Category::SelfTank.is_block());
        assert!(!Category::Upgrade.is_block());
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
    }
}
