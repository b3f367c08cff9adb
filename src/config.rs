use crate::detect::hsv::HsvRange;
use serde::Deserialize;

/// Top-level configuration with tunable detection and control parameters.
///
/// Every numeric threshold here was tuned against one fixed render resolution
/// and UI scale; none of them are resolution independent. Treat them as data
/// to retune when retargeting, not as constants of the game.
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub annotate: bool,
    pub shapes: ShapeConfig,
    pub discs: DiscConfig,
    pub indicator: IndicatorConfig,
    pub decision: DecisionConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            annotate: true,
            shapes: ShapeConfig::default(),
            discs: DiscConfig::default(),
            indicator: IndicatorConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), String> {
        self.shapes.validate()?;
        self.discs.validate()?;
        self.indicator.validate()?;
        self.decision.validate()?;
        Ok(())
    }
}

/// Thresholds for the color/shape detector.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeConfig {
    pub red: HsvRange,
    pub yellow: HsvRange,
    pub purple: HsvRange,
    /// Contours at or below this area are noise and never classified.
    pub min_contour_area: f64,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_frac: f64,
    pub triangle_block_area: (f64, f64),
    pub drone_area: (f64, f64),
    pub square_block_area: (f64, f64),
    pub pentagon_block_area: (f64, f64),
    pub death_min_area: f64,
    /// Exclusive bounds on the death-overlay bounding box.
    pub death_width: (i32, i32),
    pub death_height: (i32, i32),
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            red: HsvRange::new([0.0, 50.0, 50.0], [10.0, 255.0, 255.0]),
            yellow: HsvRange::new([20.0, 100.0, 100.0], [30.0, 255.0, 255.0]),
            purple: HsvRange::new([100.0, 50.0, 50.0], [160.0, 255.0, 255.0]),
            min_contour_area: 20.0,
            approx_epsilon_frac: 0.04,
            triangle_block_area: (450.0, 750.0),
            drone_area: (50.0, 450.0),
            square_block_area: (600.0, 1100.0),
            pentagon_block_area: (1400.0, 2300.0),
            death_min_area: 8700.0,
            death_width: (220, 240),
            death_height: (40, 50),
        }
    }
}

impl ShapeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.approx_epsilon_frac <= 0.0 || self.approx_epsilon_frac >= 1.0 {
            return Err("approx_epsilon_frac must be in (0, 1)".to_string());
        }
        for (name, (lo, hi)) in [
            ("triangle_block_area", self.triangle_block_area),
            ("drone_area", self.drone_area),
            ("square_block_area", self.square_block_area),
            ("pentagon_block_area", self.pentagon_block_area),
        ] {
            if lo > hi {
                return Err(format!("{name} bounds are inverted"));
            }
        }
        Ok(())
    }
}

/// Thresholds for the disc detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscConfig {
    pub blue: HsvRange,
    /// Red wraps around hue 0; membership is the union of both wings.
    pub red_low: HsvRange,
    pub red_high: HsvRange,
    pub blur_sigma: f32,
    /// Minimum distance between circle centers, as a divisor of frame height.
    pub min_dist_divisor: u32,
    pub edge_threshold: f32,
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
    pub patch_half_width: i64,
    /// First-match radius bands; the large band is checked before the small one.
    pub large_radius: (f64, f64),
    pub small_radius: (f64, f64),
    /// Max per-axis offset from the self-reference point (w/4, h/2) for a blue
    /// disc to count as the player's own tank.
    pub self_reference_tolerance: f64,
}

impl Default for DiscConfig {
    fn default() -> Self {
        Self {
            blue: HsvRange::new([90.0, 150.0, 50.0], [140.0, 255.0, 255.0]),
            red_low: HsvRange::new([0.0, 100.0, 100.0], [10.0, 255.0, 255.0]),
            red_high: HsvRange::new([160.0, 100.0, 100.0], [180.0, 255.0, 255.0]),
            blur_sigma: 2.0,
            min_dist_divisor: 16,
            edge_threshold: 80.0,
            accumulator_threshold: 30,
            min_radius: 2,
            max_radius: 40,
            patch_half_width: 5,
            large_radius: (20.0, 50.0),
            small_radius: (2.0, 24.0),
            self_reference_tolerance: 100.0,
        }
    }
}

impl DiscConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_radius == 0 || self.min_radius > self.max_radius {
            return Err("disc radius range is empty".to_string());
        }
        if self.min_dist_divisor == 0 {
            return Err("min_dist_divisor must be greater than 0".to_string());
        }
        if self.accumulator_threshold == 0 {
            return Err("accumulator_threshold must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Thresholds for the upgrade indicator-bar detector.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorConfig {
    pub green: HsvRange,
    pub min_area: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            green: HsvRange::new([50.0, 50.0, 50.0], [80.0, 255.0, 255.0]),
            min_area: 50.0,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_area < 0.0 {
            return Err("min_area must not be negative".to_string());
        }
        Ok(())
    }
}

/// Parameters of the rule-based control law. Distances are Euclidean pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    /// Targets farther than this are ignored.
    pub target_approach_distance: f64,
    /// Targets closer than this cause jitter at zero distance and are skipped.
    pub min_target_distance: f64,
    /// Hold position within this distance of the target; also the radius
    /// inside which other blocks repel the approach vector.
    pub block_avoid_distance: f64,
    /// Bullets beyond this distance exert 10x weaker repulsion.
    pub bullet_safety_distance: f64,
    pub wander_interval_ms: u64,
    pub upgrade_cooldown_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            target_approach_distance: 10_000.0,
            min_target_distance: 10.0,
            block_avoid_distance: 150.0,
            bullet_safety_distance: 2000.0,
            wander_interval_ms: 3000,
            upgrade_cooldown_ms: 2000,
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_target_distance >= self.target_approach_distance {
            return Err("min_target_distance must be below target_approach_distance".to_string());
        }
        if self.block_avoid_distance <= 0.0 {
            return Err("block_avoid_distance must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn inverted_area_band_is_rejected() {
        let mut config = Configuration::default();
        config.shapes.drone_area = (450.0, 50.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_radius_range_is_rejected() {
        let mut config = Configuration::default();
        config.discs.min_radius = 41;
        assert!(config.validate().is_err());
    }
}
