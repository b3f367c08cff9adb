//! Disc detector: finds circular features with a Hough transform, samples the
//! color at each center and classifies self, enemy tanks and bullets.

use crate::config::DiscConfig;
use crate::detect::annotate::Annotation;
use crate::detect::hough::{self, HoughParams};
use crate::detect::hsv::{self, Hsv};
use crate::detect::{Category, Detection, DetectorOutput, Point2};
use image::RgbImage;
use imageproc::filter::gaussian_blur_f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchColor {
    Blue,
    Red,
    Unknown,
}

pub struct DiscDetector {
    config: DiscConfig,
}

impl DiscDetector {
    pub fn new(config: DiscConfig) -> Self {
        Self { config }
    }

    pub fn classify_color(&self, color: Hsv) -> PatchColor {
        if self.config.blue.contains(color) {
            PatchColor::Blue
        } else if self.config.red_low.contains(color) || self.config.red_high.contains(color) {
            PatchColor::Red
        } else {
            PatchColor::Unknown
        }
    }

    pub fn detect(&self, image: &RgbImage) -> DetectorOutput {
        let (width, height) = image.dimensions();
        let gray = image::imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);

        let params = HoughParams {
            min_dist: height as f64 / self.config.min_dist_divisor as f64,
            edge_threshold: self.config.edge_threshold,
            accumulator_threshold: self.config.accumulator_threshold,
            min_radius: self.config.min_radius,
            max_radius: self.config.max_radius,
        };
        let circles = hough::detect_circles(&blurred, &params);

        // The player's own tank sits at a fixed reference point of the
        // captured region.
        let reference = Point2::new(width as f64 / 4.0, height as f64 / 2.0);
        let tolerance = self.config.self_reference_tolerance;

        let mut out = DetectorOutput::default();
        for circle in circles {
            let (cx, cy) = (circle.cx.round() as i64, circle.cy.round() as i64);
            let Some((r, g, b)) =
                hsv::mean_patch_color(image, cx, cy, self.config.patch_half_width)
            else {
                continue;
            };
            let color = self.classify_color(hsv::rgb_to_hsv(r, g, b));
            let position = Point2::new(circle.cx, circle.cy);

            // First-match over the overlapping radius bands: the large band
            // is evaluated before the small one and a circle never falls
            // through from one to the other.
            let category = if within(circle.radius, self.config.large_radius) {
                match color {
                    PatchColor::Blue
                        if (position.x - reference.x).abs() <= tolerance
                            && (position.y - reference.y).abs() <= tolerance =>
                    {
                        Some(Category::SelfTank)
                    }
                    PatchColor::Red => Some(Category::EnemyTank),
                    _ => None,
                }
            } else if within(circle.radius, self.config.small_radius) {
                match color {
                    PatchColor::Red => Some(Category::EnemyBullet),
                    _ => None,
                }
            } else {
                None
            };

            if let Some(category) = category {
                tracing::debug!(
                    category = category.label(),
                    radius = circle.radius,
                    "disc classified"
                );
                out.push(
                    Detection::new(category, position),
                    Annotation::Circle {
                        cx: cx as i32,
                        cy: cy as i32,
                        radius: circle.radius.round() as i32,
                    },
                );
            }
        }
        out
    }
}

fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}
