//! Color/shape detector: segments the frame into fixed hue bands, extracts
//! contours from each band mask and classifies the polygon approximations
//! into obstacle and drone categories.

use crate::config::ShapeConfig;
use crate::detect::annotate::Annotation;
use crate::detect::geometry::{bounding_box, contour_area, BoundingBox};
use crate::detect::{hsv, Category, Detection, DetectorOutput};
use image::RgbImage;
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HueBand {
    Red,
    Yellow,
    Purple,
}

pub struct ShapeDetector {
    config: ShapeConfig,
}

impl ShapeDetector {
    pub fn new(config: ShapeConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, image: &RgbImage) -> DetectorOutput {
        let (_, height) = image.dimensions();
        // Bottom 1/20 of the screen is HUD territory for the yellow band.
        let hud_strip_y = (height / 20 * 19) as i32;
        let top_third_y = (height / 3) as i32;

        let bands = [
            (HueBand::Red, &self.config.red),
            (HueBand::Yellow, &self.config.yellow),
            (HueBand::Purple, &self.config.purple),
        ];

        let mut out = DetectorOutput::default();
        for (band, range) in bands {
            let mask = hsv::mask(image, range);
            for contour in find_contours::<i32>(&mask) {
                let area = contour_area(&contour.points);
                if area <= self.config.min_contour_area {
                    continue;
                }
                let Some(bbox) = bounding_box(&contour.points) else {
                    continue;
                };
                if band == HueBand::Yellow && bbox.y > hud_strip_y {
                    continue;
                }
                let perimeter = arc_length(&contour.points, true);
                let approx = approximate_polygon_dp(
                    &contour.points,
                    self.config.approx_epsilon_frac * perimeter,
                    true,
                );
                if let Some(category) =
                    classify(&self.config, band, approx.len(), area, &bbox, top_third_y)
                {
                    tracing::debug!(
                        category = category.label(),
                        area,
                        vertices = approx.len(),
                        "shape contour classified"
                    );
                    out.push(Detection::new(category, bbox.center()), Annotation::Box(bbox));
                }
            }
        }
        out
    }
}

fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}

/// Decision table over (hue band, vertex count, area, bounding box).
/// Deterministic and pure; contours matching no rule yield `None`.
pub fn classify(
    config: &ShapeConfig,
    band: HueBand,
    vertices: usize,
    area: f64,
    bbox: &BoundingBox,
    top_third_y: i32,
) -> Option<Category> {
    match vertices {
        3 => {
            if band == HueBand::Red && within(area, config.triangle_block_area) {
                Some(Category::BlockRed)
            } else if within(area, config.drone_area) {
                Some(Category::EnemyDrone)
            } else {
                None
            }
        }
        4 => {
            if band == HueBand::Yellow && within(area, config.square_block_area) {
                Some(Category::BlockYellow)
            } else if band == HueBand::Purple
                && bbox.y <= top_third_y
                && area > config.death_min_area
                && bbox.width > config.death_width.0
                && bbox.width < config.death_width.1
                && bbox.height > config.death_height.0
                && bbox.height < config.death_height.1
            {
                Some(Category::PossibleDeath)
            } else {
                None
            }
        }
        5 if band == HueBand::Purple && within(area, config.pentagon_block_area) => {
            Some(Category::BlockPurple)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
    const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);

    fn blank() -> RgbImage {
        RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]))
    }

    fn detector() -> ShapeDetector {
        ShapeDetector::new(ShapeConfig::default())
    }

    fn bbox(width: i32, height: i32) -> BoundingBox {
        BoundingBox {
            x: 10,
            y: 10,
            width,
            height,
        }
    }

    #[test]
    fn blank_frame_yields_no_detections() {
        let out = detector().detect(&blank());
        assert!(out.detections.is_empty());
        assert!(out.annotations.is_empty());
    }

    #[test]
    fn classification_table_is_deterministic() {
        let config = ShapeConfig::default();
        let b = bbox(30, 30);
        for _ in 0..3 {
            assert_eq!(
                classify(&config, HueBand::Red, 3, 600.0, &b, 160),
                Some(Category::BlockRed)
            );
            assert_eq!(
                classify(&config, HueBand::Yellow, 3, 200.0, &b, 160),
                Some(Category::EnemyDrone)
            );
            assert_eq!(
                classify(&config, HueBand::Yellow, 4, 800.0, &b, 160),
                Some(Category::BlockYellow)
            );
            assert_eq!(
                classify(&config, HueBand::Purple, 5, 1800.0, &b, 160),
                Some(Category::BlockPurple)
            );
        }
    }

    #[test]
    fn death_overlay_requires_position_and_size() {
        let config = ShapeConfig::default();
        let b = BoundingBox {
            x: 100,
            y: 50,
            width: 230,
            height: 45,
        };
        assert_eq!(
            classify(&config, HueBand::Purple, 4, 10_000.0, &b, 160),
            Some(Category::PossibleDeath)
        );
        // Same quad below the top third is not a death overlay.
        let low = BoundingBox { y: 300, ..b };
        assert_eq!(classify(&config, HueBand::Purple, 4, 10_000.0, &low, 160), None);
        // Width bounds are exclusive.
        let wide = BoundingBox { width: 240, ..b };
        assert_eq!(classify(&config, HueBand::Purple, 4, 10_000.0, &wide, 160), None);
    }

    #[test]
    fn unmatched_contours_are_discarded() {
        let config = ShapeConfig::default();
        let b = bbox(30, 30);
        assert_eq!(classify(&config, HueBand::Red, 6, 600.0, &b, 160), None);
        assert_eq!(classify(&config, HueBand::Yellow, 4, 5000.0, &b, 160), None);
        assert_eq!(classify(&config, HueBand::Red, 3, 10.0, &b, 160), None);
    }

    #[test]
    fn yellow_square_is_a_block() {
        let mut image = blank();
        draw_filled_rect_mut(&mut image, Rect::at(300, 300).of_size(28, 28), YELLOW);
        let out = detector().detect(&image);
        assert!(out
            .detections
            .iter()
            .any(|d| d.category == Category::BlockYellow));
        let block = out
            .detections
            .iter()
            .find(|d| d.category == Category::BlockYellow)
            .unwrap();
        assert!((block.position.x - 314.0).abs() < 2.0);
        assert!((block.position.y - 314.0).abs() < 2.0);
    }

    #[test]
    fn red_triangle_is_a_block() {
        let mut image = blank();
        let triangle = [
            Point::new(100, 100),
            Point::new(150, 100),
            Point::new(125, 75),
        ];
        draw_polygon_mut(&mut image, &triangle, RED);
        let out = detector().detect(&image);
        assert!(out
            .detections
            .iter()
            .any(|d| d.category == Category::BlockRed));
    }

    #[test]
    fn small_triangle_is_a_drone() {
        let mut image = blank();
        let triangle = [
            Point::new(400, 200),
            Point::new(430, 200),
            Point::new(415, 185),
        ];
        draw_polygon_mut(&mut image, &triangle, YELLOW);
        let out = detector().detect(&image);
        assert!(out
            .detections
            .iter()
            .any(|d| d.category == Category::EnemyDrone));
    }

    #[test]
    fn purple_pentagon_is_a_block() {
        let mut image = blank();
        // Regular pentagon, circumradius 28: area ~1860, inside [1400, 2300].
        let pentagon: Vec<Point<i32>> = (0..5)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / 5.0 - std::f64::consts::FRAC_PI_2;
                Point::new(
                    (200.0 + 28.0 * angle.cos()).round() as i32,
                    (200.0 + 28.0 * angle.sin()).round() as i32,
                )
            })
            .collect();
        draw_polygon_mut(&mut image, &pentagon, PURPLE);
        let out = detector().detect(&image);
        assert!(out
            .detections
            .iter()
            .any(|d| d.category == Category::BlockPurple));
    }

    #[test]
    fn yellow_contours_in_hud_strip_are_suppressed() {
        let mut image = blank();
        // 480 * 19 / 20 = 456; a drone-sized triangle starting below that is
        // HUD and must not classify.
        let triangle = [
            Point::new(20, 475),
            Point::new(50, 475),
            Point::new(35, 460),
        ];
        draw_polygon_mut(&mut image, &triangle, YELLOW);
        let out = detector().detect(&image);
        assert!(out.detections.is_empty());

        // The same triangle above the strip is a drone.
        let mut image = blank();
        let triangle = [
            Point::new(20, 315),
            Point::new(50, 315),
            Point::new(35, 300),
        ];
        draw_polygon_mut(&mut image, &triangle, YELLOW);
        let out = detector().detect(&image);
        assert!(out
            .detections
            .iter()
            .any(|d| d.category == Category::EnemyDrone));
    }
}
