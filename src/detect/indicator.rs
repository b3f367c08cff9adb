//! Upgrade indicator detector: looks for the green bar inside the bottom-left
//! quadrant of the frame. Only presence matters, not how many bars are lit.

use crate::config::IndicatorConfig;
use crate::detect::annotate::Annotation;
use crate::detect::geometry::{bounding_box, contour_area};
use crate::detect::{hsv, Category, Detection, DetectorOutput};
use image::RgbImage;
use imageproc::contours::find_contours;

pub struct IndicatorDetector {
    config: IndicatorConfig,
}

impl IndicatorDetector {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, image: &RgbImage) -> DetectorOutput {
        let (width, height) = image.dimensions();
        let roi_width = width / 4;
        let roi_height = height / 4;
        if roi_width == 0 || roi_height == 0 {
            return DetectorOutput::default();
        }
        let roi_y = height - roi_height;

        let view = image::imageops::crop_imm(image, 0, roi_y, roi_width, roi_height).to_image();
        let mask = hsv::mask(&view, &self.config.green);

        let mut out = DetectorOutput::default();
        for contour in find_contours::<i32>(&mask) {
            let area = contour_area(&contour.points);
            if area <= self.config.min_area {
                continue;
            }
            let Some(local) = bounding_box(&contour.points) else {
                continue;
            };
            // Positions are reported in full-frame coordinates.
            let bbox = local.offset(0, roi_y as i32);
            tracing::debug!(area, "upgrade bar detected");
            out.push(
                Detection::new(Category::Upgrade, bbox.center()),
                Annotation::Box(bbox),
            );
        }
        out
    }
}
