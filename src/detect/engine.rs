//! Detection engine: runs the three detectors concurrently over one frame,
//! merges their outputs and draws the debug annotations.

use crate::config::Configuration;
use crate::detect::annotate;
use crate::detect::discs::DiscDetector;
use crate::detect::indicator::IndicatorDetector;
use crate::detect::shapes::ShapeDetector;
use crate::detect::{Detection, DetectorOutput};
use crate::frame::Frame;
use image::RgbImage;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Merged result of one detection cycle.
pub struct FrameObservations {
    pub detections: Vec<Detection>,
    /// Copy of the frame with debug annotations drawn on it.
    pub annotated: RgbImage,
}

pub struct DetectionEngine {
    shapes: Arc<ShapeDetector>,
    discs: Arc<DiscDetector>,
    indicator: Arc<IndicatorDetector>,
    annotate: bool,
}

impl DetectionEngine {
    pub fn new(config: &Configuration) -> Self {
        Self {
            shapes: Arc::new(ShapeDetector::new(config.shapes.clone())),
            discs: Arc::new(DiscDetector::new(config.discs.clone())),
            indicator: Arc::new(IndicatorDetector::new(config.indicator.clone())),
            annotate: config.annotate,
        }
    }

    /// Run all detectors against the frame and join on their completion.
    /// A failed detector contributes nothing this cycle; the frame is never
    /// aborted on a single detector's account.
    pub async fn process(&self, frame: &Frame) -> FrameObservations {
        let shapes = self.spawn_detector("shapes", frame, {
            let detector = Arc::clone(&self.shapes);
            move |image| detector.detect(image)
        });
        let discs = self.spawn_detector("discs", frame, {
            let detector = Arc::clone(&self.discs);
            move |image| detector.detect(image)
        });
        let indicator = self.spawn_detector("indicator", frame, {
            let detector = Arc::clone(&self.indicator);
            move |image| detector.detect(image)
        });

        let (shapes, discs, indicator) = tokio::join!(shapes, discs, indicator);

        let mut merged = DetectorOutput::default();
        for (name, result) in [
            ("shapes", shapes),
            ("discs", discs),
            ("indicator", indicator),
        ] {
            match result {
                Ok(output) => merged.merge(output),
                Err(error) => {
                    tracing::warn!(detector = name, %error, "detector failed, contributing no detections this cycle");
                }
            }
        }

        let mut annotated = frame.image().clone();
        if self.annotate {
            annotate::draw(&mut annotated, &merged.annotations);
        }

        FrameObservations {
            detections: merged.detections,
            annotated,
        }
    }

    fn spawn_detector<F>(&self, name: &'static str, frame: &Frame, run: F) -> JoinHandle<DetectorOutput>
    where
        F: FnOnce(&RgbImage) -> DetectorOutput + Send + 'static,
    {
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || {
            let output = run(frame.image());
            tracing::debug!(
                detector = name,
                detections = output.detections.len(),
                "detector finished"
            );
            output
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Category;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn frame_640x480() -> RgbImage {
        RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]))
    }

    #[tokio::test]
    async fn blank_frame_produces_empty_observation_set() {
        let engine = DetectionEngine::new(&Configuration::default());
        let observations = engine.process(&Frame::new(frame_640x480())).await;
        assert!(observations.detections.is_empty());
    }

    #[tokio::test]
    async fn detectors_contribute_to_one_merged_set() {
        let mut image = frame_640x480();
        // Self tank at the reference point, a yellow block, and a lit
        // upgrade bar in the bottom-left quadrant.
        draw_filled_circle_mut(&mut image, (160, 240), 22, Rgb([0, 213, 255]));
        draw_filled_rect_mut(&mut image, Rect::at(400, 300).of_size(28, 28), Rgb([255, 255, 0]));
        draw_filled_rect_mut(&mut image, Rect::at(30, 420).of_size(40, 8), Rgb([0, 255, 0]));

        let engine = DetectionEngine::new(&Configuration::default());
        let observations = engine.process(&Frame::new(image)).await;

        let has = |category: Category| {
            observations
                .detections
                .iter()
                .any(|d| d.category == category)
        };
        assert!(has(Category::SelfTank));
        assert!(has(Category::BlockYellow));
        assert!(has(Category::Upgrade));
    }

    #[tokio::test]
    async fn annotations_are_skipped_when_disabled() {
        let mut image = frame_640x480();
        draw_filled_rect_mut(&mut image, Rect::at(400, 300).of_size(28, 28), Rgb([255, 255, 0]));

        let mut config = Configuration::default();
        config.annotate = false;
        let engine = DetectionEngine::new(&config);
        let frame = Frame::new(image.clone());
        let observations = engine.process(&frame).await;

        // Detections are unchanged, the frame copy is untouched.
        assert!(!observations.detections.is_empty());
        assert_eq!(observations.annotated, image);
    }
}
