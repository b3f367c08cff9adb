//! Debug drawing. Purely cosmetic; disabling it never changes detections.

use crate::detect::geometry::BoundingBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const CIRCLE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Geometry a detector wants drawn onto the displayed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    Box(BoundingBox),
    Circle { cx: i32, cy: i32, radius: i32 },
}

pub fn draw(canvas: &mut RgbImage, annotations: &[Annotation]) {
    for annotation in annotations {
        match *annotation {
            Annotation::Box(bbox) => {
                let rect = Rect::at(bbox.x, bbox.y)
                    .of_size(bbox.width.max(1) as u32, bbox.height.max(1) as u32);
                draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
            }
            Annotation::Circle { cx, cy, radius } => {
                draw_hollow_circle_mut(canvas, (cx, cy), radius, CIRCLE_COLOR);
                draw_cross_mut(canvas, CENTER_COLOR, cx, cy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_marks_the_canvas() {
        let mut canvas = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
        draw(
            &mut canvas,
            &[
                Annotation::Box(BoundingBox {
                    x: 10,
                    y: 10,
                    width: 20,
                    height: 12,
                }),
                Annotation::Circle {
                    cx: 40,
                    cy: 40,
                    radius: 8,
                },
            ],
        );
        assert_eq!(*canvas.get_pixel(10, 10), BOX_COLOR);
        assert!(canvas.pixels().any(|p| *p == CIRCLE_COLOR));
    }

    #[test]
    fn out_of_bounds_annotations_are_clipped() {
        let mut canvas = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        draw(
            &mut canvas,
            &[Annotation::Box(BoundingBox {
                x: 10,
                y: 10,
                width: 200,
                height: 200,
            })],
        );
    }
}
