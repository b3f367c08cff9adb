//! HSV color space helpers on the OpenCV scale: hue in [0, 180), saturation
//! and value in [0, 255]. All segmentation thresholds in the configuration
//! are expressed on this scale.

use image::{GrayImage, RgbImage};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// An inclusive lower/upper HSV bound pair defining a segmentation band.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HsvRange {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl HsvRange {
    pub const fn new(lower: [f64; 3], upper: [f64; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, color: Hsv) -> bool {
        color.h >= self.lower[0]
            && color.h <= self.upper[0]
            && color.s >= self.lower[1]
            && color.s <= self.upper[1]
            && color.v >= self.lower[2]
            && color.v <= self.upper[2]
    }
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let rf = r as f64 / 255.0;
    let gf = g as f64 / 255.0;
    let bf = b as f64 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    Hsv {
        h: hue_deg / 2.0,
        s: saturation * 255.0,
        v: max * 255.0,
    }
}

/// Binary mask of the pixels whose HSV value falls inside `range`.
/// Foreground is 255, background 0.
pub fn mask(image: &RgbImage, range: &HsvRange) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if range.contains(rgb_to_hsv(r, g, b)) {
            out.put_pixel(x, y, image::Luma([255]));
        }
    }
    out
}

/// Mean color of the square patch of half-width `half` centered at (cx, cy),
/// clamped to the frame. Returns `None` when the clamped patch is empty.
pub fn mean_patch_color(image: &RgbImage, cx: i64, cy: i64, half: i64) -> Option<(u8, u8, u8)> {
    let (width, height) = image.dimensions();
    let x0 = (cx - half).max(0);
    let y0 = (cy - half).max(0);
    let x1 = (cx + half).min(width as i64);
    let y1 = (cy + half).min(height as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut sums = [0u64; 3];
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = image.get_pixel(x as u32, y as u32);
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
        }
    }
    let count = ((x1 - x0) * (y1 - y0)) as u64;
    Some((
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    ))
}
