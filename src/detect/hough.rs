//! Gradient-voting circle Hough transform over a blurred grayscale frame.
//!
//! Mirrors the two-stage gradient method: every strong edge pixel votes for
//! candidate centers along its gradient direction across the whole radius
//! range, candidate centers are local accumulator maxima separated by a
//! minimum distance, and each surviving center gets its radius from the most
//! supported edge-distance bin.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HoughParams {
    /// Minimum distance between accepted circle centers.
    pub min_dist: f64,
    /// Sobel magnitude below which a pixel is not an edge.
    pub edge_threshold: f32,
    /// Minimum center votes and minimum radius-bin support.
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

struct EdgePixel {
    x: u32,
    y: u32,
    // Unit gradient direction.
    ux: f32,
    uy: f32,
}

pub fn detect_circles(gray: &GrayImage, params: &HoughParams) -> Vec<Circle> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let mut edges = Vec::new();
    let mut accumulator = vec![0u32; (width * height) as usize];

    for y in 0..height {
        for x in 0..width {
            let dx = gx.get_pixel(x, y)[0] as f32;
            let dy = gy.get_pixel(x, y)[0] as f32;
            let magnitude = (dx * dx + dy * dy).sqrt();
            if magnitude < params.edge_threshold {
                continue;
            }
            let (ux, uy) = (dx / magnitude, dy / magnitude);
            edges.push(EdgePixel { x, y, ux, uy });

            // Vote on both sides of the edge; the polarity of the gradient
            // depends on whether the disc is lighter or darker than the
            // background.
            for direction in [-1.0f32, 1.0] {
                for r in params.min_radius..=params.max_radius {
                    let cx = x as f32 + direction * ux * r as f32;
                    let cy = y as f32 + direction * uy * r as f32;
                    let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
                    if cxi < 0 || cyi < 0 || cxi >= width as i64 || cyi >= height as i64 {
                        continue;
                    }
                    accumulator[(cyi as u32 * width + cxi as u32) as usize] += 1;
                }
            }
        }
    }

    let centers = candidate_centers(&accumulator, width, height, params);
    centers
        .into_iter()
        .filter_map(|(cx, cy)| {
            estimate_radius(&edges, cx, cy, params).map(|radius| Circle {
                cx: cx as f64,
                cy: cy as f64,
                radius,
            })
        })
        .collect()
}

/// Local accumulator maxima above threshold, strongest first, separated by
/// at least `min_dist`.
fn candidate_centers(
    accumulator: &[u32],
    width: u32,
    height: u32,
    params: &HoughParams,
) -> Vec<(u32, u32)> {
    let at = |x: i64, y: i64| -> u32 {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            0
        } else {
            accumulator[(y as u32 * width + x as u32) as usize]
        }
    };

    let mut maxima = Vec::new();
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let votes = at(x, y);
            if votes < params.accumulator_threshold {
                continue;
            }
            let is_peak = (-1..=1).all(|dy| {
                (-1..=1).all(|dx| (dx == 0 && dy == 0) || at(x + dx, y + dy) <= votes)
            });
            if is_peak {
                maxima.push((votes, x as u32, y as u32));
            }
        }
    }
    maxima.sort_by(|a, b| b.0.cmp(&a.0));

    let min_dist_sq = params.min_dist * params.min_dist;
    let mut kept: Vec<(u32, u32)> = Vec::new();
    for (_, x, y) in maxima {
        let far_enough = kept.iter().all(|&(kx, ky)| {
            let dx = kx as f64 - x as f64;
            let dy = ky as f64 - y as f64;
            dx * dx + dy * dy >= min_dist_sq
        });
        if far_enough {
            kept.push((x, y));
        }
    }
    kept
}

/// Most supported integer radius for a center, or `None` when no radius bin
/// reaches the accumulator threshold.
fn estimate_radius(edges: &[EdgePixel], cx: u32, cy: u32, params: &HoughParams) -> Option<f64> {
    let mut bins = vec![0u32; (params.max_radius + 1) as usize];
    for edge in edges {
        let dx = edge.x as f64 - cx as f64;
        let dy = edge.y as f64 - cy as f64;
        let distance = (dx * dx + dy * dy).sqrt();
        let bin = distance.round() as i64;
        if bin >= params.min_radius as i64 && bin <= params.max_radius as i64 {
            bins[bin as usize] += 1;
        }
    }
    let (best_radius, support) = bins
        .iter()
        .enumerate()
        .max_by_key(|(_, &count)| count)
        .map(|(radius, &count)| (radius, count))?;
    if support >= params.accumulator_threshold {
        Some(best_radius as f64)
    } else {
        None
    }
}
