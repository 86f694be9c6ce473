//! Software rasterizer used by the compositor.
//!
//! Shapes are first accumulated into a [`CoverageMask`] and then blended onto
//! the target in a single pass, so overlapping segments of one polyline never
//! darken their own joints.

use bevy::math::Vec2;
use image::{Rgba, RgbaImage};

/// Straight (non-premultiplied) RGBA color with components in `0.0..=1.0`.
pub type Rgbaf = [f32; 4];

/// Per-pixel coverage in `0.0..=1.0`.
pub struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width as usize) * (height as usize)],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Keep the larger of the current and the new coverage.
    pub fn cover(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let slot = &mut self.data[(y as u32 * self.width + x as u32) as usize];
        *slot = slot.max(coverage.clamp(0.0, 1.0));
    }

    /// Add coverage, saturating at 1. Used for glyph outlines.
    pub fn accumulate(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let slot = &mut self.data[(y as u32 * self.width + x as u32) as usize];
        *slot = (*slot + coverage).min(1.0);
    }

    /// Pixel range touched by a box, clipped to the mask.
    fn span(&self, min: Vec2, max: Vec2) -> Option<(i64, i64, i64, i64)> {
        let x0 = (min.x.floor() as i64).max(0);
        let y0 = (min.y.floor() as i64).max(0);
        let x1 = (max.x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (max.y.ceil() as i64).min(self.height as i64 - 1);
        (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
    }

    /// Axis-aligned box with exact area coverage at the edges.
    pub fn fill_box(&mut self, min: Vec2, max: Vec2) {
        let Some((x0, y0, x1, y1)) = self.span(min, max) else {
            return;
        };
        for y in y0..=y1 {
            let cov_y = overlap(y as f32, min.y, max.y);
            if cov_y <= 0.0 {
                continue;
            }
            for x in x0..=x1 {
                let cov_x = overlap(x as f32, min.x, max.x);
                if cov_x > 0.0 {
                    self.cover(x, y, cov_x * cov_y);
                }
            }
        }
    }

    /// Segment with round caps, i.e. every pixel within `radius` of it.
    pub fn stamp_capsule(&mut self, a: Vec2, b: Vec2, radius: f32) {
        let pad = Vec2::splat(radius + 1.0);
        let Some((x0, y0, x1, y1)) = self.span(a.min(b) - pad, a.max(b) + pad) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let dist = distance_to_segment(center, a, b);
                self.cover(x, y, radius + 0.5 - dist);
            }
        }
    }

    /// Filled triangle, anti-aliased by distance to its nearest edge.
    pub fn stamp_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2) {
        let pad = Vec2::ONE;
        let min = a.min(b).min(c) - pad;
        let max = a.max(b).max(c) + pad;
        let Some((x0, y0, x1, y1)) = self.span(min, max) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = if point_in_triangle(p, a, b, c) {
                    1.0
                } else {
                    let edge = distance_to_segment(p, a, b)
                        .min(distance_to_segment(p, b, c))
                        .min(distance_to_segment(p, c, a));
                    0.5 - edge
                };
                self.cover(x, y, coverage);
            }
        }
    }

    /// Blend `color` onto `target` weighted by this mask.
    pub fn composite(&self, target: &mut RgbaImage, color: Rgbaf) {
        for (x, y, pixel) in target.enumerate_pixels_mut() {
            let coverage = self.get(x, y);
            if coverage > 0.0 {
                blend_pixel(pixel, color, coverage);
            }
        }
    }
}

/// How much of the unit pixel starting at `start` lies within `lo..hi`.
fn overlap(start: f32, lo: f32, hi: f32) -> f32 {
    ((start + 1.0).min(hi) - start.max(lo)).clamp(0.0, 1.0)
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (p - b).perp_dot(a - b);
    let d2 = (p - c).perp_dot(b - c);
    let d3 = (p - a).perp_dot(c - a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Source-over blend of a straight-alpha color onto a straight-alpha pixel.
pub fn blend_pixel(pixel: &mut Rgba<u8>, color: Rgbaf, coverage: f32) {
    let src_a = (color[3] * coverage).clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = pixel[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let src = color[i];
        let dst = pixel[i] as f32 / 255.0;
        let out = (src * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
        pixel[i] = to_byte(out);
    }
    pixel[3] = to_byte(out_a);
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_over_transparent() {
        let mut pixel = Rgba([0, 0, 0, 0]);
        blend_pixel(&mut pixel, [1.0, 0.0, 0.0, 1.0], 1.0);
        assert_eq!(pixel, Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_blend_half_alpha_over_white() {
        let mut pixel = Rgba([255, 255, 255, 255]);
        blend_pixel(&mut pixel, [1.0, 0.0, 0.0, 0.5], 1.0);
        assert_eq!(pixel[0], 255);
        assert!((126..=129).contains(&pixel[1]));
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_zero_coverage_leaves_pixel() {
        let mut pixel = Rgba([10, 20, 30, 40]);
        blend_pixel(&mut pixel, [1.0, 1.0, 1.0, 1.0], 0.0);
        assert_eq!(pixel, Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_fill_box_interior_and_outside() {
        let mut mask = CoverageMask::new(10, 10);
        mask.fill_box(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0));
        assert_eq!(mask.get(3, 3), 1.0);
        assert_eq!(mask.get(7, 7), 0.0);
        assert_eq!(mask.get(1, 3), 0.0);
    }

    #[test]
    fn test_fill_box_partial_edge() {
        let mut mask = CoverageMask::new(4, 4);
        mask.fill_box(Vec2::new(0.0, 0.0), Vec2::new(1.5, 1.0));
        assert_eq!(mask.get(0, 0), 1.0);
        assert!((mask.get(1, 0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_capsule_covers_round_cap() {
        let mut mask = CoverageMask::new(20, 20);
        mask.stamp_capsule(Vec2::new(5.5, 10.5), Vec2::new(14.5, 10.5), 2.0);
        assert_eq!(mask.get(10, 10), 1.0);
        // Just past the end point, inside the cap
        assert!(mask.get(15, 10) > 0.9);
        assert_eq!(mask.get(10, 15), 0.0);
    }

    #[test]
    fn test_triangle_contains_centroid() {
        let mut mask = CoverageMask::new(20, 20);
        let (a, b, c) = (Vec2::new(2.0, 2.0), Vec2::new(18.0, 2.0), Vec2::new(10.0, 18.0));
        mask.stamp_triangle(a, b, c);
        let centroid = (a + b + c) / 3.0;
        assert_eq!(mask.get(centroid.x as u32, centroid.y as u32), 1.0);
        assert_eq!(mask.get(1, 18), 0.0);
    }

    #[test]
    fn test_out_of_bounds_writes_are_ignored() {
        let mut mask = CoverageMask::new(4, 4);
        mask.cover(-1, 0, 1.0);
        mask.cover(0, 9, 1.0);
        mask.stamp_capsule(Vec2::new(-50.0, -50.0), Vec2::new(-40.0, -40.0), 3.0);
        assert!((0..4).all(|x| (0..4).all(|y| mask.get(x, y) == 0.0)));
    }

    #[test]
    fn test_segment_distance() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vec2::new(1.0, 1.0), a, a), 2f32.sqrt());
    }
}
