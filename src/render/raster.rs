//! Software drawing primitives over `RgbaImage` with source-over blending.

use std::ops::Range;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

use crate::geometry::{Color, ToolBounds, ToolPoint};
use crate::scene::metrics::{font_px, GLYPH_CELL};

pub fn blend_pixel(dst: Rgba<u8>, src: Color) -> Rgba<u8> {
    if src.a == 255 {
        return Rgba(src.to_array());
    }
    let alpha = f32::from(src.a) / 255.0;
    if alpha <= 0.0 {
        return dst;
    }
    let inv = 1.0 - alpha;
    let channel = |d: u8, s: u8| {
        (f32::from(d) * inv + f32::from(s) * alpha)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let out_alpha = (f32::from(dst[3]) * inv + f32::from(src.a))
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([
        channel(dst[0], src.r),
        channel(dst[1], src.g),
        channel(dst[2], src.b),
        out_alpha,
    ])
}

/// Blends one pixel, ignoring coordinates outside the image.
pub fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Color) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= img.width() || y >= img.height() {
        return;
    }
    let dst = *img.get_pixel(x, y);
    img.put_pixel(x, y, blend_pixel(dst, color));
}

/// Visits every pixel whose center lies in `[min, max)` on both axes, clipped
/// to the image.
fn for_each_in_box(
    size: (u32, u32),
    min: (f32, f32),
    max: (f32, f32),
    mut visit: impl FnMut(i32, i32, f32, f32),
) {
    let width = size.0 as f32;
    let height = size.1 as f32;
    let x0 = min.0.floor().max(0.0) as i32;
    let y0 = min.1.floor().max(0.0) as i32;
    let x1 = max.0.ceil().min(width) as i32;
    let y1 = max.1.ceil().min(height) as i32;
    for y in y0..y1 {
        for x in x0..x1 {
            visit(x, y, x as f32 + 0.5, y as f32 + 0.5);
        }
    }
}

/// `start..end` limited to `0..limit`.
fn clipped_span(start: i32, end: i32, limit: u32) -> Range<i32> {
    let limit = i32::try_from(limit).unwrap_or(i32::MAX);
    start.clamp(0, limit)..end.clamp(0, limit)
}

pub fn fill_rect(img: &mut RgbaImage, bounds: ToolBounds, color: Color) {
    for y in clipped_span(bounds.y, bounds.bottom(), img.height()) {
        for x in clipped_span(bounds.x, bounds.right(), img.width()) {
            blend_at(img, x, y, color);
        }
    }
}

/// Outline drawn inside `bounds`. A `dash` of `n` alternates `n` painted and
/// `n` skipped pixels along each edge.
pub fn stroke_rect(img: &mut RgbaImage, bounds: ToolBounds, color: Color, width: u32, dash: Option<u32>) {
    let width = i32::try_from(width.max(1)).unwrap_or(1);
    let painted = |offset: i64| match dash {
        Some(period) if period > 0 => (offset / i64::from(period)) % 2 == 0,
        _ => true,
    };
    for y in clipped_span(bounds.y, bounds.bottom(), img.height()) {
        for x in clipped_span(bounds.x, bounds.right(), img.width()) {
            let near_left = x < bounds.x.saturating_add(width);
            let near_right = x >= bounds.right().saturating_sub(width);
            let near_top = y < bounds.y.saturating_add(width);
            let near_bottom = y >= bounds.bottom().saturating_sub(width);
            let on_edge = if near_top || near_bottom {
                painted(i64::from(x) - i64::from(bounds.x))
            } else if near_left || near_right {
                painted(i64::from(y) - i64::from(bounds.y))
            } else {
                false
            };
            if on_edge {
                blend_at(img, x, y, color);
            }
        }
    }
}

/// Round-capped, round-joined stroke through `points`.
pub fn draw_polyline(img: &mut RgbaImage, points: &[ToolPoint], color: Color, width: u32) {
    let size = img.dimensions();
    let radius = (width.max(1) as f32 / 2.0).max(0.6);
    // Stamping discs would double-blend translucent colors, so collect a mask
    // first and paint each covered pixel once.
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut mask = vec![false; w * h];
    let mut stamp = |cx: f32, cy: f32| {
        let r2 = radius * radius;
        for_each_in_box(size, (cx - radius, cy - radius), (cx + radius, cy + radius), |x, y, px, py| {
            let (dx, dy) = (px - cx, py - cy);
            if dx * dx + dy * dy <= r2 {
                mask[y as usize * w + x as usize] = true;
            }
        });
    };

    match points {
        [] => return,
        [only] => stamp(only.x as f32, only.y as f32),
        _ => {
            // Only the part of each segment that can touch the canvas is stamped.
            let pad = f64::from(radius) + 1.0;
            let min = (-pad, -pad);
            let max = (w as f64 + pad, h as f64 + pad);
            for segment in points.windows(2) {
                let (a, b) = (segment[0], segment[1]);
                let start = (f64::from(a.x), f64::from(a.y));
                let delta = (f64::from(b.x) - start.0, f64::from(b.y) - start.1);
                let Some((t0, t1)) = clip_segment(start, delta, min, max) else {
                    continue;
                };
                let length = delta.0.hypot(delta.1) * (t1 - t0);
                let steps = (length * 2.0).ceil().max(1.0) as u32;
                for step in 0..=steps {
                    let t = t0 + (t1 - t0) * f64::from(step) / f64::from(steps);
                    stamp((start.0 + delta.0 * t) as f32, (start.1 + delta.1 * t) as f32);
                }
            }
        }
    }

    for y in 0..h {
        for x in 0..w {
            if mask[y * w + x] {
                blend_at(img, x as i32, y as i32, color);
            }
        }
    }
}

/// Liang-Barsky: the `t` range of `start + t * delta` (t in 0..=1) that lies
/// inside the box, or `None` when the segment misses it.
fn clip_segment(
    start: (f64, f64),
    delta: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<(f64, f64)> {
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-delta.0, start.0 - min.0),
        (delta.0, max.0 - start.0),
        (-delta.1, start.1 - min.1),
        (delta.1, max.1 - start.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

fn inside_ellipse(px: f32, py: f32, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let nx = (px - cx) / rx;
    let ny = (py - cy) / ry;
    nx * nx + ny * ny <= 1.0
}

pub fn fill_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, color: Color) {
    let size = img.dimensions();
    let mut hits = Vec::new();
    for_each_in_box(size, (cx - rx, cy - ry), (cx + rx, cy + ry), |x, y, px, py| {
        if inside_ellipse(px, py, cx, cy, rx, ry) {
            hits.push((x, y));
        }
    });
    for (x, y) in hits {
        blend_at(img, x, y, color);
    }
}

pub fn stroke_ellipse(img: &mut RgbaImage, cx: f32, cy: f32, rx: f32, ry: f32, color: Color, width: f32) {
    let size = img.dimensions();
    let half = width / 2.0;
    let (orx, ory) = (rx + half, ry + half);
    let (irx, iry) = (rx - half, ry - half);
    let mut hits = Vec::new();
    for_each_in_box(size, (cx - orx, cy - ory), (cx + orx, cy + ory), |x, y, px, py| {
        if inside_ellipse(px, py, cx, cy, orx, ory) && !inside_ellipse(px, py, cx, cy, irx, iry) {
            hits.push((x, y));
        }
    });
    for (x, y) in hits {
        blend_at(img, x, y, color);
    }
}

fn inside_rounded_rect(px: f32, py: f32, rect: (f32, f32, f32, f32), radius: f32) -> bool {
    let (left, top, right, bottom) = rect;
    if right <= left || bottom <= top {
        return false;
    }
    let radius = radius.min((right - left) / 2.0).min((bottom - top) / 2.0).max(0.0);
    let qx = px.clamp(left + radius, right - radius);
    let qy = py.clamp(top + radius, bottom - radius);
    let (dx, dy) = (px - qx, py - qy);
    px >= left && px <= right && py >= top && py <= bottom && dx * dx + dy * dy <= radius * radius
}

fn edges(bounds: ToolBounds) -> (f32, f32, f32, f32) {
    (
        bounds.x as f32,
        bounds.y as f32,
        bounds.right() as f32,
        bounds.bottom() as f32,
    )
}

pub fn fill_rounded_rect(img: &mut RgbaImage, bounds: ToolBounds, radius: f32, color: Color) {
    let size = img.dimensions();
    let rect = edges(bounds);
    let mut hits = Vec::new();
    for_each_in_box(size, (rect.0, rect.1), (rect.2, rect.3), |x, y, px, py| {
        if inside_rounded_rect(px, py, rect, radius) {
            hits.push((x, y));
        }
    });
    for (x, y) in hits {
        blend_at(img, x, y, color);
    }
}

/// Outline centered on the box edge.
pub fn stroke_rounded_rect(img: &mut RgbaImage, bounds: ToolBounds, radius: f32, color: Color, width: f32) {
    let size = img.dimensions();
    let half = width / 2.0;
    let (left, top, right, bottom) = edges(bounds);
    let outer = (left - half, top - half, right + half, bottom + half);
    let inner = (left + half, top + half, right - half, bottom - half);
    let mut hits = Vec::new();
    for_each_in_box(size, (outer.0, outer.1), (outer.2, outer.3), |x, y, px, py| {
        if inside_rounded_rect(px, py, outer, radius + half)
            && !inside_rounded_rect(px, py, inner, (radius - half).max(0.0))
        {
            hits.push((x, y));
        }
    });
    for (x, y) in hits {
        blend_at(img, x, y, color);
    }
}

fn edge_sign(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (p.0 - b.0) * (a.1 - b.1) - (a.0 - b.0) * (p.1 - b.1)
}

pub fn fill_triangle(img: &mut RgbaImage, a: (f32, f32), b: (f32, f32), c: (f32, f32), color: Color) {
    let size = img.dimensions();
    let min = (a.0.min(b.0).min(c.0), a.1.min(b.1).min(c.1));
    let max = (a.0.max(b.0).max(c.0), a.1.max(b.1).max(c.1));
    let mut hits = Vec::new();
    for_each_in_box(size, min, max, |x, y, px, py| {
        let d1 = edge_sign((px, py), a, b);
        let d2 = edge_sign((px, py), b, c);
        let d3 = edge_sign((px, py), c, a);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        if !(has_neg && has_pos) {
            hits.push((x, y));
        }
    });
    for (x, y) in hits {
        blend_at(img, x, y, color);
    }
}

/// Draws `text` with the 8x8 bitmap font scaled so one glyph cell spans
/// `font_size` pixels, rounded the same way text is measured. `origin` is the
/// top-left of the first line.
pub fn draw_text(img: &mut RgbaImage, origin: (f32, f32), text: &str, color: Color, font_size: f32) {
    let cell = font_px(font_size) as f32;
    let dot = cell / GLYPH_CELL as f32;
    let (width, height) = img.dimensions();
    for (line_index, line) in text.lines().enumerate() {
        let top = origin.1 + line_index as f32 * cell;
        if top >= height as f32 {
            break;
        }
        if top + cell <= 0.0 {
            continue;
        }
        for (column, ch) in line.chars().enumerate() {
            let left = origin.0 + column as f32 * cell;
            if left >= width as f32 {
                break;
            }
            if left + cell <= 0.0 {
                continue;
            }
            let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
                continue;
            };
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_CELL {
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    let rows = dot_span(top + row as f32 * dot, top + (row + 1) as f32 * dot, height);
                    let cols = dot_span(left + col as f32 * dot, left + (col + 1) as f32 * dot, width);
                    for y in rows {
                        for x in cols.clone() {
                            blend_at(img, x, y, color);
                        }
                    }
                }
            }
        }
    }
}

/// Pixel span of one font dot, at least one pixel wide before clipping to
/// `0..limit`.
fn dot_span(start: f32, end: f32, limit: u32) -> Range<i32> {
    let start = start.round();
    let end = end.round().max(start + 1.0);
    let limit = limit as f32;
    (start.clamp(0.0, limit) as i32)..(end.clamp(0.0, limit) as i32)
}
