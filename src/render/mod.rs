//! Compositing of the pixel buffer, scene objects, and interaction decoration.

pub mod raster;

use image::RgbaImage;

use crate::geometry::{Color, Rect, ToolBounds, ToolPoint};
use crate::pixels::PixelBuffer;
use crate::scene::{BubbleKind, BubbleObject, SceneLayout, SceneObject, SceneObjectLayer, TextObject};

pub const SELECTION_OUTLINE_COLOR: Color = Color::new(0, 150, 255);
pub const CROP_PREVIEW_COLOR: Color = Color::new(0, 0, 255);
pub const SNIP_PREVIEW_COLOR: Color = Color::new(255, 0, 0);
const PREVIEW_WIDTH: u32 = 2;
const PREVIEW_DASH: u32 = 5;
const BUBBLE_CORNER_RADIUS: f32 = 10.0;
const BUBBLE_STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFlow {
    Crop,
    Snip,
}

impl SelectionFlow {
    const fn color(self) -> Color {
        match self {
            Self::Crop => CROP_PREVIEW_COLOR,
            Self::Snip => SNIP_PREVIEW_COLOR,
        }
    }
}

/// In-progress freehand stroke drawn above the objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePreview<'a> {
    pub points: &'a [ToolPoint],
    pub color: Color,
    pub width: u32,
}

/// Interaction chrome for the interactive view. Export uses none of it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decoration<'a> {
    pub selection: Option<(SelectionFlow, Rect)>,
    pub stroke: Option<StrokePreview<'a>>,
    pub object_outline: bool,
}

/// One displayable raster. A blank frame is 0x0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    image: RgbaImage,
}

impl RenderedFrame {
    pub fn blank() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Base pixels, then objects in list order, then decoration.
pub fn composite(
    base: Option<&PixelBuffer>,
    layer: &SceneObjectLayer,
    decoration: &Decoration<'_>,
) -> RenderedFrame {
    let Some(base) = base else {
        return RenderedFrame::blank();
    };
    let mut image = base.as_image().clone();
    draw_objects(&mut image, layer);

    if let Some(stroke) = decoration.stroke {
        raster::draw_polyline(&mut image, stroke.points, stroke.color, stroke.width);
    }
    if decoration.object_outline {
        if let Some(selected) = layer.selected() {
            draw_selection_outline(&mut image, selected.bounds(), layer.layout().handle_size);
        }
    }
    if let Some((flow, rect)) = decoration.selection {
        raster::stroke_rect(
            &mut image,
            rect_bounds(rect),
            flow.color(),
            PREVIEW_WIDTH,
            Some(PREVIEW_DASH),
        );
    }
    RenderedFrame { image }
}

/// Base pixels plus objects, without any decoration.
pub fn flatten(base: &PixelBuffer, layer: &SceneObjectLayer) -> RgbaImage {
    let mut image = base.as_image().clone();
    draw_objects(&mut image, layer);
    image
}

/// Bakes a freehand stroke into the buffer.
pub fn bake_stroke(buffer: &mut PixelBuffer, points: &[ToolPoint], color: Color, width: u32) {
    raster::draw_polyline(buffer.image_mut(), points, color, width);
}

fn draw_objects(image: &mut RgbaImage, layer: &SceneObjectLayer) {
    for object in layer.objects() {
        draw_object(image, object, layer.layout());
    }
}

pub fn draw_object(image: &mut RgbaImage, object: &SceneObject, layout: &SceneLayout) {
    match object {
        SceneObject::Text(text) => draw_text_object(image, text),
        SceneObject::Bubble(bubble) => draw_bubble(image, bubble, layout),
    }
}

fn draw_text_object(image: &mut RgbaImage, text: &TextObject) {
    raster::draw_text(
        image,
        (text.bounds.x as f32, text.bounds.y as f32),
        &text.text,
        text.style.color,
        text.style.font_size,
    );
}

fn draw_bubble(image: &mut RgbaImage, bubble: &BubbleObject, layout: &SceneLayout) {
    let style = bubble.style;
    let bounds = bubble.bounds;
    let anchor = (bubble.anchor.x as f32, bubble.anchor.y as f32);
    let center_x = bounds.x as f32 + bounds.width as f32 / 2.0;
    let center_y = bounds.y as f32 + bounds.height as f32 / 2.0;

    match style.kind {
        BubbleKind::Speech => {
            let base_y = bounds.bottom() as f32;
            let half_base = layout.bubble.tail_width as f32;
            let left = (anchor.0 - half_base, base_y);
            let right = (anchor.0 + half_base, base_y);
            raster::fill_rounded_rect(image, bounds, BUBBLE_CORNER_RADIUS, style.fill_color);
            raster::stroke_rounded_rect(
                image,
                bounds,
                BUBBLE_CORNER_RADIUS,
                style.stroke_color,
                BUBBLE_STROKE_WIDTH,
            );
            raster::fill_triangle(image, left, anchor, right, style.fill_color);
            for end in [left, right] {
                let edge = [
                    ToolPoint::new(end.0.round() as i32, end.1.round() as i32),
                    bubble.anchor,
                ];
                raster::draw_polyline(image, &edge, style.stroke_color, BUBBLE_STROKE_WIDTH as u32);
            }
        }
        BubbleKind::Thought => {
            let (rx, ry) = (bounds.width as f32 / 2.0, bounds.height as f32 / 2.0);
            raster::fill_ellipse(image, center_x, center_y, rx, ry, style.fill_color);
            raster::stroke_ellipse(
                image,
                center_x,
                center_y,
                rx,
                ry,
                style.stroke_color,
                BUBBLE_STROKE_WIDTH,
            );
            // Two puffs trailing from the body toward the anchor.
            let bottom = bounds.bottom() as f32;
            let mid_y = bottom + (anchor.1 - bottom) / 2.0;
            for (cx, cy, radius) in [(anchor.0 - 5.0, mid_y, 5.0), (anchor.0 + 2.0, anchor.1, 3.0)] {
                raster::fill_ellipse(image, cx, cy, radius, radius * 0.7, style.fill_color);
                raster::stroke_ellipse(
                    image,
                    cx,
                    cy,
                    radius,
                    radius * 0.7,
                    style.stroke_color,
                    BUBBLE_STROKE_WIDTH / 2.0,
                );
            }
        }
    }

    let extent = crate::scene::measure_text(&bubble.text, style.font_size);
    let origin = (
        center_x - extent.width as f32 / 2.0,
        center_y - extent.height as f32 / 2.0,
    );
    raster::draw_text(image, origin, &bubble.text, style.stroke_color, style.font_size);
}

fn draw_selection_outline(image: &mut RgbaImage, bounds: ToolBounds, handle_size: u32) {
    raster::stroke_rect(image, bounds, SELECTION_OUTLINE_COLOR, 1, Some(4));
    let half = i32::try_from(handle_size / 2).unwrap_or(0);
    let corner = bounds.bottom_right();
    let handle = ToolBounds::new(corner.x - half, corner.y - half, handle_size, handle_size);
    raster::fill_rect(image, handle, SELECTION_OUTLINE_COLOR);
}

fn rect_bounds(rect: Rect) -> ToolBounds {
    ToolBounds::new(
        i32::try_from(rect.x).unwrap_or(i32::MAX),
        i32::try_from(rect.y).unwrap_or(i32::MAX),
        rect.width,
        rect.height,
    )
}
