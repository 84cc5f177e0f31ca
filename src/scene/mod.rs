//! Vector overlay of text labels and comic bubbles above the pixel buffer.

pub mod bubble;
pub mod metrics;
pub mod text;

use crate::geometry::{ToolBounds, ToolPoint};

pub use bubble::{BubbleKind, BubbleLayout, BubbleObject, BubbleStyle};
pub use metrics::{measure_text, TextExtent};
pub use text::{TextFontFamily, TextObject, TextStyle};

pub const DEFAULT_HANDLE_SIZE: u32 = 10;
pub const DEFAULT_MIN_FONT_SIZE: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Text(TextObject),
    Bubble(BubbleObject),
}

impl SceneObject {
    pub const fn id(&self) -> u64 {
        match self {
            Self::Text(text) => text.id,
            Self::Bubble(bubble) => bubble.id,
        }
    }

    pub const fn bounds(&self) -> ToolBounds {
        match self {
            Self::Text(text) => text.bounds,
            Self::Bubble(bubble) => bubble.bounds,
        }
    }

    fn bounds_mut(&mut self) -> &mut ToolBounds {
        match self {
            Self::Text(text) => &mut text.bounds,
            Self::Bubble(bubble) => &mut bubble.bounds,
        }
    }

    pub const fn font_size(&self) -> f32 {
        match self {
            Self::Text(text) => text.style.font_size,
            Self::Bubble(bubble) => bubble.style.font_size,
        }
    }

    fn set_font_size(&mut self, size: f32) {
        match self {
            Self::Text(text) => text.style.font_size = size,
            Self::Bubble(bubble) => bubble.style.font_size = size,
        }
    }

    fn remeasure(&mut self, layout: &SceneLayout) {
        match self {
            Self::Text(text) => text.remeasure(),
            Self::Bubble(bubble) => bubble.remeasure(layout.bubble),
        }
    }

    /// Height implied by `font_size` without touching the object.
    fn height_for_font(&self, font_size: f32, layout: &SceneLayout) -> u32 {
        match self {
            Self::Text(text) => measure_text(&text.text, font_size).height,
            Self::Bubble(bubble) => measure_text(&bubble.text, font_size)
                .height
                .saturating_add(layout.bubble.padding.saturating_mul(2)),
        }
    }
}

/// Interaction constants for hit-testing and resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLayout {
    pub handle_size: u32,
    pub min_font_size: f32,
    pub bubble: BubbleLayout,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            handle_size: DEFAULT_HANDLE_SIZE,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            bubble: BubbleLayout::default(),
        }
    }
}

impl SceneLayout {
    /// Smallest width or height a resize may produce.
    pub fn resize_floor(&self) -> u32 {
        self.handle_size.saturating_mul(2)
    }
}

/// Context captured when a pointer-down grabs an object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectDrag {
    Move {
        id: u64,
        /// Pointer minus box origin at grab time.
        grab_offset: (i32, i32),
        /// Pointer minus bubble anchor at grab time.
        anchor_offset: Option<(i32, i32)>,
        original: SceneObject,
    },
    Resize {
        id: u64,
        start: ToolPoint,
        initial_bounds: ToolBounds,
        initial_font_size: f32,
        original: SceneObject,
    },
}

impl ObjectDrag {
    pub const fn id(&self) -> u64 {
        match self {
            Self::Move { id, .. } | Self::Resize { id, .. } => *id,
        }
    }

    pub const fn is_resize(&self) -> bool {
        matches!(self, Self::Resize { .. })
    }
}

/// Ordered object list. Later entries draw on top.
#[derive(Debug, Clone, Default)]
pub struct SceneObjectLayer {
    objects: Vec<SceneObject>,
    next_id: u64,
    selected: Option<u64>,
    layout: SceneLayout,
}

impl SceneObjectLayer {
    pub fn new(layout: SceneLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    pub fn selected(&self) -> Option<&SceneObject> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: u64) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn place_text(&mut self, origin: ToolPoint, text: &str, style: TextStyle) -> u64 {
        let id = self.allocate_id();
        self.objects
            .push(SceneObject::Text(TextObject::new(id, origin, text, style)));
        tracing::debug!(id, x = origin.x, y = origin.y, "placed text object");
        id
    }

    pub fn place_bubble(&mut self, anchor: ToolPoint, text: &str, style: BubbleStyle) -> u64 {
        let id = self.allocate_id();
        let bubble = BubbleObject::new(id, anchor, text, style, self.layout.bubble);
        self.objects.push(SceneObject::Bubble(bubble));
        tracing::debug!(id, x = anchor.x, y = anchor.y, kind = style.kind.label(), "placed bubble object");
        id
    }

    /// Topmost object whose box contains `point`.
    pub fn hit_test(&self, point: ToolPoint) -> Option<u64> {
        self.objects
            .iter()
            .rev()
            .find(|object| object.bounds().contains(point))
            .map(SceneObject::id)
    }

    pub fn handle_hit(&self, point: ToolPoint) -> Option<u64> {
        self.selected()
            .filter(|object| {
                object
                    .bounds()
                    .handle_contains(point, self.layout.handle_size)
            })
            .map(SceneObject::id)
    }

    /// Selects `id` and moves it to the end of the draw order.
    pub fn select(&mut self, id: u64) -> bool {
        let Some(index) = self.objects.iter().position(|object| object.id() == id) else {
            return false;
        };
        let object = self.objects.remove(index);
        self.objects.push(object);
        self.selected = Some(id);
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Select-tool pointer-down. The selected object's handle wins over any
    /// object underneath it; a miss deselects.
    pub fn press(&mut self, point: ToolPoint) -> Option<ObjectDrag> {
        if let Some(object) = self.handle_hit(point).and_then(|id| self.get(id)) {
            let bounds = object.bounds();
            return Some(ObjectDrag::Resize {
                id: object.id(),
                start: point,
                initial_bounds: bounds,
                initial_font_size: object.font_size(),
                original: object.clone(),
            });
        }

        let Some(id) = self.hit_test(point) else {
            self.deselect();
            return None;
        };
        self.select(id);
        let object = self.get(id)?;
        let bounds = object.bounds();
        let anchor_offset = match object {
            SceneObject::Bubble(bubble) => {
                Some((point.x - bubble.anchor.x, point.y - bubble.anchor.y))
            }
            SceneObject::Text(_) => None,
        };
        Some(ObjectDrag::Move {
            id,
            grab_offset: (point.x - bounds.x, point.y - bounds.y),
            anchor_offset,
            original: object.clone(),
        })
    }

    /// Applies one pointer-move of an open drag.
    pub fn drag_to(&mut self, drag: &ObjectDrag, point: ToolPoint) {
        let layout = self.layout;
        match drag {
            ObjectDrag::Move {
                id,
                grab_offset,
                anchor_offset,
                ..
            } => {
                let Some(object) = self.find_mut(*id) else {
                    return;
                };
                let bounds = object.bounds_mut();
                bounds.x = point.x.saturating_sub(grab_offset.0);
                bounds.y = point.y.saturating_sub(grab_offset.1);
                if let (SceneObject::Bubble(bubble), Some((dx, dy))) = (object, anchor_offset) {
                    bubble.anchor =
                        ToolPoint::new(point.x.saturating_sub(*dx), point.y.saturating_sub(*dy));
                }
            }
            ObjectDrag::Resize {
                id,
                start,
                initial_bounds,
                initial_font_size,
                ..
            } => {
                let Some(object) = self.find_mut(*id) else {
                    return;
                };
                let floor = layout.resize_floor();
                let delta_x = i64::from(point.x) - i64::from(start.x);
                let width = (i64::from(initial_bounds.width) + delta_x)
                    .clamp(i64::from(floor), i64::from(u32::MAX));
                let width = u32::try_from(width).unwrap_or(floor);
                let ratio = width as f32 / initial_bounds.width.max(1) as f32;
                let font_size = (initial_font_size * ratio).max(layout.min_font_size);
                let height = object.height_for_font(font_size, &layout).max(floor);

                object.set_font_size(font_size);
                let bounds = object.bounds_mut();
                bounds.width = width;
                bounds.height = height;
            }
        }
    }

    /// Pointer-up: a resize snaps the box to the measured text extent.
    pub fn finish_drag(&mut self, drag: &ObjectDrag) {
        if let ObjectDrag::Resize { id, .. } = drag {
            let layout = self.layout;
            if let Some(object) = self.find_mut(*id) {
                object.remeasure(&layout);
                tracing::debug!(id, font_size = object.font_size(), "resized scene object");
            }
        }
    }

    /// Puts the grabbed object back to its pre-drag geometry.
    pub fn cancel_drag(&mut self, drag: &ObjectDrag) {
        let (ObjectDrag::Move { id, original, .. } | ObjectDrag::Resize { id, original, .. }) =
            drag;
        if let Some(object) = self.find_mut(*id) {
            *object = original.clone();
        }
    }

    /// Drops every object; the only way objects are ever destroyed.
    pub fn clear(&mut self) {
        if !self.objects.is_empty() {
            tracing::debug!(count = self.objects.len(), "cleared scene objects");
        }
        self.objects.clear();
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_style(size: f32) -> TextStyle {
        TextStyle {
            font_size: size,
            ..TextStyle::default()
        }
    }

    #[test]
    fn hit_test_on_empty_layer_misses() {
        let mut layer = SceneObjectLayer::default();
        assert_eq!(layer.hit_test(ToolPoint::new(1, 1)), None);
        assert_eq!(layer.press(ToolPoint::new(1, 1)), None);
    }

    #[test]
    fn topmost_object_wins_and_click_elsewhere_deselects() {
        let mut layer = SceneObjectLayer::default();
        let first = layer.place_text(ToolPoint::new(0, 0), "aaaa", text_style(20.0));
        let second = layer.place_text(ToolPoint::new(10, 5), "bbbb", text_style(20.0));
        let point = ToolPoint::new(20, 10);

        let drag = layer.press(point).expect("overlap should hit");
        assert_eq!(drag.id(), second);
        assert_eq!(layer.selected_id(), Some(second));
        assert_eq!(layer.objects().last().map(SceneObject::id), Some(second));

        assert_eq!(layer.press(ToolPoint::new(500, 500)), None);
        assert_eq!(layer.selected_id(), None);

        layer.select(first);
        assert_eq!(layer.objects().last().map(SceneObject::id), Some(first));
        assert_eq!(layer.hit_test(point), Some(first));
    }

    #[test]
    fn move_keeps_grab_offset_and_translates_bubble_anchor() {
        let mut layer = SceneObjectLayer::default();
        let id = layer.place_bubble(ToolPoint::new(100, 100), "Hey", BubbleStyle::default());
        let before = layer.get(id).expect("bubble exists").bounds();
        let grab = ToolPoint::new(before.x + 5, before.y + 6);

        let drag = layer.press(grab).expect("bubble is hit");
        assert!(!drag.is_resize());
        layer.drag_to(&drag, ToolPoint::new(grab.x + 30, grab.y - 10));
        layer.finish_drag(&drag);

        let Some(SceneObject::Bubble(bubble)) = layer.get(id) else {
            panic!("bubble should remain");
        };
        assert_eq!(bubble.bounds.x, before.x + 30);
        assert_eq!(bubble.bounds.y, before.y - 10);
        assert_eq!(bubble.anchor, ToolPoint::new(130, 90));
        assert_eq!(bubble.bounds.width, before.width);
    }

    #[test]
    fn handle_drag_scales_font_and_release_remeasures() {
        let mut layer = SceneObjectLayer::default();
        let id = layer.place_text(ToolPoint::new(0, 0), "abcd", text_style(20.0));
        layer.press(ToolPoint::new(10, 10)).expect("text is hit");

        let drag = layer
            .press(ToolPoint::new(80, 20))
            .expect("handle is hit");
        assert!(drag.is_resize());
        assert_eq!(layer.selected_id(), Some(id));

        layer.drag_to(&drag, ToolPoint::new(120, 50));
        let live = layer.get(id).expect("text exists");
        assert_eq!(live.font_size(), 30.0);
        assert_eq!(live.bounds(), ToolBounds::new(0, 0, 120, 30));

        layer.finish_drag(&drag);
        assert_eq!(
            layer.get(id).expect("text exists").bounds(),
            ToolBounds::new(0, 0, 120, 30)
        );
    }

    #[test]
    fn resize_is_floored_at_handle_and_minimum_font() {
        let mut layer = SceneObjectLayer::default();
        let id = layer.place_text(ToolPoint::new(0, 0), "abcd", text_style(20.0));
        layer.select(id);
        let drag = layer.press(ToolPoint::new(80, 20)).expect("handle is hit");

        layer.drag_to(&drag, ToolPoint::new(-200, 20));
        let live = layer.get(id).expect("text exists");
        assert_eq!(live.bounds().width, 20);
        assert_eq!(live.bounds().height, 20);
        assert_eq!(live.font_size(), DEFAULT_MIN_FONT_SIZE);

        layer.finish_drag(&drag);
        assert_eq!(
            layer.get(id).expect("text exists").bounds(),
            ToolBounds::new(0, 0, 20, 5)
        );
    }

    #[test]
    fn cancel_restores_pre_drag_geometry() {
        let mut layer = SceneObjectLayer::default();
        let id = layer.place_text(ToolPoint::new(5, 5), "move me", text_style(10.0));
        let original = layer.get(id).cloned().expect("text exists");

        let drag = layer.press(ToolPoint::new(6, 6)).expect("text is hit");
        layer.drag_to(&drag, ToolPoint::new(60, 70));
        assert_ne!(layer.get(id), Some(&original));
        layer.cancel_drag(&drag);
        assert_eq!(layer.get(id), Some(&original));
    }

    #[test]
    fn clear_drops_objects_and_selection() {
        let mut layer = SceneObjectLayer::default();
        let id = layer.place_text(ToolPoint::new(0, 0), "x", text_style(10.0));
        layer.select(id);
        layer.clear();
        assert!(layer.is_empty());
        assert_eq!(layer.selected(), None);
    }
}
