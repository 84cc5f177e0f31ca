use std::str::FromStr;

use super::metrics::measure_text;
use crate::geometry::{Color, ToolBounds, ToolPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BubbleKind {
    #[default]
    Speech,
    Thought,
}

impl BubbleKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::Thought => "thought",
        }
    }
}

impl FromStr for BubbleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speech" => Ok(Self::Speech),
            "thought" => Ok(Self::Thought),
            other => Err(format!("unknown bubble kind {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleStyle {
    pub kind: BubbleKind,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub font_size: f32,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            kind: BubbleKind::Speech,
            stroke_color: Color::BLACK,
            fill_color: Color::WHITE,
            font_size: 14.0,
        }
    }
}

/// Spacing rules shared by every bubble on the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleLayout {
    pub padding: u32,
    pub tail_height: u32,
    pub tail_width: u32,
}

impl Default for BubbleLayout {
    fn default() -> Self {
        Self {
            padding: 10,
            tail_height: 15,
            tail_width: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleObject {
    pub id: u64,
    /// Tail tip. Moves with the box but is not derived from it.
    pub anchor: ToolPoint,
    pub bounds: ToolBounds,
    pub text: String,
    pub style: BubbleStyle,
}

impl BubbleObject {
    /// Sizes the box around the text and centers it horizontally on `anchor`,
    /// lifted by the tail height.
    pub fn new(
        id: u64,
        anchor: ToolPoint,
        text: impl Into<String>,
        style: BubbleStyle,
        layout: BubbleLayout,
    ) -> Self {
        let mut object = Self {
            id,
            anchor,
            bounds: ToolBounds::new(anchor.x, anchor.y, 0, 0),
            text: text.into(),
            style,
        };
        object.remeasure(layout);

        let half_width = to_i32(object.bounds.width / 2);
        let half_height = to_i32(object.bounds.height / 2);
        object.bounds.x = anchor.x.saturating_sub(half_width);
        object.bounds.y = anchor
            .y
            .saturating_sub(half_height)
            .saturating_sub(to_i32(layout.tail_height));
        object
    }

    pub fn remeasure(&mut self, layout: BubbleLayout) {
        let extent = measure_text(&self.text, self.style.font_size);
        let padding = layout.padding.saturating_mul(2);
        self.bounds.width = extent.width.saturating_add(padding).max(1);
        self.bounds.height = extent.height.saturating_add(padding).max(1);
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_is_padded_and_centered_above_anchor() {
        let bubble = BubbleObject::new(
            1,
            ToolPoint::new(100, 100),
            "Hey",
            BubbleStyle::default(),
            BubbleLayout::default(),
        );
        // 3 chars * 14px + 2 * 10 padding, 14px + 2 * 10 padding
        assert_eq!(bubble.bounds.width, 62);
        assert_eq!(bubble.bounds.height, 34);
        assert_eq!(bubble.bounds.x, 100 - 31);
        assert_eq!(bubble.bounds.y, 100 - 17 - 15);
        assert_eq!(bubble.anchor, ToolPoint::new(100, 100));
    }

    #[test]
    fn bubble_kind_parses_case_insensitively() {
        assert_eq!("Thought".parse::<BubbleKind>(), Ok(BubbleKind::Thought));
        assert!("shout".parse::<BubbleKind>().is_err());
    }
}
