use crate::config::EditorConfig;
use crate::geometry::Color;
use crate::scene::{BubbleKind, BubbleStyle, TextFontFamily, TextStyle};

/// Which groups of [`ToolSettings`] inputs apply to the active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolOptionPanels {
    /// Stroke color and width.
    pub stroke: bool,
    /// Text color, size and family.
    pub text: bool,
    /// Bubble kind, colors and font size.
    pub bubble: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Crop,
    Snip,
    Draw,
    Text,
    Bubble,
}

impl ToolKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Crop => "crop",
            Self::Snip => "snip",
            Self::Draw => "draw",
            Self::Text => "text",
            Self::Bubble => "bubble",
        }
    }

    /// Settings a tool reads when it commits; selection tools read none.
    pub const fn option_panels(self) -> ToolOptionPanels {
        ToolOptionPanels {
            stroke: matches!(self, Self::Draw),
            text: matches!(self, Self::Text),
            bubble: matches!(self, Self::Bubble),
        }
    }
}

/// Live values of the tool option inputs. Read when an action commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub stroke_color: Color,
    stroke_width: u32,
    pub text_color: Color,
    text_size: f32,
    pub text_family: TextFontFamily,
    pub bubble_kind: BubbleKind,
    pub bubble_stroke: Color,
    pub bubble_fill: Color,
    bubble_font_size: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            stroke_color: config.stroke_color,
            stroke_width: config.stroke_width.max(1),
            text_color: config.text_color,
            text_size: clamp_font_size(config.text_size),
            text_family: config.text_family,
            bubble_kind: BubbleKind::default(),
            bubble_stroke: config.bubble_stroke,
            bubble_fill: config.bubble_fill,
            bubble_font_size: clamp_font_size(config.bubble_font_size),
        }
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width.max(1);
    }

    pub fn text_size(&self) -> f32 {
        self.text_size
    }

    pub fn set_text_size(&mut self, size: f32) {
        self.text_size = clamp_font_size(size);
    }

    pub fn bubble_font_size(&self) -> f32 {
        self.bubble_font_size
    }

    pub fn set_bubble_font_size(&mut self, size: f32) {
        self.bubble_font_size = clamp_font_size(size);
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            color: self.text_color,
            font_size: self.text_size,
            family: self.text_family,
        }
    }

    pub fn bubble_style(&self) -> BubbleStyle {
        BubbleStyle {
            kind: self.bubble_kind,
            stroke_color: self.bubble_stroke,
            fill_color: self.bubble_fill,
            font_size: self.bubble_font_size,
        }
    }
}

fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(1.0)
    } else {
        1.0
    }
}

/// Content waiting for a placement click.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmedPayload {
    /// Style is read from the settings at placement.
    Text(String),
    /// Style is captured when the bubble is armed.
    Bubble { text: String, style: BubbleStyle },
}

impl ArmedPayload {
    pub const fn tool(&self) -> ToolKind {
        match self {
            Self::Text(_) => ToolKind::Text,
            Self::Bubble { .. } => ToolKind::Bubble,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_annotation_tool_owns_one_option_panel() {
        assert!(ToolKind::Draw.option_panels().stroke);
        assert!(ToolKind::Bubble.option_panels().bubble);
        assert!(!ToolKind::Bubble.option_panels().text);
        assert_eq!(ToolKind::Snip.option_panels(), ToolOptionPanels::default());
    }

    #[test]
    fn settings_clamp_sizes_and_build_styles() {
        let mut settings = ToolSettings::default();
        settings.set_stroke_width(0);
        settings.set_text_size(-4.0);
        assert_eq!(settings.stroke_width(), 1);
        assert_eq!(settings.text_size(), 1.0);

        settings.bubble_kind = BubbleKind::Thought;
        settings.bubble_fill = Color::new(1, 2, 3);
        let style = settings.bubble_style();
        assert_eq!(style.kind, BubbleKind::Thought);
        assert_eq!(style.fill_color, Color::new(1, 2, 3));
        assert_eq!(style.font_size, 14.0);
    }
}
