use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use super::metrics::measure_text;
use crate::geometry::{Color, ToolBounds, ToolPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFontFamily {
    #[default]
    Sans,
    Serif,
    Monospace,
}

impl FromStr for TextFontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sans" | "sans-serif" | "arial" => Ok(Self::Sans),
            "serif" | "times" => Ok(Self::Serif),
            "mono" | "monospace" | "courier" => Ok(Self::Monospace),
            other => Err(format!("unknown font family {other:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for TextFontFamily {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub font_size: f32,
    pub family: TextFontFamily,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size: 30.0,
            family: TextFontFamily::Sans,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextObject {
    pub id: u64,
    pub bounds: ToolBounds,
    pub text: String,
    pub style: TextStyle,
}

impl TextObject {
    /// Places the label with its top-left corner at `origin`.
    pub fn new(id: u64, origin: ToolPoint, text: impl Into<String>, style: TextStyle) -> Self {
        let mut object = Self {
            id,
            bounds: ToolBounds::new(origin.x, origin.y, 0, 0),
            text: text.into(),
            style,
        };
        object.remeasure();
        object
    }

    /// Resets width and height to the true rendered extent at the current size.
    pub fn remeasure(&mut self) {
        let extent = measure_text(&self.text, self.style.font_size);
        self.bounds.width = extent.width.max(1);
        self.bounds.height = extent.height.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_puts_box_origin_at_click() {
        let style = TextStyle {
            font_size: 20.0,
            ..TextStyle::default()
        };
        let text = TextObject::new(3, ToolPoint::new(15, 40), "abc", style);
        assert_eq!(text.bounds, ToolBounds::new(15, 40, 60, 20));
    }

    #[test]
    fn font_family_parses_common_names() {
        assert_eq!("Arial".parse::<TextFontFamily>(), Ok(TextFontFamily::Sans));
        assert_eq!(
            "monospace".parse::<TextFontFamily>(),
            Ok(TextFontFamily::Monospace)
        );
        assert!("wingdings".parse::<TextFontFamily>().is_err());
    }
}
