/// Side of one glyph cell in the built-in bitmap font.
pub const GLYPH_CELL: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Measures `text` as rendered by the scaled 8x8 bitmap font: every character
/// advances `font_size` pixels and every line is `font_size` tall.
pub fn measure_text(text: &str, font_size: f32) -> TextExtent {
    let size = font_px(font_size);
    let (columns, lines) = text_grid(text);
    TextExtent {
        width: size.saturating_mul(columns),
        height: size.saturating_mul(lines.max(1)),
    }
}

/// Font size rounded to whole pixels, never below one.
pub fn font_px(font_size: f32) -> u32 {
    if !font_size.is_finite() || font_size < 1.0 {
        return 1;
    }
    font_size.round().min(u32::MAX as f32) as u32
}

/// Longest line in characters and the number of lines.
pub fn text_grid(text: &str) -> (u32, u32) {
    let mut columns = 0u32;
    let mut lines = 0u32;
    for line in text.lines() {
        lines = lines.saturating_add(1);
        let count = u32::try_from(line.chars().count()).unwrap_or(u32::MAX);
        columns = columns.max(count);
    }
    (columns, lines)
}
