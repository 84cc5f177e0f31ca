use super::{PixelBuffer, PixelError, PixelResult};
use crate::geometry::Rect;
use image::imageops;

/// Quarter-turn direction. `Clockwise` is the +90° rotate-right command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub const fn inverse(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Lossless quarter-turn. Output dimensions are the input's transposed.
///
/// Clockwise moves source `(x, y)` to `(height - 1 - y, x)`; counter-clockwise
/// moves it to `(y, width - 1 - x)`.
pub fn rotate90(buffer: &PixelBuffer, rotation: Rotation) -> PixelBuffer {
    let rotated = match rotation {
        Rotation::Clockwise => imageops::rotate90(buffer.as_image()),
        Rotation::CounterClockwise => imageops::rotate270(buffer.as_image()),
    };
    PixelBuffer { image: rotated }
}

/// Output pixel `(i, j)` is input pixel `(rect.x + i, rect.y + j)`.
pub fn crop(buffer: &PixelBuffer, rect: Rect) -> PixelResult<PixelBuffer> {
    if !rect.fits_within(buffer.bounds()) {
        return Err(PixelError::RegionOutOfBounds {
            rect,
            width: buffer.width(),
            height: buffer.height(),
        });
    }
    buffer.extract_region(rect)
}
