//! Authoritative RGBA raster state.

pub mod filters;
pub mod transform;

use crate::geometry::{Color, ImageBounds, Rect};
use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

pub use filters::Filter;
pub use transform::Rotation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelError {
    #[error("pixel buffer dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("sample length mismatch: expected {expected} bytes, got {actual}")]
    SampleLength { expected: usize, actual: usize },
    #[error("region {rect:?} lies outside a {width}x{height} buffer")]
    RegionOutOfBounds { rect: Rect, width: u32, height: u32 },
}

pub type PixelResult<T> = std::result::Result<T, PixelError>;

/// Row-major RGBA8 raster. Dimensions are always non-zero and the sample
/// slice always holds `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> PixelResult<Self> {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> PixelResult<Self> {
        ensure_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba(color.to_array())),
        })
    }

    pub fn from_samples(width: u32, height: u32, samples: Vec<u8>) -> PixelResult<Self> {
        ensure_dimensions(width, height)?;
        let expected = expected_len(width, height);
        let actual = samples.len();
        RgbaImage::from_raw(width, height, samples)
            .map(|image| Self { image })
            .ok_or(PixelError::SampleLength { expected, actual })
    }

    pub fn from_image(image: RgbaImage) -> PixelResult<Self> {
        ensure_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.width(), self.height())
    }

    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Deep copy used before destructive operations and for history.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        self.image.put_pixel(x, y, Rgba(color.to_array()));
        true
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> PixelResult<()> {
        self.ensure_region(rect)?;
        let value = Rgba(color.to_array());
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.image.put_pixel(x, y, value);
            }
        }
        Ok(())
    }

    /// Copies the pixels under `rect` into a new buffer.
    pub fn extract_region(&self, rect: Rect) -> PixelResult<Self> {
        self.ensure_region(rect)?;
        let region = imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height);
        Ok(Self {
            image: region.to_image(),
        })
    }

    /// Resets the pixels under `rect` to fully transparent.
    pub fn clear_region(&mut self, rect: Rect) -> PixelResult<()> {
        self.fill_rect(rect, Color::TRANSPARENT)
    }

    /// Writes `source` verbatim (no blending) with its top-left at `(x, y)`,
    /// dropping whatever falls outside this buffer.
    pub fn put_region(&mut self, source: &PixelBuffer, x: u32, y: u32) -> PixelResult<()> {
        if x >= self.width() || y >= self.height() {
            return Err(PixelError::RegionOutOfBounds {
                rect: Rect::new(x, y, source.width(), source.height()),
                width: self.width(),
                height: self.height(),
            });
        }
        imageops::replace(&mut self.image, &source.image, i64::from(x), i64::from(y));
        Ok(())
    }

    fn ensure_region(&self, rect: Rect) -> PixelResult<()> {
        if !rect.fits_within(self.bounds()) {
            return Err(PixelError::RegionOutOfBounds {
                rect,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }
}

fn ensure_dimensions(width: u32, height: u32) -> PixelResult<()> {
    if width == 0 || height == 0 {
        return Err(PixelError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn expected_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}
