use super::PixelBuffer;

/// Whole-image color transforms. Alpha is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Grayscale,
    Sepia,
    Invert,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Self::Grayscale, Self::Sepia, Self::Invert];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
        }
    }

    /// Returns a filtered copy; `source` is left as it was.
    pub fn apply(self, source: &PixelBuffer) -> PixelBuffer {
        let mut output = source.snapshot();
        self.apply_in_place(output.samples_mut());
        output
    }

    fn apply_in_place(self, samples: &mut [u8]) {
        let transform: fn(&mut [u8]) = match self {
            Self::Grayscale => grayscale_pixel,
            Self::Sepia => sepia_pixel,
            Self::Invert => invert_pixel,
        };
        samples.chunks_exact_mut(4).for_each(transform);
    }
}

fn grayscale_pixel(pixel: &mut [u8]) {
    let (r, g, b) = channels(pixel);
    let gray = to_channel(0.299 * r + 0.587 * g + 0.114 * b);
    pixel[0] = gray;
    pixel[1] = gray;
    pixel[2] = gray;
}

fn sepia_pixel(pixel: &mut [u8]) {
    let (r, g, b) = channels(pixel);
    pixel[0] = to_channel(0.393 * r + 0.769 * g + 0.189 * b);
    pixel[1] = to_channel(0.349 * r + 0.686 * g + 0.168 * b);
    pixel[2] = to_channel(0.272 * r + 0.534 * g + 0.131 * b);
}

fn invert_pixel(pixel: &mut [u8]) {
    pixel[0] = 255 - pixel[0];
    pixel[1] = 255 - pixel[1];
    pixel[2] = 255 - pixel[2];
}

fn channels(pixel: &[u8]) -> (f32, f32, f32) {
    (
        f32::from(pixel[0]),
        f32::from(pixel[1]),
        f32::from(pixel[2]),
    )
}

// Inputs are non-negative, so only the high end needs clamping.
fn to_channel(value: f32) -> u8 {
    value.round().min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    fn sample_buffer() -> PixelBuffer {
        let samples = vec![
            10, 200, 30, 255, //
            255, 255, 255, 128, //
            0, 0, 0, 0, //
            120, 64, 250, 17,
        ];
        PixelBuffer::from_samples(2, 2, samples).expect("2x2 buffer")
    }

    #[test]
    fn invert_twice_restores_every_byte() {
        let original = sample_buffer();
        let inverted = Filter::Invert.apply(&original);
        assert_ne!(inverted, original);
        assert_eq!(Filter::Invert.apply(&inverted), original);
    }

    #[test]
    fn filters_leave_source_and_alpha_untouched() {
        let original = sample_buffer();
        for filter in Filter::ALL {
            let output = filter.apply(&original);
            assert_eq!(original, sample_buffer(), "{filter:?} mutated its input");
            assert_eq!((output.width(), output.height()), (2, 2));
            let alphas = output.samples().chunks_exact(4).map(|p| p[3]).collect::<Vec<_>>();
            assert_eq!(alphas, vec![255, 128, 0, 17], "{filter:?} changed alpha");
        }
    }

    #[test]
    fn grayscale_uses_luminance_weights() {
        let buffer = PixelBuffer::filled(1, 1, Color::new(100, 150, 200)).expect("1x1");
        let gray = Filter::Grayscale.apply(&buffer);
        // 0.299*100 + 0.587*150 + 0.114*200 = 140.75
        assert_eq!(gray.pixel(0, 0), Some([141, 141, 141, 255]));
    }

    #[test]
    fn sepia_clamps_bright_input_to_255() {
        let buffer = PixelBuffer::filled(1, 1, Color::WHITE).expect("1x1");
        let sepia = Filter::Sepia.apply(&buffer);
        // Blue channel: (0.272 + 0.534 + 0.131) * 255 = 238.9
        assert_eq!(sepia.pixel(0, 0), Some([255, 255, 239, 255]));
    }
}
