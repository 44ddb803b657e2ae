/// Alpha values below this are treated as fully transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Whether an RGBA pixel passes the alpha visibility gate.
#[inline]
pub(crate) fn is_visible(rgba: &[u8]) -> bool {
    rgba[3] >= ALPHA_THRESHOLD
}

/// An 8-bit sRGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color of an RGB or RGBA pixel, alpha dropped.
    #[inline]
    pub(crate) fn from_rgba(rgba: &[u8]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2])
    }

    /// Channel by axis index (0 = r, 1 = g, 2 = b).
    #[inline]
    pub(crate) fn channel(self, axis: usize) -> u8 {
        match axis {
            0 => self.r,
            1 => self.g,
            _ => self.b,
        }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

#[cfg(feature = "rgb")]
impl From<rgb::RGB8> for Color {
    fn from(c: rgb::RGB8) -> Self {
        Self::new(c.r, c.g, c.b)
    }
}

#[cfg(feature = "rgb")]
impl From<Color> for rgb::RGB8 {
    fn from(c: Color) -> Self {
        rgb::RGB8 {
            r: c.r,
            g: c.g,
            b: c.b,
        }
    }
}

/// Pixel memory layout of decoded output.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Typed pixels a [`crate::DecodeOutput`] can be viewed as.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy {
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGB8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGBA8 {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

/// Length in bytes of an RGBA buffer covering `width` x `height`, validated
/// against the supplied slice.
pub(crate) fn rgba_len(pixels: &[u8], width: u32, height: u32) -> Result<usize, crate::BitmapError> {
    rgba_len_usize(pixels, width as usize, height as usize)
}

pub(crate) fn rgba_len_usize(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> Result<usize, crate::BitmapError> {
    let too_large = || crate::BitmapError::DimensionsTooLarge {
        width: u32::try_from(width).unwrap_or(u32::MAX),
        height: u32::try_from(height).unwrap_or(u32::MAX),
    };
    let expected = width
        .checked_mul(height)
        .and_then(|wh| wh.checked_mul(4))
        .ok_or_else(too_large)?;
    if pixels.len() < expected {
        return Err(crate::BitmapError::BufferTooSmall {
            needed: expected,
            actual: pixels.len(),
        });
    }
    Ok(expected)
}
