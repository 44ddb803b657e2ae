use enough::Stop;

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::bmp::{self, BmpInfo};
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::pixel::{Color, PixelLayout};

/// Decoded BMP image. Pixels are top-down RGB8, or RGBA8 for 32-bit files.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub info: BmpInfo,
    palette: Option<Vec<Color>>,
    indices: Option<Vec<u8>>,
}

impl DecodeOutput {
    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Color table of a paletted file, in file order.
    pub fn palette(&self) -> Option<&[Color]> {
        self.palette.as_deref()
    }

    /// One palette index per pixel, top-down, for paletted files.
    pub fn indices(&self) -> Option<&[u8]> {
        self.indices.as_deref()
    }

    /// RGB of the pixel at `(x, y)`.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let off = (y as usize * self.width as usize + x as usize) * bpp;
        Some(Color::from_rgba(&self.pixels[off..off + 3]))
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`BitmapError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.layout != P::layout() {
            return Err(BitmapError::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, BitmapError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

/// Builder for BMP decoding.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, limits: None }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Header fields only.
    pub fn probe(&self) -> Result<BmpInfo, BitmapError> {
        bmp::probe(self.data)
    }

    pub fn decode(&self, stop: impl Stop) -> Result<DecodeOutput, BitmapError> {
        let decoded = bmp::decode(self.data, self.limits, &stop)?;
        Ok(DecodeOutput {
            width: decoded.info.width,
            height: decoded.info.height,
            layout: decoded.info.output_layout(),
            pixels: decoded.pixels,
            palette: decoded.palette,
            indices: decoded.indices,
            info: decoded.info,
        })
    }
}

/// Decode an uncompressed BMP.
pub fn decode_bmp(data: &[u8], stop: impl Stop) -> Result<DecodeOutput, BitmapError> {
    DecodeRequest::new(data).decode(stop)
}

/// Decode an uncompressed BMP within resource limits.
pub fn decode_bmp_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<DecodeOutput, BitmapError> {
    DecodeRequest::new(data).with_limits(limits).decode(stop)
}

/// Read BMP header fields without decoding pixels.
pub fn probe_bmp(data: &[u8]) -> Result<BmpInfo, BitmapError> {
    bmp::probe(data)
}
