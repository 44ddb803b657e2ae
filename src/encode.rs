use enough::Stop;

use crate::bmp;
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::palette::{Palette, PaletteSize};
use crate::pixel::rgba_len;
use crate::remap::{expand_indices, quantize_indices};

/// Output bit depth of a BMP encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BmpDepth {
    /// 24-bit BGR, lossless for RGB. Alpha is dropped.
    Rgb24,
    /// 8-bit indices into a 256-color median-cut palette.
    Indexed8,
    /// 4-bit indices into a 16-color median-cut palette.
    Indexed4,
}

impl BmpDepth {
    pub const fn bits_per_pixel(self) -> u16 {
        match self {
            Self::Rgb24 => 24,
            Self::Indexed8 => 8,
            Self::Indexed4 => 4,
        }
    }

    /// Palette size, or `None` for direct color.
    pub const fn palette_size(self) -> Option<PaletteSize> {
        match self {
            Self::Rgb24 => None,
            Self::Indexed8 => Some(PaletteSize::Colors256),
            Self::Indexed4 => Some(PaletteSize::Colors16),
        }
    }
}

/// An encoded BMP file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBmp {
    bytes: Vec<u8>,
    depth: BmpDepth,
}

impl EncodedBmp {
    pub const MIME_TYPE: &'static str = "image/bmp";

    pub fn mime_type(&self) -> &'static str {
        Self::MIME_TYPE
    }

    pub fn depth(&self) -> BmpDepth {
        self.depth
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for EncodedBmp {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<EncodedBmp> for Vec<u8> {
    fn from(e: EncodedBmp) -> Self {
        e.bytes
    }
}

/// Palette and per-pixel indices for one image.
struct Quantized {
    palette: Palette,
    indices: Vec<u8>,
}

fn quantize(
    pixels: &[u8],
    width: u32,
    height: u32,
    size: PaletteSize,
    dither: bool,
    stop: &dyn Stop,
) -> Result<Quantized, BitmapError> {
    let palette = Palette::build(pixels, size);
    stop.check()?;
    let indices = quantize_indices(
        pixels,
        width as usize,
        height as usize,
        &palette.matcher(),
        dither,
        stop,
    )?;
    Ok(Quantized { palette, indices })
}

/// Builder for BMP encode and preview operations.
///
/// ```
/// use zenbmpquant::{EncodeRequest, Unstoppable};
///
/// let pixels = [255u8, 0, 0, 255, 0, 0, 255, 255];
/// let bmp = EncodeRequest::bmp8()
///     .with_dither(true)
///     .encode(&pixels, 2, 1, Unstoppable)?;
/// assert_eq!(&bmp.as_bytes()[0..2], b"BM");
/// # Ok::<(), zenbmpquant::BitmapError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest<'a> {
    depth: BmpDepth,
    dither: bool,
    limits: Option<&'a Limits>,
}

impl<'a> EncodeRequest<'a> {
    pub fn new(depth: BmpDepth) -> Self {
        Self {
            depth,
            dither: false,
            limits: None,
        }
    }

    /// 24-bit lossless encode.
    pub fn bmp24() -> Self {
        Self::new(BmpDepth::Rgb24)
    }

    /// 8-bit, 256-color encode.
    pub fn bmp8() -> Self {
        Self::new(BmpDepth::Indexed8)
    }

    /// 4-bit, 16-color encode.
    pub fn bmp4() -> Self {
        Self::new(BmpDepth::Indexed4)
    }

    /// Enable Floyd-Steinberg dithering. Ignored at 24 bits.
    pub fn with_dither(mut self, dither: bool) -> Self {
        self.dither = dither;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn depth(&self) -> BmpDepth {
        self.depth
    }

    /// Validate the buffer and limits; returns the RGBA byte length in use.
    fn check(&self, pixels: &[u8], width: u32, height: u32) -> Result<usize, BitmapError> {
        let len = rgba_len(pixels, width, height)?;
        let palette_len = self.depth.palette_size().map_or(0, PaletteSize::len);
        let file_size = bmp::encoded_size(width, height, self.depth.bits_per_pixel(), palette_len)?;
        if let Some(limits) = self.limits {
            limits.check(width, height)?;
            limits.check_memory(file_size.max(len))?;
        }
        Ok(len)
    }

    /// Encode RGBA pixels (row-major, top-down) to a BMP file.
    ///
    /// The input buffer is never modified.
    pub fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<EncodedBmp, BitmapError> {
        let len = self.check(pixels, width, height)?;
        let pixels = &pixels[..len];
        stop.check()?;

        let bytes = match self.depth.palette_size() {
            None => bmp::encode_rgb24(pixels, width, height, &stop)?,
            Some(size) => {
                let q = quantize(pixels, width, height, size, self.dither, &stop)?;
                bmp::encode_indexed(
                    &q.indices,
                    &q.palette,
                    width,
                    height,
                    size.bits(),
                    &stop,
                )?
            }
        };

        tracing::debug!(
            width,
            height,
            bpp = self.depth.bits_per_pixel(),
            dither = self.dither,
            bytes = bytes.len(),
            "encoded BMP"
        );
        Ok(EncodedBmp {
            bytes,
            depth: self.depth,
        })
    }

    /// What a decoder will show for [`Self::encode`] of the same input, as
    /// RGBA with the source alpha kept.
    ///
    /// At 8 and 4 bits, transparent pixels come out black. At 24 bits the
    /// RGB is the input's.
    pub fn preview(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<Vec<u8>, BitmapError> {
        let len = self.check(pixels, width, height)?;
        let pixels = &pixels[..len];
        stop.check()?;

        match self.depth.palette_size() {
            None => Ok(pixels.to_vec()),
            Some(size) => {
                let q = quantize(pixels, width, height, size, self.dither, &stop)?;
                Ok(expand_indices(&q.indices, pixels, &q.palette))
            }
        }
    }

    /// Encode and preview with a single quantization pass.
    pub fn encode_with_preview(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<(EncodedBmp, Vec<u8>), BitmapError> {
        let len = self.check(pixels, width, height)?;
        let pixels = &pixels[..len];
        stop.check()?;

        let Some(size) = self.depth.palette_size() else {
            let bytes = bmp::encode_rgb24(pixels, width, height, &stop)?;
            let encoded = EncodedBmp {
                bytes,
                depth: self.depth,
            };
            return Ok((encoded, pixels.to_vec()));
        };

        let q = quantize(pixels, width, height, size, self.dither, &stop)?;
        let bytes = bmp::encode_indexed(&q.indices, &q.palette, width, height, size.bits(), &stop)?;
        let preview = expand_indices(&q.indices, pixels, &q.palette);
        Ok((
            EncodedBmp {
                bytes,
                depth: self.depth,
            },
            preview,
        ))
    }

    /// Encode typed RGBA pixels.
    #[cfg(feature = "rgb")]
    pub fn encode_rgba(
        &self,
        pixels: &[rgb::RGBA8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<EncodedBmp, BitmapError> {
        use rgb::ComponentBytes as _;
        self.encode(pixels.as_bytes(), width, height, stop)
    }

    /// Preview typed RGBA pixels.
    #[cfg(feature = "rgb")]
    pub fn preview_rgba(
        &self,
        pixels: &[rgb::RGBA8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<Vec<rgb::RGBA8>, BitmapError> {
        use rgb::AsPixels as _;
        use rgb::ComponentBytes as _;
        let bytes = self.preview(pixels.as_bytes(), width, height, stop)?;
        Ok(bytes.as_pixels().to_vec())
    }

    /// Encode an [`imgref::ImgRef`]; any stride is accepted.
    #[cfg(feature = "imgref")]
    pub fn encode_img(
        &self,
        img: imgref::ImgRef<'_, rgb::RGBA8>,
        stop: impl Stop,
    ) -> Result<EncodedBmp, BitmapError> {
        let (pixels, width, height) = contiguous(img)?;
        self.encode_rgba(&pixels, width, height, stop)
    }

    /// Preview an [`imgref::ImgRef`] as an [`imgref::ImgVec`].
    #[cfg(feature = "imgref")]
    pub fn preview_img(
        &self,
        img: imgref::ImgRef<'_, rgb::RGBA8>,
        stop: impl Stop,
    ) -> Result<imgref::ImgVec<rgb::RGBA8>, BitmapError> {
        let (pixels, width, height) = contiguous(img)?;
        let preview = self.preview_rgba(&pixels, width, height, stop)?;
        Ok(imgref::ImgVec::new(
            preview,
            width as usize,
            height as usize,
        ))
    }
}

/// Copy an image into a stride-free buffer.
#[cfg(feature = "imgref")]
fn contiguous(
    img: imgref::ImgRef<'_, rgb::RGBA8>,
) -> Result<(Vec<rgb::RGBA8>, u32, u32), BitmapError> {
    let too_large = || BitmapError::DimensionsTooLarge {
        width: u32::MAX,
        height: u32::MAX,
    };
    let width = u32::try_from(img.width()).map_err(|_| too_large())?;
    let height = u32::try_from(img.height()).map_err(|_| too_large())?;
    let pixels = img.rows().flat_map(|row| row.iter().copied()).collect();
    Ok((pixels, width, height))
}

/// Encode RGBA pixels as a 24-bit BMP.
pub fn encode_bmp24(
    pixels: &[u8],
    width: u32,
    height: u32,
    stop: impl Stop,
) -> Result<EncodedBmp, BitmapError> {
    EncodeRequest::bmp24().encode(pixels, width, height, stop)
}

/// Encode RGBA pixels as an 8-bit, 256-color BMP.
pub fn encode_bmp8(
    pixels: &[u8],
    width: u32,
    height: u32,
    dither: bool,
    stop: impl Stop,
) -> Result<EncodedBmp, BitmapError> {
    EncodeRequest::bmp8()
        .with_dither(dither)
        .encode(pixels, width, height, stop)
}

/// Encode RGBA pixels as a 4-bit, 16-color BMP. `aggressive` enables
/// dithering.
pub fn encode_bmp4(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
    stop: impl Stop,
) -> Result<EncodedBmp, BitmapError> {
    EncodeRequest::bmp4()
        .with_dither(aggressive)
        .encode(pixels, width, height, stop)
}

/// Preview of [`encode_bmp24`].
pub fn preview_bmp24(
    pixels: &[u8],
    width: u32,
    height: u32,
    stop: impl Stop,
) -> Result<Vec<u8>, BitmapError> {
    EncodeRequest::bmp24().preview(pixels, width, height, stop)
}

/// Preview of [`encode_bmp8`].
pub fn preview_bmp8(
    pixels: &[u8],
    width: u32,
    height: u32,
    dither: bool,
    stop: impl Stop,
) -> Result<Vec<u8>, BitmapError> {
    EncodeRequest::bmp8()
        .with_dither(dither)
        .preview(pixels, width, height, stop)
}

/// Preview of [`encode_bmp4`].
pub fn preview_bmp4(
    pixels: &[u8],
    width: u32,
    height: u32,
    aggressive: bool,
    stop: impl Stop,
) -> Result<Vec<u8>, BitmapError> {
    EncodeRequest::bmp4()
        .with_dither(aggressive)
        .preview(pixels, width, height, stop)
}
