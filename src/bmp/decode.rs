//! BMP decoder for uncompressed (BI_RGB) files.
//!
//! Accepts a BITMAPINFOHEADER or any later info header (V2..V5), 1/4/8-bit
//! paletted and 24/32-bit direct color, bottom-up or top-down rows. RLE and
//! bitfield compression are rejected.

use enough::Stop;

use super::encode::row_stride;
use super::utils::{packed_len, unpack_indices};
use crate::error::BitmapError;
use crate::pixel::{Color, PixelLayout};

const FILE_HEADER_SIZE: usize = 14;

/// Header fields of a BMP file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmpInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    /// Palette entries declared by the header (0 means the depth's default).
    pub colors_used: u32,
    /// Rows stored top to bottom (negative height field).
    pub top_down: bool,
    /// Byte offset of the first pixel row.
    pub data_offset: u32,
}

impl BmpInfo {
    /// Layout of the decoded output.
    pub fn output_layout(&self) -> PixelLayout {
        if self.bits_per_pixel == 32 {
            PixelLayout::Rgba8
        } else {
            PixelLayout::Rgb8
        }
    }

    pub fn is_paletted(&self) -> bool {
        self.bits_per_pixel <= 8
    }
}

/// Decoded pixels plus, for paletted files, the raw color table and indices.
pub(crate) struct DecodedBmp {
    pub info: BmpInfo,
    pub pixels: Vec<u8>,
    pub palette: Option<Vec<Color>>,
    pub indices: Option<Vec<u8>>,
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn bytes<const N: usize>(&self, off: usize) -> Result<[u8; N], BitmapError> {
        self.data
            .get(off..off + N)
            .and_then(|s| s.try_into().ok())
            .ok_or(BitmapError::UnexpectedEof)
    }

    fn u16_at(&self, off: usize) -> Result<u16, BitmapError> {
        self.bytes::<2>(off).map(u16::from_le_bytes)
    }

    fn u32_at(&self, off: usize) -> Result<u32, BitmapError> {
        self.bytes::<4>(off).map(u32::from_le_bytes)
    }

    fn i32_at(&self, off: usize) -> Result<i32, BitmapError> {
        self.bytes::<4>(off).map(i32::from_le_bytes)
    }
}

/// Parse the file and info headers.
pub(crate) fn parse_bmp_header(data: &[u8]) -> Result<BmpInfo, BitmapError> {
    let r = Reader { data };
    if r.bytes::<2>(0)? != *b"BM" {
        return Err(BitmapError::UnrecognizedFormat);
    }
    let data_offset = r.u32_at(10)?;
    let ihsize = r.u32_at(14)?;
    match ihsize {
        40 | 52 | 56 | 64 | 108 | 124 => {}
        12 | 16 => {
            return Err(BitmapError::UnsupportedVariant(format!(
                "OS/2 BMP info header ({ihsize} bytes)"
            )));
        }
        _ => {
            return Err(BitmapError::InvalidHeader(format!(
                "unknown BMP info header size: {ihsize}"
            )));
        }
    }

    let width = r.i32_at(18)?;
    let height = r.i32_at(22)?;
    let planes = r.u16_at(26)?;
    let bpp = r.u16_at(28)?;
    let compression = r.u32_at(30)?;
    let colors_used = r.u32_at(46)?;

    if width <= 0 {
        return Err(BitmapError::InvalidHeader(format!(
            "BMP width must be positive, got {width}"
        )));
    }
    if height == 0 {
        return Err(BitmapError::InvalidHeader("BMP height is zero".into()));
    }
    if planes != 1 {
        return Err(BitmapError::InvalidHeader(format!(
            "BMP planes field is {planes}, expected 1"
        )));
    }
    if !matches!(bpp, 1 | 4 | 8 | 24 | 32) {
        return Err(BitmapError::UnsupportedVariant(format!(
            "{bpp}-bit BMP"
        )));
    }
    if compression != 0 {
        return Err(BitmapError::UnsupportedVariant(format!(
            "compressed BMP (compression type {compression})"
        )));
    }
    if bpp <= 8 && colors_used > 1 << bpp {
        return Err(BitmapError::InvalidHeader(format!(
            "{colors_used} palette entries for a {bpp}-bit BMP"
        )));
    }

    Ok(BmpInfo {
        width: width as u32,
        height: height.unsigned_abs(),
        bits_per_pixel: bpp,
        colors_used,
        top_down: height < 0,
        data_offset,
    })
}

fn read_palette(data: &[u8], info: &BmpInfo) -> Result<Vec<Color>, BitmapError> {
    let r = Reader { data };
    let ihsize = r.u32_at(14)? as usize;
    let count = if info.colors_used == 0 {
        1usize << info.bits_per_pixel
    } else {
        info.colors_used as usize
    };
    let start = FILE_HEADER_SIZE + ihsize;
    let end = start + count * 4;
    if end > info.data_offset as usize {
        return Err(BitmapError::InvalidHeader(
            "BMP palette overlaps pixel data".into(),
        ));
    }
    let table = data.get(start..end).ok_or(BitmapError::UnexpectedEof)?;
    Ok(table
        .chunks_exact(4)
        .map(|e| Color::new(e[2], e[1], e[0]))
        .collect())
}

/// Size of the decoded RGB/RGBA buffer.
pub(crate) fn output_size(info: &BmpInfo) -> Result<usize, BitmapError> {
    (info.width as usize)
        .checked_mul(info.height as usize)
        .and_then(|n| n.checked_mul(info.output_layout().bytes_per_pixel()))
        .ok_or(BitmapError::DimensionsTooLarge {
            width: info.width,
            height: info.height,
        })
}

/// Decode pixels into RGB8 (or RGBA8 for 32-bit) in top-down order.
pub(crate) fn decode_bmp_pixels(
    data: &[u8],
    info: BmpInfo,
    stop: &dyn Stop,
) -> Result<DecodedBmp, BitmapError> {
    let w = info.width as usize;
    let h = info.height as usize;
    let too_large = || BitmapError::DimensionsTooLarge {
        width: info.width,
        height: info.height,
    };
    let stride = row_stride(w, info.bits_per_pixel).ok_or_else(too_large)?;
    let start = info.data_offset as usize;
    let end = stride
        .checked_mul(h)
        .and_then(|n| n.checked_add(start))
        .ok_or_else(too_large)?;
    let pixel_data = data.get(start..end).ok_or(BitmapError::UnexpectedEof)?;

    let layout = info.output_layout();
    let bpp_out = layout.bytes_per_pixel();
    let mut pixels = vec![0u8; output_size(&info)?];

    let palette = if info.is_paletted() {
        Some(read_palette(data, &info)?)
    } else {
        None
    };
    let mut indices = palette.as_ref().map(|_| vec![0u8; w * h]);

    let used = packed_len(w, info.bits_per_pixel);
    for y in 0..h {
        if y % 16 == 0 {
            stop.check()?;
        }
        let src_row = if info.top_down { y } else { h - 1 - y };
        let src = &pixel_data[src_row * stride..src_row * stride + used];
        let dst = &mut pixels[y * w * bpp_out..(y + 1) * w * bpp_out];

        match (&palette, indices.as_mut()) {
            (Some(table), Some(indices)) => {
                let row_indices = &mut indices[y * w..(y + 1) * w];
                unpack_indices(info.bits_per_pixel, src, row_indices);
                for (px, &i) in dst.chunks_exact_mut(3).zip(row_indices.iter()) {
                    let c = table.get(usize::from(i)).ok_or_else(|| {
                        BitmapError::InvalidData(format!(
                            "palette index {i} out of range ({} entries)",
                            table.len()
                        ))
                    })?;
                    px.copy_from_slice(&[c.r, c.g, c.b]);
                }
            }
            _ if info.bits_per_pixel == 24 => {
                for (px, bgr) in dst.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
                    px.copy_from_slice(&[bgr[2], bgr[1], bgr[0]]);
                }
            }
            _ => {
                for (px, bgra) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    px.copy_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
                }
            }
        }
    }

    Ok(DecodedBmp {
        info,
        pixels,
        palette,
        indices,
    })
}
