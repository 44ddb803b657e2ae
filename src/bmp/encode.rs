//! BMP encoder: uncompressed top-down 24-bit RGB and 8/4-bit paletted.

use enough::Stop;

use crate::error::BitmapError;
use crate::palette::Palette;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const HEADER_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
/// 72 DPI in pixels per meter.
const PIXELS_PER_METER: u32 = 2835;

/// Bytes per row for `bpp` bits per pixel, padded to a 4-byte boundary.
pub(crate) fn row_stride(width: usize, bpp: u16) -> Option<usize> {
    width
        .checked_mul(usize::from(bpp))
        .and_then(|bits| bits.checked_add(31))
        .map(|bits| bits / 32 * 4)
}

/// Sizes of the pieces of one BMP file.
struct Layout {
    row_stride: usize,
    pixel_data_size: usize,
    data_offset: usize,
    file_size: usize,
}

impl Layout {
    fn new(width: u32, height: u32, bpp: u16, palette_len: usize) -> Result<Self, BitmapError> {
        let too_large = || BitmapError::DimensionsTooLarge { width, height };
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(too_large());
        }
        let row_stride = row_stride(width as usize, bpp).ok_or_else(too_large)?;
        let pixel_data_size = row_stride
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        let data_offset = HEADER_SIZE + palette_len * 4;
        let file_size = pixel_data_size
            .checked_add(data_offset)
            .filter(|&size| size <= u32::MAX as usize)
            .ok_or_else(too_large)?;
        Ok(Self {
            row_stride,
            pixel_data_size,
            data_offset,
            file_size,
        })
    }
}

/// Total file size for an encode, without encoding.
pub(crate) fn encoded_size(
    width: u32,
    height: u32,
    bpp: u16,
    palette_len: usize,
) -> Result<usize, BitmapError> {
    Layout::new(width, height, bpp, palette_len).map(|l| l.file_size)
}

/// Encode RGBA pixels as 24-bit BMP. Alpha is dropped without gating.
pub(crate) fn encode_rgb24(
    pixels: &[u8],
    width: u32,
    height: u32,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    let layout = Layout::new(width, height, 24, 0)?;
    let w = width as usize;

    let mut out = Vec::with_capacity(layout.file_size);
    write_bmp_header(&mut out, &layout, width, height, 24, 0);

    let pad_bytes = layout.row_stride - w * 3;
    for (row_idx, row) in pixels.chunks_exact((w * 4).max(1)).take(height as usize).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        for px in row.chunks_exact(4) {
            out.push(px[2]);
            out.push(px[1]);
            out.push(px[0]);
        }
        out.extend(core::iter::repeat_n(0u8, pad_bytes));
    }

    debug_assert_eq!(out.len(), layout.file_size);
    Ok(out)
}

/// Encode palette indices as an 8-bit or 4-bit BMP.
///
/// At 4 bits, even columns go in the high nibble and odd columns in the low
/// nibble; an odd width leaves the last low nibble zero.
pub(crate) fn encode_indexed(
    indices: &[u8],
    palette: &Palette,
    width: u32,
    height: u32,
    bpp: u16,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    if bpp != 8 && bpp != 4 {
        return Err(BitmapError::UnsupportedVariant(format!(
            "cannot encode {bpp}-bit paletted BMP"
        )));
    }
    let layout = Layout::new(width, height, bpp, palette.len())?;
    let w = width as usize;

    let mut out = Vec::with_capacity(layout.file_size);
    let colors = palette.len() as u32;
    write_bmp_header(&mut out, &layout, width, height, bpp, colors);

    for c in palette.colors() {
        out.extend_from_slice(&[c.b, c.g, c.r, 0]);
    }

    for (row_idx, row) in indices.chunks_exact(w.max(1)).take(height as usize).enumerate() {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        let start = out.len();
        if bpp == 8 {
            out.extend_from_slice(row);
        } else {
            out.extend(
                row.chunks(2)
                    .map(|pair| (pair[0] & 0x0f) << 4 | pair.get(1).map_or(0, |lo| lo & 0x0f)),
            );
        }
        out.resize(start + layout.row_stride, 0);
    }

    debug_assert_eq!(out.len(), layout.file_size);
    Ok(out)
}

fn write_bmp_header(
    out: &mut Vec<u8>,
    layout: &Layout,
    width: u32,
    height: u32,
    bpp: u16,
    colors: u32,
) {
    // File header (14 bytes)
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(layout.file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(&(layout.data_offset as u32).to_le_bytes());

    // DIB header (BITMAPINFOHEADER, 40 bytes)
    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(-(height as i32)).to_le_bytes()); // negative = top-down
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression (BI_RGB)
    out.extend_from_slice(&(layout.pixel_data_size as u32).to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes()); // h resolution
    out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes()); // v resolution
    out.extend_from_slice(&colors.to_le_bytes()); // colors used
    out.extend_from_slice(&colors.to_le_bytes()); // important colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Color;
    use enough::Unstoppable;

    fn u32_at(data: &[u8], off: usize) -> u32 {
        u32::from_le_bytes(data[off..off + 4].try_into().unwrap())
    }

    fn i32_at(data: &[u8], off: usize) -> i32 {
        i32::from_le_bytes(data[off..off + 4].try_into().unwrap())
    }

    #[test]
    fn strides() {
        assert_eq!(row_stride(1, 24), Some(4));
        assert_eq!(row_stride(3, 24), Some(12));
        assert_eq!(row_stride(5, 8), Some(8));
        assert_eq!(row_stride(4, 8), Some(4));
        assert_eq!(row_stride(1, 4), Some(4));
        assert_eq!(row_stride(9, 4), Some(8));
        assert_eq!(row_stride(0, 24), Some(0));
    }

    #[test]
    fn header_fields() {
        let out = encode_rgb24(&[1, 2, 3, 4, 5, 6, 7, 8], 2, 1, &Unstoppable).unwrap();
        assert_eq!(&out[0..2], b"BM");
        assert_eq!(u32_at(&out, 2) as usize, out.len());
        assert_eq!(u32_at(&out, 6), 0);
        assert_eq!(u32_at(&out, 10), 54);
        assert_eq!(u32_at(&out, 14), 40);
        assert_eq!(i32_at(&out, 18), 2);
        assert_eq!(i32_at(&out, 22), -1);
        assert_eq!(u16::from_le_bytes([out[26], out[27]]), 1);
        assert_eq!(u16::from_le_bytes([out[28], out[29]]), 24);
        assert_eq!(u32_at(&out, 30), 0);
        assert_eq!(u32_at(&out, 34), 8);
        assert_eq!(u32_at(&out, 38), 2835);
        assert_eq!(u32_at(&out, 42), 2835);
        assert_eq!(u32_at(&out, 46), 0);
        assert_eq!(&out[54..], &[3, 2, 1, 7, 6, 5, 0, 0]);
    }

    #[test]
    fn four_bit_packing_odd_width() {
        let palette = Palette::from_colors(vec![Color::BLACK; 16]);
        let out = encode_indexed(&[1, 2, 3, 15, 14, 13], &palette, 3, 2, 4, &Unstoppable).unwrap();
        let data = u32_at(&out, 10) as usize;
        assert_eq!(data, 54 + 64);
        assert_eq!(&out[data..data + 4], &[0x12, 0x30, 0, 0]);
        assert_eq!(&out[data + 4..data + 8], &[0xfe, 0xd0, 0, 0]);
    }

    #[test]
    fn eight_bit_palette_layout() {
        let mut colors = vec![Color::BLACK; 256];
        colors[1] = Color::new(10, 20, 30);
        let palette = Palette::from_colors(colors);
        let out = encode_indexed(&[1, 0, 1], &palette, 3, 1, 8, &Unstoppable).unwrap();
        assert_eq!(u32_at(&out, 10), 54 + 1024);
        assert_eq!(u32_at(&out, 46), 256);
        assert_eq!(u32_at(&out, 50), 256);
        assert_eq!(&out[58..62], &[30, 20, 10, 0]);
        assert_eq!(&out[1078..], &[1, 0, 1, 0]);
    }

    #[test]
    fn rejects_unsupported_depth() {
        let palette = Palette::from_colors(vec![Color::BLACK; 2]);
        assert!(matches!(
            encode_indexed(&[0], &palette, 1, 1, 1, &Unstoppable),
            Err(BitmapError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn rejects_height_beyond_i32() {
        assert!(matches!(
            encoded_size(1, u32::MAX, 24, 0),
            Err(BitmapError::DimensionsTooLarge { .. })
        ));
    }
}
