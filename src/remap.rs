//! Pixel requantization: RGBA buffer to palette indices and back.
//!
//! The encoder and the preview share [`quantize_indices`], so a preview is
//! by construction what a decoder reads back from the BMP.

use enough::Stop;

use crate::color::ColorDistance;
use crate::dither::floyd_steinberg;
use crate::error::BitmapError;
use crate::palette::{Matcher, Palette};
use crate::pixel::{Color, is_visible, rgba_len_usize};

/// One palette index per pixel. Transparent pixels get index 0.
pub fn remap_indices<D: ColorDistance>(
    pixels: &[u8],
    width: usize,
    height: usize,
    matcher: &Matcher<'_, D>,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    let len = rgba_len_usize(pixels, width, height)?;
    let mut indices = Vec::with_capacity(width * height);
    for (row_idx, row) in pixels[..len]
        .chunks_exact((width * 4).max(1))
        .enumerate()
    {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        indices.extend(row.chunks_exact(4).map(|px| {
            if is_visible(px) {
                matcher.index_of(Color::from_rgba(px))
            } else {
                0
            }
        }));
    }
    Ok(indices)
}

/// Palette indices, optionally after Floyd-Steinberg dithering.
pub fn quantize_indices<D: ColorDistance>(
    pixels: &[u8],
    width: usize,
    height: usize,
    matcher: &Matcher<'_, D>,
    dither: bool,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    if dither {
        let dithered = floyd_steinberg(pixels, width, height, matcher, stop)?;
        remap_indices(&dithered, width, height, matcher, stop)
    } else {
        remap_indices(pixels, width, height, matcher, stop)
    }
}

/// Expand indices back to RGBA, keeping the source alpha.
///
/// Transparent pixels become black (palette slot 0).
pub fn expand_indices(indices: &[u8], source: &[u8], palette: &Palette) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len() * 4);
    for (&index, px) in indices.iter().zip(source.chunks_exact(4)) {
        let c = if is_visible(px) {
            palette.color(index)
        } else {
            Color::BLACK
        };
        out.extend_from_slice(&[c.r, c.g, c.b, px[3]]);
    }
    out
}

/// Requantize an RGBA buffer to the palette without dithering.
///
/// Visible pixels take their nearest palette color, transparent pixels
/// become `(0, 0, 0)`; alpha passes through.
pub fn requantize<D: ColorDistance>(
    pixels: &[u8],
    width: usize,
    height: usize,
    matcher: &Matcher<'_, D>,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    let indices = remap_indices(pixels, width, height, matcher, stop)?;
    Ok(expand_indices(&indices, pixels, matcher.palette()))
}
