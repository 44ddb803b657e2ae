//! Floyd-Steinberg error diffusion against a fixed palette.
//!
//! ```text
//!        X   7
//!    3   5   1     (/16)
//! ```
//!
//! Pixels are visited row-major, top to bottom, left to right. Each visible
//! pixel is replaced by its nearest palette color and the per-channel error
//! (current value minus chosen color) is pushed to the four neighbors that
//! have not been visited yet. Receivers are clamped to 0..=255 as soon as the
//! error lands. Transparent pixels neither change nor receive error.

use enough::Stop;

use crate::color::ColorDistance;
use crate::error::BitmapError;
use crate::palette::Matcher;
use crate::pixel::{Color, is_visible, rgba_len_usize};

/// Neighbor offsets `(dx, dy)` and weights in sixteenths.
pub const FLOYD_STEINBERG: [(isize, usize, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

/// Dither an RGBA buffer to the matcher's palette.
///
/// Returns a new buffer; `pixels` is left untouched. Visible pixels come out
/// as exact palette colors with their alpha preserved.
pub fn floyd_steinberg<D: ColorDistance>(
    pixels: &[u8],
    width: usize,
    height: usize,
    matcher: &Matcher<'_, D>,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    let len = rgba_len_usize(pixels, width, height)?;
    let mut work = pixels[..len].to_vec();

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        for x in 0..width {
            let off = (y * width + x) * 4;
            if !is_visible(&work[off..off + 4]) {
                continue;
            }
            let current = Color::from_rgba(&work[off..off + 4]);
            let chosen = matcher.nearest(current);
            let err = [
                i32::from(current.r) - i32::from(chosen.r),
                i32::from(current.g) - i32::from(chosen.g),
                i32::from(current.b) - i32::from(chosen.b),
            ];
            work[off] = chosen.r;
            work[off + 1] = chosen.g;
            work[off + 2] = chosen.b;

            if err != [0, 0, 0] {
                spread_error(&mut work, width, height, x, y, err);
            }
        }
    }

    Ok(work)
}

/// Push the quantization error of `(x, y)` onto its unprocessed neighbors.
///
/// Neighbors outside the image or below the alpha threshold get nothing.
fn spread_error(work: &mut [u8], width: usize, height: usize, x: usize, y: usize, err: [i32; 3]) {
    for &(dx, dy, weight) in &FLOYD_STEINBERG {
        let Some(nx) = x.checked_add_signed(dx).filter(|&nx| nx < width) else {
            continue;
        };
        let ny = y + dy;
        if ny >= height {
            continue;
        }
        let off = (ny * width + nx) * 4;
        if !is_visible(&work[off..off + 4]) {
            continue;
        }
        for c in 0..3 {
            work[off + c] = diffuse(work[off + c], err[c], weight);
        }
    }
}

/// Add `err * weight / 16` to a channel, clamped to 0..=255 and then rounded
/// to the nearest byte with halves going away from zero. The fraction lost to
/// rounding is not carried forward.
#[inline]
fn diffuse(value: u8, err: i32, weight: i32) -> u8 {
    let v = f64::from(value) + f64::from(err) * f64::from(weight) / 16.0;
    v.clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use enough::Unstoppable;

    fn bw_palette() -> Palette {
        Palette::from_colors(vec![Color::BLACK, Color::new(255, 255, 255)])
    }

    fn gray_image(w: usize, h: usize, v: u8) -> Vec<u8> {
        (0..w * h).flat_map(|_| [v, v, v, 255]).collect()
    }

    #[test]
    fn weights_sum_to_one() {
        let total: i32 = FLOYD_STEINBERG.iter().map(|&(_, _, w)| w).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn input_is_not_mutated() {
        let p = bw_palette();
        let src = gray_image(4, 4, 100);
        let copy = src.clone();
        let out = floyd_steinberg(&src, 4, 4, &p.matcher(), &Unstoppable).unwrap();
        assert_eq!(src, copy);
        assert_ne!(out, src);
    }

    #[test]
    fn outputs_only_palette_colors() {
        let p = bw_palette();
        let src = gray_image(8, 8, 77);
        let out = floyd_steinberg(&src, 8, 8, &p.matcher(), &Unstoppable).unwrap();
        for px in out.chunks_exact(4) {
            let c = Color::from_rgba(px);
            assert!(p.colors().contains(&c), "{c:?} not in palette");
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn mid_gray_mixes_black_and_white() {
        let p = bw_palette();
        let (w, h) = (16, 16);
        let src = gray_image(w, h, 128);
        let out = floyd_steinberg(&src, w, h, &p.matcher(), &Unstoppable).unwrap();
        let white = out.chunks_exact(4).filter(|px| px[0] == 255).count();
        let ratio = white as f64 / (w * h) as f64;
        assert!((ratio - 0.5).abs() < 0.1, "white ratio {ratio}");
    }

    #[test]
    fn first_pixel_error_goes_right() {
        // 2x1: first pixel 100 -> black, error 100 * 7/16 = 43.75 -> 44 added.
        let p = Palette::from_colors(vec![Color::BLACK, Color::new(200, 200, 200)]);
        let src = [100, 100, 100, 255, 0, 0, 0, 255];
        let out = floyd_steinberg(&src, 2, 1, &p.matcher(), &Unstoppable).unwrap();
        assert_eq!(&out[0..3], &[0, 0, 0]);
        // 44 is still closer to black.
        assert_eq!(&out[4..7], &[0, 0, 0]);
    }

    #[test]
    fn transparent_pixels_untouched() {
        let p = bw_palette();
        let src = [
            100, 100, 100, 255, 50, 60, 70, 0, //
            200, 10, 10, 127, 90, 90, 90, 255,
        ];
        let out = floyd_steinberg(&src, 2, 2, &p.matcher(), &Unstoppable).unwrap();
        assert_eq!(&out[4..8], &[50, 60, 70, 0]);
        assert_eq!(&out[8..12], &[200, 10, 10, 127]);
    }

    #[test]
    fn diffuse_clamps_immediately() {
        assert_eq!(diffuse(250, 100, 7), 255);
        assert_eq!(diffuse(5, -100, 7), 0);
        assert_eq!(diffuse(10, 16, 1), 11);
        // 10.5 and 9.5 both round away from zero.
        assert_eq!(diffuse(10, 8, 1), 11);
        assert_eq!(diffuse(10, -8, 1), 10);
        assert_eq!(diffuse(10, 4, 1), 10);
    }

    #[test]
    fn error_shares_per_neighbor() {
        // 3x2 flat image, error of (16, 32, -16) leaving (1, 0).
        let mut work = gray_image(3, 2, 100);
        spread_error(&mut work, 3, 2, 1, 0, [16, 32, -16]);
        let rgb = |x: usize, y: usize| {
            let off = (y * 3 + x) * 4;
            [work[off], work[off + 1], work[off + 2]]
        };
        assert_eq!(rgb(0, 0), [100, 100, 100]);
        assert_eq!(rgb(1, 0), [100, 100, 100]);
        assert_eq!(rgb(2, 0), [107, 114, 93]); // 7/16 right
        assert_eq!(rgb(0, 1), [103, 106, 97]); // 3/16 below left
        assert_eq!(rgb(1, 1), [105, 110, 95]); // 5/16 below
        assert_eq!(rgb(2, 1), [101, 102, 99]); // 1/16 below right
    }

    #[test]
    fn error_skips_edges_and_transparent_neighbors() {
        // Spreading from the last column loses the right-hand shares.
        let mut work = gray_image(2, 2, 100);
        work[2 * 4 + 3] = 0; // (0, 1) transparent
        spread_error(&mut work, 2, 2, 1, 0, [16, 16, 16]);
        assert_eq!(&work[0..4], &[100, 100, 100, 255]);
        assert_eq!(&work[8..12], &[100, 100, 100, 0]);
        assert_eq!(&work[12..16], &[105, 105, 105, 255]);
    }
}
