//! # zenbmpquant
//!
//! Palette quantizer and BMP encoder for RGBA pixel buffers.
//!
//! ## Pipeline
//!
//! - **24-bit**: pixels are written as BGR rows. Lossless for RGB; alpha is
//!   dropped and not gated.
//! - **8-bit / 4-bit**: a 256- or 16-color palette is built with median cut
//!   over the opaque pixels, every pixel is mapped to its nearest entry
//!   (luminance-weighted RGB distance), optionally after Floyd-Steinberg
//!   error diffusion. Pixels with alpha below 128 become index 0, which is
//!   always black.
//!
//! Every encode has a matching preview that returns the RGBA a decoder will
//! read back, so a UI can show the result before saving it.
//!
//! ## Non-Goals
//!
//! - RLE or bitfield compression
//! - Color spaces other than sRGB
//! - Streaming / incremental encoding
//!
//! ## Usage
//!
//! ```
//! use zenbmpquant::{DecodeRequest, EncodeRequest, Unstoppable};
//!
//! // 2x2 RGBA, one pixel transparent.
//! let pixels = [
//!     255, 0, 0, 255, 0, 255, 0, 255,
//!     0, 0, 255, 255, 9, 9, 9, 0,
//! ];
//!
//! let request = EncodeRequest::bmp4().with_dither(true);
//! let bmp = request.encode(&pixels, 2, 2, Unstoppable)?;
//! let preview = request.preview(&pixels, 2, 2, Unstoppable)?;
//!
//! let decoded = DecodeRequest::new(bmp.as_bytes()).decode(Unstoppable)?;
//! for (px, shown) in decoded.pixels().chunks(3).zip(preview.chunks(4)) {
//!     assert_eq!(px, &shown[..3]);
//! }
//! # Ok::<(), zenbmpquant::BitmapError>(())
//! ```

#![forbid(unsafe_code)]

mod error;
mod limits;
mod pixel;

pub mod color;
pub mod dither;
pub mod median_cut;
pub mod palette;
pub mod remap;

mod bmp;
mod decode;
mod encode;

// Re-exports
pub use bmp::BmpInfo;
pub use color::{CieLab, ColorDistance, WeightedRgb};
pub use decode::{DecodeOutput, DecodeRequest, decode_bmp, decode_bmp_with_limits, probe_bmp};
pub use encode::{
    BmpDepth, EncodeRequest, EncodedBmp, encode_bmp4, encode_bmp8, encode_bmp24, preview_bmp4,
    preview_bmp8, preview_bmp24,
};
pub use enough::{Stop, Unstoppable};
pub use error::BitmapError;
pub use limits::Limits;
pub use median_cut::SplitStrategy;
pub use palette::{Matcher, Palette, PaletteSize, build_palette};
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::{ALPHA_THRESHOLD, Color, PixelLayout};
