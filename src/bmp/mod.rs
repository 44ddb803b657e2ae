//! BMP container: uncompressed encode at 24/8/4 bits and decode (internal).
//!
//! Use the top-level [`crate::encode_bmp24`], [`crate::decode_bmp`], etc.

mod decode;
mod encode;
mod utils;

pub use decode::BmpInfo;
pub(crate) use decode::DecodedBmp;
pub(crate) use encode::{encode_indexed, encode_rgb24, encoded_size};

use crate::error::BitmapError;
use crate::limits::Limits;
use enough::Stop;

/// Probe header fields without decoding pixels.
pub(crate) fn probe(data: &[u8]) -> Result<BmpInfo, BitmapError> {
    decode::parse_bmp_header(data)
}

/// Decode BMP data (output in RGB/RGBA byte order).
pub(crate) fn decode(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<DecodedBmp, BitmapError> {
    let info = decode::parse_bmp_header(data)?;
    if let Some(limits) = limits {
        limits.check(info.width, info.height)?;
        limits.check_memory(decode::output_size(&info)?)?;
    }
    stop.check()?;
    let decoded = decode::decode_bmp_pixels(data, info, stop)?;
    tracing::debug!(
        width = decoded.info.width,
        height = decoded.info.height,
        bpp = decoded.info.bits_per_pixel,
        "decoded BMP"
    );
    Ok(decoded)
}
