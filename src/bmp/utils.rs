//! Sub-byte index unpacking for paletted BMP rows.

/// Unpack `out.len()` palette indices from a packed row at `depth` bits per
/// pixel (1, 4 or 8). The most significant bits hold the leftmost pixel.
pub(crate) fn unpack_indices(depth: u16, row: &[u8], out: &mut [u8]) {
    match depth {
        8 => out.copy_from_slice(&row[..out.len()]),
        4 => {
            let tail = out.len() / 2;
            let mut pairs = out.chunks_exact_mut(2);
            for (dst, &byte) in (&mut pairs).zip(row) {
                dst[0] = byte >> 4;
                dst[1] = byte & 0x0f;
            }
            let rest = pairs.into_remainder();
            if let Some(last) = rest.first_mut() {
                *last = row[tail] >> 4;
            }
        }
        1 => {
            for (x, dst) in out.iter_mut().enumerate() {
                let byte = row[x / 8];
                *dst = (byte >> (7 - (x % 8))) & 0x01;
            }
        }
        _ => out.fill(0),
    }
}

/// Packed row bytes needed for `width` pixels at `depth` bits, before padding.
pub(crate) fn packed_len(width: usize, depth: u16) -> usize {
    (width * usize::from(depth)).div_ceil(8)
}
