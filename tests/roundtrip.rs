use enough::{Stop, StopReason, Unstoppable};
use zenbmpquant::*;

fn u16_at(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes(data[off..off + 2].try_into().unwrap())
}

fn u32_at(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(data[off..off + 4].try_into().unwrap())
}

fn i32_at(data: &[u8], off: usize) -> i32 {
    i32::from_le_bytes(data[off..off + 4].try_into().unwrap())
}

/// Four saturated colors plus a transparent pixel, repeated.
fn mixed_rgba(w: usize, h: usize) -> Vec<u8> {
    let tiles: [[u8; 4]; 5] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [200, 180, 20, 255],
        [90, 90, 90, 0],
    ];
    let mut pixels = Vec::with_capacity(w * h * 4);
    for i in 0..w * h {
        pixels.extend_from_slice(&tiles[i % tiles.len()]);
    }
    pixels
}

struct Cancelled;

impl Stop for Cancelled {
    fn check(&self) -> Result<(), StopReason> {
        Err(StopReason::Cancelled)
    }
}

#[test]
fn red_pixel_bmp24() {
    let encoded = encode_bmp24(&[255, 0, 0, 255], 1, 1, Unstoppable).unwrap();
    let data = encoded.as_bytes();
    assert_eq!(data.len(), 58);
    assert_eq!(&data[0..2], b"BM");
    assert_eq!(u32_at(data, 2), 58);
    assert_eq!(u32_at(data, 10), 54);
    assert_eq!(u32_at(data, 14), 40);
    assert_eq!(i32_at(data, 18), 1);
    assert_eq!(i32_at(data, 22), -1, "rows are stored top-down");
    assert_eq!(u16_at(data, 26), 1);
    assert_eq!(u16_at(data, 28), 24);
    assert_eq!(u32_at(data, 30), 0);
    assert_eq!(u32_at(data, 38), 2835);
    assert_eq!(u32_at(data, 42), 2835);
    assert_eq!(&data[54..58], &[0, 0, 255, 0]);
    assert_eq!(encoded.mime_type(), "image/bmp");
    assert_eq!(encoded.depth(), BmpDepth::Rgb24);
}

#[test]
fn uniform_gray_bmp8() {
    let pixels = [128u8, 128, 128, 255].repeat(4);
    let encoded = encode_bmp8(&pixels, 2, 2, false, Unstoppable).unwrap();
    let data = encoded.as_bytes();
    assert_eq!(u32_at(data, 10), 54 + 256 * 4);
    assert_eq!(u32_at(data, 46), 256);

    let decoded = decode_bmp(data, Unstoppable).unwrap();
    let indices = decoded.indices().unwrap();
    assert_eq!(indices.len(), 4);
    assert!(indices.iter().all(|&i| i == indices[0]));
    let palette = decoded.palette().unwrap();
    assert_eq!(palette[usize::from(indices[0])], Color::new(128, 128, 128));
    assert_eq!(palette[0], Color::BLACK);
    assert_eq!(decoded.pixels(), &[128u8; 12][..]);
}

#[test]
fn indexed_header_fields() {
    let pixels = mixed_rgba(5, 3);
    for (depth, bpp, colors, stride) in [
        (BmpDepth::Indexed8, 8u16, 256u32, 8usize),
        (BmpDepth::Indexed4, 4, 16, 4),
    ] {
        let encoded = EncodeRequest::new(depth)
            .encode(&pixels, 5, 3, Unstoppable)
            .unwrap();
        let data = encoded.as_bytes();
        let offset = 54 + colors as usize * 4;
        assert_eq!(data.len(), offset + stride * 3, "{depth:?}");
        assert_eq!(u32_at(data, 2) as usize, data.len());
        assert_eq!(u32_at(data, 10) as usize, offset);
        assert_eq!(i32_at(data, 22), -3);
        assert_eq!(u16_at(data, 28), bpp);
        assert_eq!(u32_at(data, 34) as usize, stride * 3);
        assert_eq!(u32_at(data, 46), colors);
        assert_eq!(u32_at(data, 50), colors);
        // Palette slot 0 is black with a zero reserved byte.
        assert_eq!(&data[54..58], &[0, 0, 0, 0]);
    }
}

#[test]
fn preview_matches_decoded_pixels() {
    let pixels = mixed_rgba(7, 5);
    for depth in [BmpDepth::Rgb24, BmpDepth::Indexed8, BmpDepth::Indexed4] {
        for dither in [false, true] {
            let request = EncodeRequest::new(depth).with_dither(dither);
            let encoded = request.encode(&pixels, 7, 5, Unstoppable).unwrap();
            let preview = request.preview(&pixels, 7, 5, Unstoppable).unwrap();
            let decoded = decode_bmp(encoded.as_bytes(), Unstoppable).unwrap();

            assert_eq!(preview.len(), pixels.len());
            for (i, (shown, got)) in preview
                .chunks_exact(4)
                .zip(decoded.pixels().chunks_exact(3))
                .enumerate()
            {
                assert_eq!(&shown[..3], got, "{depth:?} dither={dither} pixel {i}");
                assert_eq!(shown[3], pixels[i * 4 + 3], "alpha is preserved");
            }
        }
    }
}

#[test]
fn encode_with_preview_matches_separate_calls() {
    let pixels = mixed_rgba(6, 6);
    let request = EncodeRequest::bmp4().with_dither(true);
    let (encoded, preview) = request
        .encode_with_preview(&pixels, 6, 6, Unstoppable)
        .unwrap();
    assert_eq!(
        encoded,
        request.encode(&pixels, 6, 6, Unstoppable).unwrap()
    );
    assert_eq!(
        preview,
        request.preview(&pixels, 6, 6, Unstoppable).unwrap()
    );
}

#[test]
fn transparent_pixels_map_to_index_zero() {
    let pixels = [
        255, 255, 255, 255, //
        250, 20, 20, 127, // below threshold
        20, 250, 20, 128, // at threshold: visible
        0, 0, 0, 0,
    ];
    for depth in [BmpDepth::Indexed8, BmpDepth::Indexed4] {
        let request = EncodeRequest::new(depth);
        let encoded = request.encode(&pixels, 4, 1, Unstoppable).unwrap();
        let decoded = decode_bmp(encoded.as_bytes(), Unstoppable).unwrap();
        let indices = decoded.indices().unwrap();
        assert_eq!(indices[1], 0);
        assert_eq!(indices[3], 0);
        assert_ne!(indices[0], 0);
        assert_ne!(indices[2], 0);
        assert_eq!(decoded.rgb_at(2, 0), Some(Color::new(20, 250, 20)));

        let preview = request.preview(&pixels, 4, 1, Unstoppable).unwrap();
        assert_eq!(&preview[4..8], &[0, 0, 0, 127]);
        assert_eq!(&preview[12..16], &[0, 0, 0, 0]);
    }
}

#[test]
fn bmp24_keeps_rgb_of_transparent_pixels() {
    let pixels = [10u8, 20, 30, 0, 40, 50, 60, 255, 70, 80, 90, 1];
    let encoded = encode_bmp24(&pixels, 3, 1, Unstoppable).unwrap();
    let decoded = decode_bmp(encoded.as_bytes(), Unstoppable).unwrap();
    assert_eq!(decoded.layout, PixelLayout::Rgb8);
    assert_eq!(
        decoded.pixels(),
        &[10, 20, 30, 40, 50, 60, 70, 80, 90][..]
    );
    let preview = preview_bmp24(&pixels, 3, 1, Unstoppable).unwrap();
    assert_eq!(preview, pixels);
}

#[test]
fn bmp24_rows_are_padded() {
    // 3 px * 3 bytes = 9, padded to 12.
    let pixels = mixed_rgba(3, 2);
    let encoded = encode_bmp24(&pixels, 3, 2, Unstoppable).unwrap();
    let data = encoded.as_bytes();
    assert_eq!(data.len(), 54 + 12 * 2);
    assert_eq!(&data[54 + 9..54 + 12], &[0, 0, 0]);
    assert_eq!(&data[54 + 21..54 + 24], &[0, 0, 0]);
}

#[test]
fn bmp4_odd_width_packs_high_nibble_first() {
    let pixels = [
        255, 0, 0, 255, //
        0, 0, 255, 255, //
        255, 0, 0, 255,
    ];
    let encoded = encode_bmp4(&pixels, 3, 1, false, Unstoppable).unwrap();
    let data = encoded.as_bytes();
    let offset = 54 + 16 * 4;
    assert_eq!(data.len(), offset + 4);

    let decoded = decode_bmp(data, Unstoppable).unwrap();
    let idx = decoded.indices().unwrap();
    assert_eq!(data[offset], (idx[0] << 4) | idx[1]);
    assert_eq!(data[offset + 1], idx[2] << 4);
    assert_eq!(&data[offset + 2..offset + 4], &[0, 0]);
    assert_eq!(decoded.rgb_at(0, 0), Some(Color::new(255, 0, 0)));
    assert_eq!(decoded.rgb_at(1, 0), Some(Color::new(0, 0, 255)));
}

#[test]
fn palette_sizes_are_exact() {
    let pixels = mixed_rgba(4, 4);
    let bmp8 = encode_bmp8(&pixels, 4, 4, false, Unstoppable).unwrap();
    let bmp4 = encode_bmp4(&pixels, 4, 4, false, Unstoppable).unwrap();
    let p8 = decode_bmp(bmp8.as_bytes(), Unstoppable).unwrap();
    let p4 = decode_bmp(bmp4.as_bytes(), Unstoppable).unwrap();
    assert_eq!(p8.palette().unwrap().len(), 256);
    assert_eq!(p4.palette().unwrap().len(), 16);

    let built = build_palette(&pixels, PaletteSize::Colors16);
    assert_eq!(built.colors(), p4.palette().unwrap());
}

#[test]
fn dithering_never_mutates_input() {
    let pixels: Vec<u8> = (0..8 * 8)
        .flat_map(|i| [(i * 4) as u8, (255 - i * 3) as u8, (i * 7 % 256) as u8, 255])
        .collect();
    let copy = pixels.clone();
    let _ = encode_bmp4(&pixels, 8, 8, true, Unstoppable).unwrap();
    let _ = preview_bmp8(&pixels, 8, 8, true, Unstoppable).unwrap();
    assert_eq!(pixels, copy);
}

#[test]
fn output_is_deterministic() {
    let pixels = mixed_rgba(9, 4);
    let a = encode_bmp8(&pixels, 9, 4, true, Unstoppable).unwrap();
    let b = encode_bmp8(&pixels, 9, 4, true, Unstoppable).unwrap();
    assert_eq!(a, b);
    let a = preview_bmp4(&pixels, 9, 4, true, Unstoppable).unwrap();
    let b = preview_bmp4(&pixels, 9, 4, true, Unstoppable).unwrap();
    assert_eq!(a, b);
}

#[test]
fn short_buffer_rejected() {
    let err = encode_bmp24(&[0u8; 15], 2, 2, Unstoppable).unwrap_err();
    assert!(matches!(
        err,
        BitmapError::BufferTooSmall {
            needed: 16,
            actual: 15
        }
    ));
}

#[test]
fn limits_enforced() {
    let pixels = mixed_rgba(4, 4);
    let limits = Limits::none().with_max_width(3);
    let err = EncodeRequest::bmp8()
        .with_limits(&limits)
        .encode(&pixels, 4, 4, Unstoppable)
        .unwrap_err();
    assert!(matches!(err, BitmapError::LimitExceeded(_)));

    let encoded = encode_bmp8(&pixels, 4, 4, false, Unstoppable).unwrap();
    let limits = Limits::none().with_max_pixels(15);
    let err = decode_bmp_with_limits(encoded.as_bytes(), &limits, Unstoppable).unwrap_err();
    assert!(matches!(err, BitmapError::LimitExceeded(_)));

    let limits = Limits::none().with_max_pixels(16);
    assert!(decode_bmp_with_limits(encoded.as_bytes(), &limits, Unstoppable).is_ok());
}

#[test]
fn cancellation_propagates() {
    let pixels = mixed_rgba(4, 4);
    for depth in [BmpDepth::Rgb24, BmpDepth::Indexed8, BmpDepth::Indexed4] {
        let err = EncodeRequest::new(depth)
            .with_dither(true)
            .encode(&pixels, 4, 4, Cancelled)
            .unwrap_err();
        assert!(matches!(err, BitmapError::Cancelled(_)), "{depth:?}");
    }
    let encoded = encode_bmp24(&pixels, 4, 4, Unstoppable).unwrap();
    let err = decode_bmp(encoded.as_bytes(), Cancelled).unwrap_err();
    assert!(matches!(err, BitmapError::Cancelled(_)));
}

#[test]
fn probe_reads_header_only() {
    let pixels = mixed_rgba(5, 2);
    let encoded = encode_bmp4(&pixels, 5, 2, false, Unstoppable).unwrap();
    // Truncate the pixel data; the header is still readable.
    let info = probe_bmp(&encoded.as_bytes()[..60]).unwrap();
    assert_eq!(info.width, 5);
    assert_eq!(info.height, 2);
    assert_eq!(info.bits_per_pixel, 4);
    assert_eq!(info.colors_used, 16);
    assert!(info.top_down);
    assert!(info.is_paletted());
    assert_eq!(info.data_offset, 54 + 64);

    let err = decode_bmp(&encoded.as_bytes()[..60], Unstoppable).unwrap_err();
    assert!(matches!(err, BitmapError::UnexpectedEof));
}

#[test]
fn zero_sized_image() {
    let encoded = encode_bmp8(&[], 0, 0, true, Unstoppable).unwrap();
    assert_eq!(encoded.len(), 54 + 1024);
    assert!(preview_bmp8(&[], 0, 0, true, Unstoppable).unwrap().is_empty());
}
