#![no_main]
use libfuzzer_sys::fuzz_target;
use zenbmpquant::*;

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the geometry and options, the rest is RGBA.
    let [w, flags, rest @ ..] = data else {
        return;
    };
    let width = u32::from(*w % 32) + 1;
    let height = (rest.len() / 4) as u32 / width;
    if height == 0 || height > 64 {
        return;
    }
    let pixels = &rest[..(width * height * 4) as usize];

    let depth = match flags % 3 {
        0 => BmpDepth::Rgb24,
        1 => BmpDepth::Indexed8,
        _ => BmpDepth::Indexed4,
    };
    let request = EncodeRequest::new(depth).with_dither(flags & 0x80 != 0);

    let encoded = request
        .encode(pixels, width, height, enough::Unstoppable)
        .expect("in-bounds input must encode");
    let preview = request
        .preview(pixels, width, height, enough::Unstoppable)
        .expect("in-bounds input must preview");
    let decoded = decode_bmp(encoded.as_bytes(), enough::Unstoppable)
        .expect("encoder output must decode");

    assert_eq!((decoded.width, decoded.height), (width, height));
    for (shown, got) in preview.chunks_exact(4).zip(decoded.pixels().chunks_exact(3)) {
        assert_eq!(&shown[..3], got, "preview differs from decoded pixels");
    }
});
