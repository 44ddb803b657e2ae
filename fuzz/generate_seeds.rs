#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn header(width: i32, height: i32, bpp: u16, colors: u32, data_len: u32) -> Vec<u8> {
    let offset = 54 + colors * 4;
    let mut bmp = Vec::new();
    bmp.extend_from_slice(b"BM");
    bmp.extend_from_slice(&(offset + data_len).to_le_bytes()); // file size
    bmp.extend_from_slice(&[0; 4]);
    bmp.extend_from_slice(&offset.to_le_bytes()); // data offset
    bmp.extend_from_slice(&40u32.to_le_bytes()); // DIB header size
    bmp.extend_from_slice(&width.to_le_bytes());
    bmp.extend_from_slice(&height.to_le_bytes());
    bmp.extend_from_slice(&1u16.to_le_bytes()); // planes
    bmp.extend_from_slice(&bpp.to_le_bytes());
    bmp.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    bmp.extend_from_slice(&data_len.to_le_bytes());
    bmp.extend_from_slice(&2835u32.to_le_bytes());
    bmp.extend_from_slice(&2835u32.to_le_bytes());
    bmp.extend_from_slice(&colors.to_le_bytes());
    bmp.extend_from_slice(&colors.to_le_bytes());
    bmp
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    // 1x1 24-bit, top-down red
    let mut bmp = header(1, -1, 24, 0, 4);
    bmp.extend_from_slice(&[0, 0, 255, 0]);
    fs::write(format!("{dir}/bmp24_1x1.bmp"), bmp).unwrap();

    // 2x2 32-bit, bottom-up
    let mut bmp = header(2, 2, 32, 0, 16);
    bmp.extend_from_slice(&[255, 0, 0, 255, 0, 255, 0, 128, 0, 0, 255, 0, 9, 9, 9, 255]);
    fs::write(format!("{dir}/bmp32_2x2.bmp"), bmp).unwrap();

    // 3x2 4-bit, two-entry palette, odd width
    let mut bmp = header(3, -2, 4, 2, 8);
    bmp.extend_from_slice(&[0, 0, 0, 0, 255, 255, 255, 0]);
    bmp.extend_from_slice(&[0x10, 0x10, 0, 0, 0x01, 0x00, 0, 0]);
    fs::write(format!("{dir}/bmp4_3x2.bmp"), bmp).unwrap();

    // 9x1 1-bit, full default palette
    let mut bmp = header(9, 1, 1, 2, 4);
    bmp.extend_from_slice(&[0, 0, 0, 0, 0, 0, 255, 0]);
    bmp.extend_from_slice(&[0b1011_0010, 0b1000_0000, 0, 0]);
    fs::write(format!("{dir}/bmp1_9x1.bmp"), bmp).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    fs::write(format!("{dir}/bmp8_no_palette.bin"), header(4, 4, 8, 256, 16)).unwrap();

    println!("Generated seed corpus in {dir}/");
}
