#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header probe and full decode must never panic
    let _ = zenbmpquant::probe_bmp(data);
    let limits = zenbmpquant::Limits::none().with_max_pixels(1 << 24);
    let _ = zenbmpquant::decode_bmp_with_limits(data, &limits, enough::Unstoppable);
});
