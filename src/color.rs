//! Color distance metrics.
//!
//! Two interchangeable metrics share the [`ColorDistance`] trait:
//!
//! - [`WeightedRgb`]: luminance-weighted Euclidean RGB distance. Cheap, and
//!   what every nearest-color lookup in this crate uses.
//! - [`CieLab`]: Euclidean distance in CIE L\*a\*b\* (D65). Accurate reference
//!   metric for callers who want higher fidelity matching.

use crate::pixel::Color;

/// A symmetric, non-negative distance between two colors that is zero only
/// for identical colors.
pub trait ColorDistance {
    fn distance(&self, a: Color, b: Color) -> f64;
}

/// `sqrt(0.30·Δr² + 0.59·Δg² + 0.11·Δb²)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeightedRgb;

impl ColorDistance for WeightedRgb {
    #[inline]
    fn distance(&self, a: Color, b: Color) -> f64 {
        weighted_rgb_distance(a, b)
    }
}

/// Euclidean distance between the CIE L\*a\*b\* coordinates of two colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CieLab;

impl ColorDistance for CieLab {
    #[inline]
    fn distance(&self, a: Color, b: Color) -> f64 {
        lab_distance(a, b)
    }
}

const WEIGHT_R: f64 = 0.30;
const WEIGHT_G: f64 = 0.59;
const WEIGHT_B: f64 = 0.11;

/// Luminance-weighted RGB distance.
#[inline]
pub fn weighted_rgb_distance(a: Color, b: Color) -> f64 {
    let dr = f64::from(a.r) - f64::from(b.r);
    let dg = f64::from(a.g) - f64::from(b.g);
    let db = f64::from(a.b) - f64::from(b.b);
    (WEIGHT_R * dr * dr + WEIGHT_G * dg * dg + WEIGHT_B * db * db).sqrt()
}

/// Euclidean distance in CIE L\*a\*b\*.
pub fn lab_distance(a: Color, b: Color) -> f64 {
    let la = Lab::from_srgb(a);
    let lb = Lab::from_srgb(b);
    let dl = la.l - lb.l;
    let da = la.a - lb.a;
    let db = la.b - lb.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// A CIE L\*a\*b\* color relative to the D65 white point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

// D65 reference white.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

const DELTA: f64 = 6.0 / 29.0;

impl Lab {
    /// Convert an 8-bit sRGB color.
    pub fn from_srgb(c: Color) -> Self {
        let r = srgb_to_linear(c.r);
        let g = srgb_to_linear(c.g);
        let b = srgb_to_linear(c.b);

        let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
        let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
        let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

        let fx = lab_f(x / XN);
        let fy = lab_f(y / YN);
        let fz = lab_f(z / ZN);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }
}

/// sRGB inverse companding of one 8-bit channel to linear 0.0..=1.0.
#[inline]
pub fn srgb_to_linear(v: u8) -> f64 {
    let c = f64::from(v) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}
