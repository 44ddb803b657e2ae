//! Palettes and nearest-color matching.

use crate::color::{ColorDistance, WeightedRgb};
use crate::median_cut::median_cut;
use crate::pixel::Color;

/// Number of entries in a BMP color table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaletteSize {
    /// 16 colors, for 4-bit BMP.
    Colors16,
    /// 256 colors, for 8-bit BMP.
    Colors256,
}

impl PaletteSize {
    pub const fn len(self) -> usize {
        match self {
            Self::Colors16 => 16,
            Self::Colors256 => 256,
        }
    }

    /// Bits per index.
    pub const fn bits(self) -> u16 {
        match self {
            Self::Colors16 => 4,
            Self::Colors256 => 8,
        }
    }
}

/// An ordered color table. Index 0 is always black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Build an adaptive palette from RGBA pixels with median cut.
    pub fn build(pixels: &[u8], size: PaletteSize) -> Self {
        Self {
            colors: median_cut(pixels, size.len()),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_colors(colors: Vec<Color>) -> Self {
        debug_assert!(!colors.is_empty() && colors.len() <= 256);
        Self { colors }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color at `index`, or black when out of range.
    #[inline]
    pub fn color(&self, index: u8) -> Color {
        self.colors
            .get(usize::from(index))
            .copied()
            .unwrap_or(Color::BLACK)
    }

    /// Matcher using the fast weighted-RGB metric.
    pub fn matcher(&self) -> Matcher<'_, WeightedRgb> {
        Matcher::new(self, WeightedRgb)
    }

    /// Matcher using any metric.
    pub fn matcher_with<D: ColorDistance>(&self, metric: D) -> Matcher<'_, D> {
        Matcher::new(self, metric)
    }
}

/// Build an adaptive palette of exactly `size` entries from RGBA pixels.
pub fn build_palette(pixels: &[u8], size: PaletteSize) -> Palette {
    Palette::build(pixels, size)
}

/// Maps colors to the index of their nearest palette entry.
///
/// A linear scan; the lowest index wins on ties.
#[derive(Clone, Debug)]
pub struct Matcher<'p, D> {
    palette: &'p Palette,
    metric: D,
}

impl<'p, D: ColorDistance> Matcher<'p, D> {
    pub fn new(palette: &'p Palette, metric: D) -> Self {
        Self { palette, metric }
    }

    pub fn palette(&self) -> &'p Palette {
        self.palette
    }

    /// Index of the closest palette entry.
    pub fn index_of(&self, c: Color) -> u8 {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (i, &entry) in self.palette.colors.iter().enumerate() {
            let d = self.metric.distance(c, entry);
            if d < best_dist {
                best_dist = d;
                best = i;
                if d == 0.0 {
                    break;
                }
            }
        }
        best as u8
    }

    /// The closest palette color itself.
    #[inline]
    pub fn nearest(&self, c: Color) -> Color {
        self.palette.color(self.index_of(c))
    }
}
