//! Median-cut palette construction.
//!
//! Opaque pixels are deduplicated into weighted samples, then a single box
//! covering the whole RGB cube is split until `size - 1` boxes exist. Slot 0
//! of every palette is black, so only `size - 1` boxes contribute colors.
//!
//! Each round picks the first [`SplitStrategy`] that applies, in this order:
//!
//! 1. [`SplitStrategy::VolumeSplit`]: weighted-median split of the largest
//!    box holding more than one sample.
//! 2. [`SplitStrategy::RangeBisect`]: once every box holds at most one sample,
//!    bisect a box's bounding range. The empty half contributes its center
//!    color, so even a single-color image yields a spread of distinct entries.
//! 3. [`SplitStrategy::DuplicateFill`]: nothing left to split; copy boxes
//!    round-robin until the box count is reached.

use std::collections::HashMap;

use crate::pixel::{Color, is_visible};

/// Box-splitting strategy, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitStrategy {
    VolumeSplit,
    RangeBisect,
    DuplicateFill,
}

impl SplitStrategy {
    /// Evaluation order of the split cascade.
    pub const ORDER: [SplitStrategy; 3] = [
        SplitStrategy::VolumeSplit,
        SplitStrategy::RangeBisect,
        SplitStrategy::DuplicateFill,
    ];
}

/// A unique opaque color and how many pixels carry it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ColorSample {
    pub(crate) color: Color,
    pub(crate) count: u32,
}

/// A set of samples plus an inclusive per-channel bounding range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ColorBox {
    pub(crate) samples: Vec<ColorSample>,
    pub(crate) min: [u8; 3],
    pub(crate) max: [u8; 3],
}

impl ColorBox {
    fn full_cube(samples: Vec<ColorSample>) -> Self {
        Self {
            samples,
            min: [0; 3],
            max: [255; 3],
        }
    }

    fn range(&self, axis: usize) -> u32 {
        u32::from(self.max[axis]) - u32::from(self.min[axis])
    }

    fn volume(&self) -> u64 {
        u64::from(self.range(0)) * u64::from(self.range(1)) * u64::from(self.range(2))
    }

    /// Axis with the largest range; ties go r, then g, then b.
    fn longest_axis(&self) -> usize {
        let (r, g, b) = (self.range(0), self.range(1), self.range(2));
        if r >= g && r >= b {
            0
        } else if g >= b {
            1
        } else {
            2
        }
    }

    fn is_bisectable(&self) -> bool {
        (0..3).any(|axis| self.range(axis) > 1)
    }

    fn total_count(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.count)).sum()
    }

    /// Count-weighted mean of the samples, or the bounding-range center for an
    /// empty box.
    fn average(&self) -> Color {
        let total = self.total_count();
        if total == 0 {
            let center = |axis: usize| {
                ((u16::from(self.min[axis]) + u16::from(self.max[axis]) + 1) / 2) as u8
            };
            return Color::new(center(0), center(1), center(2));
        }
        let mut sums = [0u64; 3];
        for s in &self.samples {
            let n = u64::from(s.count);
            sums[0] += u64::from(s.color.r) * n;
            sums[1] += u64::from(s.color.g) * n;
            sums[2] += u64::from(s.color.b) * n;
        }
        // Round half up: (2·sum + total) / (2·total).
        let round = |sum: u64| ((2 * sum + total) / (2 * total)) as u8;
        Color::new(round(sums[0]), round(sums[1]), round(sums[2]))
    }

    /// Shrink the range on `axis` to the extremes of this box's samples.
    /// Empty boxes keep what they have.
    fn fit_axis(&mut self, axis: usize) {
        let values = self.samples.iter().map(|s| s.color.channel(axis));
        if let (Some(lo), Some(hi)) = (values.clone().min(), values.max()) {
            self.min[axis] = lo;
            self.max[axis] = hi;
        }
    }

    /// Weighted-median split along the longest axis. Both halves keep at least
    /// one sample.
    fn split_at_median(mut self) -> (ColorBox, ColorBox) {
        debug_assert!(self.samples.len() > 1);
        let axis = self.longest_axis();
        self.samples.sort_by_key(|s| s.color.channel(axis));

        let total = self.total_count();
        let mut cumulative = 0u64;
        let mut median = self.samples.len() - 1;
        for (i, s) in self.samples.iter().enumerate() {
            cumulative += u64::from(s.count);
            if 2 * cumulative >= total {
                median = i;
                break;
            }
        }
        let split = (median + 1).min(self.samples.len() - 1);

        let right_samples = self.samples.split_off(split);
        let mut left = ColorBox {
            samples: self.samples,
            min: self.min,
            max: self.max,
        };
        let mut right = ColorBox {
            samples: right_samples,
            min: self.min,
            max: self.max,
        };
        left.fit_axis(axis);
        right.fit_axis(axis);
        (left, right)
    }

    /// Split the bounding range of the longest axis at its midpoint. The
    /// sample (if any) follows its channel value.
    fn bisect(self) -> (ColorBox, ColorBox) {
        let axis = self.longest_axis();
        let mid = ((u16::from(self.min[axis]) + u16::from(self.max[axis])) / 2) as u8;

        let (lower, upper): (Vec<_>, Vec<_>) = self
            .samples
            .into_iter()
            .partition(|s| s.color.channel(axis) <= mid);

        let mut left = ColorBox {
            samples: lower,
            min: self.min,
            max: self.max,
        };
        left.max[axis] = mid;
        let mut right = ColorBox {
            samples: upper,
            min: self.min,
            max: self.max,
        };
        right.min[axis] = mid + 1;
        left.fit_axis(axis);
        right.fit_axis(axis);
        (left, right)
    }
}

/// Collect unique opaque colors in first-appearance order.
pub(crate) fn collect_samples(pixels: &[u8]) -> Vec<ColorSample> {
    let mut index: HashMap<Color, usize> = HashMap::new();
    let mut samples: Vec<ColorSample> = Vec::new();
    for px in pixels.chunks_exact(4).filter(|px| is_visible(px)) {
        let color = Color::from_rgba(px);
        match index.get(&color) {
            Some(&i) => samples[i].count += 1,
            None => {
                index.insert(color, samples.len());
                samples.push(ColorSample { color, count: 1 });
            }
        }
    }
    samples
}

/// Pick the strategy and box index for the next round.
///
/// Returns `None` only for an empty box list.
pub(crate) fn choose_split(boxes: &[ColorBox]) -> Option<(SplitStrategy, usize)> {
    SplitStrategy::ORDER
        .iter()
        .find_map(|&strategy| select_box(boxes, strategy).map(|i| (strategy, i)))
}

fn select_box(boxes: &[ColorBox], strategy: SplitStrategy) -> Option<usize> {
    let largest = |eligible: &dyn Fn(&ColorBox) -> bool| {
        let mut best: Option<(usize, u64)> = None;
        for (i, b) in boxes.iter().enumerate().filter(|(_, b)| eligible(b)) {
            let v = b.volume();
            if best.is_none_or(|(_, bv)| v > bv) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| i)
    };
    match strategy {
        SplitStrategy::VolumeSplit => largest(&|b| b.samples.len() > 1),
        SplitStrategy::RangeBisect => largest(&|b| b.is_bisectable()),
        SplitStrategy::DuplicateFill => (!boxes.is_empty()).then_some(0),
    }
}

/// Split boxes until `target` exist.
pub(crate) fn split_boxes(samples: Vec<ColorSample>, target: usize) -> Vec<ColorBox> {
    let mut boxes = vec![ColorBox::full_cube(samples)];
    let mut bisections = 0usize;

    while boxes.len() < target {
        let Some((strategy, i)) = choose_split(&boxes) else {
            break;
        };
        match strategy {
            SplitStrategy::VolumeSplit => {
                let (left, right) = boxes.remove(i).split_at_median();
                boxes.insert(i, left);
                boxes.push(right);
            }
            SplitStrategy::RangeBisect => {
                bisections += 1;
                let (left, right) = boxes.remove(i).bisect();
                boxes.insert(i, left);
                boxes.push(right);
            }
            SplitStrategy::DuplicateFill => {
                tracing::trace!(base = boxes.len(), target, "median cut: duplicating boxes");
                duplicate_fill(&mut boxes, target);
            }
        }
    }

    if bisections > 0 {
        tracing::trace!(bisections, "median cut: bisected single-sample boxes");
    }
    boxes
}

/// Append copies of the existing boxes, cycling through them in order.
fn duplicate_fill(boxes: &mut Vec<ColorBox>, target: usize) {
    let base = boxes.len();
    for k in 0..target.saturating_sub(base) {
        let copy = boxes[k % base].clone();
        boxes.push(copy);
    }
}

/// Build a palette of exactly `size` colors from RGBA pixels.
///
/// Index 0 is always black. Pixels with alpha below the visibility threshold
/// are ignored. The result never falls short of `size`: unused slots are
/// black.
pub fn median_cut(pixels: &[u8], size: usize) -> Vec<Color> {
    let mut palette = Vec::with_capacity(size);
    palette.push(Color::BLACK);

    let samples = collect_samples(pixels);
    let unique = samples.len();
    if unique > 0 && size > 1 {
        for b in split_boxes(samples, size - 1) {
            let c = b.average();
            if c != Color::BLACK {
                palette.push(c);
            }
        }
    }
    palette.resize(size, Color::BLACK);

    tracing::debug!(size, unique_colors = unique, "built median-cut palette");
    palette
}
