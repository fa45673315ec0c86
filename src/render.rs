//! Density-to-glyph quantization, the legend, and the final map text.
//!
//! The quantizer and the legend consult the same tier-threshold sequence, so
//! the glyph drawn for a cell always falls inside the numeric range the
//! legend prints for it.

use itertools::Itertools;

use crate::bounds::Bounds;
use crate::config::Config;
use crate::grid::DensityGrid;

/// Upper count bound of each density tier: `threshold[i-1]` is the largest
/// count drawn with glyph `i`. Ceiling division of `max_count` into `levels`
/// equal slices, with monotonicity forced when rounding makes two tiers
/// collide. Empty when there is nothing to scale against.
pub fn tier_thresholds(max_count: u64, levels: usize) -> Vec<u64> {
    if levels == 0 || max_count == 0 {
        return Vec::new();
    }
    let levels = levels as u64;
    let mut out = Vec::with_capacity(levels as usize);
    let mut prev = 0u64;
    for i in 1..=levels {
        let mut threshold = (max_count * i).div_ceil(levels);
        if threshold <= prev {
            threshold = prev + 1;
        }
        out.push(threshold);
        prev = threshold;
    }
    out
}

/// One legend entry: counts in `lo..=hi` render as `glyph`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendEntry {
    pub glyph: char,
    pub lo: u64,
    pub hi: u64,
}

/// Shared scale for one rendered map: the glyph alphabet plus the tier
/// thresholds derived from the grid's maximum cell count.
pub struct DensityScale<'a> {
    glyphs: &'a [char],
    max_count: u64,
    thresholds: Vec<u64>,
}

impl<'a> DensityScale<'a> {
    pub fn new(glyphs: &'a [char], max_count: u64) -> Self {
        let levels = glyphs.len().saturating_sub(1);
        Self {
            glyphs,
            max_count,
            thresholds: tier_thresholds(max_count, levels),
        }
    }

    /// Tier index for a cell count: 0 for empty cells, otherwise the first
    /// tier whose threshold covers the count.
    pub fn glyph_index(&self, count: u64) -> usize {
        if count == 0 {
            return 0;
        }
        if self.thresholds.is_empty() {
            // A positive count with no usable maximum: lowest non-zero tier.
            return 1;
        }
        match self.thresholds.iter().position(|&t| count <= t) {
            Some(i) => i + 1,
            None => self.thresholds.len(),
        }
    }

    pub fn glyph(&self, count: u64) -> char {
        self.glyphs[self.glyph_index(count)]
    }

    /// The non-empty tiers, in order. Tiers whose range starts above the
    /// maximum count can never hold a cell and are omitted, so a map whose
    /// busiest cell holds one point gets a single legend entry.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        let mut out = Vec::new();
        let mut prev = 0u64;
        for (i, &threshold) in self.thresholds.iter().enumerate() {
            let lo = prev + 1;
            if lo > self.max_count {
                break;
            }
            out.push(LegendEntry {
                glyph: self.glyphs[i + 1],
                lo,
                hi: threshold,
            });
            prev = threshold;
        }
        out
    }

    fn legend_line(&self) -> String {
        let entries = self
            .legend_entries()
            .into_iter()
            .map(|e| {
                if e.lo == e.hi {
                    format!("'{}': {}", e.glyph, e.lo)
                } else {
                    format!("'{}': {}-{}", e.glyph, e.lo, e.hi)
                }
            })
            .join(" ");
        format!("Legend (Points per cell): '{}': 0 {}", self.glyphs[0], entries)
    }
}

/// Compose the bordered glyph grid, axis labels, and legend into one text
/// block. An empty grid over empty bounds short-circuits to a fixed notice.
pub fn render_map(grid: &DensityGrid, config: &Config, bounds: &Bounds) -> String {
    let max_count = grid.max_count();
    if max_count == 0 && bounds.point_count == 0 {
        return "(Map is empty or no points fell within the bounds)".to_string();
    }

    let scale = DensityScale::new(&config.glyphs, max_count);
    let width = grid.width();
    let height = grid.height();
    let mut out = String::with_capacity(height * (width + 24) + 256);

    out.push('\n');
    out.push_str(&format!("      {:.4} N\n", bounds.max_lat));
    push_border(&mut out, width);

    for y in 0..height {
        if y == height / 2 {
            out.push_str(&format!("{:.3} W |", bounds.min_lon));
        } else {
            out.push_str("         |");
        }
        for &count in grid.row(y) {
            out.push(scale.glyph(count));
        }
        if y == height / 2 {
            out.push_str(&format!("| {:.3} E", bounds.max_lon));
        } else {
            out.push('|');
        }
        out.push('\n');
    }

    push_border(&mut out, width);
    out.push_str(&format!("      {:.4} S\n", bounds.min_lat));
    out.push_str(&scale.legend_line());
    out
}

fn push_border(out: &mut String, width: usize) {
    out.push_str("         +");
    for _ in 0..width {
        out.push('-');
    }
    out.push_str("+\n");
}
