use crate::bounds::Bounds;
use crate::parse::Point;

/// 2-D grid of per-cell point counts, stored as one flat row-major buffer.
/// Row 0 is the northern edge of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    width: usize,
    height: usize,
    cells: Vec<u64>,
}

impl DensityGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn count(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.width + col]
    }

    pub fn increment(&mut self, row: usize, col: usize) {
        self.cells[row * self.width + col] += 1;
    }

    pub fn row(&self, row: usize) -> &[u64] {
        &self.cells[row * self.width..(row + 1) * self.width]
    }

    /// Elementwise sum of another grid of identical dimensions. Used to fold
    /// per-shard grids after the parallel pass.
    pub fn merge(&mut self, other: &DensityGrid) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        for (dst, src) in self.cells.iter_mut().zip(&other.cells) {
            *dst += src;
        }
    }

    pub fn max_count(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }
}

/// Map an in-bounds point to its (row, column) cell.
///
/// Linear normalization against the bounds, floored and clamped to the grid.
/// Higher latitudes get smaller row indices so north renders at the top. A
/// zero-range axis puts every point in the middle row/column.
pub fn cell_for_point(p: Point, bounds: &Bounds, width: usize, height: usize) -> (usize, usize) {
    let lat_range = bounds.lat_range();
    let lon_range = bounds.lon_range();

    let col = if lon_range == 0.0 {
        width / 2
    } else {
        let x = ((p.lon - bounds.min_lon) / lon_range) * width as f64;
        (x as usize).min(width - 1)
    };

    let row = if lat_range == 0.0 {
        height / 2
    } else {
        let y = ((bounds.max_lat - p.lat) / lat_range) * height as f64;
        (y as usize).min(height - 1)
    };

    (row, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> Point {
        Point { lat, lon }
    }

    fn test_bounds() -> Bounds {
        Bounds::new(1.0, 9.0, 1.0, 9.0, 6)
    }

    #[test]
    fn corner_points_clamp_to_grid_edges() {
        let b = test_bounds();
        // min lat -> bottom row, min lon -> left column
        assert_eq!(cell_for_point(pt(1.0, 1.0), &b, 10, 5), (4, 0));
        // max lat -> top row, max lon -> right column
        assert_eq!(cell_for_point(pt(9.0, 9.0), &b, 10, 5), (0, 9));
    }

    #[test]
    fn nearby_points_share_a_cell() {
        let b = test_bounds();
        assert_eq!(cell_for_point(pt(5.0, 5.0), &b, 10, 5), (2, 5));
        assert_eq!(cell_for_point(pt(5.1, 5.1), &b, 10, 5), (2, 5));
    }

    #[test]
    fn mixed_corners() {
        let b = test_bounds();
        assert_eq!(cell_for_point(pt(1.5, 8.5), &b, 10, 5), (4, 9));
        assert_eq!(cell_for_point(pt(8.5, 1.5), &b, 10, 5), (0, 0));
    }

    #[test]
    fn zero_range_axes_map_to_middle() {
        let b = Bounds::new(5.0, 5.0, 5.0, 5.0, 3);
        assert_eq!(cell_for_point(pt(5.0, 5.0), &b, 10, 5), (2, 5));
    }

    #[test]
    fn mapping_is_stable() {
        let b = test_bounds();
        let first = cell_for_point(pt(3.3, 7.7), &b, 10, 5);
        assert_eq!(cell_for_point(pt(3.3, 7.7), &b, 10, 5), first);
    }

    #[test]
    fn grid_increment_and_count() {
        let mut g = DensityGrid::new(10, 5);
        g.increment(2, 5);
        g.increment(2, 5);
        g.increment(0, 9);
        assert_eq!(g.count(2, 5), 2);
        assert_eq!(g.count(0, 9), 1);
        assert_eq!(g.count(0, 0), 0);
        assert_eq!(g.max_count(), 2);
        assert_eq!(g.total(), 3);
    }

    #[test]
    fn grid_merge_sums_elementwise() {
        let mut a = DensityGrid::new(3, 2);
        a.increment(0, 0);
        a.increment(1, 2);
        let mut b = DensityGrid::new(3, 2);
        b.increment(0, 0);
        b.increment(0, 1);
        a.merge(&b);
        assert_eq!(a.count(0, 0), 2);
        assert_eq!(a.count(0, 1), 1);
        assert_eq!(a.count(1, 2), 1);
        assert_eq!(a.total(), 4);
    }
}
