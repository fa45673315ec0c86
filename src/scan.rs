//! The two file passes: bounds discovery and grid population, each in a
//! sequential and a sharded-parallel variant.
//!
//! The parallel variants memory-map the file, cut it into newline-aligned
//! chunks, give every shard its own accumulator or grid, and fold the partial
//! results with the same commutative merge the sequential code would produce.
//! The only shared mutable state is the global error tally.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{info, warn};
use memmap2::Mmap;
use rayon::prelude::*;

use crate::bounds::Bounds;
use crate::config::Config;
use crate::error::{LineError, MapError};
use crate::grid::{cell_for_point, DensityGrid};
use crate::parse::{parse_line, Point};

/// Error counter with capped individual reporting.
///
/// `record` returns whether this particular error should still be logged.
/// The cap is evaluated against the count as observed at increment time, so
/// under concurrency the set of individually reported lines is
/// non-deterministic while the final tally is not.
pub struct ErrorTally {
    count: AtomicU64,
    cap: i64,
}

impl ErrorTally {
    pub fn new(cap: i64) -> Self {
        Self {
            count: AtomicU64::new(0),
            cap,
        }
    }

    pub fn record(&self) -> bool {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        self.cap < 0 || n <= self.cap as u64
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn log_summary(&self, pass: &str) {
        let total = self.total();
        if total == 0 {
            return;
        }
        if self.cap >= 0 && total > self.cap as u64 {
            warn!(
                "{pass}: encountered {total} total parse errors (first {} shown)",
                self.cap
            );
        } else {
            warn!("{pass}: encountered {total} total parse errors");
        }
    }
}

/// Parse one line and apply the pass-1 sanity check. Out-of-world coordinates
/// are an error here; pass 2 applies its own bounds check instead.
fn accept_point(line: &str, config: &Config) -> Result<Option<Point>, LineError> {
    match parse_line(line, &config.delimiter, config.lat_column, config.lon_column)? {
        None => Ok(None),
        Some(p) if p.in_world_range() => Ok(Some(p)),
        Some(p) => Err(LineError::OutOfRange { lat: p.lat, lon: p.lon }),
    }
}

/// Pass 1, sequential: one full scan to find the lat/lon extrema of the
/// valid data. Fails with `NoValidData` when nothing survives the scan.
pub fn find_bounds(config: &Config) -> Result<Bounds, MapError> {
    let start = Instant::now();
    let file = File::open(&config.file_path)?;
    let mut reader = BufReader::new(file);
    let tally = ErrorTally::new(config.max_reported_errors);
    let mut bounds = Bounds::default();
    let mut line_num: u64 = 0;
    let mut line = String::with_capacity(128);

    // Header lines still count toward the line numbers in error messages.
    for _ in 0..config.skip_header_lines {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_num += 1;
    }

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_num += 1;
        match accept_point(&line, config) {
            Ok(Some(p)) => bounds.update(p),
            Ok(None) => {}
            Err(e) => {
                if tally.record() {
                    warn!("(Pass 1, Line {line_num}): skipping: {e}");
                }
            }
        }
    }

    tally.log_summary("Pass 1");
    finish_bounds(bounds, config, start, "sequential")
}

/// Pass 1, parallel: shard the mapped file over the rayon pool, one private
/// accumulator per shard, merged pairwise at the end.
pub fn find_bounds_parallel(config: &Config) -> Result<Bounds, MapError> {
    let start = Instant::now();
    let file = File::open(&config.file_path)?;
    // Safety: the file is not expected to be mutated while we scan it.
    let mmap = unsafe { Mmap::map(&file)? };
    let text = str::from_utf8(&mmap)?;
    let body = strip_header_lines(text, config.skip_header_lines);
    let tally = ErrorTally::new(config.max_reported_errors);

    let bounds = newline_chunks(body, rayon::current_num_threads())
        .into_par_iter()
        .map(|chunk| {
            let mut local = Bounds::default();
            for line in chunk.lines() {
                match accept_point(line, config) {
                    Ok(Some(p)) => local.update(p),
                    Ok(None) => {}
                    Err(e) => {
                        if tally.record() {
                            warn!("(Pass 1): skipping: {e}");
                        }
                    }
                }
            }
            local
        })
        .reduce(Bounds::default, |mut a, b| {
            a.merge(&b);
            a
        });

    tally.log_summary("Pass 1");
    finish_bounds(bounds, config, start, "parallel")
}

fn finish_bounds(
    bounds: Bounds,
    config: &Config,
    start: Instant,
    variant: &str,
) -> Result<Bounds, MapError> {
    if !bounds.is_valid() {
        return Err(MapError::NoValidData {
            path: config.file_path.clone(),
        });
    }
    if !bounds.has_range() {
        warn!("all valid points are identical; the map will collapse into a single cell");
    }
    info!(
        "{variant} bounds pass finished in {:.3}s: {bounds}",
        start.elapsed().as_secs_f64()
    );
    Ok(bounds)
}

/// Pass 2, sequential: re-read the file and count each in-bounds point into
/// its grid cell.
pub fn populate_grid(config: &Config, bounds: &Bounds) -> Result<DensityGrid, MapError> {
    let start = Instant::now();
    let file = File::open(&config.file_path)?;
    let mut reader = BufReader::new(file);
    let tally = ErrorTally::new(config.max_reported_errors);
    let mut grid = DensityGrid::new(config.map_width, config.map_height);
    let mut line_num: u64 = 0;
    let mut line = String::with_capacity(128);

    for _ in 0..config.skip_header_lines {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_num += 1;
    }

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_num += 1;
        match parse_line(&line, &config.delimiter, config.lat_column, config.lon_column) {
            Ok(Some(p)) => count_point(p, bounds, &mut grid, Some(line_num)),
            Ok(None) => {}
            Err(e) => {
                if tally.record() {
                    warn!("(Pass 2, Line {line_num}): skipping: {e}");
                }
            }
        }
    }

    tally.log_summary("Pass 2");
    info!(
        "processed {} points during grid population in {:.3}s",
        grid.total(),
        start.elapsed().as_secs_f64()
    );
    Ok(grid)
}

/// Pass 2, parallel: one private zero-filled grid per shard, merged by
/// elementwise summation. No cell is touched by two shards before the merge.
pub fn populate_grid_parallel(
    config: &Config,
    bounds: &Bounds,
) -> Result<DensityGrid, MapError> {
    let start = Instant::now();
    let file = File::open(&config.file_path)?;
    // Safety: same single-writer assumption as in `find_bounds_parallel`.
    let mmap = unsafe { Mmap::map(&file)? };
    let text = str::from_utf8(&mmap)?;
    let body = strip_header_lines(text, config.skip_header_lines);
    let tally = ErrorTally::new(config.max_reported_errors);

    let grid = newline_chunks(body, rayon::current_num_threads())
        .into_par_iter()
        .map(|chunk| {
            let mut local = DensityGrid::new(config.map_width, config.map_height);
            for line in chunk.lines() {
                match parse_line(line, &config.delimiter, config.lat_column, config.lon_column) {
                    Ok(Some(p)) => count_point(p, bounds, &mut local, None),
                    Ok(None) => {}
                    Err(e) => {
                        if tally.record() {
                            warn!("(Pass 2): skipping: {e}");
                        }
                    }
                }
            }
            local
        })
        .reduce(
            || DensityGrid::new(config.map_width, config.map_height),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    tally.log_summary("Pass 2");
    info!(
        "processed {} points during parallel grid population in {:.3}s",
        grid.total(),
        start.elapsed().as_secs_f64()
    );
    Ok(grid)
}

/// Drop a parsed point into its cell, or skip it when it falls outside the
/// bounds. Out-of-bounds here is not an error: the bounds were derived from
/// the same file, so this only fires when the file changed between passes or
/// fixed bounds exclude part of the data.
fn count_point(p: Point, bounds: &Bounds, grid: &mut DensityGrid, line_num: Option<u64>) {
    if bounds.contains(p) {
        let (row, col) = cell_for_point(p, bounds, grid.width(), grid.height());
        grid.increment(row, col);
    } else {
        match line_num {
            Some(n) => warn!(
                "(Pass 2, Line {n}): skipping point outside bounds (lat: {}, lon: {})",
                p.lat, p.lon
            ),
            None => warn!(
                "(Pass 2): skipping point outside bounds (lat: {}, lon: {})",
                p.lat, p.lon
            ),
        }
    }
}

/// Skip the first `lines` lines of `text`, returning the remainder.
fn strip_header_lines(mut text: &str, lines: usize) -> &str {
    for _ in 0..lines {
        match text.find('\n') {
            Some(i) => text = &text[i + 1..],
            None => return "",
        }
    }
    text
}

/// Cut `text` into roughly `shards` pieces, each ending on a line boundary.
/// Concatenating the chunks in order yields `text` back exactly.
fn newline_chunks(text: &str, shards: usize) -> Vec<&str> {
    let target = (text.len() / shards.max(1)).max(1);
    let mut chunks = Vec::with_capacity(shards);
    let mut rest = text;
    while !rest.is_empty() {
        if rest.len() <= target {
            chunks.push(rest);
            break;
        }
        // Splitting right after a newline byte keeps us on a char boundary.
        let end = match rest.as_bytes()[target..].iter().position(|&b| b == b'\n') {
            Some(i) => target + i + 1,
            None => rest.len(),
        };
        chunks.push(&rest[..end]);
        rest = &rest[end..];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_reports_up_to_cap() {
        let tally = ErrorTally::new(2);
        assert!(tally.record());
        assert!(tally.record());
        assert!(!tally.record());
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn negative_cap_reports_everything() {
        let tally = ErrorTally::new(-1);
        for _ in 0..100 {
            assert!(tally.record());
        }
        assert_eq!(tally.total(), 100);
    }

    #[test]
    fn zero_cap_reports_nothing() {
        let tally = ErrorTally::new(0);
        assert!(!tally.record());
        assert_eq!(tally.total(), 1);
    }

    #[test]
    fn strips_header_lines() {
        let text = "header\n1,2\n3,4\n";
        assert_eq!(strip_header_lines(text, 0), text);
        assert_eq!(strip_header_lines(text, 1), "1,2\n3,4\n");
        assert_eq!(strip_header_lines(text, 3), "");
        assert_eq!(strip_header_lines(text, 10), "");
    }

    #[test]
    fn chunks_reassemble_to_input() {
        let text = "1,2\n3,4\n5,6\n7,8\n9,10\n";
        for shards in 1..6 {
            let chunks = newline_chunks(text, shards);
            assert_eq!(chunks.concat(), text);
        }
    }

    #[test]
    fn chunks_end_on_line_boundaries() {
        let text = "alpha\nbeta\ngamma\ndelta\n";
        for chunk in newline_chunks(text, 3) {
            assert!(chunk.ends_with('\n'));
        }
    }

    #[test]
    fn chunking_handles_missing_trailing_newline() {
        let text = "1,2\n3,4";
        let chunks = newline_chunks(text, 4);
        assert_eq!(chunks.concat(), text);
    }
}
