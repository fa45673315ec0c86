use std::path::PathBuf;

use anyhow::{ensure, Result};

use crate::bounds::Bounds;

/// Everything the pipeline needs to know about one run. Built by the CLI in
/// the binary; the library only ever reads it.
#[derive(Debug, Clone)]
pub struct Config {
    pub file_path: PathBuf,
    pub map_width: usize,
    pub map_height: usize,
    pub delimiter: String,
    pub skip_header_lines: usize,
    /// Ordered density glyphs; index 0 is reserved for empty cells.
    pub glyphs: Vec<char>,
    pub lat_column: usize,
    pub lon_column: usize,
    /// How many per-line errors to log individually; -1 means all of them.
    pub max_reported_errors: i64,
    pub parallel: bool,
    /// Skip bounds discovery and use this rectangle instead.
    pub fixed_bounds: Option<Bounds>,
    /// Handled by the external HTML renderer, not by this pipeline.
    pub html_output: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.map_width > 0 && self.map_height > 0,
            "map width and height must be > 0"
        );
        ensure!(!self.delimiter.is_empty(), "delimiter must not be empty");
        ensure!(
            self.glyphs.len() >= 2,
            "glyph alphabet needs at least 2 characters (index 0 is the empty cell)"
        );
        ensure!(
            self.lat_column != self.lon_column,
            "latitude and longitude columns must differ"
        );
        ensure!(
            self.max_reported_errors >= -1,
            "error report cap must be >= 0, or -1 for unlimited"
        );
        if let Some(b) = &self.fixed_bounds {
            ensure!(
                b.min_lat < b.max_lat && b.min_lon < b.max_lon,
                "fixed bounds are invalid: min must be less than max"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(path: PathBuf) -> Config {
        Config {
            file_path: path,
            map_width: 10,
            map_height: 5,
            delimiter: ",".into(),
            skip_header_lines: 1,
            glyphs: " .123".chars().collect(),
            lat_column: 0,
            lon_column: 1,
            max_reported_errors: 10,
            parallel: false,
            fixed_bounds: None,
            html_output: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config("points.csv".into()).validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut c = base_config("points.csv".into());
        c.map_width = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn empty_delimiter_rejected() {
        let mut c = base_config("points.csv".into());
        c.delimiter.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn short_glyph_alphabet_rejected() {
        let mut c = base_config("points.csv".into());
        c.glyphs = vec![' '];
        assert!(c.validate().is_err());
    }

    #[test]
    fn identical_columns_rejected() {
        let mut c = base_config("points.csv".into());
        c.lon_column = c.lat_column;
        assert!(c.validate().is_err());
    }

    #[test]
    fn inverted_fixed_bounds_rejected() {
        let mut c = base_config("points.csv".into());
        c.fixed_bounds = Some(Bounds::new(9.0, 1.0, 1.0, 9.0, 0));
        assert!(c.validate().is_err());
    }
}
