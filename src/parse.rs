use crate::error::LineError;

/// A parsed latitude/longitude pair. Coordinates are range-unchecked here;
/// each pass applies its own bounds check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    /// Sanity check used by the first pass: real-world coordinates only.
    pub fn in_world_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Parse one raw line into a `Point`.
///
/// The line is split on the literal `delimiter`; the fields at `lat_col` and
/// `lon_col` (0-based) must parse as decimal numbers. Whitespace around the
/// line and around each field is ignored. Blank lines yield `Ok(None)` and
/// are not errors.
pub fn parse_line(
    line: &str,
    delimiter: &str,
    lat_col: usize,
    lon_col: usize,
) -> Result<Option<Point>, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(delimiter).collect();
    let expected = lat_col.max(lon_col) + 1;
    if fields.len() < expected {
        return Err(LineError::MalformedLine {
            expected,
            found: fields.len(),
        });
    }

    let lat = parse_field(fields[lat_col], lat_col)?;
    let lon = parse_field(fields[lon_col], lon_col)?;
    Ok(Some(Point { lat, lon }))
}

fn parse_field(raw: &str, index: usize) -> Result<f64, LineError> {
    let raw = raw.trim();
    raw.parse().map_err(|_| LineError::NonNumericField {
        index,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_csv_line() {
        let p = parse_line("12.5,-30.25", ",", 0, 1).unwrap().unwrap();
        assert_eq!(p, Point { lat: 12.5, lon: -30.25 });
    }

    #[test]
    fn trims_line_and_fields() {
        let p = parse_line("  1.0 ;  2.0  \n", ";", 0, 1).unwrap().unwrap();
        assert_eq!(p, Point { lat: 1.0, lon: 2.0 });
    }

    #[test]
    fn respects_column_indices() {
        let p = parse_line("id-7,foo,48.8,2.35", ",", 2, 3).unwrap().unwrap();
        assert_eq!(p, Point { lat: 48.8, lon: 2.35 });
    }

    #[test]
    fn blank_line_is_skipped() {
        assert_eq!(parse_line("   \t ", ",", 0, 1), Ok(None));
        assert_eq!(parse_line("", ",", 0, 1), Ok(None));
    }

    #[test]
    fn too_few_fields_is_malformed() {
        let err = parse_line("1.0,2.0", ",", 0, 3).unwrap_err();
        assert_eq!(err, LineError::MalformedLine { expected: 4, found: 2 });
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_line("abc,2.0", ",", 0, 1).unwrap_err();
        assert_eq!(
            err,
            LineError::NonNumericField { index: 0, value: "abc".into() }
        );
    }

    #[test]
    fn world_range_check() {
        assert!(Point { lat: 90.0, lon: -180.0 }.in_world_range());
        assert!(!Point { lat: 90.1, lon: 0.0 }.in_world_range());
        assert!(!Point { lat: 0.0, lon: 180.5 }.in_world_range());
    }
}
