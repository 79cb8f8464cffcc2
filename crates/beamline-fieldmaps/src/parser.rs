//! Parser for plain-text tabulated field files.
//!
//! The format is whitespace separated with `#` comments:
//! ```text
//! # 3D map
//! <nx> <ny> <nz>
//! <xmin> <xmax> <ymin> <ymax> <zmin> <zmax>
//! <fx> <fy> <fz>
//! <fx> <fy> <fz>
//! ...
//! ```
//! A 1D map declares a single count and a single pair of bounds. Samples
//! are listed with `x` outermost and `z` innermost; three values per node,
//! free line layout. Loading fails fast if the number of values does not
//! match the declared dimensions.

use std::path::Path;

use crate::grid::{FieldMap, FieldMapError, MapDimension, TabulatedField1D, TabulatedField3D};
use crate::interpolator::GridAxis;

const AXIS_LABELS: [char; 3] = ['x', 'y', 'z'];

/// A numeric token together with the line it came from.
struct Token {
    line: usize,
    value: f64,
}

/// Content lines with comments stripped, paired with 1-based line numbers.
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    content.lines().enumerate().filter_map(|(idx, line)| {
        let line = line.split('#').next().unwrap_or("").trim();
        (!line.is_empty()).then_some((idx + 1, line))
    })
}

fn parse_number(line: usize, text: &str) -> Result<f64, FieldMapError> {
    text.parse().map_err(|_| FieldMapError::FormatError {
        line,
        message: format!("Invalid number: '{}'", text),
    })
}

/// Parse a field map, deciding 1D vs 3D from the header arity.
///
/// A 1D map varies along `dimension`; the argument is ignored for 3D maps.
pub fn parse_field_map(content: &str, dimension: MapDimension) -> Result<FieldMap, FieldMapError> {
    let mut lines = content_lines(content);

    let (count_line, counts) = lines.next().ok_or_else(|| FieldMapError::FormatError {
        line: 1,
        message: "Missing sample-count header".into(),
    })?;
    let counts: Vec<&str> = counts.split_whitespace().collect();
    if counts.len() != 1 && counts.len() != 3 {
        return Err(FieldMapError::FormatError {
            line: count_line,
            message: format!("Expected 1 or 3 sample counts, got {}", counts.len()),
        });
    }

    let (bounds_line, bounds) = lines.next().ok_or_else(|| FieldMapError::FormatError {
        line: count_line + 1,
        message: "Missing bounds header".into(),
    })?;
    let bounds = bounds
        .split_whitespace()
        .map(|t| parse_number(bounds_line, t))
        .collect::<Result<Vec<f64>, _>>()?;
    if bounds.len() != 2 * counts.len() {
        return Err(FieldMapError::FormatError {
            line: bounds_line,
            message: format!(
                "Expected {} bounds for {} axes, got {}",
                2 * counts.len(),
                counts.len(),
                bounds.len()
            ),
        });
    }

    let labels: Vec<char> = if counts.len() == 1 {
        vec![dimension.label()]
    } else {
        AXIS_LABELS.to_vec()
    };

    let mut axes = Vec::with_capacity(counts.len());
    for (i, (count, label)) in counts.iter().zip(&labels).enumerate() {
        let n: i64 = count.parse().map_err(|_| FieldMapError::FormatError {
            line: count_line,
            message: format!("Invalid sample count: '{}'", count),
        })?;
        if n <= 0 {
            return Err(FieldMapError::InvalidDimension { axis: *label, n });
        }
        axes.push(GridAxis::new(*label, n as usize, bounds[2 * i], bounds[2 * i + 1])?);
    }

    let mut tokens = Vec::new();
    for (line, text) in lines {
        for t in text.split_whitespace() {
            tokens.push(Token {
                line,
                value: parse_number(line, t)?,
            });
        }
    }

    let expected_values = axes
        .iter()
        .try_fold(3usize, |acc, axis| acc.checked_mul(axis.samples()))
        .ok_or_else(|| FieldMapError::FormatError {
            line: count_line,
            message: format!("Sample counts {:?} overflow the grid size", counts),
        })?;
    let expected_nodes = expected_values / 3;
    if tokens.len() != expected_values {
        let line = tokens.last().map_or(bounds_line, |t| t.line);
        log::warn!(
            "Field map declares {} nodes but holds {} values (last data line {})",
            expected_nodes,
            tokens.len(),
            line
        );
        return Err(FieldMapError::SampleCountMismatch {
            expected: expected_nodes,
            found: tokens.len() / 3,
        });
    }

    let samples = tokens
        .chunks_exact(3)
        .map(|c| [c[0].value, c[1].value, c[2].value]);

    match axes.as_slice() {
        [axis] => Ok(FieldMap::OneD(TabulatedField1D::from_samples(
            *axis, dimension, samples,
        )?)),
        [x, y, z] => Ok(FieldMap::ThreeD(TabulatedField3D::from_samples(
            [*x, *y, *z],
            samples,
        )?)),
        _ => Err(FieldMapError::FormatError {
            line: count_line,
            message: format!("Unsupported map dimensionality: {}", axes.len()),
        }),
    }
}

/// Read and parse a field map file.
pub fn load_field_map(path: &Path, dimension: MapDimension) -> Result<FieldMap, FieldMapError> {
    let content = std::fs::read_to_string(path)?;
    parse_field_map(&content, dimension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_1d_map() {
        let content = "# solenoid on-axis field\n3\n0.0 1.0\n0 0 0\n0 0 1.5 # peak\n0 0 0\n";
        let map = parse_field_map(content, MapDimension::Z).unwrap();
        let f = map.field_at(&[0.0, 0.0, 0.5], 0.0);
        assert!((f[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_3d_map_free_layout() {
        let mut content = String::from("2 2 2\n-1 1 -1 1 0 2\n");
        for i in 0..8 {
            content.push_str(&format!("{} 0 0 ", i));
        }
        let map = parse_field_map(&content, MapDimension::Z).unwrap();
        // Node (1, 1, 1) is the last sample.
        let f = map.field_at(&[1.0, 1.0, 2.0], 0.0);
        assert!((f[0] - 7.0).abs() < 1e-12);
        // Node (1, 0, 0) is sample index 4.
        let f = map.field_at(&[1.0, -1.0, 0.0], 0.0);
        assert!((f[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_file_fails_fast() {
        let content = "2 2 2\n-1 1 -1 1 0 2\n0 0 0\n0 0 0\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(
            err,
            FieldMapError::SampleCountMismatch { expected: 8, found: 2 }
        ));
    }

    #[test]
    fn test_non_positive_count_rejected() {
        let content = "0\n0 1\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidDimension { n: 0, .. }));
        let content = "-3\n0 1\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidDimension { n: -3, .. }));
    }

    #[test]
    fn test_oversized_counts_rejected_without_panic() {
        let content = "4294967296 4294967296 2\n0 1 0 1 0 1\n0 0 0\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(err, FieldMapError::FormatError { line: 1, .. }));

        // Large but representable: a plain count mismatch.
        let content = "100000 100000 100000\n0 1 0 1 0 1\n0 0 0\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(err, FieldMapError::SampleCountMismatch { found: 1, .. }));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let content = "2\n1.0 -1.0\n0 0 0\n0 0 0\n";
        let err = parse_field_map(content, MapDimension::X).unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidBounds { axis: 'x', .. }));
    }

    #[test]
    fn test_bad_token_reports_line() {
        let content = "2\n0 1\n0 0 0\n0 zero 0\n";
        let err = parse_field_map(content, MapDimension::Z).unwrap_err();
        assert!(matches!(err, FieldMapError::FormatError { line: 4, .. }));
    }
}
