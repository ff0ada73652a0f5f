//! Reading and writing rate files.
//!
//! # Format
//! ```text
//! # length duplication loss gain
//! 0.51 0.4 1.0 0.2          <- one line per non-root node, in postorder
//! ...
//! |variation loss 4 0.8 0.05
//! |variation length 2 1.5
//! |root Poisson 1.2
//! |End
//! ```
//!
//! * `#` lines are comments; blank lines are skipped.
//! * `|variation <dimension> <k> <alpha> [<forbidden>]` with dimension one of
//!   `loss`, `duplication`, `gain` (or `transfer`), `length`; the forbidden
//!   probability is ignored for `length`.
//! * `|root <family> <params...>` with family one of `Poisson`,
//!   `NegativeBinomial`, `PointDistribution`, `ShiftedGeometric`.
//! * Reading stops at `|End` or at the end of the input.

use crate::model::indexed_tree::IndexedTree;
use crate::model::phylogeny::Phylogeny;
use crate::model::traversal::post_order;
use crate::rates::distribution::{Distribution, DistributionFamily};
use crate::rates::error::{ModelError, RateFileError};
use crate::rates::model::{BirthDeathModel, TreeWithRates};
use crate::rates::variation::{RateDimension, RateVariation};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Starts a rate variation line
const VARIATION_PREFIX: &str = "|variation";
/// Starts a root distribution line
const ROOT_PREFIX: &str = "|root";
/// Ends the model
const MODEL_END: &str = "|End";

/// Numbered lines of a reader (1-based).
struct Lines<R: BufRead> {
    lines: io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Next line that is neither blank nor a `#` comment.
    fn next_data_line(&mut self) -> Result<Option<String>, RateFileError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
        Ok(None)
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, line: usize) -> Result<T, RateFileError> {
    field.parse().map_err(|_| RateFileError::BadNumber {
        line,
        value: field.to_string(),
    })
}

// =#========================================================================#=
// READING
// =#========================================================================$=
/// Reads a rate file into a rate variation model over `tree`.
///
/// # Errors
/// A [RateFileError] carrying the line of the problem.
///
/// # Example
/// ```
/// use phylocount::newick::parse_str;
/// use phylocount::rates::{BirthDeathModel, Distribution, RateDimension, read_rates};
///
/// let tree = parse_str("((A:1,B:1):1,C:2);").unwrap();
/// let rates = "\
/// ## length duplication loss gain
/// 1 0.1 0.9 0.2
/// 1 0.1 0.8 0.2
/// 1 0.1 0.7 0.2
/// 2 0.1 0.6 0.2
/// |variation loss 2 1.0 0.1
/// |root Poisson 1.5
/// |End
/// ";
/// let variation = read_rates(rates.as_bytes(), tree).unwrap();
/// let model = variation.main_model();
///
/// // postorder: A, B, (A,B), C
/// assert_eq!(model.loss_rate(0), 0.9);
/// assert_eq!(model.loss_rate(3), 0.7);
/// assert_eq!(model.loss_rate(2), 0.6);
/// assert_eq!(variation.num_gamma_categories(RateDimension::Loss), 2);
/// assert_eq!(model.root_distribution(), Some(&Distribution::Poisson { lambda: 1.5 }));
/// ```
pub fn read_rates<R: BufRead>(reader: R, tree: Phylogeny) -> Result<RateVariation, RateFileError> {
    let mut lines = Lines::new(reader);
    let edges: Vec<usize> = post_order(&tree).filter(|&index| !tree.is_root(index)).collect();
    let mut model = TreeWithRates::new(tree);

    for (found, &edge) in edges.iter().enumerate() {
        let Some(line) = lines.next_data_line()? else {
            return Err(RateFileError::MissingEdges {
                line: lines.line_number,
                expected: edges.len(),
                found,
            });
        };
        let line_number = lines.line_number;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(RateFileError::ShortEdgeLine {
                line: line_number,
                found: fields.len(),
            });
        }
        let values = fields[..4]
            .iter()
            .map(|field| parse_number::<f64>(field, line_number))
            .collect::<Result<Vec<f64>, _>>()?;

        let set = |model: &mut TreeWithRates| -> Result<(), ModelError> {
            model.set_edge_length(edge, values[0])?;
            model.set_edge_duplication_rate(edge, values[1])?;
            model.set_edge_loss_rate(edge, values[2])?;
            model.set_edge_gain_rate(edge, values[3])
        };
        set(&mut model).map_err(|source| RateFileError::Model {
            line: line_number,
            source,
        })?;
    }

    let mut variation = RateVariation::new(model);
    while let Some(line) = lines.next_data_line()? {
        let line_number = lines.line_number;
        if line.starts_with(MODEL_END) {
            break;
        } else if let Some(rest) = line.strip_prefix(VARIATION_PREFIX) {
            read_variation_line(rest, line_number, &mut variation)?;
        } else if let Some(rest) = line.strip_prefix(ROOT_PREFIX) {
            let distribution = read_root_line(rest, line_number)?;
            variation.main_model_mut().set_root_distribution(Some(distribution));
        } else {
            debug!(line = line_number, "Skipping unrecognized line in rate file");
        }
    }

    Ok(variation)
}

/// Reads a rate file from disk, see [read_rates].
pub fn read_rates_file<P: AsRef<Path>>(path: P, tree: Phylogeny) -> Result<RateVariation, RateFileError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let variation = read_rates(BufReader::new(file), tree)?;
    info!(path = %path.display(), num_classes = variation.num_classes(), "Read rates");
    Ok(variation)
}

/// `<dimension> <k> <alpha> [<forbidden>]`
fn read_variation_line(rest: &str, line: usize, variation: &mut RateVariation) -> Result<(), RateFileError> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(RateFileError::BadVariation { line });
    }
    let dimension: RateDimension = fields[0].parse().map_err(|name| RateFileError::UnknownDimension { line, name })?;
    let k: usize = parse_number(fields[1], line)?;
    let alpha: f64 = parse_number(fields[2], line)?;
    let forbidden: f64 = match fields.get(3) {
        Some(field) => parse_number(field, line)?,
        None => 0.0,
    };

    let to_file_error = |source| RateFileError::Variation { line, source };
    variation.set_discretization(dimension, k, alpha).map_err(to_file_error)?;
    if dimension.has_forbidden() {
        variation.set_forbidden(dimension, forbidden).map_err(to_file_error)?;
    }
    Ok(())
}

/// `<family> <params...>`
fn read_root_line(rest: &str, line: usize) -> Result<Distribution, RateFileError> {
    let mut fields = rest.split_whitespace();
    let name = fields.next().ok_or(RateFileError::UnknownDistribution {
        line,
        name: String::new(),
    })?;
    let family = DistributionFamily::from_name(name).ok_or_else(|| RateFileError::UnknownDistribution {
        line,
        name: name.to_string(),
    })?;
    let params = fields
        .map(|field| parse_number::<f64>(field, line))
        .collect::<Result<Vec<f64>, _>>()?;
    Distribution::from_parameters(family, &params).map_err(|source| RateFileError::Model { line, source })
}

// =#========================================================================#=
// WRITING
// =#========================================================================$=
/// Writes a rate variation model in the format read by [read_rates].
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_rates<W: Write>(writer: W, variation: &RateVariation) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    let model = variation.main_model();
    let tree = model.tree();

    writeln!(writer, "# length duplication loss gain")?;
    for edge in post_order(tree).filter(|&index| !tree.is_root(index)) {
        write!(
            writer,
            "{}\t{}\t{}\t{}",
            model.edge_length(edge),
            model.duplication_rate(edge),
            model.loss_rate(edge),
            model.gain_rate(edge)
        )?;
        match tree.name(edge) {
            Some(name) => writeln!(writer, "\t# {}", name)?,
            None => writeln!(writer)?,
        }
    }

    for dimension in RateDimension::FILE_ORDER {
        write!(
            writer,
            "{} {} {} {}",
            VARIATION_PREFIX,
            dimension,
            variation.num_gamma_categories(dimension),
            variation.alpha(dimension)
        )?;
        if dimension.has_forbidden() {
            write!(writer, " {}", variation.forbidden(dimension))?;
        }
        writeln!(writer)?;
    }

    if let Some(distribution) = model.root_distribution() {
        write!(writer, "{} {}", ROOT_PREFIX, distribution.family().name())?;
        for param in distribution.parameters() {
            write!(writer, " {}", param)?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "{}", MODEL_END)?;

    writer.flush()
}

/// Writes a rate variation model to a file, see [write_rates].
pub fn write_rates_file<P: AsRef<Path>>(path: P, variation: &RateVariation) -> io::Result<()> {
    let path = path.as_ref();
    write_rates(File::create(path)?, variation)?;
    info!(path = %path.display(), "Wrote rates");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    const TREE: &str = "((A:1,B:1):1,C:2);";

    fn read(rates: &str) -> Result<RateVariation, RateFileError> {
        read_rates(rates.as_bytes(), parse_str(TREE).unwrap())
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let rates = "# header\n\n1 0 1 0\n# between\n1 0 1 0\n\n1 0 1 0\n2 0 1 0\n";
        let variation = read(rates).unwrap();
        assert_eq!(variation.main_model().edge_length(2), 2.0);
        assert_eq!(variation.num_classes(), 8);
    }

    #[test]
    fn test_line_numbers_in_errors() {
        let err = read("1 0 1 0\n\n1 0 x 0\n").unwrap_err();
        assert!(matches!(err, RateFileError::BadNumber { line: 3, ref value } if value == "x"));

        let err = read("1 0 1 0\n1 0 1\n").unwrap_err();
        assert!(matches!(err, RateFileError::ShortEdgeLine { line: 2, found: 3 }));

        let err = read("1 0 1 0\n1 0 1 0\n").unwrap_err();
        assert!(matches!(err, RateFileError::MissingEdges { expected: 4, found: 2, .. }));
    }

    #[test]
    fn test_variation_and_root_errors() {
        let edges = "1 0 1 0\n1 0 1 0\n1 0 1 0\n2 0 1 0\n";

        let err = read(&format!("{edges}|variation speed 2 1.0\n")).unwrap_err();
        assert!(matches!(err, RateFileError::UnknownDimension { line: 5, .. }));

        let err = read(&format!("{edges}|variation loss 2\n")).unwrap_err();
        assert!(matches!(err, RateFileError::BadVariation { line: 5 }));

        let err = read(&format!("{edges}|variation loss 0 1.0\n")).unwrap_err();
        assert!(matches!(err, RateFileError::Variation { line: 5, .. }));

        let err = read(&format!("{edges}|root Binomial 3\n")).unwrap_err();
        assert!(matches!(err, RateFileError::UnknownDistribution { line: 5, .. }));

        let err = read(&format!("{edges}|root NegativeBinomial 3\n")).unwrap_err();
        assert!(matches!(err, RateFileError::Model { line: 5, .. }));
    }

    #[test]
    fn test_end_marker_stops_reading() {
        let rates = "1 0 1 0\n1 0 1 0\n1 0 1 0\n2 0 1 0\n|End\n|variation loss 0 1.0\n";
        assert!(read(rates).is_ok());
    }

    #[test]
    fn test_length_ignores_forbidden() {
        let rates = "1 0 1 0\n1 0 1 0\n1 0 1 0\n2 0 1 0\n|variation length 3 1.0 0.5\n";
        let variation = read(rates).unwrap();
        assert_eq!(variation.num_gamma_categories(RateDimension::Length), 3);
        assert_eq!(variation.forbidden(RateDimension::Length), 0.0);
    }
}
