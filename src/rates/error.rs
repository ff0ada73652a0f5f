//! Error types of the rate layer.

use crate::rates::variation::RateDimension;
use std::io;

/// Problems evaluating or configuring a rate model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Transient distribution on edge {edge} is not a number (p = {p}, q = {q})")]
    NotANumber { edge: usize, p: f64, q: f64 },
    #[error("Edge {edge} out of range for a tree with {num_edges} edges")]
    EdgeOutOfRange { edge: usize, num_edges: usize },
    #[error("{family} takes {expected} parameter(s), got {found}")]
    WrongParameterCount {
        family: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Invalid rate variation settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VariationError {
    #[error("Need at least one {0} category")]
    NoCategories(RateDimension),
    #[error("Gamma shape for {dimension} must be positive and finite, got {alpha}")]
    InvalidShape { dimension: RateDimension, alpha: f64 },
    #[error("Forbidden {dimension} probability must be in [0, 1], got {p}")]
    InvalidForbidden { dimension: RateDimension, p: f64 },
    #[error("There is no forbidden category for {0}")]
    NoForbiddenCategory(RateDimension),
    #[error("Class {class} out of range for {num_classes} classes")]
    ClassOutOfRange { class: usize, num_classes: usize },
}

/// Problems reading a rate file.
///
/// Line numbers are 1-based.
#[derive(thiserror::Error, Debug)]
pub enum RateFileError {
    #[error("IO error - {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: file ends before the rates of all {expected} edges, read {found}")]
    MissingEdges { line: usize, expected: usize, found: usize },
    #[error("Line {line}: expected 4 values (length duplication loss gain), got {found}")]
    ShortEdgeLine { line: usize, found: usize },
    #[error("Line {line}: '{value}' is not a number")]
    BadNumber { line: usize, value: String },
    #[error("Line {line}: rate variation line has bad syntax")]
    BadVariation { line: usize },
    #[error("Line {line}: variation type '{name}' is not recognized")]
    UnknownDimension { line: usize, name: String },
    #[error("Line {line}: root distribution '{name}' is unknown")]
    UnknownDistribution { line: usize, name: String },
    #[error("Line {line}: {source}")]
    Model { line: usize, source: ModelError },
    #[error("Line {line}: {source}")]
    Variation { line: usize, source: VariationError },
}

impl RateFileError {
    /// Line of the problem, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            RateFileError::Io(_) => None,
            RateFileError::MissingEdges { line, .. }
            | RateFileError::ShortEdgeLine { line, .. }
            | RateFileError::BadNumber { line, .. }
            | RateFileError::BadVariation { line }
            | RateFileError::UnknownDimension { line, .. }
            | RateFileError::UnknownDistribution { line, .. }
            | RateFileError::Model { line, .. }
            | RateFileError::Variation { line, .. } => Some(*line),
        }
    }
}
