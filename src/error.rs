//! Error types for the analysis and mixing engine

use std::fmt;

/// Errors that can occur during analysis, selection or calibration
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (degenerate profile, NaN, etc.)
    NumericalError(String),

    /// The caller cancelled the analysis
    Cancelled(String),

    /// Not enough playable tracks in the library
    InsufficientLibrary(String),

    /// Calibration harness could not produce a result
    CalibrationError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            AnalysisError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            AnalysisError::InsufficientLibrary(msg) => write!(f, "Insufficient library: {}", msg),
            AnalysisError::CalibrationError(msg) => write!(f, "Calibration error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
