// In: src/error.rs

//! This module defines the single, unified error type for the entire plm-codec library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every variant carries enough context (pixel index, expected vs. actual shape or
//! length, offending value) to diagnose a failure without re-running the frame.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlmError {
    // =========================================================================
    // === Configuration Errors (detected once, at profile construction)
    // =========================================================================
    #[error("Invalid device profile: {0}")]
    InvalidProfile(String),

    #[error("Unknown device preset '{name}'. Please select from one of {available:?}")]
    UnknownPreset {
        name: String,
        available: Vec<&'static str>,
    },

    // =========================================================================
    // === Data Errors (caller passed data inconsistent with the profile)
    // =========================================================================
    #[error(
        "Phase sample {value} at (row {row}, col {col}) is outside the phase range [{min}, {max}]"
    )]
    OutOfDomain {
        row: usize,
        col: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Shape mismatch: expected (rows, cols) = {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },

    /// A code above `2^bit_depth - 1`, or an electrode memory word missing from the
    /// device's memory LUT.
    #[error("Code {code} at (row {row}, col {col}) exceeds the device maximum {max}")]
    CodeOutOfRange {
        row: usize,
        col: usize,
        code: u64,
        max: u64,
    },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a profile document.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error originating from the underlying I/O subsystem (e.g., profile file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlmError {
    /// Convenience constructor for shape errors on 2-D fields.
    pub(crate) fn shape(expected: (usize, usize), actual: (usize, usize)) -> Self {
        PlmError::ShapeMismatch { expected, actual }
    }
}
