//! Error types for IFC Picker.

use crate::model::{ElementRef, ExpressId, ModelHandle};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing IFC content.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors raised by the picking and inspection pipeline.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The engine does not know the handle, or it was already closed.
    #[error("{handle} is not open")]
    ModelNotOpen { handle: ModelHandle },

    /// The hit surface carries no element ids (helper geometry).
    #[error("face {face} of fragment {fragment} has no element id")]
    UnmappedFace { fragment: usize, face: usize },

    /// The element is not in its model's line index.
    #[error("element {element} not found")]
    ElementNotFound { element: ElementRef },

    /// The engine listed the same id twice while indexing. Logged, not returned.
    #[error("{id} reported twice in {handle}")]
    DuplicateIdentifier { handle: ModelHandle, id: ExpressId },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}

/// Errors that can occur when loading the viewer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
