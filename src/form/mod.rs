//! Form state behind both front-ends.
//!
//! - `predict`: one input per metadata feature, producing an ordered feature vector
//! - `editor`: the editable list of feature rows used for inline metadata
//! - `upload`: the upload form and its client-side validation
//!
//! All checks here run before any request is built.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ClientError;

pub mod editor;
pub mod predict;
pub mod upload;

pub use editor::*;
pub use predict::*;
pub use upload::*;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Provide a model name.")]
    MissingName,

    #[error("Provide a model file (.onnx).")]
    MissingModelFile,

    #[error("Model file is empty: {}", .0.display())]
    EmptyModelFile(PathBuf),

    #[error("Expected a {expected} file (got: {}).", .path.display())]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("Provide a metadata file (.meta or .json), or switch to inline metadata.")]
    MissingMetadataFile,

    #[error("Metadata file {} is not valid model metadata: {reason}", .path.display())]
    InvalidMetadataFile { path: PathBuf, reason: String },

    #[error("Could not read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Feature {row} has no name.")]
    UnnamedFeature { row: usize },

    #[error("Categorical feature '{name}' needs at least one option.")]
    NoOptions { name: String },

    #[error("Model metadata cannot be used for prediction: {0}")]
    UnusableMetadata(String),

    #[error("Unknown feature '{0}'.")]
    UnknownFeature(String),

    #[error("'{value}' is not an option for '{name}' (choose from: {}).", .options.join(", "))]
    NotAnOption {
        name: String,
        value: String,
        options: Vec<String>,
    },

    #[error("'{value}' is not a number (feature '{name}').")]
    NotANumber { name: String, value: String },

    #[error("Invalid feature spec '{spec}': {reason}")]
    InvalidFeatureSpec { spec: String, reason: String },
}

/// Failure of a form submission: either caught locally or returned by the API.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
