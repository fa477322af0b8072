//! Domain types used throughout the client.
//!
//! This module defines:
//!
//! - model metadata as served by the backend (`ModelMetadata`, `FeatureDescriptor`)
//! - feature vectors sent for prediction (`FeatureValue`, `PredictRequest`)

pub mod types;

pub use types::*;
