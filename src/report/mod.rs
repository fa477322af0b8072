//! Reporting utilities: terminal text for model lists, metadata, results and errors.

pub mod format;

pub use format::*;
