//! `model-deck` library crate.
//!
//! The binary (`deck`) is a thin wrapper around this library so that:
//!
//! - the HTTP client and form validation are testable without spawning processes
//! - the scripted commands and the TUI share one implementation
//! - code stays easy to navigate as the project grows

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod form;
pub mod report;
pub mod tui;
