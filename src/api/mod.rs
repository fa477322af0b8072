//! Model backend API.

pub mod client;

pub use client::*;
