//! Core types and trait definitions for the Vera insight engine.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod claim;
pub mod dataset;
pub mod error;
pub mod generate;
pub mod summary;

pub use error::{Error, Result};
