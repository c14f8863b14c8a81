//! Output formatting utilities for the lf CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by command:
//!
//! - [`instances`] - Run output formatting (per-instance counts, headings, items)
//! - [`queries`] - Decoded query output formatting
//! - [`helpers`] - Common formatting utilities (truncation, criteria, counts)

pub mod helpers;
mod instances;
mod queries;

// Run
pub use instances::{format_run_json, format_run_table};

// Decode
pub use queries::{format_decoded_json, format_decoded_table};
