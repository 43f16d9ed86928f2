//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{clean_doc, contains_ignore_case, format_timestamp, truncate};
