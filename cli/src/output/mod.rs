//! CLI-specific output
//!
//! Formats display snapshots for the terminal, with match highlights and
//! column alignment, or as JSON for scripting.

pub mod formatter;

pub use formatter::ResultFormatter;
