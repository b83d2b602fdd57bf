//! Reporting utilities: formatted terminal output for pipeline runs.

pub mod format;

pub use format::*;
