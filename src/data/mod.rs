//! Built-in datasets.

pub mod reference;

pub use reference::*;
