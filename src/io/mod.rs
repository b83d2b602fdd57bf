//! Input/output helpers.
//!
//! - order CSV ingest + summary CSV read-back (`ingest`)
//! - CSV exports of the pipeline tables (`export`)
//! - fitted-model JSON read/write (`model`)

pub mod export;
pub mod ingest;
pub mod model;

pub use export::*;
pub use ingest::*;
pub use model::*;
