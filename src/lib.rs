//! `sales-forecast` library crate.
//!
//! The binary (`sales`) is a thin wrapper around this library so that:
//!
//! - cleaning, aggregation and forecasting are testable without spawning processes
//! - each stage is a plain function over value types
//!
//! Stages: [`clean`] -> [`aggregate`] -> [`forecast`], composed by [`app::pipeline`].

pub mod aggregate;
pub mod app;
pub mod clean;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
