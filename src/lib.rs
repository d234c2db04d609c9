//! dlsck - offline integrity tool for a distributed log store's bucket files
//!
//! A channel stores its records in time-bucketed, append-only bucket files.
//! This crate validates those files, repairs salvageable corruption, and
//! maintains the channel's persisted size index.

pub mod bucket;
pub mod check;
pub mod cli;
pub mod config;
pub mod observability;
pub mod repair;
pub mod size_index;
