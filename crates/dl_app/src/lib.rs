//! Command-line front end for the dl engine.
pub mod cli;
pub mod config;
pub mod merge;
