//! Shared functionality
//!
//! This crate supplies the input stream and source locations used by the corecss crates.
//!

pub mod byte_stream;
