#![no_std]

//! E57 Core - ASTM E57 Format Definitions
//!
//! This crate provides the pure, I/O free parts of the E57 file format:
//! error codes, binary section and file headers, layout arithmetic, the
//! scaled integer encoding, element name grammar and markup escaping.

pub mod error;
pub mod escape;
pub mod format;
pub mod validation;

pub use error::*;
pub use format::*;
pub use validation::*;

