//! Binary format definitions for the E57 file layout
//!
//! This module contains pure data structure definitions for the E57 wire
//! format. No I/O operations, only layout specifications.

pub mod constants;
pub mod file_header;
pub mod node_type;
pub mod section;

pub use constants::*;
pub use file_header::FileHeader;
pub use node_type::{FloatPrecision, NodeType};
pub use section::BlobSectionHeader;
