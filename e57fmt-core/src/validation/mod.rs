//! Validation utilities for the E57 format
//!
//! Pure functions with no I/O dependencies: layout arithmetic, bounds
//! checks, scaling and name grammar.

pub mod bounds;
pub mod layout;
pub mod names;
pub mod scaling;

pub use bounds::{validate_child_index, validate_transfer_range, within_bounds};
pub use layout::{align_to_boundary, blob_section_logical_length, validate_page_size, PageLayout};
pub use names::{is_index_name, parse_index, split_prefix, validate_element_name, PathName};
pub use scaling::{raw_from_scaled, scaled_from_raw};
