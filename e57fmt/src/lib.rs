//! e57fmt - Typed element tree for ASTM E57 point cloud files
//!
//! An E57 file is a paged binary container whose metadata lives in an XML
//! section. This crate models that metadata as a tree of typed elements,
//! enforces the attachment and ownership rules between them, lays out blob
//! sections in the binary part of the file and writes the XML section.
//!
//! ## Architecture
//!
//! - **e57fmt-core**: Error codes, file and section headers, page layout
//!   arithmetic, name grammar and escaping rules (no I/O)
//! - **e57fmt**: File sessions, the checked byte stream, the element tree and
//!   the XML writer
//!
//! ## Quick Start
//!
//! ```rust
//! use e57fmt::{BlobNode, ImageFile, IntegerNode, StringNode, TreeBuilder};
//!
//! fn example() -> e57fmt::Result<()> {
//!     let imf = ImageFile::create_in_memory("scan.e57")?;
//!     let root = imf.root()?;
//!     root.set_path("/guid", StringNode::new(&imf, "{example}")?)?;
//!     root.set_path("/data3D/count", IntegerNode::new(&imf, 3, 0, 100)?)?;
//!
//!     let blob = BlobNode::new(&imf, 4)?;
//!     root.set_path("thumbnail", blob.clone())?;
//!     blob.write(&[1, 2, 3, 4], 0)?;
//!     imf.close()?;
//!
//!     let bytes = imf.memory_contents().unwrap_or_default();
//!     let reopened = ImageFile::open_bytes("scan.e57", bytes, |xml: &str, _: &mut TreeBuilder<'_>| {
//!         assert!(xml.contains("<guid type=\"String\">"));
//!         Ok(())
//!     })?;
//!     assert!(!reopened.is_writer()?);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! - **mmap**: Memory-mapped read sessions
//! - **serde**: JSON configuration and serializable header types
//! - **dump**: Human readable tree dumps for debugging

pub use e57fmt_core::{
    // Error codes
    ErrorCode,
    // Format definitions
    BlobSectionHeader, FileHeader, FloatPrecision, NodeType,
    // Layout
    PageLayout,
};

// Implementation modules
pub mod backend;
pub mod checked_file;
pub mod config;
pub mod error;
pub mod image_file;
pub mod markup;
pub mod node;
pub mod xml;

// Public exports
pub use config::ImageFileConfig;
pub use error::{Error, Result};
pub use image_file::ImageFile;
pub use markup::{MarkupReader, TreeBuilder};
pub use node::{
    BlobNode, FloatNode, IntegerNode, Node, ScaledIntegerNode, StringNode, StructureNode,
    VectorNode,
};
