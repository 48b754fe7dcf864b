//! Format constants fixed by the ASTM E57 standard

/// Physical page size of the checked byte stream
pub const PAGE_SIZE: u64 = 1024;

/// Size of the checksum slot trailing every physical page
pub const CHECKSUM_SIZE: u64 = 4;

/// Logical payload bytes carried by one physical page
pub const LOGICAL_PAGE_SIZE: u64 = PAGE_SIZE - CHECKSUM_SIZE;

/// Binary sections are padded to this many bytes
pub const SECTION_ALIGNMENT: u64 = 4;

/// File signature stored in the first eight bytes
pub const FILE_SIGNATURE: [u8; 8] = *b"ASTM-E57";

/// Major version of the standard written by this crate
pub const FORMAT_MAJOR: u32 = 1;

/// Minor version of the standard written by this crate
pub const FORMAT_MINOR: u32 = 0;

/// Default XML namespace of an E57 v1.0 document
pub const E57_V1_0_URI: &str = "http://www.astm.org/COMMIT/E57/2010-e57-v1.0";

/// Element name of the tree root in the XML section
pub const ROOT_ELEMENT_NAME: &str = "e57Root";

/// Element name used for every child of a Vector in the XML section
pub const VECTOR_CHILD_NAME: &str = "vectorChild";

/// Default Integer / ScaledInteger bounds
pub const INT64_MIN: i64 = i64::MIN;
pub const INT64_MAX: i64 = i64::MAX;

/// Default bounds of a single precision Float, expressed in double precision
pub const FLOAT_MIN: f64 = -(f32::MAX as f64);
pub const FLOAT_MAX: f64 = f32::MAX as f64;

/// Default bounds of a double precision Float
pub const DOUBLE_MIN: f64 = f64::MIN;
pub const DOUBLE_MAX: f64 = f64::MAX;

/// Section identifiers stored in the first byte of a binary section
pub mod section_id {
    pub const BLOB: u8 = 0;
    pub const COMPRESSED_VECTOR: u8 = 1;
}
