//! Error codes for E57 operations

/// Numeric error identifiers shared by every E57 implementation
///
/// The discriminants are the codes assigned by the reference library, so
/// they stay stable across implementations and can be logged as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ErrorCode {
    BadCvHeader = 1,
    BadCvPacket = 2,
    ChildIndexOutOfBounds = 3,
    SetTwice = 4,
    HomogeneousViolation = 5,
    ValueNotRepresentable = 6,
    ScaledValueNotRepresentable = 7,
    Real64TooLarge = 8,
    ExpectingNumeric = 9,
    ExpectingUstring = 10,
    Internal = 11,
    BadXmlFormat = 12,
    XmlParser = 13,
    BadApiArgument = 14,
    FileIsReadOnly = 15,
    BadChecksum = 16,
    OpenFailed = 17,
    CloseFailed = 18,
    ReadFailed = 19,
    WriteFailed = 20,
    LseekFailed = 21,
    PathUndefined = 22,
    BadBuffer = 23,
    NoBufferForElement = 24,
    BufferSizeMismatch = 25,
    BufferDuplicatePathname = 26,
    BadFileSignature = 27,
    UnknownFileVersion = 28,
    BadFileLength = 29,
    XmlParserInit = 30,
    DuplicateNamespacePrefix = 31,
    DuplicateNamespaceUri = 32,
    BadPrototype = 33,
    BadCodecs = 34,
    ValueOutOfBounds = 35,
    ConversionRequired = 36,
    BadPathName = 37,
    NotImplemented = 38,
    BadNodeDowncast = 39,
    WriterNotOpen = 40,
    ReaderNotOpen = 41,
    NodeUnattached = 42,
    AlreadyHasParent = 43,
    DifferentDestImageFile = 44,
    ImageFileNotOpen = 45,
    BuffersNotCompatible = 46,
    TooManyWriters = 47,
    TooManyReaders = 48,
    BadConfiguration = 49,
    InvarianceViolation = 50,
}

impl ErrorCode {
    /// Numeric code as assigned by the standard reference library
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human readable description of the failure
    pub const fn message(self) -> &'static str {
        match self {
            ErrorCode::BadCvHeader => "a CompressedVector binary header was bad",
            ErrorCode::BadCvPacket => "a CompressedVector binary packet was bad",
            ErrorCode::ChildIndexOutOfBounds => {
                "a numerical index identifying a child was out of bounds"
            }
            ErrorCode::SetTwice => "attempted to set an existing child element to a new value",
            ErrorCode::HomogeneousViolation => {
                "attempted to add an E57 Element that would have made the children of a homogenous Vector have different types"
            }
            ErrorCode::ValueNotRepresentable => {
                "a value could not be represented in the requested type"
            }
            ErrorCode::ScaledValueNotRepresentable => {
                "after scaling the result could not be represented in the requested type"
            }
            ErrorCode::Real64TooLarge => {
                "a 64 bit IEEE float was too large to store in a 32 bit IEEE float"
            }
            ErrorCode::ExpectingNumeric => {
                "expecting numeric representation in user's buffer, found ustring"
            }
            ErrorCode::ExpectingUstring => {
                "expecting string representation in user's buffer, found numeric"
            }
            ErrorCode::Internal => "an unrecoverable inconsistent internal state was detected",
            ErrorCode::BadXmlFormat => "E57 primitive not encoded in XML correctly",
            ErrorCode::XmlParser => "XML not well formed",
            ErrorCode::BadApiArgument => "bad API function argument provided by user",
            ErrorCode::FileIsReadOnly => "can't modify read only file",
            ErrorCode::BadChecksum => "checksum mismatch, file is corrupted",
            ErrorCode::OpenFailed => "open() failed",
            ErrorCode::CloseFailed => "close() failed",
            ErrorCode::ReadFailed => "read() failed",
            ErrorCode::WriteFailed => "write() failed",
            ErrorCode::LseekFailed => "lseek() failed",
            ErrorCode::PathUndefined => "E57 element path well formed but not defined",
            ErrorCode::BadBuffer => "bad SourceDestBuffer",
            ErrorCode::NoBufferForElement => {
                "no buffer specified for an element in CompressedVectorNode during write"
            }
            ErrorCode::BufferSizeMismatch => "SourceDestBuffers not all same size",
            ErrorCode::BufferDuplicatePathname => {
                "duplicate pathname in CompressedVectorNode read/write"
            }
            ErrorCode::BadFileSignature => "file signature not \"ASTM-E57\"",
            ErrorCode::UnknownFileVersion => "incompatible file version",
            ErrorCode::BadFileLength => "size in file header not same as actual",
            ErrorCode::XmlParserInit => "XML parser failed to initialize",
            ErrorCode::DuplicateNamespacePrefix => "namespace prefix already defined",
            ErrorCode::DuplicateNamespaceUri => "namespace URI already defined",
            ErrorCode::BadPrototype => "bad prototype in CompressedVectorNode",
            ErrorCode::BadCodecs => "bad codecs in CompressedVectorNode",
            ErrorCode::ValueOutOfBounds => "element value out of min/max bounds",
            ErrorCode::ConversionRequired => {
                "conversion required to assign element value, but not requested"
            }
            ErrorCode::BadPathName => "E57 path name is not well formed",
            ErrorCode::NotImplemented => "functionality not implemented",
            ErrorCode::BadNodeDowncast => "bad downcast from Node to specific node type",
            ErrorCode::WriterNotOpen => "CompressedVectorWriter is no longer open",
            ErrorCode::ReaderNotOpen => "CompressedVectorReader is no longer open",
            ErrorCode::NodeUnattached => "node is not yet attached to tree of ImageFile",
            ErrorCode::AlreadyHasParent => "node already has a parent",
            ErrorCode::DifferentDestImageFile => {
                "nodes were constructed with different destImageFiles"
            }
            ErrorCode::ImageFileNotOpen => "destImageFile is no longer open",
            ErrorCode::BuffersNotCompatible => {
                "SourceDestBuffers not compatible with previously given ones"
            }
            ErrorCode::TooManyWriters => "too many open CompressedVectorWriters of an ImageFile",
            ErrorCode::TooManyReaders => "too many open CompressedVectorReaders of an ImageFile",
            ErrorCode::BadConfiguration => "bad configuration string",
            ErrorCode::InvarianceViolation => "class invariance constraint violation in debug mode",
        }
    }

    /// Whether the failure came from the underlying byte stream rather
    /// than from a violated precondition
    pub const fn is_io(self) -> bool {
        matches!(
            self,
            ErrorCode::OpenFailed
                | ErrorCode::CloseFailed
                | ErrorCode::ReadFailed
                | ErrorCode::WriteFailed
                | ErrorCode::LseekFailed
                | ErrorCode::BadChecksum
        )
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (E57 error {})", self.message(), self.code())
    }
}

/// Result type for E57 core operations
pub type Result<T> = core::result::Result<T, ErrorCode>;
