//! Blob elements: opaque byte payloads stored in their own binary section
//!
//! A blob section is a [`BlobSectionHeader`] followed by the payload, padded
//! to a 4-byte boundary. The XML records the section's physical offset and
//! the payload length.

use e57fmt_core::{
    blob_section_logical_length, validate_transfer_range, BlobSectionHeader, ErrorCode,
};
use tracing::{debug, trace};

use super::{NodeImpl, NodeKind};
use crate::error::{Error, Result};
use crate::image_file::{ImageFile, ImageFileImpl};
use crate::xml::XmlWriter;

const HEADER_SIZE: u64 = BlobSectionHeader::SIZE as u64;

pub(crate) struct BlobData {
    /// Payload length in bytes
    logical_length: u64,
    /// Logical offset of the section header
    section_logical_start: u64,
    /// Header plus payload plus padding
    section_logical_length: u64,
}

impl BlobData {
    pub(crate) fn is_type_equivalent(&self, other: &Self) -> bool {
        self.logical_length == other.logical_length
    }

    fn payload_start(&self) -> u64 {
        self.section_logical_start + HEADER_SIZE
    }

    pub(crate) fn write_xml(&self, imf: &ImageFileImpl, w: &mut XmlWriter, depth: usize, name: &str) {
        let physical = imf.layout().logical_to_physical(self.section_logical_start);
        w.start_element(depth, name, "Blob");
        w.attribute("fileOffset", physical);
        w.attribute("length", self.logical_length);
        w.end_empty();
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, pad: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{pad}blobLogicalLength:     {}", self.logical_length);
        let _ = writeln!(out, "{pad}binarySectionLogicalStart: {}", self.section_logical_start);
        let _ = writeln!(out, "{pad}binarySectionLogicalLength: {}", self.section_logical_length);
    }
}

node_handle!(
    /// Opaque byte payload stored outside the XML section
    BlobNode,
    Blob,
    BlobData
);

impl BlobNode {
    /// Reserve a new blob section of `byte_count` payload bytes
    ///
    /// The section header is written immediately; the payload reads back as
    /// zeros until [`BlobNode::write`] fills it. Requires a writable file.
    pub fn new(file: &ImageFile, byte_count: u64) -> Result<Self> {
        let imf = &file.inner;
        imf.check_open()?;

        let section_logical_length = blob_section_logical_length(byte_count).ok_or_else(|| {
            Error::new(
                ErrorCode::BadApiArgument,
                format!("byteCount={byte_count} fileName={}", imf.file_name()),
            )
        })?;

        let section_logical_start = imf.allocate_space(section_logical_length, true)?;
        {
            let mut cf = imf.file_mut()?;
            cf.seek(section_logical_start)?;
            cf.write(&BlobSectionHeader::new(section_logical_length).to_bytes())?;
        }

        debug!(
            byte_count,
            section_logical_start, section_logical_length, "allocated blob section"
        );

        let node = NodeImpl::new(
            file,
            NodeKind::Blob(BlobData {
                logical_length: byte_count,
                section_logical_start,
                section_logical_length,
            }),
        )?;
        Ok(Self(super::Node(node)))
    }

    /// Describe an existing blob section found while reading a file
    ///
    /// `file_offset` is the physical offset recorded in the XML.
    pub fn from_file_offset(file: &ImageFile, file_offset: u64, length: u64) -> Result<Self> {
        let imf = &file.inner;
        imf.check_open()?;

        let (section_logical_start, file_logical_length) = {
            let cf = imf.file_mut()?;
            (cf.physical_to_logical(file_offset)?, cf.logical_length())
        };

        let section_logical_length = blob_section_logical_length(length).ok_or_else(|| {
            Error::new(
                ErrorCode::BadXmlFormat,
                format!("fileOffset={file_offset} length={length}"),
            )
        })?;

        let payload_end = section_logical_start
            .checked_add(HEADER_SIZE)
            .and_then(|start| start.checked_add(length));
        if !matches!(payload_end, Some(end) if end <= file_logical_length) {
            return Err(Error::new(
                ErrorCode::BadXmlFormat,
                format!(
                    "fileOffset={file_offset} length={length} blob extends past end of {}",
                    imf.file_name()
                ),
            ));
        }

        let node = NodeImpl::new(
            file,
            NodeKind::Blob(BlobData {
                logical_length: length,
                section_logical_start,
                section_logical_length,
            }),
        )?;
        Ok(Self(super::Node(node)))
    }

    /// Payload length in bytes
    pub fn byte_count(&self) -> Result<u64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.logical_length)
    }

    /// Copy `buf.len()` payload bytes starting at `start` into `buf`
    pub fn read(&self, buf: &mut [u8], start: u64) -> Result<()> {
        let imf = self.0 .0.check_open()?;
        let data = self.data()?;
        self.check_range(data, start, buf.len() as u64)?;

        trace!(start, count = buf.len(), "blob read");
        let mut cf = imf.file_mut()?;
        cf.seek(data.payload_start() + start)?;
        cf.read(buf)
    }

    /// Copy `buf` into the payload starting at `start`
    ///
    /// Requires a writable file and an attached blob.
    pub fn write(&self, buf: &[u8], start: u64) -> Result<()> {
        let imf = self.0 .0.check_open()?;
        if !imf.is_writer() {
            return Err(Error::new(
                ErrorCode::FileIsReadOnly,
                format!("fileName={}", imf.file_name()),
            ));
        }
        if !self.0 .0.is_attached() {
            return Err(Error::new(
                ErrorCode::NodeUnattached,
                format!("fileName={}", imf.file_name()),
            ));
        }
        let data = self.data()?;
        self.check_range(data, start, buf.len() as u64)?;

        trace!(start, count = buf.len(), "blob write");
        let mut cf = imf.file_mut()?;
        cf.seek(data.payload_start() + start)?;
        cf.write(buf)
    }

    fn check_range(&self, data: &BlobData, start: u64, count: u64) -> Result<()> {
        validate_transfer_range(start, count, data.logical_length).map_err(|code| {
            Error::new(
                code,
                format!(
                    "this->pathName={} start={start} count={count} length={}",
                    self.0 .0.path_name_raw(),
                    data.logical_length
                ),
            )
        })
    }
}
