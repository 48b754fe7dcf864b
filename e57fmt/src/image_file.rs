//! File sessions
//!
//! An [`ImageFile`] owns the checked byte stream, the extension namespace
//! table and the root of the element tree. Writers lay out binary sections
//! as elements are created and emit the XML section and file header on
//! [`ImageFile::close`]. Readers parse the header, hand the XML section to a
//! caller-supplied [`MarkupReader`] and leave the stream open for blob reads.

use std::cell::{Cell, RefCell, RefMut};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use e57fmt_core::{
    is_index_name, split_prefix, validate_element_name, ErrorCode, FileHeader, PageLayout,
    ROOT_ELEMENT_NAME,
};
use tracing::{debug, info, warn};

use crate::backend::{FileBackend, MemoryBackend, StorageBackend};
use crate::checked_file::CheckedFile;
use crate::config::ImageFileConfig;
use crate::error::{Error, Result};
use crate::markup::{MarkupReader, TreeBuilder};
use crate::node::{NodeImpl, StructureNode};
use crate::xml::XmlWriter;

/// Session state shared by the public handle and every element
pub(crate) struct ImageFileImpl {
    name: String,
    path: Option<PathBuf>,
    writer: bool,
    open: Cell<bool>,
    config: ImageFileConfig,
    layout: PageLayout,
    file: RefCell<CheckedFile>,
    root: RefCell<Option<Rc<NodeImpl>>>,
    extensions: RefCell<Vec<(String, String)>>,
    unused_logical_start: Cell<u64>,
}

impl ImageFileImpl {
    fn build(
        name: String,
        path: Option<PathBuf>,
        writer: bool,
        config: ImageFileConfig,
        file: CheckedFile,
    ) -> Rc<Self> {
        let imf = Rc::new(Self {
            name,
            path,
            writer,
            open: Cell::new(true),
            layout: file.layout(),
            config,
            file: RefCell::new(file),
            root: RefCell::new(None),
            extensions: RefCell::new(Vec::new()),
            unused_logical_start: Cell::new(FileHeader::SIZE as u64),
        });
        *imf.root.borrow_mut() = Some(NodeImpl::new_root(&imf));
        imf
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.open.get() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::ImageFileNotOpen,
                format!("fileName={}", self.name),
            ))
        }
    }

    fn check_writer(&self) -> Result<()> {
        if self.writer {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::FileIsReadOnly,
                format!("fileName={}", self.name),
            ))
        }
    }

    pub(crate) fn is_writer(&self) -> bool {
        self.writer
    }

    pub(crate) fn file_name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &ImageFileConfig {
        &self.config
    }

    pub(crate) fn layout(&self) -> PageLayout {
        self.layout
    }

    pub(crate) fn root_node(&self) -> Result<Rc<NodeImpl>> {
        self.root
            .borrow()
            .clone()
            .ok_or_else(|| Error::internal(format!("fileName={} has no root", self.name)))
    }

    pub(crate) fn is_root_node(&self, node: &Rc<NodeImpl>) -> bool {
        self.root
            .borrow()
            .as_ref()
            .is_some_and(|root| Rc::ptr_eq(root, node))
    }

    /// Exclusive access to the byte stream
    pub(crate) fn file_mut(&self) -> Result<RefMut<'_, CheckedFile>> {
        self.file.try_borrow_mut().map_err(|_| {
            Error::internal(format!("fileName={} byte stream already in use", self.name))
        })
    }

    /// Reserve `byte_count` logical bytes at the end of the file and return
    /// the start of the reserved range
    pub(crate) fn allocate_space(&self, byte_count: u64, extend_now: bool) -> Result<u64> {
        self.check_writer()?;
        let old_start = self.unused_logical_start.get();
        let new_start = old_start.checked_add(byte_count).ok_or_else(|| {
            Error::new(
                ErrorCode::BadApiArgument,
                format!("fileName={} byteCount={byte_count}", self.name),
            )
        })?;
        if extend_now {
            self.file_mut()?.extend(new_start)?;
        }
        self.unused_logical_start.set(new_start);
        debug!(file = %self.name, start = old_start, byte_count, "allocated space");
        Ok(old_start)
    }

    /// Registered `(prefix, uri)` pairs, in registration order
    pub(crate) fn extensions(&self) -> Vec<(String, String)> {
        self.extensions.borrow().clone()
    }

    pub(crate) fn add_extension(&self, prefix: &str, uri: &str) -> Result<()> {
        if prefix.contains(':') || is_index_name(prefix) || validate_element_name(prefix).is_err()
        {
            return Err(Error::new(
                ErrorCode::BadApiArgument,
                format!("fileName={} prefix={prefix}", self.name),
            ));
        }
        let mut extensions = self.extensions.borrow_mut();
        if extensions.iter().any(|(p, _)| p == prefix) {
            return Err(Error::new(
                ErrorCode::DuplicateNamespacePrefix,
                format!("fileName={} prefix={prefix} uri={uri}", self.name),
            ));
        }
        if extensions.iter().any(|(_, u)| u == uri) {
            return Err(Error::new(
                ErrorCode::DuplicateNamespaceUri,
                format!("fileName={} prefix={prefix} uri={uri}", self.name),
            ));
        }
        extensions.push((prefix.to_string(), uri.to_string()));
        debug!(file = %self.name, prefix, uri, "registered extension");
        Ok(())
    }

    /// Reject element names whose prefix is not a registered extension
    pub(crate) fn check_element_name(&self, name: &str) -> Result<()> {
        validate_element_name(name)
            .map_err(|code| Error::new(code, format!("elementName={name}")))?;
        if let Some((prefix, _)) = split_prefix(name) {
            if !self.extensions.borrow().iter().any(|(p, _)| p == prefix) {
                return Err(Error::new(
                    ErrorCode::BadPathName,
                    format!("elementName={name} prefix={prefix} is not registered"),
                ));
            }
        }
        Ok(())
    }

    fn write_xml_and_header(&self) -> Result<()> {
        let root = self.root_node()?;
        let mut w = XmlWriter::new(self.config.xml_indent);
        root.write_xml(self, &mut w, 0, Some(ROOT_ELEMENT_NAME))?;
        let xml = w.into_string();

        let xml_logical_offset = self.allocate_space(xml.len() as u64, true)?;
        let mut cf = self.file_mut()?;
        cf.seek(xml_logical_offset)?;
        cf.write(xml.as_bytes())?;

        let header = FileHeader {
            file_physical_length: cf.physical_length(),
            xml_physical_offset: cf.logical_to_physical(xml_logical_offset),
            xml_logical_length: xml.len() as u64,
            page_size: self.layout.page_size(),
            ..FileHeader::new()
        };
        cf.seek(0)?;
        cf.write(&header.to_bytes())?;
        cf.flush()?;

        debug!(
            file = %self.name,
            xml_logical_offset,
            xml_length = xml.len(),
            physical_length = header.file_physical_length,
            "wrote xml section and header"
        );
        Ok(())
    }
}

impl Drop for ImageFileImpl {
    fn drop(&mut self) {
        if self.open.get() && self.writer {
            warn!(file = %self.name, "writer dropped without close, file is incomplete");
        }
    }
}

#[cfg(feature = "mmap")]
fn read_backend(file: File, config: &ImageFileConfig) -> std::io::Result<Box<dyn StorageBackend>> {
    if config.mmap_reads {
        Ok(Box::new(crate::backend::MmapBackend::open(&file)?))
    } else {
        Ok(Box::new(FileBackend::open(file)?))
    }
}

#[cfg(not(feature = "mmap"))]
fn read_backend(file: File, _config: &ImageFileConfig) -> std::io::Result<Box<dyn StorageBackend>> {
    Ok(Box::new(FileBackend::open(file)?))
}

/// An open E57 file
///
/// Cloning the handle shares the session.
#[derive(Clone)]
pub struct ImageFile {
    pub(crate) inner: Rc<ImageFileImpl>,
}

impl ImageFile {
    /// Create a new file on disk with the default configuration
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_config(path, ImageFileConfig::default())
    }

    /// Create a new file on disk
    ///
    /// An existing file at `path` is truncated.
    pub fn create_with_config(path: impl AsRef<Path>, config: ImageFileConfig) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::io(ErrorCode::OpenFailed, format!("fileName={name}"), e))?;
        let backend = FileBackend::create(file)
            .map_err(|e| Error::io(ErrorCode::OpenFailed, format!("fileName={name}"), e))?;
        Self::new_writer(name, Some(path.to_path_buf()), Box::new(backend), config)
    }

    /// Create a writer that keeps the file in memory
    ///
    /// The finished bytes are available from [`ImageFile::memory_contents`]
    /// after [`ImageFile::close`].
    pub fn create_in_memory(name: impl Into<String>) -> Result<Self> {
        Self::create_in_memory_with_config(name, ImageFileConfig::default())
    }

    /// In-memory writer with explicit settings
    pub fn create_in_memory_with_config(
        name: impl Into<String>,
        config: ImageFileConfig,
    ) -> Result<Self> {
        Self::new_writer(name.into(), None, Box::new(MemoryBackend::new()), config)
    }

    fn new_writer(
        name: String,
        path: Option<PathBuf>,
        backend: Box<dyn StorageBackend>,
        config: ImageFileConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut file = CheckedFile::new(name.clone(), backend, config.page_layout()?)?;
        // page 0 holds the header, written last
        file.extend(FileHeader::SIZE as u64)?;

        info!(file = %name, page_size = config.page_size, "created image file");
        Ok(Self {
            inner: ImageFileImpl::build(name, path, true, config, file),
        })
    }

    /// Open an existing file for reading with the default configuration
    pub fn open(path: impl AsRef<Path>, reader: impl MarkupReader) -> Result<Self> {
        Self::open_with_config(path, ImageFileConfig::default(), reader)
    }

    /// Open an existing file for reading
    ///
    /// `reader` parses the XML section and rebuilds the element tree.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: ImageFileConfig,
        reader: impl MarkupReader,
    ) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file = File::open(path)
            .map_err(|e| Error::io(ErrorCode::OpenFailed, format!("fileName={name}"), e))?;
        let backend = read_backend(file, &config)
            .map_err(|e| Error::io(ErrorCode::OpenFailed, format!("fileName={name}"), e))?;
        Self::open_backend(name, Some(path.to_path_buf()), backend, config, reader)
    }

    /// Open a file held in memory
    pub fn open_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        reader: impl MarkupReader,
    ) -> Result<Self> {
        Self::open_bytes_with_config(name, bytes, ImageFileConfig::default(), reader)
    }

    /// Read session over a byte buffer with explicit settings
    pub fn open_bytes_with_config(
        name: impl Into<String>,
        bytes: Vec<u8>,
        config: ImageFileConfig,
        reader: impl MarkupReader,
    ) -> Result<Self> {
        Self::open_backend(
            name.into(),
            None,
            Box::new(MemoryBackend::from_bytes(bytes)),
            config,
            reader,
        )
    }

    fn open_backend(
        name: String,
        path: Option<PathBuf>,
        mut backend: Box<dyn StorageBackend>,
        config: ImageFileConfig,
        mut reader: impl MarkupReader,
    ) -> Result<Self> {
        config.validate()?;

        // the header sits at the start of page 0, before any checksum slot
        let physical_length = backend.len();
        let mut header_bytes = [0u8; FileHeader::SIZE];
        if physical_length < FileHeader::SIZE as u64 {
            return Err(Error::new(
                ErrorCode::BadFileLength,
                format!("fileName={name} physicalLength={physical_length}"),
            ));
        }
        backend
            .read_at(0, &mut header_bytes)
            .map_err(|e| Error::io(ErrorCode::ReadFailed, format!("fileName={name}"), e))?;
        let header = FileHeader::from_bytes(&header_bytes, physical_length)
            .map_err(|code| Error::new(code, format!("fileName={name}")))?;

        let layout = PageLayout::new(header.page_size)
            .map_err(|code| Error::new(code, format!("fileName={name} pageSize={}", header.page_size)))?;
        let mut file = CheckedFile::new(name.clone(), backend, layout)?;

        let xml_logical_offset = file.physical_to_logical(header.xml_physical_offset)?;
        let xml_length = usize::try_from(header.xml_logical_length).map_err(|_| {
            Error::new(
                ErrorCode::BadFileLength,
                format!("fileName={name} xmlLogicalLength={}", header.xml_logical_length),
            )
        })?;
        let mut xml = vec![0u8; xml_length];
        file.seek(xml_logical_offset)?;
        file.read(&mut xml)?;
        let xml = String::from_utf8(xml).map_err(|e| {
            Error::new(
                ErrorCode::BadXmlFormat,
                format!("fileName={name} xml section is not UTF-8: {e}"),
            )
        })?;

        info!(
            file = %name,
            major = header.major_version,
            minor = header.minor_version,
            physical_length,
            "opened image file"
        );

        let imf = Self {
            inner: ImageFileImpl::build(name, path, false, config, file),
        };
        let mut builder = TreeBuilder::new(&imf);
        if let Err(e) = reader.read_tree(&xml, &mut builder) {
            imf.inner.open.set(false);
            return Err(e);
        }
        Ok(imf)
    }

    /// Whether the session is still usable
    pub fn is_open(&self) -> bool {
        self.inner.open.get()
    }

    /// Whether the session was created for writing
    pub fn is_writer(&self) -> Result<bool> {
        self.inner.check_open()?;
        Ok(self.inner.writer)
    }

    /// Name given when the session was created or opened
    pub fn file_name(&self) -> &str {
        &self.inner.name
    }

    /// Settings the session was created with
    pub fn config(&self) -> &ImageFileConfig {
        &self.inner.config
    }

    /// Root structure of the element tree
    pub fn root(&self) -> Result<StructureNode> {
        self.inner.check_open()?;
        let root = self.inner.root_node()?;
        StructureNode::try_from(crate::node::Node(root))
    }

    /// Register an extension namespace so its prefix may be used in element
    /// names
    pub fn extensions_add(&self, prefix: &str, uri: &str) -> Result<()> {
        self.inner.check_open()?;
        self.inner.check_writer()?;
        self.inner.add_extension(prefix, uri)
    }

    /// URI registered for `prefix`
    pub fn extensions_lookup_prefix(&self, prefix: &str) -> Result<Option<String>> {
        self.inner.check_open()?;
        Ok(self
            .inner
            .extensions
            .borrow()
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone()))
    }

    /// Prefix registered for `uri`
    pub fn extensions_lookup_uri(&self, uri: &str) -> Result<Option<String>> {
        self.inner.check_open()?;
        Ok(self
            .inner
            .extensions
            .borrow()
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.clone()))
    }

    /// Number of registered namespace extensions
    pub fn extensions_count(&self) -> Result<usize> {
        self.inner.check_open()?;
        Ok(self.inner.extensions.borrow().len())
    }

    /// Finish the session
    ///
    /// Writers emit the XML section and the file header. Closing an already
    /// closed session does nothing.
    pub fn close(&self) -> Result<()> {
        if !self.inner.open.get() {
            return Ok(());
        }
        if self.inner.writer {
            if let Err(e) = self.inner.write_xml_and_header() {
                self.inner.open.set(false);
                return Err(e);
            }
        }
        self.inner.open.set(false);
        info!(file = %self.inner.name, "closed image file");
        Ok(())
    }

    /// Abandon the session; a writer's file on disk is removed
    pub fn cancel(&self) -> Result<()> {
        if !self.inner.open.get() {
            return Ok(());
        }
        self.inner.open.set(false);
        if let (true, Some(path)) = (self.inner.writer, &self.inner.path) {
            std::fs::remove_file(path).map_err(|e| {
                Error::io(
                    ErrorCode::CloseFailed,
                    format!("fileName={}", self.inner.name),
                    e,
                )
            })?;
        }
        info!(file = %self.inner.name, "cancelled image file");
        Ok(())
    }

    /// Bytes of an in-memory session
    pub fn memory_contents(&self) -> Option<Vec<u8>> {
        let file = self.inner.file.try_borrow().ok()?;
        file.as_slice().map(<[u8]>::to_vec)
    }

    /// Whether both handles share one session
    pub fn ptr_eq(&self, other: &ImageFile) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.inner.name)
            .field("writer", &self.inner.writer)
            .field("open", &self.inner.open.get())
            .finish()
    }
}
