//! Hook for rebuilding the element tree from an XML section
//!
//! The crate writes XML itself but leaves parsing to the caller: opening a
//! file hands the XML text to a [`MarkupReader`] together with a
//! [`TreeBuilder`]. The builder attaches elements without the writer checks
//! that guard the public mutators, since read sessions are read-only.

use crate::error::Result;
use crate::image_file::ImageFile;
use crate::node::{append_unchecked, insert_child, Node, StructureNode, VectorNode};

/// Parses an XML section into elements
pub trait MarkupReader {
    fn read_tree(&mut self, xml: &str, tree: &mut TreeBuilder<'_>) -> Result<()>;
}

impl<F> MarkupReader for F
where
    F: FnMut(&str, &mut TreeBuilder<'_>) -> Result<()>,
{
    fn read_tree(&mut self, xml: &str, tree: &mut TreeBuilder<'_>) -> Result<()> {
        self(xml, tree)
    }
}

/// Attaches parsed elements to a session being opened
pub struct TreeBuilder<'a> {
    file: &'a ImageFile,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(file: &'a ImageFile) -> Self {
        Self { file }
    }

    /// Session the elements must be created for
    pub fn image_file(&self) -> &ImageFile {
        self.file
    }

    pub fn root(&self) -> Result<StructureNode> {
        self.file.root()
    }

    /// Add `child` to `parent` under `name`
    pub fn set_child(
        &mut self,
        parent: &StructureNode,
        name: &str,
        child: impl Into<Node>,
    ) -> Result<()> {
        insert_child(&parent.as_node().0, name, child.into().0, false, false)
    }

    /// Add `child` after the last child of `parent`
    pub fn append_child(&mut self, parent: &VectorNode, child: impl Into<Node>) -> Result<()> {
        append_unchecked(parent, child.into())
    }

    /// Record an extension namespace declared on the root element
    pub fn add_extension(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.file.inner.check_open()?;
        self.file.inner.add_extension(prefix, uri)
    }
}
