//! The typed element tree
//!
//! Every element is a [`NodeImpl`] behind an `Rc`. Containers own their
//! children through `Rc`; the parent link and the owning file session are
//! `Weak` and only used for lookups and validity checks. Public handles
//! ([`Node`], [`IntegerNode`], ...) are cheap clones of the same `Rc`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use e57fmt_core::{ErrorCode, NodeType, ROOT_ELEMENT_NAME};
use hashbrown::HashSet;

use crate::error::{Error, Result};
use crate::image_file::{ImageFile, ImageFileImpl};
use crate::xml::XmlWriter;

/// Generates a typed handle around [`Node`] with the accessors every
/// element kind shares, plus conversions to and from [`Node`]
macro_rules! node_handle {
    ($(#[$meta:meta])* $name:ident, $variant:ident, $data:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(pub(crate) $crate::node::Node);

        impl $name {
            /// Type-erased handle to this element
            pub fn as_node(&self) -> &$crate::node::Node {
                &self.0
            }

            /// Convert into the type-erased handle
            pub fn into_node(self) -> $crate::node::Node {
                self.0
            }

            /// Name of this element within its parent
            pub fn element_name(&self) -> $crate::error::Result<String> {
                self.0.element_name()
            }

            /// Absolute path name of this element
            pub fn path_name(&self) -> $crate::error::Result<String> {
                self.0.path_name()
            }

            /// Whether this element is reachable from the file's root
            pub fn is_attached(&self) -> $crate::error::Result<bool> {
                self.0.is_attached()
            }

            /// Whether this element has no parent
            pub fn is_root(&self) -> $crate::error::Result<bool> {
                self.0.is_root()
            }

            /// Containing element, `None` for a root
            pub fn parent(&self) -> $crate::error::Result<Option<$crate::node::Node>> {
                self.0.parent()
            }

            /// File session this element was created for
            pub fn image_file(&self) -> $crate::error::Result<$crate::image_file::ImageFile> {
                self.0.image_file()
            }

            /// Structural equivalence, ignoring values
            pub fn is_type_equivalent(&self, other: &$crate::node::Node) -> bool {
                self.0.is_type_equivalent(other)
            }

            /// Whether `path` names an element relative to this one
            pub fn is_defined(&self, path: &str) -> $crate::error::Result<bool> {
                self.0.is_defined(path)
            }

            pub(crate) fn data(&self) -> $crate::error::Result<&$data> {
                match &self.0 .0.kind {
                    $crate::node::NodeKind::$variant(data) => Ok(data),
                    _ => Err($crate::error::Error::internal(format!(
                        "this->pathName={} is not a {}",
                        self.0 .0.path_name_raw(),
                        stringify!($variant)
                    ))),
                }
            }
        }

        impl From<$name> for $crate::node::Node {
            fn from(node: $name) -> Self {
                node.0
            }
        }

        impl TryFrom<$crate::node::Node> for $name {
            type Error = $crate::error::Error;

            fn try_from(node: $crate::node::Node) -> $crate::error::Result<Self> {
                if node.node_type() == e57fmt_core::NodeType::$variant {
                    Ok(Self(node))
                } else {
                    Err($crate::error::Error::new(
                        e57fmt_core::ErrorCode::BadNodeDowncast,
                        format!(
                            "nodeType={} expected={}",
                            node.node_type(),
                            e57fmt_core::NodeType::$variant
                        ),
                    ))
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(&self.0, f)
            }
        }
    };
}

mod blob;
mod container;
mod scalar;

pub use blob::BlobNode;
pub use container::{StructureNode, VectorNode};
pub use scalar::{FloatNode, IntegerNode, ScaledIntegerNode, StringNode};

pub(crate) use container::{append_unchecked, insert_child, Children};

/// Per-kind payload of an element
pub(crate) enum NodeKind {
    Structure(Children),
    Vector(container::VectorData),
    Integer(scalar::IntegerData),
    ScaledInteger(scalar::ScaledIntegerData),
    Float(scalar::FloatData),
    String(scalar::StringData),
    Blob(blob::BlobData),
}

/// Shared state of one element
pub(crate) struct NodeImpl {
    file: Weak<ImageFileImpl>,
    element_name: RefCell<String>,
    parent: RefCell<Weak<NodeImpl>>,
    attached: Cell<bool>,
    pub(crate) kind: NodeKind,
}

impl NodeImpl {
    /// Create an unattached element for an open file
    pub(crate) fn new(file: &ImageFile, kind: NodeKind) -> Result<Rc<Self>> {
        file.inner.check_open()?;
        Ok(Rc::new(Self {
            file: Rc::downgrade(&file.inner),
            element_name: RefCell::new(String::new()),
            parent: RefCell::new(Weak::new()),
            attached: Cell::new(false),
            kind,
        }))
    }

    /// Create the attached, empty root structure of a session
    pub(crate) fn new_root(file: &Rc<ImageFileImpl>) -> Rc<Self> {
        Rc::new(Self {
            file: Rc::downgrade(file),
            element_name: RefCell::new(String::new()),
            parent: RefCell::new(Weak::new()),
            attached: Cell::new(true),
            kind: NodeKind::Structure(Children::default()),
        })
    }

    pub(crate) fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Structure(_) => NodeType::Structure,
            NodeKind::Vector(_) => NodeType::Vector,
            NodeKind::Integer(_) => NodeType::Integer,
            NodeKind::ScaledInteger(_) => NodeType::ScaledInteger,
            NodeKind::Float(_) => NodeType::Float,
            NodeKind::String(_) => NodeType::String,
            NodeKind::Blob(_) => NodeType::Blob,
        }
    }

    /// Child list, for container kinds
    pub(crate) fn children(&self) -> Option<&Children> {
        match &self.kind {
            NodeKind::Structure(children) => Some(children),
            NodeKind::Vector(vector) => Some(&vector.children),
            _ => None,
        }
    }

    /// Owning session, failing if it has been dropped
    pub(crate) fn image_file(&self) -> Result<Rc<ImageFileImpl>> {
        self.file.upgrade().ok_or_else(|| {
            Error::new(
                ErrorCode::ImageFileNotOpen,
                format!("this->pathName={} image file dropped", self.path_name_raw()),
            )
        })
    }

    /// Owning session, failing unless it is still open
    pub(crate) fn check_open(&self) -> Result<Rc<ImageFileImpl>> {
        let imf = self.image_file()?;
        imf.check_open()?;
        Ok(imf)
    }

    pub(crate) fn same_file(&self, other: &NodeImpl) -> bool {
        Weak::ptr_eq(&self.file, &other.file)
    }

    pub(crate) fn parent_node(&self) -> Option<Rc<NodeImpl>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent_node().is_none()
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub(crate) fn element_name_raw(&self) -> String {
        self.element_name.borrow().clone()
    }

    /// Absolute path name, without the open check; used in error contexts
    pub(crate) fn path_name_raw(&self) -> String {
        let mut names = Vec::new();
        let mut parent = self.parent_node();
        if parent.is_none() {
            return "/".to_string();
        }
        names.push(self.element_name_raw());
        while let Some(node) = parent {
            parent = node.parent_node();
            if parent.is_some() {
                names.push(node.element_name_raw());
            }
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Path of this element relative to `origin`, which must be an ancestor
    /// (or the element itself, giving the empty path)
    pub(crate) fn relative_path_name(self: &Rc<Self>, origin: &Rc<NodeImpl>) -> Result<String> {
        let mut names = Vec::new();
        let mut cursor = self.clone();
        while !Rc::ptr_eq(&cursor, origin) {
            names.push(cursor.element_name_raw());
            cursor = cursor.parent_node().ok_or_else(|| {
                Error::internal(format!(
                    "this->pathName={} origin->pathName={} origin is not an ancestor",
                    self.path_name_raw(),
                    origin.path_name_raw()
                ))
            })?;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    /// Topmost ancestor
    pub(crate) fn root(self: &Rc<Self>) -> Rc<NodeImpl> {
        let mut cursor = self.clone();
        while let Some(parent) = cursor.parent_node() {
            cursor = parent;
        }
        cursor
    }

    /// Link this element under `parent`; attachment spreads to the subtree
    pub(crate) fn set_parent(self: &Rc<Self>, parent: &Rc<NodeImpl>, name: String) {
        *self.element_name.borrow_mut() = name;
        *self.parent.borrow_mut() = Rc::downgrade(parent);
        if parent.is_attached() {
            self.set_attached_recursive();
        }
    }

    fn set_attached_recursive(&self) {
        self.attached.set(true);
        if let Some(children) = self.children() {
            for child in children.snapshot() {
                child.set_attached_recursive();
            }
        }
    }

    pub(crate) fn is_type_equivalent(&self, other: &NodeImpl) -> bool {
        match (&self.kind, &other.kind) {
            // free-form structures are schema-flexible
            (NodeKind::Structure(_), NodeKind::Structure(_)) => true,
            (NodeKind::Vector(a), NodeKind::Vector(b)) => a.is_type_equivalent(b),
            (NodeKind::Integer(a), NodeKind::Integer(b)) => a.is_type_equivalent(b),
            (NodeKind::ScaledInteger(a), NodeKind::ScaledInteger(b)) => a.is_type_equivalent(b),
            (NodeKind::Float(a), NodeKind::Float(b)) => a.is_type_equivalent(b),
            (NodeKind::String(_), NodeKind::String(_)) => true,
            (NodeKind::Blob(a), NodeKind::Blob(b)) => a.is_type_equivalent(b),
            _ => false,
        }
    }

    pub(crate) fn is_defined(self: &Rc<Self>, path: &str) -> Result<bool> {
        if self.children().is_none() {
            // no substructure
            return Ok(path.is_empty());
        }
        Ok(container::lookup(self, path)?.is_some())
    }

    pub(crate) fn check_leaves_in_set(
        self: &Rc<Self>,
        path_names: &HashSet<String>,
        origin: &Rc<NodeImpl>,
    ) -> Result<()> {
        if let Some(children) = self.children() {
            for child in children.snapshot() {
                child.check_leaves_in_set(path_names, origin)?;
            }
            return Ok(());
        }

        let relative = self.relative_path_name(origin)?;
        let listed = match &self.kind {
            // Float alone is also looked up by its absolute path
            NodeKind::Float(_) => {
                path_names.contains(&relative) || path_names.contains(&self.path_name_raw())
            }
            _ => path_names.contains(&relative),
        };

        if listed {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::NoBufferForElement,
                format!("this->pathName={}", self.path_name_raw()),
            ))
        }
    }

    pub(crate) fn write_xml(
        self: &Rc<Self>,
        imf: &ImageFileImpl,
        w: &mut XmlWriter,
        depth: usize,
        forced_name: Option<&str>,
    ) -> Result<()> {
        let own_name = self.element_name_raw();
        let name = forced_name.unwrap_or(&own_name);
        match &self.kind {
            NodeKind::Structure(children) => {
                container::write_structure_xml(self, children, imf, w, depth, name)
            }
            NodeKind::Vector(vector) => vector.write_xml(imf, w, depth, name),
            NodeKind::Integer(data) => {
                data.write_xml(w, depth, name);
                Ok(())
            }
            NodeKind::ScaledInteger(data) => {
                data.write_xml(w, depth, name);
                Ok(())
            }
            NodeKind::Float(data) => {
                data.write_xml(w, depth, name);
                Ok(())
            }
            NodeKind::String(data) => {
                data.write_xml(w, depth, name);
                Ok(())
            }
            NodeKind::Blob(data) => {
                data.write_xml(imf, w, depth, name);
                Ok(())
            }
        }
    }

    #[cfg(feature = "dump")]
    fn dump(&self, indent: usize, out: &mut String) {
        use std::fmt::Write;

        let pad = " ".repeat(indent);
        let _ = writeln!(
            out,
            "{pad}type:        {} ({})",
            self.node_type(),
            self.node_type() as u8
        );
        let _ = writeln!(out, "{pad}elementName: {}", self.element_name_raw());
        let _ = writeln!(out, "{pad}isAttached:  {}", self.is_attached());
        let _ = writeln!(out, "{pad}path:        {}", self.path_name_raw());
        match &self.kind {
            NodeKind::Structure(children) => children.dump(indent, out),
            NodeKind::Vector(vector) => vector.dump(indent, out),
            NodeKind::Integer(data) => data.dump(&pad, out),
            NodeKind::ScaledInteger(data) => data.dump(&pad, out),
            NodeKind::Float(data) => data.dump(&pad, out),
            NodeKind::String(data) => data.dump(&pad, out),
            NodeKind::Blob(data) => data.dump(&pad, out),
        }
    }
}

/// Type-erased handle to an element of any kind
///
/// Downcast with `TryFrom`, e.g. `IntegerNode::try_from(node)?`.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeImpl>);

impl Node {
    /// Kind of this element
    pub fn node_type(&self) -> NodeType {
        self.0.node_type()
    }

    /// Whether this element has no parent
    pub fn is_root(&self) -> Result<bool> {
        self.0.check_open()?;
        Ok(self.0.is_root())
    }

    /// Containing element, `None` for a root
    pub fn parent(&self) -> Result<Option<Node>> {
        self.0.check_open()?;
        Ok(self.0.parent_node().map(Node))
    }

    /// Name of this element within its parent
    pub fn element_name(&self) -> Result<String> {
        self.0.check_open()?;
        Ok(self.0.element_name_raw())
    }

    /// Absolute path name of this element
    pub fn path_name(&self) -> Result<String> {
        self.0.check_open()?;
        Ok(self.0.path_name_raw())
    }

    /// Path name of this element relative to an ancestor
    pub fn relative_path_name(&self, origin: &Node) -> Result<String> {
        self.0.check_open()?;
        self.0.relative_path_name(&origin.0)
    }

    /// Whether this element is reachable from the file's root
    pub fn is_attached(&self) -> Result<bool> {
        self.0.check_open()?;
        Ok(self.0.is_attached())
    }

    /// File session this element was created for
    pub fn image_file(&self) -> Result<ImageFile> {
        Ok(ImageFile {
            inner: self.0.image_file()?,
        })
    }

    /// Structural equivalence: same kind and same constraints, values ignored
    pub fn is_type_equivalent(&self, other: &Node) -> bool {
        self.0.is_type_equivalent(&other.0)
    }

    /// Whether `path` names an element relative to this one
    ///
    /// Leaves have no substructure and only define the empty path.
    pub fn is_defined(&self, path: &str) -> Result<bool> {
        self.0.check_open()?;
        self.0.is_defined(path)
    }

    /// Verify every leaf below this element appears in `path_names`, by its
    /// path relative to `origin`
    pub fn check_leaves_in_set(&self, path_names: &HashSet<String>, origin: &Node) -> Result<()> {
        self.0.check_leaves_in_set(path_names, &origin.0)
    }

    /// Validate a declared list of buffer paths for record transfer
    ///
    /// Duplicate paths fail with `BufferDuplicatePathname`; a leaf with no
    /// matching path fails with `NoBufferForElement`.
    pub fn check_buffer_paths<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        self.0.check_open()?;
        let mut path_names = HashSet::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            if !path_names.insert(path.to_string()) {
                return Err(Error::new(
                    ErrorCode::BufferDuplicatePathname,
                    format!("this->pathName={} pathName={path}", self.0.path_name_raw()),
                ));
            }
        }
        self.0.check_leaves_in_set(&path_names, &self.0)
    }

    /// XML form of this element and its subtree
    pub fn to_xml(&self) -> Result<String> {
        let imf = self.0.check_open()?;
        let mut w = XmlWriter::fragment(imf.config().xml_indent);
        let forced_name = imf.is_root_node(&self.0).then_some(ROOT_ELEMENT_NAME);
        self.0.write_xml(&imf, &mut w, 0, forced_name)?;
        Ok(w.into_string())
    }

    /// Whether both handles refer to the same element
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Human readable description of this element and its subtree
    #[cfg(feature = "dump")]
    pub fn dump(&self, indent: usize) -> String {
        let mut out = String::new();
        self.0.dump(indent, &mut out);
        out
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.node_type())
            .field("path", &self.0.path_name_raw())
            .field("attached", &self.0.is_attached())
            .finish()
    }
}
