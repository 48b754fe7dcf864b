//! Structure and Vector elements
//!
//! Both own an ordered list of children. Structure children carry unique
//! element names; Vector children are named by their index and, unless the
//! vector allows heterogeneous children, must all be type-equivalent.

use std::cell::RefCell;
use std::rc::Rc;

use e57fmt_core::{parse_index, validate_child_index, ErrorCode, PathName, E57_V1_0_URI, VECTOR_CHILD_NAME};

use super::{Node, NodeImpl, NodeKind};
use crate::error::{Error, Result};
use crate::image_file::{ImageFile, ImageFileImpl};
use crate::xml::XmlWriter;

/// Ordered children of a container
#[derive(Default)]
pub(crate) struct Children(RefCell<Vec<Rc<NodeImpl>>>);

impl Children {
    pub(crate) fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<Rc<NodeImpl>> {
        self.0.borrow().get(index).cloned()
    }

    pub(crate) fn find(&self, name: &str) -> Option<Rc<NodeImpl>> {
        self.0
            .borrow()
            .iter()
            .find(|child| *child.element_name.borrow() == name)
            .cloned()
    }

    /// Copy of the child list, so callers can recurse without holding the
    /// borrow
    pub(crate) fn snapshot(&self) -> Vec<Rc<NodeImpl>> {
        self.0.borrow().clone()
    }

    fn push(&self, child: Rc<NodeImpl>) {
        self.0.borrow_mut().push(child);
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, indent: usize, out: &mut String) {
        use std::fmt::Write;
        let pad = " ".repeat(indent);
        let children = self.snapshot();
        let _ = writeln!(out, "{pad}childCount:  {}", children.len());
        for (i, child) in children.iter().enumerate() {
            let _ = writeln!(out, "{pad}child[{i}]:");
            child.dump(indent + 2, out);
        }
    }
}

pub(crate) struct VectorData {
    allow_hetero_children: bool,
    pub(crate) children: Children,
}

impl VectorData {
    pub(crate) fn is_type_equivalent(&self, other: &Self) -> bool {
        if self.allow_hetero_children != other.allow_hetero_children {
            return false;
        }
        match (self.children.get(0), other.children.get(0)) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_type_equivalent(&b),
            _ => false,
        }
    }

    pub(crate) fn write_xml(
        &self,
        imf: &ImageFileImpl,
        w: &mut XmlWriter,
        depth: usize,
        name: &str,
    ) -> Result<()> {
        w.start_element(depth, name, "Vector");
        if self.allow_hetero_children {
            w.attribute("allowHeterogeneousChildren", 1);
        }
        let children = self.children.snapshot();
        if children.is_empty() {
            w.end_empty();
            return Ok(());
        }
        w.open_children();
        for child in &children {
            child.write_xml(imf, w, depth + 1, Some(VECTOR_CHILD_NAME))?;
        }
        w.end_element(depth, name);
        Ok(())
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, indent: usize, out: &mut String) {
        use std::fmt::Write;
        let pad = " ".repeat(indent);
        let _ = writeln!(
            out,
            "{pad}allowHeteroChildren: {}",
            self.allow_hetero_children
        );
        self.children.dump(indent, out);
    }
}

pub(crate) fn write_structure_xml(
    node: &Rc<NodeImpl>,
    children: &Children,
    imf: &ImageFileImpl,
    w: &mut XmlWriter,
    depth: usize,
    name: &str,
) -> Result<()> {
    w.start_element(depth, name, "Structure");

    if imf.is_root_node(node) {
        w.attribute_on_new_line(depth, name, "xmlns", E57_V1_0_URI);
        for (prefix, uri) in imf.extensions() {
            w.attribute_on_new_line(depth, name, &format!("xmlns:{prefix}"), &uri);
        }
    }

    let children = children.snapshot();
    if children.is_empty() {
        w.end_empty();
        return Ok(());
    }
    w.open_children();
    for child in &children {
        child.write_xml(imf, w, depth + 1, None)?;
    }
    w.end_element(depth, name);
    Ok(())
}

/// Resolve `path` from `start`; `None` if any step is missing
pub(crate) fn lookup(start: &Rc<NodeImpl>, path: &str) -> Result<Option<Rc<NodeImpl>>> {
    let parsed = PathName::parse(path).map_err(|code| {
        Error::new(
            code,
            format!("this->pathName={} pathName={path}", start.path_name_raw()),
        )
    })?;

    let mut current = if parsed.is_relative() {
        start.clone()
    } else {
        start.root()
    };
    for field in parsed.fields() {
        let next = match current.children() {
            Some(children) => children.find(field),
            None => None,
        };
        match next {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Checks that must pass before `child` may be linked anywhere under the
/// tree containing `parent`
fn check_adoption(
    parent: &Rc<NodeImpl>,
    child: &Rc<NodeImpl>,
    writer_required: bool,
) -> Result<Rc<ImageFileImpl>> {
    let imf = parent.check_open()?;
    if writer_required && !imf.is_writer() {
        return Err(Error::new(
            ErrorCode::FileIsReadOnly,
            format!("fileName={}", imf.file_name()),
        ));
    }
    if !parent.same_file(child) {
        return Err(Error::new(
            ErrorCode::DifferentDestImageFile,
            format!(
                "this->pathName={} child->pathName={} fileName={}",
                parent.path_name_raw(),
                child.path_name_raw(),
                imf.file_name()
            ),
        ));
    }
    if !child.is_root() || child.is_attached() {
        return Err(Error::new(
            ErrorCode::AlreadyHasParent,
            format!(
                "this->pathName={} newParent->pathName={}",
                child.path_name_raw(),
                parent.path_name_raw()
            ),
        ));
    }
    // child is now known to be a root, so it can only be an ancestor of
    // parent by being the root of parent's tree
    if Rc::ptr_eq(&parent.root(), child) {
        return Err(Error::new(
            ErrorCode::BadApiArgument,
            format!(
                "this->pathName={} would become its own descendant",
                parent.path_name_raw()
            ),
        ));
    }
    Ok(imf)
}

/// Structural rules for placing `child` under `parent` as `name`
fn check_slot(parent: &NodeImpl, name: &str, child: &NodeImpl) -> Result<()> {
    match &parent.kind {
        NodeKind::Structure(children) => {
            if children.find(name).is_some() {
                return Err(Error::new(
                    ErrorCode::SetTwice,
                    format!(
                        "this->pathName={} elementName={name}",
                        parent.path_name_raw()
                    ),
                ));
            }
            Ok(())
        }
        NodeKind::Vector(vector) => {
            let count = vector.children.len() as u64;
            let index = parse_index(name).map_err(|code| {
                Error::new(
                    code,
                    format!(
                        "this->pathName={} elementName={name} is not an index",
                        parent.path_name_raw()
                    ),
                )
            })?;
            if index < count {
                return Err(Error::new(
                    ErrorCode::SetTwice,
                    format!("this->pathName={} index={index}", parent.path_name_raw()),
                ));
            }
            validate_child_index(index, count, true).map_err(|code| {
                Error::new(
                    code,
                    format!(
                        "this->pathName={} index={index} childCount={count}",
                        parent.path_name_raw()
                    ),
                )
            })?;
            if !vector.allow_hetero_children {
                if let Some(first) = vector.children.get(0) {
                    if !first.is_type_equivalent(child) {
                        return Err(Error::new(
                            ErrorCode::HomogeneousViolation,
                            format!(
                                "this->pathName={} newType={}",
                                parent.path_name_raw(),
                                child.node_type()
                            ),
                        ));
                    }
                }
            }
            Ok(())
        }
        _ => Err(Error::new(
            ErrorCode::BadPathName,
            format!(
                "this->pathName={} is a {}, not a container",
                parent.path_name_raw(),
                parent.node_type()
            ),
        )),
    }
}

fn link(parent: &Rc<NodeImpl>, child: Rc<NodeImpl>, name: String) -> Result<()> {
    let children = parent.children().ok_or_else(|| {
        Error::internal(format!(
            "this->pathName={} is not a container",
            parent.path_name_raw()
        ))
    })?;
    child.set_parent(parent, name);
    children.push(child);
    Ok(())
}

fn new_structure(imf: &Rc<ImageFileImpl>) -> Result<Rc<NodeImpl>> {
    let file = ImageFile { inner: imf.clone() };
    NodeImpl::new(&file, NodeKind::Structure(Children::default()))
}

/// Place `child` at the slot numbered `index`, which must be the next free one
fn insert_at_index(
    parent: &Rc<NodeImpl>,
    index: u64,
    child: Rc<NodeImpl>,
    writer_required: bool,
) -> Result<()> {
    check_adoption(parent, &child, writer_required)?;
    let count = parent.children().map_or(0, |c| c.len()) as u64;
    if index < count {
        return Err(Error::new(
            ErrorCode::SetTwice,
            format!("this->pathName={} index={index}", parent.path_name_raw()),
        ));
    }
    validate_child_index(index, count, true).map_err(|code| {
        Error::new(
            code,
            format!(
                "this->pathName={} index={index} childCount={count}",
                parent.path_name_raw()
            ),
        )
    })?;
    insert_named(parent, index.to_string(), child)
}

/// Link an adopted `child` under `name` once the slot is free
fn insert_named(parent: &Rc<NodeImpl>, name: String, child: Rc<NodeImpl>) -> Result<()> {
    check_slot(parent, &name, &child)?;
    link(parent, child, name)
}

/// Place `child` at `path` resolved from `start`
///
/// Validation runs to completion before anything is linked, so a failed
/// call leaves the tree unchanged.
pub(crate) fn insert_child(
    start: &Rc<NodeImpl>,
    path: &str,
    child: Rc<NodeImpl>,
    auto_create: bool,
    writer_required: bool,
) -> Result<()> {
    let imf = check_adoption(start, &child, writer_required)?;

    let bad_path = |code: ErrorCode| {
        Error::new(
            code,
            format!("this->pathName={} pathName={path}", start.path_name_raw()),
        )
    };
    let parsed = PathName::parse(path).map_err(bad_path)?;
    let fields: Vec<&str> = parsed.fields().collect();
    let Some((&last, intermediate)) = fields.split_last() else {
        // the root already exists
        return Err(bad_path(ErrorCode::SetTwice));
    };
    for field in &fields {
        imf.check_element_name(field).map_err(|e| bad_path(e.code()))?;
    }

    let mut parent = if parsed.is_relative() {
        start.clone()
    } else {
        start.root()
    };
    let mut level = 0;
    while level < intermediate.len() {
        let Some(next) = parent.children().and_then(|c| c.find(intermediate[level])) else {
            break;
        };
        if next.children().is_none() {
            return Err(Error::new(
                ErrorCode::BadPathName,
                format!(
                    "this->pathName={} pathName={path} {} is a {}",
                    start.path_name_raw(),
                    next.path_name_raw(),
                    next.node_type()
                ),
            ));
        }
        parent = next;
        level += 1;
    }

    if level == intermediate.len() {
        check_slot(&parent, last, &child)?;
        return link(&parent, child, last.to_string());
    }

    if !auto_create {
        return Err(Error::new(
            ErrorCode::PathUndefined,
            format!("this->pathName={} pathName={path}", start.path_name_raw()),
        ));
    }

    let first = new_structure(&imf)?;
    check_slot(&parent, intermediate[level], &first)?;
    link(&parent, first.clone(), intermediate[level].to_string())?;
    let mut current = first;
    for &name in &intermediate[level + 1..] {
        let next = new_structure(&imf)?;
        link(&current, next.clone(), name.to_string())?;
        current = next;
    }
    link(&current, child, last.to_string())
}

fn child_at(parent: &Rc<NodeImpl>, index: u64) -> Result<Node> {
    parent.check_open()?;
    let children = parent.children().ok_or_else(|| {
        Error::internal(format!(
            "this->pathName={} is not a container",
            parent.path_name_raw()
        ))
    })?;
    let count = children.len() as u64;
    validate_child_index(index, count, false)
        .ok()
        .and_then(|()| children.get(index as usize))
        .map(Node)
        .ok_or_else(|| {
            Error::new(
                ErrorCode::ChildIndexOutOfBounds,
                format!(
                    "this->pathName={} index={index} childCount={count}",
                    parent.path_name_raw()
                ),
            )
        })
}

fn child_at_path(start: &Rc<NodeImpl>, path: &str) -> Result<Node> {
    start.check_open()?;
    lookup(start, path)?.map(Node).ok_or_else(|| {
        Error::new(
            ErrorCode::PathUndefined,
            format!("this->pathName={} pathName={path}", start.path_name_raw()),
        )
    })
}

node_handle!(
    /// Container of uniquely named children, kept in insertion order
    StructureNode,
    Structure,
    Children
);

impl StructureNode {
    /// Create an empty, unattached structure
    pub fn new(file: &ImageFile) -> Result<Self> {
        let node = NodeImpl::new(file, NodeKind::Structure(Children::default()))?;
        Ok(Self(Node(node)))
    }

    /// Number of children
    pub fn child_count(&self) -> Result<u64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.len() as u64)
    }

    /// Child at position `index`
    pub fn get(&self, index: u64) -> Result<Node> {
        child_at(&self.0 .0, index)
    }

    /// Element named by an absolute or relative path
    pub fn get_path(&self, path: &str) -> Result<Node> {
        child_at_path(&self.0 .0, path)
    }

    /// Place `child` at `index`, which must equal the current child count
    ///
    /// The child is named by its decimal index.
    pub fn set(&self, index: u64, child: impl Into<Node>) -> Result<()> {
        insert_at_index(&self.0 .0, index, child.into().0, true)
    }

    /// Place `child` at `path`, creating missing intermediate structures
    pub fn set_path(&self, path: &str, child: impl Into<Node>) -> Result<()> {
        insert_child(&self.0 .0, path, child.into().0, true, true)
    }

    /// Place `child` at `path`; every intermediate element must exist
    pub fn set_path_strict(&self, path: &str, child: impl Into<Node>) -> Result<()> {
        insert_child(&self.0 .0, path, child.into().0, false, true)
    }

    /// Add `child` after the last child
    ///
    /// The child is named by the lowest decimal index, starting from the
    /// child count, that no existing child uses.
    pub fn append(&self, child: impl Into<Node>) -> Result<()> {
        let parent = &self.0 .0;
        let child = child.into().0;
        check_adoption(parent, &child, true)?;
        let children = self.data()?;
        let mut index = children.len() as u64;
        while children.find(&index.to_string()).is_some() {
            index += 1;
        }
        insert_named(parent, index.to_string(), child)
    }

    /// Handles to the children, in order
    pub fn children(&self) -> Result<Vec<Node>> {
        self.0 .0.check_open()?;
        Ok(self.data()?.snapshot().into_iter().map(Node).collect())
    }
}

node_handle!(
    /// Ordered sequence of children addressed by index
    VectorNode,
    Vector,
    VectorData
);

impl VectorNode {
    /// Create an empty, unattached vector
    ///
    /// With `allow_hetero_children` false every child must be
    /// type-equivalent to the first.
    pub fn new(file: &ImageFile, allow_hetero_children: bool) -> Result<Self> {
        let node = NodeImpl::new(
            file,
            NodeKind::Vector(VectorData {
                allow_hetero_children,
                children: Children::default(),
            }),
        )?;
        Ok(Self(Node(node)))
    }

    /// Whether children may differ in type
    pub fn allow_hetero_children(&self) -> Result<bool> {
        self.0 .0.check_open()?;
        Ok(self.data()?.allow_hetero_children)
    }

    /// Number of children
    pub fn child_count(&self) -> Result<u64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.children.len() as u64)
    }

    /// Child at position `index`
    pub fn get(&self, index: u64) -> Result<Node> {
        child_at(&self.0 .0, index)
    }

    /// Element named by an absolute or relative path
    pub fn get_path(&self, path: &str) -> Result<Node> {
        child_at_path(&self.0 .0, path)
    }

    /// Place `child` at `index`, which must equal the current child count
    pub fn set(&self, index: u64, child: impl Into<Node>) -> Result<()> {
        insert_at_index(&self.0 .0, index, child.into().0, true)
    }

    /// Place `child` at `path`; the last field must be the next index
    pub fn set_path(&self, path: &str, child: impl Into<Node>) -> Result<()> {
        insert_child(&self.0 .0, path, child.into().0, true, true)
    }

    /// Add `child` after the last child
    pub fn append(&self, child: impl Into<Node>) -> Result<()> {
        let count = self.data()?.children.len() as u64;
        self.set(count, child)
    }

    /// Handles to the children, in order
    pub fn children(&self) -> Result<Vec<Node>> {
        self.0 .0.check_open()?;
        Ok(self
            .data()?
            .children
            .snapshot()
            .into_iter()
            .map(Node)
            .collect())
    }
}

/// Link without the writer check, for building a tree while reading a file
pub(crate) fn append_unchecked(parent: &VectorNode, child: Node) -> Result<()> {
    let count = parent.data()?.children.len() as u64;
    insert_at_index(&parent.0 .0, count, child.0, false)
}
