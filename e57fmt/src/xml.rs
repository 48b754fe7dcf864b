//! XML section writer
//!
//! Element writers only call into [`XmlWriter`]; the escaping rules live in
//! [`e57fmt_core::escape`].

use e57fmt_core::escape;
use std::fmt::{self, Display, Write};

/// Accumulates the XML section of a file
#[derive(Debug)]
pub struct XmlWriter {
    out: String,
    indent_width: usize,
}

impl XmlWriter {
    /// Start a document with the XML declaration
    pub fn new(indent_width: usize) -> Self {
        let mut out = String::with_capacity(4096);
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        Self { out, indent_width }
    }

    /// Writer without the XML declaration, for serializing a single subtree
    pub fn fragment(indent_width: usize) -> Self {
        Self {
            out: String::new(),
            indent_width,
        }
    }

    fn indent(&mut self, depth: usize) {
        let spaces = depth * self.indent_width;
        self.out.extend(std::iter::repeat(' ').take(spaces));
    }

    /// `<name type="Kind"` at the given nesting depth
    pub fn start_element(&mut self, depth: usize, name: &str, type_name: &str) {
        self.indent(depth);
        self.out.push('<');
        self.out.push_str(name);
        self.attribute("type", type_name);
    }

    /// ` key="value"` with a value that needs no escaping
    pub fn attribute(&mut self, key: &str, value: impl Display) {
        // Writing to a String cannot fail
        let _ = write!(self.out, " {key}=\"{value}\"");
    }

    /// Attribute on its own line, aligned under the element name
    pub fn attribute_on_new_line(&mut self, depth: usize, name: &str, key: &str, value: &str) {
        self.out.push('\n');
        self.indent(depth);
        self.out
            .extend(std::iter::repeat(' ').take(name.len() + 2));
        self.out.push_str(key);
        self.out.push_str("=\"");
        let _ = escape::write_attribute_value(&mut self.out, value);
        self.out.push('"');
    }

    /// Close the start tag as an empty element
    pub fn end_empty(&mut self) {
        self.out.push_str("/>\n");
    }

    /// Close the start tag, write `value` as text and the end tag
    pub fn text_element_body(&mut self, name: &str, value: impl Display) {
        let _ = write!(self.out, ">{value}</{name}>\n");
    }

    /// Close the start tag, write `value` as CDATA and the end tag
    pub fn cdata_element_body(&mut self, name: &str, value: &str) {
        self.out.push('>');
        let _ = escape::write_cdata(&mut self.out, value);
        let _ = write!(self.out, "</{name}>\n");
    }

    /// Close the start tag of an element whose children follow
    pub fn open_children(&mut self) {
        self.out.push_str(">\n");
    }

    /// `</name>` at the given depth
    pub fn end_element(&mut self, depth: usize, name: &str) {
        self.indent(depth);
        let _ = write!(self.out, "</{name}>\n");
    }

    /// Text written so far
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Finish and take the text
    pub fn into_string(self) -> String {
        self.out
    }
}

/// Shortest round-trip decimal form of a double
pub struct Double(pub f64);

impl Display for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.0)
    }
}

/// Shortest round-trip decimal form of a value stored in single precision
pub struct Single(pub f64);

impl Display for Single {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.0 as f32)
    }
}
