//! XML section reader used to reopen files in tests

use std::collections::HashMap;

use e57fmt::{
    BlobNode, Error, ErrorCode, FloatNode, FloatPrecision, ImageFile, IntegerNode, Node,
    NodeType, Result, ScaledIntegerNode, StringNode, StructureNode, TreeBuilder, VectorNode,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

struct Frame {
    name: String,
    node_type: NodeType,
    attrs: HashMap<String, String>,
    text: String,
    container: Option<Node>,
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorCode::XmlParser, e.to_string())
}

fn start_frame(start: &BytesStart<'_>) -> Result<Frame> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        attrs.insert(key, value);
    }
    let node_type = attrs
        .get("type")
        .and_then(|t| NodeType::from_type_attribute(t))
        .ok_or_else(|| Error::new(ErrorCode::BadXmlFormat, format!("element {name} has no type")))?;
    Ok(Frame {
        name,
        node_type,
        attrs,
        text: String::new(),
        container: None,
    })
}

fn attr<T: std::str::FromStr>(frame: &Frame, key: &str, default: T) -> Result<T> {
    match frame.attrs.get(key) {
        Some(value) => value.parse().map_err(|_| {
            Error::new(
                ErrorCode::BadXmlFormat,
                format!("element {} attribute {key}={value}", frame.name),
            )
        }),
        None => Ok(default),
    }
}

fn text<T: std::str::FromStr>(frame: &Frame, default: T) -> Result<T> {
    if frame.text.is_empty() {
        return Ok(default);
    }
    frame.text.trim().parse().map_err(|_| {
        Error::new(
            ErrorCode::BadXmlFormat,
            format!("element {} value={}", frame.name, frame.text),
        )
    })
}

fn open_container(file: &ImageFile, frame: &mut Frame, is_root: bool, tree: &mut TreeBuilder<'_>) -> Result<()> {
    frame.container = match frame.node_type {
        NodeType::Structure if is_root => {
            for (key, uri) in &frame.attrs {
                if let Some(prefix) = key.strip_prefix("xmlns:") {
                    tree.add_extension(prefix, uri)?;
                }
            }
            Some(tree.root()?.into_node())
        }
        NodeType::Structure => Some(StructureNode::new(file)?.into_node()),
        NodeType::Vector => {
            let hetero = frame.attrs.get("allowHeterogeneousChildren").map(String::as_str) == Some("1");
            Some(VectorNode::new(file, hetero)?.into_node())
        }
        _ => None,
    };
    Ok(())
}

fn build_leaf(file: &ImageFile, frame: &Frame) -> Result<Node> {
    let node = match frame.node_type {
        NodeType::Integer => IntegerNode::new(
            file,
            text(frame, 0i64)?,
            attr(frame, "minimum", i64::MIN)?,
            attr(frame, "maximum", i64::MAX)?,
        )?
        .into_node(),
        NodeType::ScaledInteger => ScaledIntegerNode::new(
            file,
            text(frame, 0i64)?,
            attr(frame, "minimum", i64::MIN)?,
            attr(frame, "maximum", i64::MAX)?,
            attr(frame, "scale", 1.0f64)?,
            attr(frame, "offset", 0.0f64)?,
        )?
        .into_node(),
        NodeType::Float => {
            let precision = match frame.attrs.get("precision").map(String::as_str) {
                Some("single") => FloatPrecision::Single,
                _ => FloatPrecision::Double,
            };
            FloatNode::with_precision(
                file,
                text(frame, 0.0f64)?,
                precision,
                attr(frame, "minimum", precision.default_minimum())?,
                attr(frame, "maximum", precision.default_maximum())?,
            )?
            .into_node()
        }
        NodeType::String => StringNode::new(file, frame.text.clone())?.into_node(),
        NodeType::Blob => BlobNode::from_file_offset(
            file,
            attr(frame, "fileOffset", 0u64)?,
            attr(frame, "length", 0u64)?,
        )?
        .into_node(),
        other => {
            return Err(Error::new(
                ErrorCode::NotImplemented,
                format!("element {} type={other}", frame.name),
            ))
        }
    };
    Ok(node)
}

fn finish(file: &ImageFile, frame: Frame, stack: &mut [Frame], tree: &mut TreeBuilder<'_>) -> Result<()> {
    let node = match frame.container {
        Some(ref node) => node.clone(),
        None => build_leaf(file, &frame)?,
    };
    let Some(parent) = stack.last().and_then(|f| f.container.clone()) else {
        return Ok(());
    };
    match parent.node_type() {
        NodeType::Structure => tree.set_child(&StructureNode::try_from(parent)?, &frame.name, node),
        NodeType::Vector => tree.append_child(&VectorNode::try_from(parent)?, node),
        other => Err(Error::new(
            ErrorCode::BadXmlFormat,
            format!("element {} nested in a {other}", frame.name),
        )),
    }
}

/// Rebuild the element tree of a file from its XML section
pub fn read_tree(xml: &str, tree: &mut TreeBuilder<'_>) -> Result<()> {
    let file = tree.image_file().clone();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let mut frame = start_frame(&e)?;
                open_container(&file, &mut frame, stack.is_empty(), tree)?;
                stack.push(frame);
            }
            Ok(Event::Empty(e)) => {
                let mut frame = start_frame(&e)?;
                open_container(&file, &mut frame, stack.is_empty(), tree)?;
                finish(&file, frame, &mut stack, tree)?;
            }
            Ok(Event::CData(c)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::new(ErrorCode::BadXmlFormat, "unbalanced end tag"))?;
                finish(&file, frame, &mut stack, tree)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}
