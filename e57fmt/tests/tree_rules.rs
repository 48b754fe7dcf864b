mod common;

use e57fmt::{
    BlobNode, ErrorCode, FloatNode, FloatPrecision, ImageFile, IntegerNode, Node,
    ScaledIntegerNode, StringNode, StructureNode, TreeBuilder, VectorNode,
};
use rand::Rng;

fn session(name: &str) -> ImageFile {
    ImageFile::create_in_memory(name).unwrap()
}

#[test]
fn test_integer_bounds_random() {
    let imf = session("bounds.e57");
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let a: i64 = rng.gen_range(-1000..1000);
        let b: i64 = rng.gen_range(-1000..1000);
        let (minimum, maximum) = (a.min(b), a.max(b));
        let value: i64 = rng.gen_range(-1100..1100);

        let result = IntegerNode::new(&imf, value, minimum, maximum);
        if value < minimum || value > maximum {
            assert_eq!(result.unwrap_err().code(), ErrorCode::ValueOutOfBounds);
        } else {
            let node = result.unwrap();
            let v = node.value().unwrap();
            assert!(node.minimum().unwrap() <= v && v <= node.maximum().unwrap());
        }
    }
}

#[test]
fn test_float_bounds_random() {
    let imf = session("fbounds.e57");
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let minimum: f64 = rng.gen_range(-10.0..0.0);
        let maximum: f64 = rng.gen_range(0.0..10.0);
        let value: f64 = rng.gen_range(-12.0..12.0);
        let result =
            FloatNode::with_precision(&imf, value, FloatPrecision::Double, minimum, maximum);
        assert_eq!(
            result.is_ok(),
            minimum <= value && value <= maximum,
            "value={value} minimum={minimum} maximum={maximum}"
        );
    }
}

#[test]
fn test_scaled_integer_reproduces_scaled_value() {
    let imf = session("scaled.e57");
    let n = ScaledIntegerNode::from_scaled(&imf, 10.0, 0.0, 100.0, 0.1, 0.0).unwrap();
    assert_eq!(n.raw_value().unwrap(), 100);

    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let scale: f64 = rng.gen_range(0.001..2.0);
        let offset: f64 = rng.gen_range(-50.0..50.0);
        let scaled: f64 = rng.gen_range(-1000.0..1000.0);
        let n = ScaledIntegerNode::from_scaled(&imf, scaled, -2000.0, 2000.0, scale, offset)
            .unwrap();
        let expected = n.raw_value().unwrap() as f64 * scale + offset;
        assert!((n.scaled_value().unwrap() - expected).abs() < 1e-9);
        assert!((n.scaled_value().unwrap() - scaled).abs() <= scale);
    }
}

#[test]
fn test_scaled_value_not_representable() {
    let imf = session("nan.e57");
    let err = ScaledIntegerNode::from_scaled(&imf, 1.0, 0.0, 10.0, 0.0, 0.0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValueNotRepresentable);
}

#[test]
fn test_type_equivalence_properties() {
    let imf = session("equiv.e57");
    let nodes: Vec<Node> = vec![
        IntegerNode::new(&imf, 1, 0, 10).unwrap().into(),
        IntegerNode::new(&imf, 9, 0, 10).unwrap().into(),
        IntegerNode::new(&imf, 1, 0, 20).unwrap().into(),
        ScaledIntegerNode::new(&imf, 1, 0, 10, 0.5, 0.0).unwrap().into(),
        ScaledIntegerNode::new(&imf, 1, 0, 10, 0.5, 1.0).unwrap().into(),
        FloatNode::new(&imf, 1.0).unwrap().into(),
        FloatNode::with_precision(&imf, 1.0, FloatPrecision::Single, -5.0, 5.0)
            .unwrap()
            .into(),
        StringNode::new(&imf, "a").unwrap().into(),
        StringNode::new(&imf, "b").unwrap().into(),
        BlobNode::new(&imf, 5).unwrap().into(),
        BlobNode::new(&imf, 6).unwrap().into(),
        StructureNode::new(&imf).unwrap().into(),
        VectorNode::new(&imf, false).unwrap().into(),
    ];

    for a in &nodes {
        assert!(a.is_type_equivalent(a));
        for b in &nodes {
            assert_eq!(a.is_type_equivalent(b), b.is_type_equivalent(a));
        }
    }
    assert!(nodes[0].is_type_equivalent(&nodes[1]));
    assert!(!nodes[0].is_type_equivalent(&nodes[2]));
    assert!(!nodes[3].is_type_equivalent(&nodes[4]));
    assert!(!nodes[5].is_type_equivalent(&nodes[6]));
    assert!(nodes[7].is_type_equivalent(&nodes[8]));
    assert!(!nodes[9].is_type_equivalent(&nodes[10]));
}

#[test]
fn test_blob_section_padding() {
    let imf = session("pad.e57");
    let first = BlobNode::new(&imf, 5).unwrap();
    let second = BlobNode::new(&imf, 1).unwrap();
    let root = imf.root().unwrap();
    root.set_path("first", first).unwrap();
    root.set_path("second", second.clone()).unwrap();

    // 16 byte header + 5 bytes, padded to 24
    let xml = second.as_node().to_xml().unwrap();
    assert_eq!(xml, "<second type=\"Blob\" fileOffset=\"72\" length=\"1\"/>\n");
}

#[test]
fn test_blob_transfer_bounds_random() {
    let imf = session("xfer.e57");
    let mut rng = rand::thread_rng();
    let root = imf.root().unwrap();
    for i in 0..50 {
        let len: u64 = rng.gen_range(0..64);
        let blob = BlobNode::new(&imf, len).unwrap();
        root.set_path(&format!("b{i}"), blob.clone()).unwrap();

        let start: u64 = rng.gen_range(0..80);
        let count: usize = rng.gen_range(0..80);
        let mut buf = vec![0u8; count];
        let fits = start + count as u64 <= len;

        let read = blob.read(&mut buf, start);
        let write = blob.write(&buf, start);
        if fits {
            read.unwrap();
            write.unwrap();
        } else {
            assert_eq!(read.unwrap_err().code(), ErrorCode::BadApiArgument);
            assert_eq!(write.unwrap_err().code(), ErrorCode::BadApiArgument);
        }
    }
}

#[test]
fn test_cdata_terminator_round_trip() {
    let imf = session("cdata.e57");
    let root = imf.root().unwrap();
    root.set_path("s", StringNode::new(&imf, "a]]>b]]>c").unwrap())
        .unwrap();
    let xml = root.get_path("s").unwrap().to_xml().unwrap();
    assert_eq!(
        xml.matches("]]>").count(),
        3,
        "each piece closes its own block: {xml}"
    );
    imf.close().unwrap();

    let reopened =
        ImageFile::open_bytes("cdata.e57", imf.memory_contents().unwrap(), common::read_tree)
            .unwrap();
    let s = StringNode::try_from(reopened.root().unwrap().get_path("s").unwrap()).unwrap();
    assert_eq!(s.value().unwrap(), "a]]>b]]>c");
}

#[test]
fn test_homogeneous_append() {
    let imf = session("homo.e57");
    let v = VectorNode::new(&imf, false).unwrap();
    v.append(IntegerNode::new(&imf, 1, 0, 10).unwrap()).unwrap();
    v.append(IntegerNode::new(&imf, 2, 0, 10).unwrap()).unwrap();

    let err = v
        .append(IntegerNode::new(&imf, 3, 0, 20).unwrap())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::HomogeneousViolation);
    v.append(IntegerNode::new(&imf, 3, 0, 10).unwrap()).unwrap();
    assert_eq!(v.child_count().unwrap(), 3);
}

#[test]
fn test_set_index_rules() {
    let imf = session("index.e57");
    let s = StructureNode::new(&imf).unwrap();
    s.set(0, IntegerNode::with_value(&imf, 0).unwrap()).unwrap();
    assert_eq!(
        s.set(0, IntegerNode::with_value(&imf, 1).unwrap())
            .unwrap_err()
            .code(),
        ErrorCode::SetTwice
    );
    assert_eq!(
        s.set(3, IntegerNode::with_value(&imf, 1).unwrap())
            .unwrap_err()
            .code(),
        ErrorCode::ChildIndexOutOfBounds
    );
    assert_eq!(s.get(1).unwrap_err().code(), ErrorCode::ChildIndexOutOfBounds);
    assert_eq!(
        s.get_path("missing").unwrap_err().code(),
        ErrorCode::PathUndefined
    );
}

#[test]
fn test_failed_set_leaves_child_reusable() {
    let imf = session("reuse.e57");
    let root = imf.root().unwrap();
    root.set_path("taken", IntegerNode::with_value(&imf, 0).unwrap())
        .unwrap();
    let child = IntegerNode::with_value(&imf, 1).unwrap();
    assert!(root.set_path("taken", child.clone()).is_err());
    assert!(child.parent().unwrap().is_none());
    root.set_path("free", child.clone()).unwrap();
    assert_eq!(child.path_name().unwrap(), "/free");
}

#[test]
fn test_closed_session_fails_everything() {
    let imf = session("closed.e57");
    let root = imf.root().unwrap();
    let s = StructureNode::new(&imf).unwrap();
    let v = VectorNode::new(&imf, true).unwrap();
    let i = IntegerNode::with_value(&imf, 1).unwrap();
    let f = FloatNode::new(&imf, 1.0).unwrap();
    let si = ScaledIntegerNode::new(&imf, 1, 0, 10, 1.0, 0.0).unwrap();
    let st = StringNode::new(&imf, "x").unwrap();
    let b = BlobNode::new(&imf, 4).unwrap();
    root.set_path("b", b.clone()).unwrap();
    let spare = IntegerNode::with_value(&imf, 2).unwrap();
    imf.close().unwrap();

    let closed = |code: ErrorCode| assert_eq!(code, ErrorCode::ImageFileNotOpen);
    closed(root.child_count().unwrap_err().code());
    closed(root.get(0).unwrap_err().code());
    closed(root.get_path("b").unwrap_err().code());
    closed(root.set_path("x", spare.clone()).unwrap_err().code());
    closed(s.children().unwrap_err().code());
    closed(v.append(spare).unwrap_err().code());
    closed(i.value().unwrap_err().code());
    closed(f.precision().unwrap_err().code());
    closed(si.scaled_value().unwrap_err().code());
    closed(st.value().unwrap_err().code());
    closed(b.byte_count().unwrap_err().code());
    closed(b.read(&mut [0u8; 1], 0).unwrap_err().code());
    closed(b.write(&[0u8; 1], 0).unwrap_err().code());
    closed(i.path_name().unwrap_err().code());
    closed(i.is_attached().unwrap_err().code());
    closed(imf.extensions_count().unwrap_err().code());
    closed(
        i.as_node()
            .check_buffer_paths(&[""])
            .unwrap_err()
            .code(),
    );
}

#[test]
fn test_check_buffer_paths() {
    let imf = session("buffers.e57");
    let proto = StructureNode::new(&imf).unwrap();
    proto
        .set_path("cartesianX", FloatNode::new(&imf, 0.0).unwrap())
        .unwrap();
    proto
        .set_path("intensity", IntegerNode::new(&imf, 0, 0, 255).unwrap())
        .unwrap();
    proto
        .set_path("color/red", IntegerNode::new(&imf, 0, 0, 255).unwrap())
        .unwrap();
    let proto = proto.into_node();

    proto
        .check_buffer_paths(&["cartesianX", "intensity", "color/red"])
        .unwrap();

    let err = proto
        .check_buffer_paths(&["cartesianX", "intensity"])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoBufferForElement);
    assert!(err.context().contains("/color/red"));

    let err = proto
        .check_buffer_paths(&["cartesianX", "cartesianX", "intensity", "color/red"])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BufferDuplicatePathname);
}

#[test]
fn test_float_leaf_matches_absolute_path() {
    let imf = session("abs.e57");
    let root = imf.root().unwrap();
    let points = StructureNode::new(&imf).unwrap();
    points
        .set_path("x", FloatNode::new(&imf, 0.0).unwrap())
        .unwrap();
    points
        .set_path("i", IntegerNode::with_value(&imf, 0).unwrap())
        .unwrap();
    root.set_path("points", points.clone()).unwrap();

    let points = points.into_node();
    // Float leaves may be listed by absolute path, other leaves may not
    points.check_buffer_paths(&["/points/x", "i"]).unwrap();
    let err = points.check_buffer_paths(&["x", "/points/i"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoBufferForElement);
}

#[test]
fn test_is_defined() {
    let imf = session("defined.e57");
    let root = imf.root().unwrap();
    let leaf = IntegerNode::with_value(&imf, 1).unwrap();
    root.set_path("a/b", leaf.clone()).unwrap();

    assert!(root.is_defined("a/b").unwrap());
    assert!(root.is_defined("/a").unwrap());
    assert!(!root.is_defined("a/c").unwrap());
    assert!(!root.is_defined("a/b/c").unwrap());
    assert!(leaf.is_defined("").unwrap());
    assert!(!leaf.is_defined("x").unwrap());
    assert_eq!(
        root.is_defined("a//b").unwrap_err().code(),
        ErrorCode::BadPathName
    );
}

#[test]
fn test_reader_rejects_foreign_nodes() {
    let other = session("other.e57");
    let imf = session("base.e57");
    imf.close().unwrap();

    let err = ImageFile::open_bytes(
        "base.e57",
        imf.memory_contents().unwrap(),
        |_: &str, tree: &mut TreeBuilder<'_>| {
            let root = tree.root()?;
            tree.set_child(&root, "x", IntegerNode::with_value(&other, 1)?)
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DifferentDestImageFile);
    other.cancel().unwrap();
}

#[cfg(feature = "dump")]
#[test]
fn test_dump_lists_children() {
    let imf = session("dump.e57");
    let root = imf.root().unwrap();
    root.set_path("n", IntegerNode::new(&imf, 4, 0, 9).unwrap())
        .unwrap();
    let dump = root.as_node().dump(0);
    assert!(dump.contains("type:        Structure"));
    assert!(dump.contains("childCount:  1"));
    assert!(dump.contains("path:        /n"));
    assert!(dump.contains("value:       4"));
}
