//! Write a small E57 file with a few scan records and a thumbnail blob

use e57fmt::{
    BlobNode, FloatNode, FloatPrecision, ImageFile, IntegerNode, ScaledIntegerNode, StringNode,
    StructureNode, VectorNode,
};
use std::time::Instant;

fn main() -> e57fmt::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let filename = "example_scan.e57";
    println!("Writing '{filename}'...");
    let start = Instant::now();

    let imf = ImageFile::create(filename)?;
    imf.extensions_add("demo", "http://example.com/demo")?;
    let root = imf.root()?;
    root.set_path("formatName", StringNode::new(&imf, "ASTM E57 3D Imaging Data File")?)?;
    root.set_path("versionMajor", IntegerNode::new(&imf, 1, 0, 255)?)?;
    root.set_path("versionMinor", IntegerNode::new(&imf, 0, 0, 255)?)?;
    root.set_path("demo:operator", StringNode::new(&imf, "survey crew 7")?)?;

    let scans = VectorNode::new(&imf, false)?;
    for i in 0..4 {
        let scan = StructureNode::new(&imf)?;
        scan.set_path("name", StringNode::new(&imf, format!("station {i}"))?)?;
        scan.set_path(
            "pose/translation/x",
            ScaledIntegerNode::from_scaled(&imf, i as f64 * 1.5, -1000.0, 1000.0, 0.001, 0.0)?,
        )?;
        scan.set_path(
            "temperature",
            FloatNode::with_precision(&imf, 21.5, FloatPrecision::Single, -40.0, 60.0)?,
        )?;
        scans.append(scan)?;
    }
    root.set_path("data3D", scans)?;

    let thumbnail: Vec<u8> = (0..=255).collect();
    let blob = BlobNode::new(&imf, thumbnail.len() as u64)?;
    root.set_path("images2D/thumbnail", blob.clone())?;
    blob.write(&thumbnail, 0)?;

    imf.close()?;
    println!("Written in {:?}", start.elapsed());
    println!("\nRun 'cargo run --example read_scan' to inspect it!");
    Ok(())
}
