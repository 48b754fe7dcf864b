//! Open an E57 file and print its header and XML section

use e57fmt::{FileHeader, ImageFile, TreeBuilder};

fn main() -> e57fmt::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let filename = "example_scan.e57";
    if !std::path::Path::new(filename).exists() {
        println!("File '{filename}' not found!");
        println!("   Run 'cargo run --example write_scan' first");
        return Ok(());
    }

    let bytes = std::fs::read(filename)
        .map_err(|e| e57fmt::Error::new(e57fmt::ErrorCode::OpenFailed, e.to_string()))?;
    let header = FileHeader::from_bytes(&bytes, bytes.len() as u64)?;
    println!("File Information:");
    println!("   Version: {}.{}", header.major_version, header.minor_version);
    println!("   Physical length: {}", header.file_physical_length);
    println!("   Page size: {}", header.page_size);
    println!("   XML section: {} bytes at {}", header.xml_logical_length, header.xml_physical_offset);

    let imf = ImageFile::open(filename, |xml: &str, _: &mut TreeBuilder<'_>| {
        println!("\n{xml}");
        Ok(())
    })?;
    imf.close()?;
    Ok(())
}
