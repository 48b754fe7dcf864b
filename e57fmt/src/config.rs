//! Configuration for E57 file sessions

use crate::error::{Error, Result};
use e57fmt_core::{format::constants::PAGE_SIZE, ErrorCode, PageLayout};

/// Configuration for creating or opening an [`ImageFile`](crate::ImageFile)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImageFileConfig {
    /// Physical page size of the checked byte stream
    pub page_size: u64,
    /// Spaces of indentation per nesting level in the XML section
    pub xml_indent: usize,
    /// Memory-map files opened for reading (requires the `mmap` feature)
    pub mmap_reads: bool,
}

impl ImageFileConfig {
    /// Set the physical page size
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the XML indentation width
    pub fn with_xml_indent(mut self, xml_indent: usize) -> Self {
        self.xml_indent = xml_indent;
        self
    }

    /// Enable or disable memory mapping for read sessions
    pub fn with_mmap_reads(mut self, mmap_reads: bool) -> Self {
        self.mmap_reads = mmap_reads;
        self
    }

    /// Page framing described by this configuration
    pub fn page_layout(&self) -> Result<PageLayout> {
        PageLayout::new(self.page_size)
            .map_err(|code| Error::new(code, format!("pageSize={}", self.page_size)))
    }

    /// Check that the configuration describes a usable layout
    pub fn validate(&self) -> Result<()> {
        self.page_layout()?;
        if self.xml_indent > 16 {
            return Err(Error::new(
                ErrorCode::BadConfiguration,
                format!("xmlIndent={}", self.xml_indent),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::new(ErrorCode::BadConfiguration, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ImageFileConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            xml_indent: 2,
            mmap_reads: true,
        }
    }
}
