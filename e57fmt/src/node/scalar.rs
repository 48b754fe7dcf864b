//! Leaf elements holding a single value: Integer, ScaledInteger, Float and
//! String

use e57fmt_core::{
    raw_from_scaled, scaled_from_raw, within_bounds, ErrorCode, FloatPrecision, INT64_MAX,
    INT64_MIN,
};

use super::{NodeImpl, NodeKind};
use crate::error::{Error, Result};
use crate::image_file::ImageFile;
use crate::xml::{Double, Single, XmlWriter};

pub(crate) struct IntegerData {
    value: i64,
    minimum: i64,
    maximum: i64,
}

impl IntegerData {
    pub(crate) fn is_type_equivalent(&self, other: &Self) -> bool {
        self.minimum == other.minimum && self.maximum == other.maximum
    }

    pub(crate) fn write_xml(&self, w: &mut XmlWriter, depth: usize, name: &str) {
        w.start_element(depth, name, "Integer");
        if self.minimum != INT64_MIN {
            w.attribute("minimum", self.minimum);
        }
        if self.maximum != INT64_MAX {
            w.attribute("maximum", self.maximum);
        }
        if self.value != 0 {
            w.text_element_body(name, self.value);
        } else {
            w.end_empty();
        }
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, pad: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{pad}value:       {}", self.value);
        let _ = writeln!(out, "{pad}minimum:     {}", self.minimum);
        let _ = writeln!(out, "{pad}maximum:     {}", self.maximum);
    }
}

node_handle!(
    /// Signed 64-bit integer constrained to an inclusive range
    IntegerNode,
    Integer,
    IntegerData
);

impl IntegerNode {
    /// Create an unattached Integer element
    ///
    /// Fails with `ValueOutOfBounds` unless `minimum <= value <= maximum`.
    pub fn new(file: &ImageFile, value: i64, minimum: i64, maximum: i64) -> Result<Self> {
        let node = NodeImpl::new(
            file,
            NodeKind::Integer(IntegerData {
                value,
                minimum,
                maximum,
            }),
        )?;
        if !within_bounds(value, minimum, maximum) {
            return Err(Error::new(
                ErrorCode::ValueOutOfBounds,
                format!(
                    "this->pathName={} value={value} minimum={minimum} maximum={maximum}",
                    node.path_name_raw()
                ),
            ));
        }
        Ok(Self(super::Node(node)))
    }

    /// Create an Integer element with the full 64-bit range
    pub fn with_value(file: &ImageFile, value: i64) -> Result<Self> {
        Self::new(file, value, INT64_MIN, INT64_MAX)
    }

    /// Current value
    pub fn value(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.value)
    }

    /// Smallest allowed value
    pub fn minimum(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.minimum)
    }

    /// Largest allowed value
    pub fn maximum(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.maximum)
    }
}

pub(crate) struct ScaledIntegerData {
    raw: i64,
    minimum: i64,
    maximum: i64,
    scale: f64,
    offset: f64,
}

impl ScaledIntegerData {
    pub(crate) fn is_type_equivalent(&self, other: &Self) -> bool {
        self.minimum == other.minimum
            && self.maximum == other.maximum
            && self.scale == other.scale
            && self.offset == other.offset
    }

    fn scaled(&self, raw: i64) -> f64 {
        scaled_from_raw(raw, self.scale, self.offset)
    }

    pub(crate) fn write_xml(&self, w: &mut XmlWriter, depth: usize, name: &str) {
        w.start_element(depth, name, "ScaledInteger");
        if self.minimum != INT64_MIN {
            w.attribute("minimum", self.minimum);
        }
        if self.maximum != INT64_MAX {
            w.attribute("maximum", self.maximum);
        }
        if self.scale != 1.0 {
            w.attribute("scale", Double(self.scale));
        }
        if self.offset != 0.0 {
            w.attribute("offset", Double(self.offset));
        }
        if self.raw != 0 {
            w.text_element_body(name, self.raw);
        } else {
            w.end_empty();
        }
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, pad: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{pad}rawValue:    {}", self.raw);
        let _ = writeln!(out, "{pad}minimum:     {}", self.minimum);
        let _ = writeln!(out, "{pad}maximum:     {}", self.maximum);
        let _ = writeln!(out, "{pad}scale:       {}", self.scale);
        let _ = writeln!(out, "{pad}offset:      {}", self.offset);
    }
}

node_handle!(
    /// Integer stored in raw form with a linear mapping to real values:
    /// `scaled = raw * scale + offset`
    ScaledIntegerNode,
    ScaledInteger,
    ScaledIntegerData
);

impl ScaledIntegerNode {
    /// Create from a raw value and raw bounds
    ///
    /// Fails with `ValueOutOfBounds` unless `minimum <= raw <= maximum`.
    pub fn new(
        file: &ImageFile,
        raw: i64,
        minimum: i64,
        maximum: i64,
        scale: f64,
        offset: f64,
    ) -> Result<Self> {
        let node = NodeImpl::new(
            file,
            NodeKind::ScaledInteger(ScaledIntegerData {
                raw,
                minimum,
                maximum,
                scale,
                offset,
            }),
        )?;
        if !within_bounds(raw, minimum, maximum) {
            return Err(Error::new(
                ErrorCode::ValueOutOfBounds,
                format!(
                    "this->pathName={} rawValue={raw} minimum={minimum} maximum={maximum}",
                    node.path_name_raw()
                ),
            ));
        }
        Ok(Self(super::Node(node)))
    }

    /// Create from a scaled value and scaled bounds
    ///
    /// Each scaled quantity is mapped to raw space with
    /// `floor((x - offset) / scale + 0.5)`. The bounds check runs on the
    /// scaled inputs.
    pub fn from_scaled(
        file: &ImageFile,
        scaled: f64,
        scaled_minimum: f64,
        scaled_maximum: f64,
        scale: f64,
        offset: f64,
    ) -> Result<Self> {
        let to_raw = |value: f64, what: &str| {
            raw_from_scaled(value, scale, offset).map_err(|code| {
                Error::new(
                    code,
                    format!("{what}={value} scale={scale} offset={offset}"),
                )
            })
        };
        let raw = to_raw(scaled, "scaledValue")?;
        let minimum = to_raw(scaled_minimum, "scaledMinimum")?;
        let maximum = to_raw(scaled_maximum, "scaledMaximum")?;
        let node = NodeImpl::new(
            file,
            NodeKind::ScaledInteger(ScaledIntegerData {
                raw,
                minimum,
                maximum,
                scale,
                offset,
            }),
        )?;
        if !within_bounds(scaled, scaled_minimum, scaled_maximum) {
            return Err(Error::new(
                ErrorCode::ValueOutOfBounds,
                format!(
                    "this->pathName={} scaledValue={scaled} scaledMinimum={scaled_minimum} scaledMaximum={scaled_maximum}",
                    node.path_name_raw()
                ),
            ));
        }
        Ok(Self(super::Node(node)))
    }

    /// Stored raw integer
    pub fn raw_value(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.raw)
    }

    /// Raw value mapped through scale and offset
    pub fn scaled_value(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        let data = self.data()?;
        Ok(data.scaled(data.raw))
    }

    /// Smallest allowed raw value
    pub fn minimum(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.minimum)
    }

    /// Largest allowed raw value
    pub fn maximum(&self) -> Result<i64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.maximum)
    }

    /// Smallest allowed value in scaled units
    pub fn scaled_minimum(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        let data = self.data()?;
        Ok(data.scaled(data.minimum))
    }

    /// Largest allowed value in scaled units
    pub fn scaled_maximum(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        let data = self.data()?;
        Ok(data.scaled(data.maximum))
    }

    /// Factor applied to the raw value
    pub fn scale(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.scale)
    }

    /// Added after scaling
    pub fn offset(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.offset)
    }
}

pub(crate) struct FloatData {
    value: f64,
    precision: FloatPrecision,
    minimum: f64,
    maximum: f64,
}

impl FloatData {
    pub(crate) fn is_type_equivalent(&self, other: &Self) -> bool {
        self.precision == other.precision
            && self.minimum == other.minimum
            && self.maximum == other.maximum
    }

    pub(crate) fn write_xml(&self, w: &mut XmlWriter, depth: usize, name: &str) {
        w.start_element(depth, name, "Float");
        match self.precision {
            FloatPrecision::Single => {
                w.attribute("precision", FloatPrecision::Single.as_str());
                if self.minimum > FloatPrecision::Single.default_minimum() {
                    w.attribute("minimum", Single(self.minimum));
                }
                if self.maximum < FloatPrecision::Single.default_maximum() {
                    w.attribute("maximum", Single(self.maximum));
                }
                if self.value != 0.0 {
                    w.text_element_body(name, Single(self.value));
                } else {
                    w.end_empty();
                }
            }
            FloatPrecision::Double => {
                if self.minimum > FloatPrecision::Double.default_minimum() {
                    w.attribute("minimum", Double(self.minimum));
                }
                if self.maximum < FloatPrecision::Double.default_maximum() {
                    w.attribute("maximum", Double(self.maximum));
                }
                if self.value != 0.0 {
                    w.text_element_body(name, Double(self.value));
                } else {
                    w.end_empty();
                }
            }
        }
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, pad: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{pad}precision:   {}", self.precision);
        let _ = writeln!(out, "{pad}value:       {}", self.value);
        let _ = writeln!(out, "{pad}minimum:     {}", self.minimum);
        let _ = writeln!(out, "{pad}maximum:     {}", self.maximum);
    }
}

node_handle!(
    /// IEEE floating point value in single or double precision
    FloatNode,
    Float,
    FloatData
);

impl FloatNode {
    /// Create a double precision Float element with the full double range
    pub fn new(file: &ImageFile, value: f64) -> Result<Self> {
        Self::with_precision(
            file,
            value,
            FloatPrecision::Double,
            FloatPrecision::Double.default_minimum(),
            FloatPrecision::Double.default_maximum(),
        )
    }

    /// Create a Float element with explicit precision and bounds
    ///
    /// For single precision the bounds are clamped to the single range
    /// before the bounds check. Fails with `ValueOutOfBounds` unless
    /// `minimum <= value <= maximum` after clamping.
    pub fn with_precision(
        file: &ImageFile,
        value: f64,
        precision: FloatPrecision,
        minimum: f64,
        maximum: f64,
    ) -> Result<Self> {
        let (minimum, maximum) = match precision {
            FloatPrecision::Single => (
                minimum.max(FloatPrecision::Single.default_minimum()),
                maximum.min(FloatPrecision::Single.default_maximum()),
            ),
            FloatPrecision::Double => (minimum, maximum),
        };
        let node = NodeImpl::new(
            file,
            NodeKind::Float(FloatData {
                value,
                precision,
                minimum,
                maximum,
            }),
        )?;
        if !within_bounds(value, minimum, maximum) {
            return Err(Error::new(
                ErrorCode::ValueOutOfBounds,
                format!(
                    "this->pathName={} value={value} minimum={minimum} maximum={maximum}",
                    node.path_name_raw()
                ),
            ));
        }
        Ok(Self(super::Node(node)))
    }

    /// Current value
    pub fn value(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.value)
    }

    /// Storage precision
    pub fn precision(&self) -> Result<FloatPrecision> {
        self.0 .0.check_open()?;
        Ok(self.data()?.precision)
    }

    /// Smallest allowed value
    pub fn minimum(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.minimum)
    }

    /// Largest allowed value
    pub fn maximum(&self) -> Result<f64> {
        self.0 .0.check_open()?;
        Ok(self.data()?.maximum)
    }
}

pub(crate) struct StringData {
    value: String,
}

impl StringData {
    pub(crate) fn write_xml(&self, w: &mut XmlWriter, depth: usize, name: &str) {
        w.start_element(depth, name, "String");
        if self.value.is_empty() {
            w.end_empty();
        } else {
            w.cdata_element_body(name, &self.value);
        }
    }

    #[cfg(feature = "dump")]
    pub(crate) fn dump(&self, pad: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "{pad}value:       '{}'", self.value);
    }
}

node_handle!(
    /// UTF-8 text value
    StringNode,
    String,
    StringData
);

impl StringNode {
    /// Create an unattached string holding `value`
    pub fn new(file: &ImageFile, value: impl Into<String>) -> Result<Self> {
        let node = NodeImpl::new(
            file,
            NodeKind::String(StringData {
                value: value.into(),
            }),
        )?;
        Ok(Self(super::Node(node)))
    }

    /// Copy of the stored text
    pub fn value(&self) -> Result<String> {
        self.0 .0.check_open()?;
        Ok(self.data()?.value.clone())
    }
}
