//! Element name and path name grammar
//!
//! Element names follow XML NCName rules, optionally qualified with an
//! extension prefix (`prefix:local`). Children of a Vector are named by their
//! decimal index. Path names join element names with `/`; a leading `/`
//! makes the path absolute.

use crate::ErrorCode;

/// Check a name against the NCName production (ASCII subset plus any
/// alphabetic code point)
fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Whether `name` is a decimal child index (`"0"`, `"17"`)
pub fn is_index_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a decimal child index with overflow protection
pub fn parse_index(name: &str) -> Result<u64, ErrorCode> {
    if !is_index_name(name) {
        return Err(ErrorCode::BadPathName);
    }

    let mut result: u64 = 0;
    for byte in name.bytes() {
        let digit = (byte - b'0') as u64;
        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_add(digit))
            .ok_or(ErrorCode::BadPathName)?;
    }
    Ok(result)
}

/// Split an element name into its extension prefix and local part
///
/// Returns `None` for unprefixed names.
pub fn split_prefix(name: &str) -> Option<(&str, &str)> {
    name.split_once(':')
}

/// Validate a single element name
///
/// Accepts NCNames, `prefix:NCName` and decimal indexes. Does not check that
/// the prefix is registered; that is the file session's job.
pub fn validate_element_name(name: &str) -> Result<(), ErrorCode> {
    if is_index_name(name) {
        return Ok(());
    }
    let valid = match split_prefix(name) {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(name),
    };
    if valid {
        Ok(())
    } else {
        Err(ErrorCode::BadPathName)
    }
}

/// A parsed, validated path name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathName<'a> {
    relative: bool,
    body: &'a str,
}

impl<'a> PathName<'a> {
    /// Parse and validate a path name
    ///
    /// `"/"` is the root, `"/a/b"` is absolute, `"a/b"` is relative. Empty
    /// paths, empty fields and trailing separators are rejected.
    pub fn parse(path: &'a str) -> Result<Self, ErrorCode> {
        if path.is_empty() {
            return Err(ErrorCode::BadPathName);
        }

        let (relative, body) = match path.strip_prefix('/') {
            Some(rest) => (false, rest),
            None => (true, path),
        };

        if !body.is_empty() {
            for field in body.split('/') {
                validate_element_name(field)?;
            }
        }

        Ok(Self { relative, body })
    }

    /// Whether the path is resolved from the current node
    pub const fn is_relative(&self) -> bool {
        self.relative
    }

    /// Element names along the path, in order
    pub fn fields(&self) -> impl Iterator<Item = &'a str> + 'a {
        let body = self.body;
        body.split('/').filter(move |_| !body.is_empty())
    }
}
