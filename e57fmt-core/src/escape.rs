//! Markup escaping rules shared by every element writer
//!
//! String values are written as CDATA. A CDATA block cannot contain its own
//! terminator `]]>`, so each occurrence is split after the `]]`: the block is
//! closed, a new one is opened and the `>` starts the next piece. Readers
//! concatenate adjacent CDATA blocks and get the original bytes back.

use core::fmt::{self, Write};

/// Terminator of a CDATA block
pub const CDATA_END: &str = "]]>";

/// Opening of a CDATA block
pub const CDATA_START: &str = "<![CDATA[";

/// Pieces of `value` that can each be emitted as one CDATA block
///
/// No piece contains `]]>`. Concatenating the pieces yields `value`.
pub fn cdata_pieces(value: &str) -> CdataPieces<'_> {
    CdataPieces { rest: Some(value) }
}

/// Iterator returned by [`cdata_pieces`]
#[derive(Debug, Clone)]
pub struct CdataPieces<'a> {
    rest: Option<&'a str>,
}

impl<'a> Iterator for CdataPieces<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.find(CDATA_END) {
            Some(found) => {
                // keep "]]" in this piece, ">" opens the next one
                let (piece, tail) = rest.split_at(found + 2);
                self.rest = Some(tail);
                Some(piece)
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Write `value` as one or more adjacent CDATA blocks
pub fn write_cdata<W: Write>(out: &mut W, value: &str) -> fmt::Result {
    for piece in cdata_pieces(value) {
        out.write_str(CDATA_START)?;
        out.write_str(piece)?;
        out.write_str(CDATA_END)?;
    }
    Ok(())
}

/// Write `value` escaped for use inside a double-quoted attribute
pub fn write_attribute_value<W: Write>(out: &mut W, value: &str) -> fmt::Result {
    let mut start = 0;
    for (i, c) in value.char_indices() {
        let replacement = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&apos;",
            _ => continue,
        };
        out.write_str(&value[start..i])?;
        out.write_str(replacement)?;
        start = i + c.len_utf8();
    }
    out.write_str(&value[start..])
}
