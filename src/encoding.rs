//! Text clean-up applied before content reaches a sheet.
//!
//! Two things can make text unusable in a workbook: byte sequences that are
//! not UTF-8 (raw PDF strings without a resolvable font encoding), and
//! characters that XML 1.0 cannot carry (most C0 control characters). Both
//! are handled by one explicit [`InvalidBytes`] policy.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do with input that cannot be stored as sheet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidBytes {
    /// Discard the offending bytes or characters.
    #[default]
    Drop,
    /// Substitute U+FFFD REPLACEMENT CHARACTER.
    Replace,
    /// Fail with [`Error::Encoding`].
    Error,
}

impl InvalidBytes {
    /// Name used in CLI flags and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidBytes::Drop => "drop",
            InvalidBytes::Replace => "replace",
            InvalidBytes::Error => "error",
        }
    }
}

impl std::fmt::Display for InvalidBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode bytes as UTF-8, handling invalid sequences according to `policy`.
///
/// Valid UTF-8 input is returned unchanged.
pub fn clean_bytes(bytes: &[u8], policy: InvalidBytes) -> Result<String> {
    if let Ok(valid) = std::str::from_utf8(bytes) {
        return Ok(valid.to_string());
    }

    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    let mut offset = 0;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return Ok(out);
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }

                match policy {
                    InvalidBytes::Drop => {}
                    InvalidBytes::Replace => out.push(char::REPLACEMENT_CHARACTER),
                    InvalidBytes::Error => {
                        return Err(Error::Encoding(format!(
                            "invalid UTF-8 sequence at byte {}",
                            offset + e.valid_up_to()
                        )));
                    }
                }

                // A truncated sequence at the end has no error length.
                let skip = e.error_len().unwrap_or(after.len());
                offset += e.valid_up_to() + skip;
                rest = &after[skip..];
            }
        }
    }
}

/// Clean one cell of text so it can be written to a sheet.
///
/// Strings without XML-illegal characters are returned borrowed and
/// unchanged, so applying this twice is the same as applying it once.
pub fn clean_cell(text: &str, policy: InvalidBytes) -> Result<Cow<'_, str>> {
    let Some(first_bad) = text.find(is_xml_illegal) else {
        return Ok(Cow::Borrowed(text));
    };

    if policy == InvalidBytes::Error {
        let c = text[first_bad..].chars().next().unwrap_or_default();
        return Err(Error::Encoding(format!(
            "character U+{:04X} cannot be stored in a sheet",
            c as u32
        )));
    }

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first_bad]);
    for c in text[first_bad..].chars() {
        if !is_xml_illegal(c) {
            out.push(c);
        } else if policy == InvalidBytes::Replace {
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
    Ok(Cow::Owned(out))
}

/// Characters outside the XML 1.0 `Char` production.
fn is_xml_illegal(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}
