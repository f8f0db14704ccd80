//! Runtime selection between the positional and the JSON representation.

use std::{fmt, str::FromStr};

use crate::{
    document::Document,
    error::{IrsError, Result},
    portable::{from_json, to_json},
    reader::{Decoded, decode},
    writer::encode,
};

/// External representation of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Fixed-width positional text.
    Irs,
    /// Portable JSON tree.
    Json,
}

impl Format {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Irs => "irs",
            Self::Json => "json",
        }
    }

    /// Determines the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use irs_codec::Format;
    ///
    /// assert_eq!(Format::from_extension("DAT"), Some(Format::Irs));
    /// assert_eq!(Format::from_extension("json"), Some(Format::Json));
    /// assert_eq!(Format::from_extension("csv"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "irs" | "txt" | "dat" => Some(Self::Irs),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detects the format from content: JSON starts with `{`.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Self::Json,
            _ => Self::Irs,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = IrsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "irs" => Ok(Self::Irs),
            "json" => Ok(Self::Json),
            _ => Err(IrsError::UnknownFormat(s.to_string())),
        }
    }
}

/// Decodes `bytes` in the given format.
///
/// Positional input is decoded fail-soft; JSON input either parses or fails.
///
/// # Errors
///
/// JSON syntax or structure errors; positional decoding never fails here.
pub fn read(bytes: &[u8], format: Format) -> Result<Decoded> {
    match format {
        Format::Irs => Ok(decode(bytes)),
        Format::Json => Ok(Decoded { document: from_json(bytes)?, findings: Vec::new() }),
    }
}

/// Encodes a document in the given format.
///
/// # Errors
///
/// [`IrsError::MalformedDocument`] or field encode errors for positional
/// output; [`IrsError::Json`] for JSON output.
pub fn write(document: &Document, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Irs => encode(document),
        Format::Json => to_json(document),
    }
}
