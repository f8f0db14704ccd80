//! Single fixed-width field: layout entry, value and codec.
//!
//! A field occupies `length` bytes starting at a 1-based `position`, the way
//! IRS Publication 1220 numbers record columns. Values are justified and
//! padded according to the field's [`FieldSpec`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrsError, Result};

/// Kind of data a field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Unsigned integer.
    Numeric,
    /// Integer that may carry a leading `-` (money amounts).
    SignedNumeric,
    /// Printable ASCII text.
    Alphanumeric,
    /// Constant fill (record type code, reserved blanks, zero fill).
    /// Not carried in a record's field map.
    Filler,
}

/// Side a value is aligned to; padding goes on the opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Justification {
    Left,
    Right,
}

/// Layout entry for one field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name used in the record's field map and in the portable form.
    pub name: &'static str,
    /// First column of the field (1-based).
    pub position: usize,
    /// Width in bytes.
    pub length: usize,
    pub kind: FieldKind,
    pub justification: Justification,
    /// Pad byte; for fillers, the fill byte.
    pub pad: u8,
    pub required: bool,
    /// Permitted values for non-blank alphanumeric content.
    pub allowed: Option<&'static [&'static str]>,
    /// Inclusive range for numeric content.
    pub range: Option<(i64, i64)>,
    /// Recomputed from the document structure on encode.
    pub derived: bool,
}

impl FieldSpec {
    const fn base(
        name: &'static str,
        position: usize,
        length: usize,
        kind: FieldKind,
        justification: Justification,
        pad: u8,
    ) -> Self {
        Self {
            name,
            position,
            length,
            kind,
            justification,
            pad,
            required: false,
            allowed: None,
            range: None,
            derived: false,
        }
    }

    /// Left-justified, space-filled text.
    pub const fn alpha(name: &'static str, position: usize, length: usize) -> Self {
        Self::base(name, position, length, FieldKind::Alphanumeric, Justification::Left, b' ')
    }

    /// Right-justified, zero-filled unsigned number.
    pub const fn numeric(name: &'static str, position: usize, length: usize) -> Self {
        Self::base(name, position, length, FieldKind::Numeric, Justification::Right, b'0')
    }

    /// Right-justified, zero-filled number with an optional leading minus sign.
    pub const fn signed(name: &'static str, position: usize, length: usize) -> Self {
        Self::base(name, position, length, FieldKind::SignedNumeric, Justification::Right, b'0')
    }

    /// Reserved blank range.
    pub const fn blank(position: usize, length: usize) -> Self {
        Self::fill("blank", position, length, b' ')
    }

    /// Range filled with a constant byte.
    pub const fn fill(name: &'static str, position: usize, length: usize, byte: u8) -> Self {
        Self::base(name, position, length, FieldKind::Filler, Justification::Left, byte)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub const fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Pads with `pad` instead of the kind's default.
    pub const fn padded_with(mut self, pad: u8) -> Self {
        self.pad = pad;
        self
    }

    pub const fn justified(mut self, justification: Justification) -> Self {
        self.justification = justification;
        self
    }

    /// Zero-based byte offset of the field within the record.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.position - 1
    }

    /// Zero-based offset one past the field's last byte.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset() + self.length
    }

    #[must_use]
    pub const fn is_filler(&self) -> bool {
        matches!(self.kind, FieldKind::Filler)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Numeric | FieldKind::SignedNumeric)
    }

    /// Zero-filled numeric fields always carry a value; zero encodes the same
    /// as an absent value.
    #[must_use]
    pub const fn is_zero_filled(&self) -> bool {
        self.is_numeric() && self.pad == b'0'
    }
}

/// Decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(i64),
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Decodes the field described by `spec` out of a full record line.
///
/// Returns `Ok(None)` for fillers and for blank content.
///
/// # Errors
///
/// [`IrsError::FieldFormat`] if the line is too short, the bytes are not
/// printable ASCII, or a numeric field holds something other than digits.
pub fn decode_field(line: &[u8], spec: &FieldSpec) -> Result<Option<Value>> {
    let raw = line.get(spec.offset()..spec.end()).ok_or_else(|| IrsError::FieldFormat {
        field: spec.name,
        message: format!("record ends before column {}", spec.position + spec.length - 1),
    })?;

    if spec.is_filler() {
        return Ok(None);
    }

    if !raw.iter().all(|b| is_printable(*b)) {
        return Err(IrsError::FieldFormat {
            field: spec.name,
            message: "contains bytes that are not printable ASCII".to_string(),
        });
    }
    // All bytes are ASCII at this point
    let text = std::str::from_utf8(raw).map_err(|e| IrsError::FieldFormat {
        field: spec.name,
        message: e.to_string(),
    })?;

    match spec.kind {
        FieldKind::Alphanumeric => {
            let trimmed = strip_pad(text, spec);
            if trimmed.is_empty() { Ok(None) } else { Ok(Some(Value::Text(trimmed.to_string()))) }
        }
        FieldKind::Numeric | FieldKind::SignedNumeric => {
            decode_number(text, spec).map(|n| n.map(Value::Number))
        }
        FieldKind::Filler => Ok(None),
    }
}

fn decode_number(text: &str, spec: &FieldSpec) -> Result<Option<i64>> {
    // Blank numeric fields are tolerated on input regardless of the pad byte
    if text.bytes().all(|b| b == b' ') {
        return Ok(None);
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) if spec.kind == FieldKind::SignedNumeric => (true, rest),
        _ => (false, text),
    };
    let digits = if spec.pad == b'0' { body } else { strip_pad(body, spec) };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IrsError::FieldFormat {
            field: spec.name,
            message: format!("expected digits, found {text:?}"),
        });
    }

    let value: i64 = digits.parse().map_err(|_| IrsError::FieldFormat {
        field: spec.name,
        message: format!("number {digits} is out of range"),
    })?;

    Ok(Some(if negative { -value } else { value }))
}

/// Encodes `value` into exactly `spec.length` bytes.
///
/// An absent value encodes as all pad bytes.
///
/// # Errors
///
/// [`IrsError::FieldTooLong`] if the formatted value is wider than the field;
/// [`IrsError::FieldFormat`] if the value does not match the field's kind.
pub fn encode_field(value: Option<&Value>, spec: &FieldSpec) -> Result<Vec<u8>> {
    let Some(value) = value.filter(|_| !spec.is_filler()) else {
        return Ok(vec![spec.pad; spec.length]);
    };

    match (spec.kind, value) {
        (FieldKind::Alphanumeric, Value::Text(s)) => encode_text(s, spec),
        (FieldKind::Alphanumeric, Value::Number(n)) => encode_text(&n.to_string(), spec),
        (FieldKind::Numeric | FieldKind::SignedNumeric, Value::Number(n)) => encode_number(*n, spec),
        (FieldKind::Numeric | FieldKind::SignedNumeric, Value::Text(s)) => {
            Err(IrsError::FieldFormat { field: spec.name, message: format!("expected a number, got {s:?}") })
        }
        (FieldKind::Filler, _) => Ok(vec![spec.pad; spec.length]),
    }
}

fn encode_text(text: &str, spec: &FieldSpec) -> Result<Vec<u8>> {
    if !text.bytes().all(is_printable) {
        return Err(IrsError::FieldFormat {
            field: spec.name,
            message: format!("{text:?} contains characters that are not printable ASCII"),
        });
    }
    if text.len() > spec.length {
        return Err(IrsError::FieldTooLong { field: spec.name, length: spec.length, actual: text.len() });
    }
    Ok(justify(text.as_bytes(), spec.length, spec))
}

fn encode_number(n: i64, spec: &FieldSpec) -> Result<Vec<u8>> {
    if n < 0 && spec.kind != FieldKind::SignedNumeric {
        return Err(IrsError::FieldFormat {
            field: spec.name,
            message: format!("negative value {n} in an unsigned field"),
        });
    }

    let digits = n.unsigned_abs().to_string();
    let sign_width = usize::from(n < 0);
    let actual = digits.len() + sign_width;
    if actual > spec.length {
        return Err(IrsError::FieldTooLong { field: spec.name, length: spec.length, actual });
    }

    let mut out = Vec::with_capacity(spec.length);
    // Sign always takes the leftmost column
    if n < 0 {
        out.push(b'-');
    }
    out.extend(justify(digits.as_bytes(), spec.length - sign_width, spec));
    Ok(out)
}

fn justify(content: &[u8], width: usize, spec: &FieldSpec) -> Vec<u8> {
    let padding = std::iter::repeat_n(spec.pad, width - content.len());
    match spec.justification {
        Justification::Left => content.iter().copied().chain(padding).collect(),
        Justification::Right => padding.chain(content.iter().copied()).collect(),
    }
}

/// Removes pad bytes from the side opposite the justification.
pub(crate) fn strip_pad<'a>(text: &'a str, spec: &FieldSpec) -> &'a str {
    let pad = char::from(spec.pad);
    match spec.justification {
        Justification::Left => text.trim_end_matches(pad),
        Justification::Right => text.trim_start_matches(pad),
    }
}

const fn is_printable(b: u8) -> bool {
    matches!(b, 0x20..=0x7e)
}
