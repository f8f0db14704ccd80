//! Error types for the positional codec, the assembler and the JSON bridge.

use thiserror::Error;

use crate::layout::RecordType;

/// Main error type of the crate.
///
/// Decode-time variants (field, record and assembly errors) are normally not
/// returned to the caller directly: the decoder collects them as
/// [`Finding`](crate::validation::Finding)s and keeps going. Encode-time
/// variants are fatal for the encode call that produced them.
#[derive(Debug, Error)]
pub enum IrsError {
    // === Field codec ===
    /// Raw bytes or a value that do not fit the field's kind.
    #[error("Invalid value for field '{field}': {message}")]
    FieldFormat {
        /// Field name from the record layout.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// Formatted value is wider than the field.
    #[error("Value for field '{field}' needs {actual} bytes, but the field holds {length}")]
    FieldTooLong {
        /// Field name from the record layout.
        field: &'static str,
        /// Declared field width.
        length: usize,
        /// Width of the formatted value.
        actual: usize,
    },

    /// Field name that the record's layout does not declare.
    #[error("Unknown field '{field}' for {record_type} record")]
    UnknownField {
        /// Record type whose layout was consulted.
        record_type: RecordType,
        /// Offending name.
        field: String,
    },

    // === Record codec ===
    /// Leading type code does not match any layout.
    #[error("Unknown record type {code:?} at line {line}")]
    UnknownRecordType {
        /// Line number (1-based).
        line: usize,
        /// Type code as found in the line.
        code: String,
    },

    /// Line length differs from the layout's fixed length.
    #[error("Record length mismatch at line {line}: expected {expected} bytes, got {actual}")]
    RecordLengthMismatch {
        /// Line number (1-based).
        line: usize,
        /// Layout length.
        expected: usize,
        /// Actual line length without the line terminator.
        actual: usize,
    },

    // === Assembly ===
    /// Record type not permitted at this point of the file.
    #[error("Unexpected {found} record at line {line}, expected {}", type_list(.expected))]
    UnexpectedRecordOrder {
        /// Line number (1-based).
        line: usize,
        /// Type of the rejected record.
        found: RecordType,
        /// Record types the assembler would have accepted.
        expected: Vec<RecordType>,
    },

    /// Payee record seen before any payer record.
    #[error("Payee record at line {line} appears before any payer record")]
    OrphanPayee {
        /// Line number (1-based).
        line: usize,
    },

    /// Input ended before the end-of-transmission record.
    #[error("Input ended before the end of transmission, expected {}", type_list(.expected))]
    UnexpectedEndOfInput {
        /// Record types the assembler was still waiting for.
        expected: Vec<RecordType>,
    },

    /// Document violates a structural invariant.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    // === I/O and formats ===
    /// Format selector other than `irs` or `json`.
    #[error("Unknown format '{0}', expected 'irs' or 'json'")]
    UnknownFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON syntax error in a portable document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IrsError {
    /// Stable identifier used as the `rule` of a finding built from this error.
    #[must_use]
    pub const fn rule_id(&self) -> &'static str {
        match self {
            Self::FieldFormat { .. } => "field-format",
            Self::FieldTooLong { .. } => "field-too-long",
            Self::UnknownField { .. } => "unknown-field",
            Self::UnknownRecordType { .. } => "unknown-record-type",
            Self::RecordLengthMismatch { .. } => "record-length-mismatch",
            Self::UnexpectedRecordOrder { .. } => "unexpected-record-order",
            Self::OrphanPayee { .. } => "orphan-payee",
            Self::UnexpectedEndOfInput { .. } => "unexpected-end-of-input",
            Self::MalformedDocument(_) => "malformed-document",
            Self::UnknownFormat(_) => "unknown-format",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    /// Field the error refers to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::FieldFormat { field, .. } | Self::FieldTooLong { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Line number (1-based) the error refers to, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::UnknownRecordType { line, .. }
            | Self::RecordLengthMismatch { line, .. }
            | Self::UnexpectedRecordOrder { line, .. }
            | Self::OrphanPayee { line } => Some(*line),
            _ => None,
        }
    }
}

fn type_list(types: &[RecordType]) -> String {
    if types.is_empty() {
        return "no further records".to_string();
    }
    let names: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("one of: {}", names.join(", "))
}

/// Shorthand Result type for codec operations.
pub type Result<T> = std::result::Result<T, IrsError>;
