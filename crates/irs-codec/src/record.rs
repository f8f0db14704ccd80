//! Generic record (a field map tagged with its layout) and the record codec.

use std::collections::BTreeMap;

use crate::{
    error::{IrsError, Result},
    field::{FieldSpec, Justification, Value, decode_field, encode_field, strip_pad},
    layout::{RECORD_LENGTH, RecordLayout, RecordType},
};

/// One decoded or constructed record.
///
/// Values are kept in canonical form so that a record built in code compares
/// equal to its decoded image:
/// - blank text is absent from the map;
/// - zero-filled numeric fields are always present (zero by default);
/// - pad bytes on the unjustified side of text are trimmed.
///
/// # Example
///
/// ```
/// use irs_codec::{Record, RecordType};
///
/// let mut payee = Record::new(RecordType::Payee);
/// payee.set("first_payee_name_line", "JANE DOE  ").unwrap();
/// payee.set("payment_amount_1", 125_00).unwrap();
///
/// assert_eq!(payee.text("first_payee_name_line"), Some("JANE DOE"));
/// assert_eq!(payee.number("payment_amount_2"), Some(0));
/// assert!(payee.set("no_such_field", 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    record_type: RecordType,
    fields: BTreeMap<&'static str, Value>,
}

impl Record {
    /// Creates a record with every zero-filled numeric field set to zero.
    #[must_use]
    pub fn new(record_type: RecordType) -> Self {
        let fields = record_type
            .layout()
            .data_fields()
            .filter(|spec| spec.is_zero_filled())
            .map(|spec| (spec.name, Value::Number(0)))
            .collect();
        Self { record_type, fields }
    }

    /// Creates a record with no values at all; used while decoding.
    pub(crate) fn empty(record_type: RecordType) -> Self {
        Self { record_type, fields: BTreeMap::new() }
    }

    #[must_use]
    pub const fn record_type(&self) -> RecordType {
        self.record_type
    }

    #[must_use]
    pub const fn layout(&self) -> &'static RecordLayout {
        self.record_type.layout()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Text value of a field, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    /// Numeric value of a field, if present.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_number)
    }

    /// Sets a field, canonicalizing the value against the field's spec.
    ///
    /// # Errors
    ///
    /// [`IrsError::UnknownField`] if the layout has no such data field,
    /// [`IrsError::FieldFormat`] for text that is not a number on a numeric
    /// field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let spec = self.spec(name)?;
        self.put(spec, value.into())
    }

    /// Builder form of [`Record::set`].
    ///
    /// # Errors
    ///
    /// See [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Clears a field back to its blank state.
    ///
    /// # Errors
    ///
    /// [`IrsError::UnknownField`] if the layout has no such data field.
    pub fn clear(&mut self, name: &str) -> Result<()> {
        let spec = self.spec(name)?;
        if spec.is_zero_filled() {
            self.fields.insert(spec.name, Value::Number(0));
        } else {
            self.fields.remove(spec.name);
        }
        Ok(())
    }

    /// Present values in column order, paired with their specs.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &Value)> + '_ {
        self.layout().data_fields().filter_map(|spec| self.fields.get(spec.name).map(|v| (spec, v)))
    }

    fn spec(&self, name: &str) -> Result<&'static FieldSpec> {
        self.layout().field(name).ok_or_else(|| IrsError::UnknownField {
            record_type: self.record_type,
            field: name.to_string(),
        })
    }

    /// Stores a value for a field known to belong to this layout.
    ///
    /// Numbers given for text fields are stored as their digits; text given
    /// for numeric fields must parse as a number or be blank.
    pub(crate) fn put(&mut self, spec: &'static FieldSpec, value: Value) -> Result<()> {
        let text = match value {
            Value::Number(_) if spec.is_numeric() => {
                self.fields.insert(spec.name, value);
                return Ok(());
            }
            Value::Number(n) => n.to_string(),
            Value::Text(text) => text,
        };

        let canonical = match spec.justification {
            Justification::Left => text.trim_end_matches(' '),
            Justification::Right => text.trim_start_matches(' '),
        };
        if spec.is_numeric() && !canonical.is_empty() {
            let n = canonical.trim().parse::<i64>().map_err(|_| IrsError::FieldFormat {
                field: spec.name,
                message: format!("'{canonical}' is not a number"),
            })?;
            self.fields.insert(spec.name, Value::Number(n));
            return Ok(());
        }

        let canonical = if spec.is_numeric() { canonical } else { strip_pad(canonical, spec) };
        if canonical.is_empty() && spec.is_zero_filled() {
            self.fields.insert(spec.name, Value::Number(0));
        } else if canonical.is_empty() {
            self.fields.remove(spec.name);
        } else {
            self.fields.insert(spec.name, Value::Text(canonical.to_string()));
        }
        Ok(())
    }

    /// Sets a numeric field by name; the name must come from the layout tables.
    pub(crate) fn put_number(&mut self, name: &'static str, value: i64) {
        let spec = self.layout().field(name);
        debug_assert!(spec.is_some(), "{name} is not a field of {}", self.record_type);
        if let Some(spec) = spec {
            self.fields.insert(spec.name, Value::Number(value));
        }
    }
}

/// Result of decoding one line: the record plus any per-field failures.
///
/// A field that failed to decode is left absent in `record`.
#[derive(Debug)]
pub struct DecodedRecord {
    /// Line number (1-based).
    pub line: usize,
    pub record: Record,
    pub errors: Vec<IrsError>,
}

impl DecodedRecord {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decodes a single line (without its line terminator).
///
/// Every field of the layout is decoded even after a failure, so a bad
/// record reports one error per bad field.
///
/// # Errors
///
/// [`IrsError::UnknownRecordType`] or [`IrsError::RecordLengthMismatch`];
/// the line cannot be decoded at all in these cases.
pub fn decode_line(bytes: &[u8], line: usize) -> Result<DecodedRecord> {
    let code = bytes.first().copied().unwrap_or(b' ');
    let record_type = RecordType::from_code(code).ok_or_else(|| IrsError::UnknownRecordType {
        line,
        code: String::from_utf8_lossy(&bytes[..bytes.len().min(1)]).into_owned(),
    })?;

    let layout = record_type.layout();
    if bytes.len() != layout.length() {
        return Err(IrsError::RecordLengthMismatch {
            line,
            expected: layout.length(),
            actual: bytes.len(),
        });
    }

    let mut record = Record::empty(record_type);
    let mut errors = Vec::new();
    for spec in layout.data_fields() {
        match decode_field(bytes, spec) {
            Ok(Some(value)) => {
                record.fields.insert(spec.name, value);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    Ok(DecodedRecord { line, record, errors })
}

/// Encodes a record into a line of exactly [`RECORD_LENGTH`] bytes.
///
/// # Errors
///
/// Field-level encode errors ([`IrsError::FieldTooLong`],
/// [`IrsError::FieldFormat`]); the first one aborts the call.
pub fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let layout = record.layout();
    let mut line = Vec::with_capacity(RECORD_LENGTH);
    for spec in layout.fields {
        let value = if spec.is_filler() { None } else { record.get(spec.name) };
        line.extend(encode_field(value, spec)?);
    }
    debug_assert_eq!(line.len(), layout.length());
    Ok(line)
}
