//! JSON-representable form of a [`Document`].
//!
//! The portable tree nests records the way the document does and keys every
//! value by its layout field name. Numeric fields become JSON numbers,
//! alphanumeric fields strings; blank fields are omitted.
//!
//! ```json
//! {
//!   "transmitter": { "payment_year": 2019, "transmitter_tin": "131052134" },
//!   "payers": [
//!     {
//!       "payer": { "payer_tin": "261234567" },
//!       "payees": [ { "payment_amount_1": 50000 } ],
//!       "end_of_payer": { "number_of_payees": 1 }
//!     }
//!   ],
//!   "end_of_transmission": { "number_of_a_records": 1 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::{
    document::{Document, PayerGroup},
    error::{IrsError, Result},
    field::Value,
    layout::RecordType,
    record::Record,
};

/// Field map of one record, in layout order.
pub type PortableRecord = Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortableDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitter: Option<PortableRecord>,
    #[serde(default)]
    pub payers: Vec<PortablePayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_transmission: Option<PortableRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortablePayer {
    pub payer: PortableRecord,
    #[serde(default)]
    pub payees: Vec<PortableRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_of_payer: Option<PortableRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_totals: Vec<PortableRecord>,
}

/// Converts a document into its portable tree.
#[must_use]
pub fn to_portable(document: &Document) -> PortableDocument {
    PortableDocument {
        transmitter: document.transmitter.as_ref().map(record_to_map),
        payers: document
            .payers
            .iter()
            .map(|group| PortablePayer {
                payer: record_to_map(&group.payer),
                payees: group.payees.iter().map(record_to_map).collect(),
                end_of_payer: group.end_of_payer.as_ref().map(record_to_map),
                state_totals: group.state_totals.iter().map(record_to_map).collect(),
            })
            .collect(),
        end_of_transmission: document.end_of_transmission.as_ref().map(record_to_map),
    }
}

/// Builds a document from a portable tree.
///
/// Derived values are taken as given; encoding recomputes them.
///
/// # Errors
///
/// [`IrsError::MalformedDocument`] if the transmitter or every payer is
/// missing, a key is not a field of its record's layout, or a value has the
/// wrong JSON type.
pub fn from_portable(portable: &PortableDocument) -> Result<Document> {
    let transmitter = portable
        .transmitter
        .as_ref()
        .ok_or_else(|| IrsError::MalformedDocument("missing transmitter".to_string()))?;
    if portable.payers.is_empty() {
        return Err(IrsError::MalformedDocument("at least one payer is required".to_string()));
    }

    let mut document = Document::new(map_to_record(transmitter, RecordType::Transmitter)?);
    for payer in &portable.payers {
        let mut group = PayerGroup::new(map_to_record(&payer.payer, RecordType::Payer)?);
        for payee in &payer.payees {
            group.payees.push(map_to_record(payee, RecordType::Payee)?);
        }
        group.end_of_payer =
            payer.end_of_payer.as_ref().map(|m| map_to_record(m, RecordType::EndOfPayer)).transpose()?;
        for state in &payer.state_totals {
            group.state_totals.push(map_to_record(state, RecordType::StateTotals)?);
        }
        document.payers.push(group);
    }
    document.end_of_transmission = portable
        .end_of_transmission
        .as_ref()
        .map(|m| map_to_record(m, RecordType::EndOfTransmission))
        .transpose()?;

    debug!(payers = document.payers.len(), payees = document.payee_count(), "built document from portable form");
    Ok(document)
}

/// Serializes a document as pretty-printed JSON.
///
/// # Errors
///
/// [`IrsError::Json`] if serialization fails.
pub fn to_json(document: &Document) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(&to_portable(document))?;
    out.push(b'\n');
    Ok(out)
}

/// Serializes a document as single-line JSON.
///
/// # Errors
///
/// [`IrsError::Json`] if serialization fails.
pub fn to_json_compact(document: &Document) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&to_portable(document))?)
}

/// Parses a document from JSON.
///
/// # Errors
///
/// [`IrsError::Json`] for syntax errors and keys outside the tree shape,
/// otherwise see [`from_portable`].
pub fn from_json(bytes: &[u8]) -> Result<Document> {
    let portable: PortableDocument = serde_json::from_slice(bytes)?;
    from_portable(&portable)
}

fn record_to_map(record: &Record) -> PortableRecord {
    record
        .fields()
        .map(|(spec, value)| {
            let json = match value {
                Value::Number(n) => JsonValue::from(*n),
                Value::Text(s) => JsonValue::from(s.as_str()),
            };
            (spec.name.to_string(), json)
        })
        .collect()
}

fn map_to_record(map: &PortableRecord, record_type: RecordType) -> Result<Record> {
    let layout = record_type.layout();
    let mut record = Record::new(record_type);

    for (key, json) in map {
        let spec = layout.field(key).ok_or_else(|| {
            IrsError::MalformedDocument(format!("unknown field '{key}' in {record_type} record"))
        })?;
        let wrong_type = |expected: &str| {
            IrsError::MalformedDocument(format!(
                "field '{key}' of {record_type} record must be {expected}, got {json}"
            ))
        };

        let value = match json {
            JsonValue::Null => {
                record.clear(spec.name)?;
                continue;
            }
            JsonValue::Number(n) => {
                let n = n.as_i64().ok_or_else(|| wrong_type("an integer"))?;
                if spec.is_numeric() { Value::Number(n) } else { Value::Text(n.to_string()) }
            }
            JsonValue::String(s) if spec.is_numeric() => {
                let n = s.trim().parse::<i64>().map_err(|_| wrong_type("a number"))?;
                Value::Number(n)
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Bool(_) | JsonValue::Array(_) | JsonValue::Object(_) => {
                return Err(wrong_type(if spec.is_numeric() { "a number" } else { "a string" }));
            }
        };
        record.put(spec, value)?;
    }
    Ok(record)
}
