//! Codec and validator for IRS information-return files.
//!
//! The positional format of IRS Publication 1220 stores a submission as
//! 750-byte records: one transmitter (`T`), payer groups (`A` followed by
//! payees `B`, an end-of-payer `C` and optional state totals `K`) and a
//! closing end-of-transmission record (`F`). This crate converts such files
//! to and from a [`Document`] tree and a JSON form of that tree, and checks
//! documents against the publication's rules.
//!
//! - [`field`] and [`layout`] describe every column as data;
//! - [`record`] decodes and encodes single lines;
//! - [`document`] assembles records into a tree and flattens it back;
//! - [`reader`] and [`writer`] stream whole files;
//! - [`portable`] is the JSON bridge;
//! - [`validation`] produces [`Finding`]s.
//!
//! Decoding is fail-soft: a damaged line is reported and skipped, and the
//! rest of the file is still assembled. Encoding is strict and recomputes
//! counts, control totals and sequence numbers.
//!
//! # Quick start
//!
//! ```
//! use irs_codec::{Document, Format, PayerGroup, Record, RecordType, validate};
//!
//! let payee = Record::new(RecordType::Payee).with("payment_amount_1", 50_000).unwrap();
//! let document = Document::new(Record::new(RecordType::Transmitter))
//!     .with_payer(PayerGroup::new(Record::new(RecordType::Payer)).with_payee(payee));
//!
//! let bytes = irs_codec::write(&document, Format::Irs).unwrap();
//! assert_eq!(bytes.len(), 5 * 751);
//!
//! let decoded = irs_codec::read(&bytes, Format::Irs).unwrap();
//! assert!(decoded.findings.is_empty());
//! let end = decoded.document.payers[0].end_of_payer.as_ref().unwrap();
//! assert_eq!(end.number("control_total_1"), Some(50_000));
//!
//! // A skeleton document decodes cleanly but is far from valid
//! assert!(validate(&decoded.document).iter().any(|f| f.is_error()));
//! ```

pub mod document;
pub mod error;
pub mod field;
pub mod format;
pub mod layout;
pub mod portable;
pub mod reader;
pub mod record;
pub mod validation;
pub mod writer;

pub use document::{Assembler, Document, PayerGroup, assemble, flatten};
pub use error::{IrsError, Result};
pub use field::{FieldKind, FieldSpec, Justification, Value};
pub use format::{Format, read, write};
pub use layout::{RECORD_LENGTH, RecordLayout, RecordType};
pub use portable::{PortableDocument, PortablePayer, PortableRecord, from_json, from_portable, to_json, to_portable};
pub use reader::{Decoded, IrsReader, decode, read_document};
pub use record::{DecodedRecord, Record, decode_line, encode_record};
pub use validation::{Finding, RuleCategory, Severity, ValidationReport, Validator, validate};
pub use writer::{IrsWriter, LineEnding, encode, encode_with};
