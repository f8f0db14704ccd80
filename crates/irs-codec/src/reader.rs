//! Streaming decoder for positional files.
//!
//! [`IrsReader`] turns any [`Read`] source into an iterator of decoded
//! records. [`read_document`] and [`decode`] add assembly on top and never
//! stop at a damaged record: every problem becomes a [`Finding`] and the
//! rest of the file is still processed.

use std::io::{BufRead, BufReader, Read};

use tracing::{debug, warn};

use crate::{
    document::{Assembler, Document},
    error::{IrsError, Result},
    record::{DecodedRecord, decode_line},
    validation::Finding,
};

/// Iterator over the records of a positional file.
///
/// Lines are split on `\n`; a trailing `\r` is dropped and empty lines are
/// skipped. Each item is either a (possibly partially) decoded record or
/// the line-level error that prevented decoding it. An I/O error ends the
/// iteration.
///
/// # Example
///
/// ```
/// use irs_codec::IrsReader;
///
/// let input = format!("Z{}\n", " ".repeat(749));
/// let mut reader = IrsReader::new(input.as_bytes());
///
/// assert!(reader.next().unwrap().is_err());
/// assert!(reader.next().is_none());
/// assert_eq!(reader.lines_read(), 1);
/// ```
pub struct IrsReader<R> {
    inner: BufReader<R>,
    buffer: Vec<u8>,
    /// Physical lines consumed so far, including empty ones.
    lines_read: usize,
    /// Records decoded without a line-level error.
    records_read: usize,
    finished: bool,
}

impl<R: Read> IrsReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buffer: Vec::new(),
            lines_read: 0,
            records_read: 0,
            finished: false,
        }
    }

    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    #[must_use]
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read> Iterator for IrsReader<R> {
    type Item = Result<DecodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            match self.inner.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.lines_read += 1;
                    let line = trim_line_ending(&self.buffer);
                    if line.is_empty() {
                        continue;
                    }
                    let result = decode_line(line, self.lines_read);
                    if result.is_ok() {
                        self.records_read += 1;
                    }
                    return Some(result);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Best-effort decode result: the document plus everything that went wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub document: Document,
    /// Decode problems, in file order. Empty for a clean file.
    pub findings: Vec<Finding>,
}

impl Decoded {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Reads and assembles a whole positional file.
///
/// Finding record indexes are zero-based line numbers; an error about the
/// end of input points one past the last line. An undecodable line yields a
/// single finding: the records around it are still assembled, see
/// [`Assembler::skip_line`].
///
/// # Errors
///
/// Only [`IrsError::Io`]; format problems are reported as findings.
pub fn read_document<R: Read>(reader: R) -> Result<Decoded> {
    let mut reader = IrsReader::new(reader);
    let mut assembler = Assembler::new();
    let mut findings = Vec::new();

    for item in reader.by_ref() {
        let decoded = match item {
            Ok(decoded) => decoded,
            Err(e @ IrsError::Io(_)) => return Err(e),
            Err(e) => {
                let index = e.line().map_or(0, |line| line - 1);
                warn!(line = index + 1, error = %e, "skipping undecodable record");
                findings.push(Finding::from_error(index, &e));
                assembler.skip_line();
                continue;
            }
        };

        let index = decoded.line - 1;
        findings.extend(decoded.errors.iter().map(|e| Finding::from_error(index, e)));
        if let Err(e) = assembler.push(decoded.record, decoded.line) {
            warn!(line = decoded.line, error = %e, "skipping out-of-place record");
            findings.push(Finding::from_error(index, &e));
        }
    }

    let (document, error) = assembler.finish();
    if let Some(e) = error {
        warn!(error = %e, "input ended early");
        findings.push(Finding::from_error(reader.lines_read(), &e));
    }

    debug!(
        lines = reader.lines_read(),
        records = reader.records_read(),
        findings = findings.len(),
        "decoded positional file"
    );
    Ok(Decoded { document, findings })
}

/// Decodes a positional file held in memory.
///
/// # Example
///
/// ```
/// use irs_codec::decode;
///
/// let decoded = decode(b"");
/// assert!(decoded.document.transmitter.is_none());
/// assert_eq!(decoded.findings[0].rule, "unexpected-end-of-input");
/// ```
#[must_use]
pub fn decode(bytes: &[u8]) -> Decoded {
    // Reading from a slice cannot fail
    read_document(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::{RECORD_LENGTH, RecordType},
        record::{Record, encode_record},
    };

    fn line(record_type: RecordType) -> Vec<u8> {
        encode_record(&Record::new(record_type)).unwrap()
    }

    fn file(types: &[RecordType], ending: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        for record_type in types {
            out.extend(line(*record_type));
            out.extend_from_slice(ending);
        }
        out
    }

    const MINIMAL: [RecordType; 5] = [
        RecordType::Transmitter,
        RecordType::Payer,
        RecordType::Payee,
        RecordType::EndOfPayer,
        RecordType::EndOfTransmission,
    ];

    // ==== IrsReader ====

    #[test]
    fn reads_lf_and_crlf_lines() {
        for ending in [&b"\n"[..], &b"\r\n"[..]] {
            let input = file(&MINIMAL, ending);
            let reader = IrsReader::new(input.as_slice());
            let records: Vec<_> = reader.map(|r| r.unwrap().record.record_type()).collect();
            assert_eq!(records, MINIMAL);
        }
    }

    #[test]
    fn last_line_without_terminator_is_read() {
        let mut input = file(&MINIMAL, b"\n");
        input.pop();
        assert_eq!(IrsReader::new(input.as_slice()).count(), 5);
    }

    #[test]
    fn empty_lines_are_skipped_but_counted() {
        let mut input = b"\n\n".to_vec();
        input.extend(line(RecordType::Transmitter));
        let mut reader = IrsReader::new(input.as_slice());
        let decoded = reader.next().unwrap().unwrap();
        assert_eq!(decoded.line, 3);
        assert!(reader.next().is_none());
        assert_eq!(reader.records_read(), 1);
    }

    #[test]
    fn line_errors_do_not_stop_iteration() {
        let mut input = b"short\n".to_vec();
        input.extend(line(RecordType::Transmitter));
        let results: Vec<_> = IrsReader::new(input.as_slice()).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(IrsError::UnknownRecordType { line: 1, .. })));
        assert!(results[1].is_ok());
    }

    // ==== read_document ====

    #[test]
    fn clean_file_has_no_findings() {
        let decoded = decode(&file(&MINIMAL, b"\n"));
        assert!(decoded.is_clean(), "{:?}", decoded.findings);
        assert_eq!(decoded.document.payee_count(), 1);
    }

    #[test]
    fn bad_length_line_is_reported_and_skipped() {
        let mut input = file(&MINIMAL[..2], b"\n");
        let mut short = line(RecordType::Payee);
        short.truncate(RECORD_LENGTH - 10);
        input.extend(short);
        input.push(b'\n');
        input.extend(file(&[RecordType::Payee, RecordType::EndOfPayer, RecordType::EndOfTransmission], b"\n"));

        let decoded = decode(&input);
        assert_eq!(decoded.findings.len(), 1);
        assert_eq!(decoded.findings[0].rule, "record-length-mismatch");
        assert_eq!(decoded.findings[0].record_index, 2);
        assert_eq!(decoded.document.payee_count(), 1);
        assert!(decoded.document.end_of_transmission.is_some());
    }

    #[test]
    fn field_errors_keep_the_record() {
        let mut bad = line(RecordType::Payee);
        bad[1..5].copy_from_slice(b"20X9");
        let mut input = file(&MINIMAL[..2], b"\n");
        input.extend(bad);
        input.push(b'\n');
        input.extend(file(&MINIMAL[3..], b"\n"));

        let decoded = decode(&input);
        assert_eq!(decoded.findings.len(), 1);
        assert_eq!(decoded.findings[0].rule, "field-format");
        assert_eq!(decoded.findings[0].field.as_deref(), Some("payment_year"));
        assert_eq!(decoded.document.payee_count(), 1);
    }

    #[test]
    fn decode_matches_read_document() {
        let input = file(&MINIMAL[..4], b"\n");
        assert_eq!(decode(&input), read_document(input.as_slice()).unwrap());
    }

    #[test]
    fn short_payer_line_keeps_following_records() {
        let mut input = line(RecordType::Transmitter);
        input.push(b'\n');
        input.extend_from_slice(&line(RecordType::Payer)[..RECORD_LENGTH - 1]);
        input.push(b'\n');
        input.extend(file(&MINIMAL[2..], b"\n"));

        let decoded = decode(&input);
        assert_eq!(decoded.findings.len(), 1, "{:?}", decoded.findings);
        assert_eq!(decoded.findings[0].record_index, 1);
        assert_eq!(decoded.document.payee_count(), 1);
        assert!(decoded.document.end_of_transmission.is_some());
    }

    #[test]
    fn truncated_file_reports_end_of_input() {
        let decoded = decode(&file(&MINIMAL[..3], b"\n"));
        let last = decoded.findings.last().unwrap();
        assert_eq!(last.rule, "unexpected-end-of-input");
        assert_eq!(last.record_index, 3);
        assert_eq!(decoded.document.payee_count(), 1);
    }

    #[test]
    fn out_of_order_record_is_skipped() {
        let types = [
            RecordType::Transmitter,
            RecordType::Payee,
            RecordType::Payer,
            RecordType::Payee,
            RecordType::EndOfPayer,
            RecordType::EndOfTransmission,
        ];
        let decoded = decode(&file(&types, b"\n"));
        assert_eq!(decoded.findings.len(), 1);
        assert_eq!(decoded.findings[0].rule, "orphan-payee");
        assert_eq!(decoded.findings[0].record_index, 1);
        assert_eq!(decoded.document.payee_count(), 1);
    }
}
