//! Streaming encoder for positional files.

use std::io::{BufWriter, Write};

use tracing::debug;

use crate::{
    document::{Document, flatten},
    error::{IrsError, Result},
    record::{Record, encode_record},
};

/// Line terminator written after every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Buffered writer of positional records.
///
/// # Example
///
/// ```
/// use irs_codec::{IrsWriter, LineEnding, Record, RecordType};
///
/// let mut writer = IrsWriter::new(Vec::new()).with_line_ending(LineEnding::CrLf);
/// writer.write(&Record::new(RecordType::EndOfTransmission)).unwrap();
/// assert_eq!(writer.records_written(), 1);
///
/// let bytes = writer.into_inner().unwrap();
/// assert_eq!(bytes.len(), 752);
/// assert!(bytes.ends_with(b"\r\n"));
/// ```
pub struct IrsWriter<W: Write> {
    inner: BufWriter<W>,
    line_ending: LineEnding,
    records_written: usize,
}

impl<W: Write> IrsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: BufWriter::new(writer), line_ending: LineEnding::default(), records_written: 0 }
    }

    /// Creates a writer with the given buffer size.
    pub fn with_capacity(capacity: usize, writer: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, writer),
            line_ending: LineEnding::default(),
            records_written: 0,
        }
    }

    #[must_use]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Writes one record followed by the line ending.
    ///
    /// Derived fields are written as stored; use [`IrsWriter::write_document`]
    /// to have them recomputed.
    ///
    /// # Errors
    ///
    /// Field encode errors or [`IrsError::Io`].
    pub fn write(&mut self, record: &Record) -> Result<()> {
        let line = encode_record(record)?;
        self.inner.write_all(&line)?;
        self.inner.write_all(self.line_ending.as_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes several records.
    ///
    /// # Errors
    ///
    /// See [`IrsWriter::write`]; stops at the first failing record.
    pub fn write_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Flattens a document (recomputing derived fields) and writes it.
    ///
    /// # Errors
    ///
    /// [`IrsError::MalformedDocument`] for a structurally invalid document,
    /// otherwise see [`IrsWriter::write`].
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        let records = flatten(document)?;
        self.write_all(&records)?;
        debug!(records = records.len(), "encoded document");
        Ok(())
    }

    /// Flushes the buffer.
    ///
    /// # Errors
    ///
    /// [`IrsError::Io`].
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// [`IrsError::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| IrsError::Io(e.into_error()))
    }
}

/// Encodes a document with `\n` line endings.
///
/// # Errors
///
/// See [`IrsWriter::write_document`].
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    encode_with(document, LineEnding::Lf)
}

/// Encodes a document with the given line ending.
///
/// # Errors
///
/// See [`IrsWriter::write_document`].
pub fn encode_with(document: &Document, line_ending: LineEnding) -> Result<Vec<u8>> {
    let mut writer = IrsWriter::new(Vec::new()).with_line_ending(line_ending);
    writer.write_document(document)?;
    writer.into_inner()
}
