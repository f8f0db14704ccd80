//! Hierarchical document and the assembler that builds it from records.
//!
//! A file is a transmitter record, one or more payer groups and a closing
//! end-of-transmission record. Records are owned by the [`Document`] tree
//! and addressed by position; there are no back references.
//!
//! Assembly follows the record order of Publication 1220:
//!
//! ```text
//! Start → T → A → B* → C → K* → (A | F) → End
//! ```
//!
//! After [`Assembler::skip_line`] the assembler also accepts records that
//! would have followed the dropped one, so one damaged line costs one record.

use std::mem;

use tracing::debug;

use crate::{
    error::{IrsError, Result},
    layout::{CONTROL_TOTAL_FIELDS, PAYMENT_AMOUNT_FIELDS, RECORD_SEQUENCE_NUMBER, RecordType},
    record::Record,
};

/// One payer (`A`) with everything it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerGroup {
    pub payer: Record,
    pub payees: Vec<Record>,
    /// `C` record; synthesized by [`Document::refresh_derived`] when missing.
    pub end_of_payer: Option<Record>,
    /// `K` records following the `C` record.
    pub state_totals: Vec<Record>,
}

impl PayerGroup {
    #[must_use]
    pub fn new(payer: Record) -> Self {
        Self { payer, payees: Vec::new(), end_of_payer: None, state_totals: Vec::new() }
    }

    /// Group standing in for a payer record that could not be decoded.
    fn placeholder() -> Self {
        Self::new(Record::new(RecordType::Payer))
    }

    /// Appends a payee record; returns `self` for chaining.
    #[must_use]
    pub fn with_payee(mut self, payee: Record) -> Self {
        self.payees.push(payee);
        self
    }

    /// Records of the group in file order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        std::iter::once(&self.payer)
            .chain(&self.payees)
            .chain(&self.end_of_payer)
            .chain(&self.state_totals)
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        std::iter::once(&mut self.payer)
            .chain(&mut self.payees)
            .chain(&mut self.end_of_payer)
            .chain(&mut self.state_totals)
    }

    fn refresh_totals(&mut self) {
        let end = self.end_of_payer.get_or_insert_with(|| Record::new(RecordType::EndOfPayer));
        write_totals(end, &self.payees);

        for state in &mut self.state_totals {
            let Some(code) = state.text("combined_federal_state_code").map(str::to_owned) else {
                write_totals(state, &[]);
                continue;
            };
            let matching: Vec<Record> = self
                .payees
                .iter()
                .filter(|p| p.text("combined_federal_state_code") == Some(code.as_str()))
                .cloned()
                .collect();
            write_totals(state, &matching);
            state.put_number("state_income_tax_withheld_total", sum_of(&matching, "state_income_tax_withheld"));
            state.put_number("local_income_tax_withheld_total", sum_of(&matching, "local_income_tax_withheld"));
        }
    }
}

/// Root aggregate of one information-return file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// `T` record; absent only in a best-effort decode of a damaged file.
    pub transmitter: Option<Record>,
    pub payers: Vec<PayerGroup>,
    /// `F` record; synthesized by [`Document::refresh_derived`] when missing.
    pub end_of_transmission: Option<Record>,
}

impl Document {
    #[must_use]
    pub fn new(transmitter: Record) -> Self {
        Self { transmitter: Some(transmitter), ..Self::default() }
    }

    /// Appends a payer group; returns `self` for chaining.
    #[must_use]
    pub fn with_payer(mut self, group: PayerGroup) -> Self {
        self.payers.push(group);
        self
    }

    /// Present records in file order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.transmitter
            .iter()
            .chain(self.payers.iter().flat_map(PayerGroup::records))
            .chain(&self.end_of_transmission)
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.transmitter
            .iter_mut()
            .chain(self.payers.iter_mut().flat_map(|group| group.records_mut()))
            .chain(&mut self.end_of_transmission)
    }

    /// Payee records of every payer, in file order.
    pub fn payees(&self) -> impl Iterator<Item = &Record> {
        self.payers.iter().flat_map(|group| &group.payees)
    }

    #[must_use]
    pub fn payee_count(&self) -> usize {
        self.payers.iter().map(|group| group.payees.len()).sum()
    }

    /// Checks record types and the presence of the mandatory parts.
    ///
    /// # Errors
    ///
    /// [`IrsError::MalformedDocument`] naming the first violation.
    pub fn check_structure(&self) -> Result<()> {
        let transmitter = self
            .transmitter
            .as_ref()
            .ok_or_else(|| malformed("document has no transmitter record"))?;
        expect_type(transmitter, RecordType::Transmitter, "transmitter")?;

        if self.payers.is_empty() {
            return Err(malformed("document has no payer records"));
        }
        for group in &self.payers {
            expect_type(&group.payer, RecordType::Payer, "payer")?;
            for payee in &group.payees {
                expect_type(payee, RecordType::Payee, "payee")?;
            }
            if let Some(end) = &group.end_of_payer {
                expect_type(end, RecordType::EndOfPayer, "end of payer")?;
            }
            for state in &group.state_totals {
                expect_type(state, RecordType::StateTotals, "state totals")?;
            }
        }
        if let Some(end) = &self.end_of_transmission {
            expect_type(end, RecordType::EndOfTransmission, "end of transmission")?;
        }
        Ok(())
    }

    /// Recomputes every derived field from the tree and writes it back.
    ///
    /// Missing `C` and `F` records are created. Sequence numbers are
    /// assigned 1..n in file order.
    ///
    /// # Errors
    ///
    /// [`IrsError::MalformedDocument`] if [`Document::check_structure`] fails.
    pub fn refresh_derived(&mut self) -> Result<()> {
        self.check_structure()?;

        let payees = count(self.payee_count());
        let payers = count(self.payers.len());

        for group in &mut self.payers {
            group.refresh_totals();
        }
        if let Some(transmitter) = &mut self.transmitter {
            transmitter.put_number("total_number_of_payees", payees);
        }
        let end = self.end_of_transmission.get_or_insert_with(|| Record::new(RecordType::EndOfTransmission));
        end.put_number("number_of_a_records", payers);
        end.put_number("total_number_of_payees", payees);

        let mut sequence = 0;
        for record in self.records_mut() {
            sequence += 1;
            record.put_number(RECORD_SEQUENCE_NUMBER, sequence);
        }

        debug!(payers, payees, records = sequence, "refreshed derived fields");
        Ok(())
    }
}

/// Records of `document` in file order, with derived fields recomputed.
///
/// The document itself is left untouched.
///
/// # Errors
///
/// [`IrsError::MalformedDocument`] if the document lacks a transmitter or
/// payers, or holds a record of the wrong type in some position.
pub fn flatten(document: &Document) -> Result<Vec<Record>> {
    let mut document = document.clone();
    document.refresh_derived()?;
    Ok(document.records().cloned().collect())
}

/// Assembles records into a document, stopping at the first structural error.
///
/// Records are numbered from 1 in the order given; error line numbers refer
/// to that numbering.
///
/// # Errors
///
/// [`IrsError::UnexpectedRecordOrder`], [`IrsError::OrphanPayee`] or
/// [`IrsError::UnexpectedEndOfInput`].
pub fn assemble(records: impl IntoIterator<Item = Record>) -> Result<Document> {
    let mut assembler = Assembler::new();
    for (index, record) in records.into_iter().enumerate() {
        assembler.push(record, index + 1)?;
    }
    match assembler.finish() {
        (document, None) => Ok(document),
        (_, Some(err)) => Err(err),
    }
}

#[derive(Debug)]
enum State {
    Start,
    Transmitter,
    Payer(PayerGroup),
    EndOfPayer(PayerGroup),
    End,
}

impl State {
    fn expected(&self) -> Vec<RecordType> {
        match self {
            Self::Start => vec![RecordType::Transmitter],
            Self::Transmitter => vec![RecordType::Payer],
            Self::Payer(_) => vec![RecordType::Payee, RecordType::EndOfPayer],
            Self::EndOfPayer(_) => {
                vec![RecordType::StateTotals, RecordType::Payer, RecordType::EndOfTransmission]
            }
            Self::End => Vec::new(),
        }
    }
}

/// Incremental document builder.
///
/// A rejected record leaves the assembler unchanged, so fail-soft callers
/// can report the error and keep pushing.
#[derive(Debug)]
pub struct Assembler {
    document: Document,
    state: State,
    /// A line was dropped since the last accepted record.
    gap: bool,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self { document: Document::default(), state: State::Start, gap: false }
    }

    /// Notes that an undecodable line was dropped before the next record.
    ///
    /// Until a record is accepted, the next record may stand where the
    /// dropped one was missing: a document without its transmitter, a group
    /// without its payer (a blank payer record takes its place) or a group
    /// without its end-of-payer record. A dropped end-of-transmission line
    /// does not end the input early.
    pub fn skip_line(&mut self) {
        self.gap = true;
    }

    /// Record types accepted next.
    #[must_use]
    pub fn expected(&self) -> Vec<RecordType> {
        self.state.expected()
    }

    /// Feeds the next record.
    ///
    /// # Errors
    ///
    /// [`IrsError::OrphanPayee`] for a payee before any payer,
    /// [`IrsError::UnexpectedRecordOrder`] for any other out-of-order record.
    pub fn push(&mut self, record: Record, line: usize) -> Result<()> {
        let found = record.record_type();
        let state = mem::replace(&mut self.state, State::Start);
        let (next, result) = self.transition(state, record, line);
        self.state = next;
        if result.is_ok() {
            self.gap = false;
            debug!(line, record_type = %found, "accepted record");
        }
        result
    }

    fn transition(&mut self, state: State, record: Record, line: usize) -> (State, Result<()>) {
        let gap = self.gap;
        match (state, record.record_type()) {
            (State::Start, RecordType::Transmitter) => {
                self.document.transmitter = Some(record);
                (State::Transmitter, Ok(()))
            }
            (State::Transmitter, RecordType::Payer) => (State::Payer(PayerGroup::new(record)), Ok(())),
            (State::Payer(mut group), RecordType::Payee) => {
                group.payees.push(record);
                (State::Payer(group), Ok(()))
            }
            (State::Payer(mut group), RecordType::EndOfPayer) => {
                group.end_of_payer = Some(record);
                (State::EndOfPayer(group), Ok(()))
            }
            (State::EndOfPayer(mut group), RecordType::StateTotals) => {
                group.state_totals.push(record);
                (State::EndOfPayer(group), Ok(()))
            }
            (State::EndOfPayer(group), RecordType::Payer) => {
                self.document.payers.push(group);
                (State::Payer(PayerGroup::new(record)), Ok(()))
            }
            (State::EndOfPayer(group), RecordType::EndOfTransmission) => {
                self.document.payers.push(group);
                self.document.end_of_transmission = Some(record);
                (State::End, Ok(()))
            }
            // === After a dropped line ===
            (State::Start, RecordType::Payer) if gap => (State::Payer(PayerGroup::new(record)), Ok(())),
            (State::Start | State::Transmitter, RecordType::Payee) if gap => {
                (State::Payer(PayerGroup::placeholder().with_payee(record)), Ok(()))
            }
            (State::Start | State::Transmitter, RecordType::EndOfPayer) if gap => {
                let mut group = PayerGroup::placeholder();
                group.end_of_payer = Some(record);
                (State::EndOfPayer(group), Ok(()))
            }
            (State::Payer(group), RecordType::Payer) if gap => {
                self.document.payers.push(group);
                (State::Payer(PayerGroup::new(record)), Ok(()))
            }
            (State::Payer(mut group), RecordType::StateTotals) if gap => {
                group.state_totals.push(record);
                (State::EndOfPayer(group), Ok(()))
            }
            (State::Payer(group), RecordType::EndOfTransmission) if gap => {
                self.document.payers.push(group);
                self.document.end_of_transmission = Some(record);
                (State::End, Ok(()))
            }
            (State::EndOfPayer(group), RecordType::Payee) if gap => {
                self.document.payers.push(group);
                (State::Payer(PayerGroup::placeholder().with_payee(record)), Ok(()))
            }
            (State::EndOfPayer(group), RecordType::EndOfPayer) if gap => {
                self.document.payers.push(group);
                let mut group = PayerGroup::placeholder();
                group.end_of_payer = Some(record);
                (State::EndOfPayer(group), Ok(()))
            }
            // === Rejections ===
            (state @ (State::Start | State::Transmitter), RecordType::Payee) => {
                (state, Err(IrsError::OrphanPayee { line }))
            }
            (state, found) => {
                let expected = state.expected();
                (state, Err(IrsError::UnexpectedRecordOrder { line, found, expected }))
            }
        }
    }

    /// Closes assembly and returns the document built so far.
    ///
    /// An unfinished payer group is kept in the document. The error is
    /// [`IrsError::UnexpectedEndOfInput`] when the input stopped before the
    /// end-of-transmission record, unless that record was the dropped line.
    #[must_use]
    pub fn finish(self) -> (Document, Option<IrsError>) {
        let Self { mut document, state, gap } = self;
        let expected = state.expected();
        let error = match state {
            State::End => None,
            State::EndOfPayer(group) if gap => {
                document.payers.push(group);
                None
            }
            State::Payer(group) | State::EndOfPayer(group) => {
                document.payers.push(group);
                Some(IrsError::UnexpectedEndOfInput { expected })
            }
            State::Start | State::Transmitter => Some(IrsError::UnexpectedEndOfInput { expected }),
        };
        (document, error)
    }
}

fn write_totals(target: &mut Record, payees: &[Record]) {
    target.put_number("number_of_payees", count(payees.len()));
    for (amount, total) in PAYMENT_AMOUNT_FIELDS.iter().zip(CONTROL_TOTAL_FIELDS) {
        target.put_number(total, sum_of(payees, amount));
    }
}

fn sum_of(records: &[Record], field: &str) -> i64 {
    records.iter().filter_map(|r| r.number(field)).fold(0, i64::saturating_add)
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn expect_type(record: &Record, expected: RecordType, role: &str) -> Result<()> {
    if record.record_type() == expected {
        Ok(())
    } else {
        Err(malformed(format!("{} record found where the {role} record belongs", record.record_type())))
    }
}

fn malformed(message: impl Into<String>) -> IrsError {
    IrsError::MalformedDocument(message.into())
}
