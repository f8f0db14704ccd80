//! Rules that relate records to each other.

use super::{DocumentView, Finding, Located};
use crate::layout::{AMOUNT_CODES, CONTROL_TOTAL_FIELDS, PAYMENT_AMOUNT_FIELDS, RECORD_SEQUENCE_NUMBER};

pub(super) fn structure(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    const RULE: &str = "structure";

    if view.transmitter.is_none() {
        out.push(Finding::error(0, None, RULE, "file has no transmitter (T) record"));
    }
    if view.payers.is_empty() {
        out.push(Finding::error(0, None, RULE, "file has no payer (A) record"));
    }
    for group in &view.payers {
        if group.payees.is_empty() {
            out.push(Finding::error(group.payer.index, None, RULE, "payer has no payee (B) records"));
        }
        if group.end_of_payer.is_none() {
            out.push(Finding::error(group.payer.index, None, RULE, "payer has no end of payer (C) record"));
        }
    }
    if view.end_of_transmission.is_none() {
        out.push(Finding::error(view.records.len(), None, RULE, "file has no end of transmission (F) record"));
    }
}

pub(super) fn payee_counts(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    const RULE: &str = "payee-count";

    let mut total = 0;
    for group in &view.payers {
        let actual = count(group.payees.len());
        total += actual;
        if let Some(end) = &group.end_of_payer {
            compare(end, "number_of_payees", actual, RULE, out);
        }
    }

    if let Some(transmitter) = &view.transmitter {
        compare(transmitter, "total_number_of_payees", total, RULE, out);
    }
    if let Some(end) = &view.end_of_transmission {
        compare(end, "total_number_of_payees", total, RULE, out);
        compare(end, "number_of_a_records", count(view.payers.len()), RULE, out);
    }
}

pub(super) fn control_totals(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    const RULE: &str = "control-total";

    for group in &view.payers {
        if let Some(end) = &group.end_of_payer {
            compare_totals(end, &group.payees, RULE, out);
        }
        for state in &group.state_totals {
            let code = state.record.text("combined_federal_state_code");
            let matching: Vec<_> = group
                .payees
                .iter()
                .filter(|payee| code.is_some() && payee.record.text("combined_federal_state_code") == code)
                .copied()
                .collect();
            compare(state, "number_of_payees", count(matching.len()), RULE, out);
            compare_totals(state, &matching, RULE, out);
            compare(state, "state_income_tax_withheld_total", sum(&matching, "state_income_tax_withheld"), RULE, out);
            compare(state, "local_income_tax_withheld_total", sum(&matching, "local_income_tax_withheld"), RULE, out);
        }
    }
}

/// Non-zero payee amounts must belong to a code the payer declared.
pub(super) fn amount_codes(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    for group in &view.payers {
        let Some(declared) = group.payer.record.text("amount_codes") else {
            continue;
        };
        for payee in &group.payees {
            for (code, field) in AMOUNT_CODES.iter().zip(PAYMENT_AMOUNT_FIELDS) {
                let amount = payee.record.number(field).unwrap_or(0);
                if amount != 0 && !declared.contains(*code) {
                    out.push(Finding::error(
                        payee.index,
                        Some(field),
                        "amount-codes",
                        format!("amount {amount} reported for code '{code}', which the payer does not declare"),
                    ));
                }
            }
        }
    }
}

/// Payer and payee years must match the transmitter's.
pub(super) fn payment_years(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    let Some(year) = view.transmitter.and_then(|t| t.record.number("payment_year")) else {
        return;
    };
    let records = view.payers.iter().flat_map(|group| std::iter::once(&group.payer).chain(&group.payees));
    for located in records {
        if let Some(other) = located.record.number("payment_year").filter(|other| *other != year) {
            out.push(Finding::error(
                located.index,
                Some("payment_year"),
                "payment-year",
                format!("payment year {other} differs from the transmitter's {year}"),
            ));
        }
    }
}

pub(super) fn sequence_numbers(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    for located in &view.records {
        let expected = count(located.index + 1);
        compare(located, RECORD_SEQUENCE_NUMBER, expected, "sequence-number", out);
    }
}

fn compare_totals(target: &Located<'_>, payees: &[Located<'_>], rule: &str, out: &mut Vec<Finding>) {
    for (amount, total) in PAYMENT_AMOUNT_FIELDS.iter().zip(CONTROL_TOTAL_FIELDS) {
        compare(target, total, sum(payees, amount), rule, out);
    }
}

fn compare(located: &Located<'_>, field: &str, expected: i64, rule: &str, out: &mut Vec<Finding>) {
    let declared = located.record.number(field).unwrap_or(0);
    if declared != expected {
        out.push(Finding::error(
            located.index,
            Some(field),
            rule,
            format!("declared {declared}, expected {expected}"),
        ));
    }
}

fn sum(records: &[Located<'_>], field: &str) -> i64 {
    records.iter().filter_map(|l| l.record.number(field)).fold(0, i64::saturating_add)
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{Document, PayerGroup},
        layout::RecordType,
        record::Record,
    };

    type Rule = fn(&DocumentView<'_>, &mut Vec<Finding>);

    fn run(rule: Rule, document: &Document) -> Vec<Finding> {
        let mut out = Vec::new();
        rule(&DocumentView::new(document), &mut out);
        out
    }

    fn payee(amount_1: i64) -> Record {
        Record::new(RecordType::Payee).with("payment_amount_1", amount_1).unwrap()
    }

    /// Two payers with refreshed derived fields.
    fn consistent() -> Document {
        let mut document = Document::new(Record::new(RecordType::Transmitter))
            .with_payer(PayerGroup::new(Record::new(RecordType::Payer)).with_payee(payee(10)).with_payee(payee(20)))
            .with_payer(PayerGroup::new(Record::new(RecordType::Payer)).with_payee(payee(5)));
        document.refresh_derived().unwrap();
        document
    }

    #[test]
    fn refreshed_document_is_consistent() {
        let document = consistent();
        let rules: [Rule; 4] = [structure, payee_counts, control_totals, sequence_numbers];
        for rule in rules {
            assert!(run(rule, &document).is_empty());
        }
    }

    // ==== Structure ====

    #[test]
    fn missing_parts_are_structural_errors() {
        let document = Document::new(Record::new(RecordType::Transmitter))
            .with_payer(PayerGroup::new(Record::new(RecordType::Payer)));
        let findings = run(structure, &document);
        let messages: Vec<_> = findings.iter().map(|f| (f.record_index, f.message.as_str())).collect();
        assert_eq!(
            messages,
            vec![
                (1, "payer has no payee (B) records"),
                (1, "payer has no end of payer (C) record"),
                (2, "file has no end of transmission (F) record"),
            ]
        );
    }

    #[test]
    fn empty_document_lacks_transmitter_and_payers() {
        let findings = run(structure, &Document::default());
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.rule == "structure"));
    }

    // ==== Counts and totals ====

    #[test]
    fn wrong_payer_count_is_reported_on_end_of_payer() {
        let mut document = consistent();
        document.payers[0].end_of_payer.as_mut().unwrap().set("number_of_payees", 3).unwrap();
        let findings = run(payee_counts, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record_index, 4);
        assert_eq!(findings[0].field.as_deref(), Some("number_of_payees"));
        assert_eq!(findings[0].message, "declared 3, expected 2");
    }

    #[test]
    fn wrong_totals_on_transmitter_and_terminator() {
        let mut document = consistent();
        document.transmitter.as_mut().unwrap().set("total_number_of_payees", 2).unwrap();
        document.end_of_transmission.as_mut().unwrap().set("number_of_a_records", 1).unwrap();
        let fields: Vec<_> =
            run(payee_counts, &document).into_iter().map(|f| (f.record_index, f.field.unwrap())).collect();
        assert_eq!(fields, vec![(0, "total_number_of_payees".to_string()), (8, "number_of_a_records".to_string())]);
    }

    #[test]
    fn control_total_mismatch() {
        let mut document = consistent();
        document.payers[1].payees[0].set("payment_amount_1", 6).unwrap();
        let findings = run(control_totals, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field.as_deref(), Some("control_total_1"));
        assert_eq!(findings[0].record_index, 7);
    }

    #[test]
    fn state_totals_are_checked_against_matching_payees() {
        let mut document = consistent();
        let group = &mut document.payers[0];
        group.payees[0].set("combined_federal_state_code", "25").unwrap();
        group.state_totals.push(
            Record::new(RecordType::StateTotals)
                .with("combined_federal_state_code", "25")
                .unwrap()
                .with("number_of_payees", 1)
                .unwrap()
                .with("control_total_1", 30)
                .unwrap(),
        );
        let findings = run(control_totals, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field.as_deref(), Some("control_total_1"));
        assert_eq!(findings[0].message, "declared 30, expected 10");
    }

    // ==== Amount codes and years ====

    #[test]
    fn undeclared_amount_code() {
        let mut document = consistent();
        document.payers[0].payer.set("amount_codes", "1").unwrap();
        document.payers[0].payees[1].set("payment_amount_a", 7).unwrap();
        let findings = run(amount_codes, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record_index, 3);
        assert_eq!(findings[0].field.as_deref(), Some("payment_amount_a"));
    }

    #[test]
    fn payee_year_must_match_transmitter() {
        let mut document = consistent();
        document.transmitter.as_mut().unwrap().set("payment_year", 2019).unwrap();
        for group in &mut document.payers {
            group.payer.set("payment_year", 2019).unwrap();
            for payee in &mut group.payees {
                payee.set("payment_year", 2019).unwrap();
            }
        }
        document.payers[1].payees[0].set("payment_year", 2018).unwrap();
        let findings = run(payment_years, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record_index, 6);
    }

    #[test]
    fn out_of_sequence_record() {
        let mut document = consistent();
        document.payers[0].payees[0].set(RECORD_SEQUENCE_NUMBER, 9).unwrap();
        let findings = run(sequence_numbers, &document);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].record_index, 2);
        assert_eq!(findings[0].message, "declared 9, expected 3");
    }
}
