//! Round-trip, consistency and fail-soft properties of the codec.

mod common;

use std::io::Write as _;

use irs_codec::{
    Format, LineEnding, RECORD_LENGTH, Record, RecordType, Severity, decode, encode, encode_with, from_portable,
    read_document, to_portable, validate,
};

// ==== Round trips ====

#[test]
fn positional_round_trip_is_identity() {
    for document in [common::minimal_valid(), common::two_payers()] {
        let decoded = decode(&encode(&document).unwrap());
        assert!(decoded.is_clean(), "{:?}", decoded.findings);
        assert_eq!(decoded.document, document);
    }
}

#[test]
fn portable_round_trip_is_identity() {
    let document = common::two_payers();
    assert_eq!(from_portable(&to_portable(&document)).unwrap(), document);

    let json = irs_codec::write(&document, Format::Json).unwrap();
    assert_eq!(irs_codec::read(&json, Format::Json).unwrap().document, document);
}

#[test]
fn numbers_given_for_text_fields_survive_both_round_trips() {
    let mut document = common::minimal_valid();
    document.payers[0].payees[0].set("payee_tin", 323_456_789).unwrap();

    assert_eq!(decode(&encode(&document).unwrap()).document, document);
    assert_eq!(from_portable(&to_portable(&document)).unwrap(), document);
}

#[test]
fn re_encoding_is_byte_identical() {
    let document = common::two_payers();
    let first = encode(&document).unwrap();
    assert_eq!(encode(&document).unwrap(), first);
    assert_eq!(encode(&decode(&first).document).unwrap(), first);
}

#[test]
fn crlf_file_decodes_to_the_same_document() {
    let document = common::minimal_valid();
    let decoded = decode(&encode_with(&document, LineEnding::CrLf).unwrap());
    assert!(decoded.is_clean());
    assert_eq!(decoded.document, document);
}

// ==== Counts ====

#[test]
fn declared_counts_match_assembled_groups() {
    let decoded = decode(&encode(&common::two_payers()).unwrap());
    let document = decoded.document;

    let mut declared_sum = 0;
    for group in &document.payers {
        let declared = group.end_of_payer.as_ref().and_then(|c| c.number("number_of_payees")).unwrap();
        assert_eq!(usize::try_from(declared).unwrap(), group.payees.len());
        declared_sum += declared;
    }
    let terminator = document.end_of_transmission.as_ref().unwrap();
    assert_eq!(terminator.number("total_number_of_payees"), Some(declared_sum));
}

#[test]
fn count_mismatch_is_reported() {
    let mut document = common::two_payers();
    document.payers[1].payees.pop();
    let findings = validate(&document);
    assert!(findings.iter().any(|f| f.rule == "payee-count"));

    // Encoding recomputes the counts
    let reencoded = decode(&encode(&document).unwrap()).document;
    assert!(!validate(&reencoded).iter().any(|f| f.rule == "payee-count"));
}

// ==== Fail-soft decoding ====

/// Encoded `two_payers` with line `index` cut one byte short.
fn with_short_line(index: usize) -> Vec<u8> {
    let encoded = encode(&common::two_payers()).unwrap();
    let mut lines: Vec<&[u8]> = encoded.split(|b| *b == b'\n').filter(|l| !l.is_empty()).collect();
    let line = lines[index];
    lines[index] = &line[..RECORD_LENGTH - 1];
    let mut damaged = lines.join(&b'\n');
    damaged.push(b'\n');
    damaged
}

#[test]
fn one_short_line_yields_one_finding() {
    let original: Vec<Record> = common::two_payers().records().cloned().collect();
    let blank_payer = Record::new(RecordType::Payer);

    // T A B B C A B C F: every position, including the structural records
    for index in 0..original.len() {
        let decoded = decode(&with_short_line(index));
        assert_eq!(decoded.findings.len(), 1, "line {index}: {:#?}", decoded.findings);
        assert_eq!(decoded.findings[0].rule, "record-length-mismatch");
        assert_eq!(decoded.findings[0].record_index, index);

        let mut expected = original.clone();
        expected.remove(index);
        let survivors: Vec<Record> =
            decoded.document.records().filter(|record| **record != blank_payer).cloned().collect();
        assert_eq!(survivors, expected, "line {index}");
    }
}

#[test]
fn short_payer_line_keeps_its_payees() {
    let decoded = decode(&with_short_line(1));
    let group = &decoded.document.payers[0];
    assert_eq!(group.payer, Record::new(RecordType::Payer));
    assert_eq!(group.payees.len(), 2);
    assert_eq!(decoded.document.payee_count(), 3);
}

#[test]
fn short_transmitter_line_keeps_the_payers() {
    let decoded = decode(&with_short_line(0));
    assert!(decoded.document.transmitter.is_none());
    assert_eq!(decoded.document.payers.len(), 2);
    assert!(decoded.document.end_of_transmission.is_some());
}

#[test]
fn unknown_record_type_does_not_stop_decoding() {
    let mut encoded = encode(&common::minimal_valid()).unwrap();
    // Second line is the payer record
    encoded[RECORD_LENGTH + 1] = b'X';
    let decoded = decode(&encoded);

    let rules: Vec<_> = decoded.findings.iter().map(|f| f.rule.as_str()).collect();
    assert_eq!(rules, vec!["unknown-record-type"]);
    assert!(decoded.document.transmitter.is_some());
    assert_eq!(decoded.document.payee_count(), 1);
    assert!(decoded.document.end_of_transmission.is_some());
}

#[test]
fn reads_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&encode(&common::two_payers()).unwrap()).unwrap();
    file.flush().unwrap();

    let decoded = read_document(std::fs::File::open(file.path()).unwrap()).unwrap();
    assert!(decoded.is_clean());
    assert_eq!(decoded.document, common::two_payers());
}

// ==== Validation scenarios ====

#[test]
fn validation_is_deterministic() {
    let mut document = common::two_payers();
    document.payers[0].payees[1].set("payee_tin", "000000000").unwrap();
    document.payers[0].payer.set("payer_state", "ZZ").unwrap();
    assert_eq!(validate(&document), validate(&document));
}

#[test]
fn minimal_valid_file_has_no_errors() {
    let decoded = decode(&encode(&common::minimal_valid()).unwrap());
    let findings = validate(&decoded.document);
    assert!(!findings.iter().any(|f| f.severity == Severity::Error), "{findings:#?}");
    let terminator = decoded.document.end_of_transmission.as_ref().unwrap();
    assert_eq!(terminator.number("total_number_of_payees"), Some(1));
}

#[test]
fn invalid_payment_yields_exactly_one_error() {
    let mut document = common::minimal_valid();
    document.payers[0].payees[0].set("payment_amount_1", -500).unwrap();
    document.refresh_derived().unwrap();

    let errors: Vec<_> = validate(&document).into_iter().filter(|f| f.severity == Severity::Error).collect();
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_eq!(errors[0].record_index, 2);
    assert_eq!(errors[0].field.as_deref(), Some("payment_amount_1"));
    assert_eq!(errors[0].rule, "numeric-range");

    // Conversion is independent of validation
    let encoded = encode(&document).unwrap();
    assert_eq!(decode(&encoded).document, document);
    assert_eq!(document.records().nth(2).map(|r| r.record_type()), Some(RecordType::Payee));
}
