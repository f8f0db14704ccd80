//! Conditional requirements inside a single record.

use super::{DocumentView, Finding, Located};
use crate::layout::{AMOUNT_CODES, RecordType, STATE_CODES};

const RULE: &str = "record-consistency";

const VENDOR_FIELDS: [&str; 5] = [
    "vendor_name",
    "vendor_mailing_address",
    "vendor_city",
    "vendor_contact_name",
    "vendor_contact_telephone_number",
];

/// Address fields checked per record type: (foreign indicator, state, ZIP).
const fn address_fields(record_type: RecordType) -> Option<(&'static str, &'static str, &'static str)> {
    match record_type {
        RecordType::Transmitter => Some(("foreign_entity_indicator", "company_state", "company_zip_code")),
        RecordType::Payer => Some(("foreign_entity_indicator", "payer_state", "payer_zip_code")),
        RecordType::Payee => Some(("foreign_country_indicator", "payee_state", "payee_zip_code")),
        RecordType::EndOfPayer | RecordType::StateTotals | RecordType::EndOfTransmission => None,
    }
}

pub(super) fn consistency(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    for located in &view.records {
        if let Some((foreign, state, zip)) = address_fields(located.record.record_type()) {
            check_address(located, foreign, state, zip, out);
        }
        match located.record.record_type() {
            RecordType::Transmitter => check_vendor(located, out),
            RecordType::Payer => check_amount_codes(located, out),
            _ => {}
        }
    }
}

fn check_address(located: &Located<'_>, foreign: &str, state: &'static str, zip: &'static str, out: &mut Vec<Finding>) {
    if located.record.text(foreign) == Some("1") {
        return;
    }
    let index = located.index;

    match located.record.text(state) {
        None => out.push(Finding::error(index, Some(state), RULE, "state is required for a domestic address")),
        Some(code) if !STATE_CODES.contains(&code) => {
            out.push(Finding::error(index, Some(state), RULE, format!("'{code}' is not a state code")));
        }
        Some(_) => {}
    }

    match located.record.text(zip) {
        None => out.push(Finding::error(index, Some(zip), RULE, "ZIP code is required for a domestic address")),
        Some(code) if !is_zip(code) => {
            out.push(Finding::error(index, Some(zip), RULE, format!("'{code}' is not a 5 or 9 digit ZIP code")));
        }
        Some(_) => {}
    }
}

fn is_zip(code: &str) -> bool {
    matches!(code.len(), 5 | 9) && code.bytes().all(|b| b.is_ascii_digit())
}

fn check_vendor(located: &Located<'_>, out: &mut Vec<Finding>) {
    let record = located.record;
    if record.text("vendor_indicator") != Some("V") {
        return;
    }
    for field in VENDOR_FIELDS {
        if record.get(field).is_none() {
            out.push(Finding::error(located.index, Some(field), RULE, "required when the vendor indicator is 'V'"));
        }
    }
    check_address(located, "vendor_foreign_entity_indicator", "vendor_state", "vendor_zip_code", out);
}

fn check_amount_codes(located: &Located<'_>, out: &mut Vec<Finding>) {
    let Some(codes) = located.record.text("amount_codes") else {
        return;
    };
    if let Some(problem) = amount_codes_problem(codes) {
        out.push(Finding::error(located.index, Some("amount_codes"), RULE, problem));
    }
}

/// Describes what is wrong with an amount code string, if anything.
fn amount_codes_problem(codes: &str) -> Option<String> {
    let mut last = None;
    for c in codes.chars() {
        let Some(position) = AMOUNT_CODES.iter().position(|code| *code == c) else {
            return Some(format!("'{c}' is not an amount code"));
        };
        match last {
            Some(previous) if previous == position => return Some(format!("amount code '{c}' is repeated")),
            Some(previous) if previous > position => return Some(format!("amount code '{c}' is out of order")),
            _ => last = Some(position),
        }
    }
    None
}
