//! Documents shared by the integration tests.

#![allow(dead_code)]

use irs_codec::{Document, PayerGroup, Record, RecordType};

fn record(record_type: RecordType, fields: &[(&str, &str)]) -> Record {
    let mut record = Record::new(record_type);
    for (name, value) in fields {
        record.set(name, *value).unwrap();
    }
    record
}

pub fn transmitter() -> Record {
    let mut record = record(
        RecordType::Transmitter,
        &[
            ("transmitter_tin", "131052134"),
            ("transmitter_control_code", "A1B2C"),
            ("transmitter_name", "ACME PAYROLL SERVICES"),
            ("company_name", "ACME PAYROLL SERVICES"),
            ("company_mailing_address", "100 MAIN ST"),
            ("company_city", "ALBANY"),
            ("company_state", "NY"),
            ("company_zip_code", "12207"),
            ("contact_name", "JANE SMITH"),
            ("contact_telephone_number", "5185550100"),
            ("vendor_indicator", "I"),
        ],
    );
    record.set("payment_year", 2019).unwrap();
    record
}

pub fn payer(tin: &str) -> Record {
    let mut record = record(
        RecordType::Payer,
        &[
            ("payer_tin", tin),
            ("type_of_return", "A"),
            ("amount_codes", "1"),
            ("first_payer_name_line", "WIDGET CORP"),
            ("transfer_agent_indicator", "0"),
            ("payer_shipping_address", "200 OAK AVE"),
            ("payer_city", "AUSTIN"),
            ("payer_state", "TX"),
            ("payer_zip_code", "73301"),
        ],
    );
    record.set("payment_year", 2019).unwrap();
    record
}

pub fn payee(name: &str, amount: i64) -> Record {
    let mut record = record(
        RecordType::Payee,
        &[
            ("type_of_tin", "2"),
            ("payee_tin", "323456789"),
            ("first_payee_name_line", name),
            ("payee_mailing_address", "300 PINE RD"),
            ("payee_city", "DENVER"),
            ("payee_state", "CO"),
            ("payee_zip_code", "80202"),
        ],
    );
    record.set("payment_year", 2019).unwrap();
    record.set("payment_amount_1", amount).unwrap();
    record
}

/// One transmitter, one payer, one payee; every derived field filled in.
pub fn minimal_valid() -> Document {
    let mut document = Document::new(transmitter())
        .with_payer(PayerGroup::new(payer("261234567")).with_payee(payee("JOHN DOE", 50_000)));
    document.refresh_derived().unwrap();
    document
}

/// Two payers with three payees in total.
pub fn two_payers() -> Document {
    let mut document = Document::new(transmitter())
        .with_payer(
            PayerGroup::new(payer("261234567"))
                .with_payee(payee("JOHN DOE", 50_000))
                .with_payee(payee("MARY ROE", 1_250)),
        )
        .with_payer(PayerGroup::new(payer("381234567")).with_payee(payee("RICHARD MILES", 99_00)));
    document.refresh_derived().unwrap();
    document
}
