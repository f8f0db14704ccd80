//! Generated documents survive both external representations unchanged.

mod common;

use irs_codec::{Document, PayerGroup, Record, RecordType, decode, encode, from_json, to_json};
use proptest::prelude::*;

const AMOUNT: std::ops::RangeInclusive<i64> = -99_999_999_999..=99_999_999_999;

fn payee() -> impl Strategy<Value = Record> {
    (AMOUNT, 0..=99_999_999_999i64, "[A-Z][A-Z .&]{0,39}", "[0-9]{9}", prop::option::of("[0-9]{2}"))
        .prop_map(|(amount_1, amount_g, name, tin, state)| {
            let mut payee = common::payee(&name, amount_1);
            payee.set("payment_amount_g", amount_g).unwrap();
            payee.set("payee_tin", tin).unwrap();
            if let Some(code) = state {
                payee.set("combined_federal_state_code", code).unwrap();
            }
            payee
        })
}

fn group() -> impl Strategy<Value = PayerGroup> {
    ("[0-9]{9}", prop::collection::vec(payee(), 0..4), prop::option::of("[0-9]{2}")).prop_map(
        |(tin, payees, state)| {
            let mut group = PayerGroup::new(common::payer(&tin));
            group.payees = payees;
            if let Some(code) = state {
                let totals = Record::new(RecordType::StateTotals).with("combined_federal_state_code", code).unwrap();
                group.state_totals.push(totals);
            }
            group
        },
    )
}

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(group(), 1..4).prop_map(|payers| {
        let mut document = Document::new(common::transmitter());
        document.payers = payers;
        document.refresh_derived().unwrap();
        document
    })
}

proptest! {
    #[test]
    fn positional_round_trip(document in document()) {
        let encoded = encode(&document).unwrap();
        let decoded = decode(&encoded);
        prop_assert!(decoded.is_clean(), "{:?}", decoded.findings);
        prop_assert_eq!(&decoded.document, &document);
        prop_assert_eq!(encode(&decoded.document).unwrap(), encoded);
    }

    #[test]
    fn json_round_trip(document in document()) {
        let json = to_json(&document).unwrap();
        prop_assert_eq!(from_json(&json).unwrap(), document);
    }
}
