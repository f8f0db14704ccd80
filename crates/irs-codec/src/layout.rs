//! Record layouts of the IRS information-return file format.
//!
//! Each record type is described as data: a table of [`FieldSpec`]s keyed by
//! the one-byte type code in column 1. Every layout is exactly
//! [`RECORD_LENGTH`] bytes; columns follow IRS Publication 1220.
//!
//! | Code | Record |
//! |------|------------------------|
//! | `T`  | Transmitter            |
//! | `A`  | Payer                  |
//! | `B`  | Payee                  |
//! | `C`  | End of payer           |
//! | `K`  | State totals           |
//! | `F`  | End of transmission    |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldSpec;

/// Fixed length of every record, in bytes.
pub const RECORD_LENGTH: usize = 750;

/// Name of the sequence number field shared by all layouts.
pub const RECORD_SEQUENCE_NUMBER: &str = "record_sequence_number";

/// Amount codes in the order the publication sorts them.
pub const AMOUNT_CODES: [char; 16] =
    ['1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G'];

/// Payee amount fields, indexed like [`AMOUNT_CODES`].
pub const PAYMENT_AMOUNT_FIELDS: [&str; 16] = [
    "payment_amount_1",
    "payment_amount_2",
    "payment_amount_3",
    "payment_amount_4",
    "payment_amount_5",
    "payment_amount_6",
    "payment_amount_7",
    "payment_amount_8",
    "payment_amount_9",
    "payment_amount_a",
    "payment_amount_b",
    "payment_amount_c",
    "payment_amount_d",
    "payment_amount_e",
    "payment_amount_f",
    "payment_amount_g",
];

/// Control total fields of C and K records, indexed like [`AMOUNT_CODES`].
pub const CONTROL_TOTAL_FIELDS: [&str; 16] = [
    "control_total_1",
    "control_total_2",
    "control_total_3",
    "control_total_4",
    "control_total_5",
    "control_total_6",
    "control_total_7",
    "control_total_8",
    "control_total_9",
    "control_total_a",
    "control_total_b",
    "control_total_c",
    "control_total_d",
    "control_total_e",
    "control_total_f",
    "control_total_g",
];

/// Type of a record, identified by its leading code byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// `T`: identifies the entity submitting the file.
    Transmitter,
    /// `A`: one filer; owns the payee records that follow.
    Payer,
    /// `B`: one reportable payment.
    Payee,
    /// `C`: closes a payer group with counts and control totals.
    EndOfPayer,
    /// `K`: per-state totals for combined federal/state filing.
    StateTotals,
    /// `F`: closes the file with transmission-wide counts.
    EndOfTransmission,
}

impl RecordType {
    pub const ALL: [Self; 6] = [
        Self::Transmitter,
        Self::Payer,
        Self::Payee,
        Self::EndOfPayer,
        Self::StateTotals,
        Self::EndOfTransmission,
    ];

    /// Type code in column 1.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Transmitter => b'T',
            Self::Payer => b'A',
            Self::Payee => b'B',
            Self::EndOfPayer => b'C',
            Self::StateTotals => b'K',
            Self::EndOfTransmission => b'F',
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'T' => Some(Self::Transmitter),
            b'A' => Some(Self::Payer),
            b'B' => Some(Self::Payee),
            b'C' => Some(Self::EndOfPayer),
            b'K' => Some(Self::StateTotals),
            b'F' => Some(Self::EndOfTransmission),
            _ => None,
        }
    }

    /// Human-readable name, also used as the portable form's key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transmitter => "transmitter",
            Self::Payer => "payer",
            Self::Payee => "payee",
            Self::EndOfPayer => "end_of_payer",
            Self::StateTotals => "state_totals",
            Self::EndOfTransmission => "end_of_transmission",
        }
    }

    #[must_use]
    pub const fn layout(self) -> &'static RecordLayout {
        match self {
            Self::Transmitter => &TRANSMITTER,
            Self::Payer => &PAYER,
            Self::Payee => &PAYEE,
            Self::EndOfPayer => &END_OF_PAYER,
            Self::StateTotals => &STATE_TOTALS,
            Self::EndOfTransmission => &END_OF_TRANSMISSION,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", char::from(self.code()), self.as_str().replace('_', " "))
    }
}

/// Ordered field table of one record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub record_type: RecordType,
    pub fields: &'static [FieldSpec],
}

impl RecordLayout {
    /// Total width of the layout; equals [`RECORD_LENGTH`] for every table
    /// in this module.
    #[must_use]
    pub fn length(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }

    /// Looks up a non-filler field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| !f.is_filler() && f.name == name)
    }

    /// Fields that carry values, in column order.
    pub fn data_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| !f.is_filler())
    }
}

const YEAR_RANGE: (i64, i64) = (1990, 2099);
const AMOUNT_MAX: i64 = 99_999_999_999;

const INDICATOR_ONE: &[&str] = &["1"];

/// Type of return codes (Publication 1220, Part C).
pub const RETURN_TYPES: &[&str] = &[
    "BT", "3", "X", "2", "QT", "8", "4", "B", "5", "P", "1", "F", "6", "MC", "LS", "T", "A", "NE",
    "D", "7", "Q", "9", "S", "M", "SB", "N", "Z", "L", "V", "K", "W",
];

/// Two-letter codes accepted as a domestic state.
pub const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY", "AS", "FM", "GU", "MH", "MP", "PW", "PR", "VI", "AA", "AE", "AP",
];

pub static TRANSMITTER: RecordLayout = RecordLayout {
    record_type: RecordType::Transmitter,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'T'),
        FieldSpec::numeric("payment_year", 2, 4).required().range(YEAR_RANGE.0, YEAR_RANGE.1),
        FieldSpec::alpha("prior_year_data_indicator", 6, 1).allowed(&["P"]),
        FieldSpec::alpha("transmitter_tin", 7, 9).required(),
        FieldSpec::alpha("transmitter_control_code", 16, 5).required(),
        FieldSpec::blank(21, 7),
        FieldSpec::alpha("test_file_indicator", 28, 1).allowed(&["T"]),
        FieldSpec::alpha("foreign_entity_indicator", 29, 1).allowed(INDICATOR_ONE),
        FieldSpec::alpha("transmitter_name", 30, 40).required(),
        FieldSpec::alpha("transmitter_name_continuation", 70, 40),
        FieldSpec::alpha("company_name", 110, 40).required(),
        FieldSpec::alpha("company_name_continuation", 150, 40),
        FieldSpec::alpha("company_mailing_address", 190, 40).required(),
        FieldSpec::alpha("company_city", 230, 40).required(),
        FieldSpec::alpha("company_state", 270, 2),
        FieldSpec::alpha("company_zip_code", 272, 9),
        FieldSpec::blank(281, 15),
        FieldSpec::numeric("total_number_of_payees", 296, 8).derived(),
        FieldSpec::alpha("contact_name", 304, 40).required(),
        FieldSpec::alpha("contact_telephone_number", 344, 15).required(),
        FieldSpec::alpha("contact_email_address", 359, 50),
        FieldSpec::blank(409, 91),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 10),
        FieldSpec::alpha("vendor_indicator", 518, 1).required().allowed(&["V", "I"]),
        FieldSpec::alpha("vendor_name", 519, 40),
        FieldSpec::alpha("vendor_mailing_address", 559, 40),
        FieldSpec::alpha("vendor_city", 599, 40),
        FieldSpec::alpha("vendor_state", 639, 2),
        FieldSpec::alpha("vendor_zip_code", 641, 9),
        FieldSpec::alpha("vendor_contact_name", 650, 40),
        FieldSpec::alpha("vendor_contact_telephone_number", 690, 15),
        FieldSpec::blank(705, 35),
        FieldSpec::alpha("vendor_foreign_entity_indicator", 740, 1).allowed(INDICATOR_ONE),
        FieldSpec::blank(741, 10),
    ],
};

pub static PAYER: RecordLayout = RecordLayout {
    record_type: RecordType::Payer,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'A'),
        FieldSpec::numeric("payment_year", 2, 4).required().range(YEAR_RANGE.0, YEAR_RANGE.1),
        FieldSpec::alpha("combined_federal_state_filer", 6, 1).allowed(INDICATOR_ONE),
        FieldSpec::blank(7, 5),
        FieldSpec::alpha("payer_tin", 12, 9).required(),
        FieldSpec::alpha("payer_name_control", 21, 4),
        FieldSpec::alpha("last_filing_indicator", 25, 1).allowed(INDICATOR_ONE),
        FieldSpec::alpha("type_of_return", 26, 2).required().allowed(RETURN_TYPES),
        FieldSpec::alpha("amount_codes", 28, 16).required(),
        FieldSpec::blank(44, 8),
        FieldSpec::alpha("foreign_entity_indicator", 52, 1).allowed(INDICATOR_ONE),
        FieldSpec::alpha("first_payer_name_line", 53, 40).required(),
        FieldSpec::alpha("second_payer_name_line", 93, 40),
        FieldSpec::alpha("transfer_agent_indicator", 133, 1).required().allowed(&["0", "1"]),
        FieldSpec::alpha("payer_shipping_address", 134, 40).required(),
        FieldSpec::alpha("payer_city", 174, 40).required(),
        FieldSpec::alpha("payer_state", 214, 2),
        FieldSpec::alpha("payer_zip_code", 216, 9),
        FieldSpec::alpha("payer_telephone_number", 225, 15),
        FieldSpec::blank(240, 260),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 243),
    ],
};

pub static PAYEE: RecordLayout = RecordLayout {
    record_type: RecordType::Payee,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'B'),
        FieldSpec::numeric("payment_year", 2, 4).required().range(YEAR_RANGE.0, YEAR_RANGE.1),
        FieldSpec::alpha("corrected_return_indicator", 6, 1).allowed(&["G", "C"]),
        FieldSpec::alpha("name_control", 7, 4),
        FieldSpec::alpha("type_of_tin", 11, 1).allowed(&["1", "2", "3", "4"]),
        FieldSpec::alpha("payee_tin", 12, 9),
        FieldSpec::alpha("payer_account_number_for_payee", 21, 20),
        FieldSpec::alpha("payer_office_code", 41, 4),
        FieldSpec::blank(45, 10),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[0], 55, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[1], 67, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[2], 79, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[3], 91, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[4], 103, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[5], 115, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[6], 127, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[7], 139, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[8], 151, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[9], 163, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[10], 175, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[11], 187, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[12], 199, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[13], 211, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[14], 223, 12).range(0, AMOUNT_MAX),
        FieldSpec::signed(PAYMENT_AMOUNT_FIELDS[15], 235, 12).range(0, AMOUNT_MAX),
        FieldSpec::alpha("foreign_country_indicator", 247, 1).allowed(INDICATOR_ONE),
        FieldSpec::alpha("first_payee_name_line", 248, 40).required(),
        FieldSpec::alpha("second_payee_name_line", 288, 40),
        FieldSpec::blank(328, 40),
        FieldSpec::alpha("payee_mailing_address", 368, 40).required(),
        FieldSpec::blank(408, 40),
        FieldSpec::alpha("payee_city", 448, 40).required(),
        FieldSpec::alpha("payee_state", 488, 2),
        FieldSpec::alpha("payee_zip_code", 490, 9),
        FieldSpec::blank(499, 1),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 36),
        FieldSpec::alpha("second_tin_notice", 544, 1).allowed(&["2"]),
        FieldSpec::blank(545, 2),
        FieldSpec::alpha("direct_sales_indicator", 547, 1).allowed(INDICATOR_ONE),
        FieldSpec::alpha("fatca_filing_requirement_indicator", 548, 1).allowed(INDICATOR_ONE),
        FieldSpec::blank(549, 114),
        FieldSpec::alpha("special_data_entries", 663, 60),
        FieldSpec::signed("state_income_tax_withheld", 723, 12),
        FieldSpec::signed("local_income_tax_withheld", 735, 12),
        FieldSpec::alpha("combined_federal_state_code", 747, 2),
        FieldSpec::blank(749, 2),
    ],
};

pub static END_OF_PAYER: RecordLayout = RecordLayout {
    record_type: RecordType::EndOfPayer,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'C'),
        FieldSpec::numeric("number_of_payees", 2, 8).derived(),
        FieldSpec::blank(10, 6),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[0], 16, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[1], 34, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[2], 52, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[3], 70, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[4], 88, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[5], 106, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[6], 124, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[7], 142, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[8], 160, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[9], 178, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[10], 196, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[11], 214, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[12], 232, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[13], 250, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[14], 268, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[15], 286, 18).derived(),
        FieldSpec::blank(304, 196),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 243),
    ],
};

pub static STATE_TOTALS: RecordLayout = RecordLayout {
    record_type: RecordType::StateTotals,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'K'),
        FieldSpec::numeric("number_of_payees", 2, 8).derived(),
        FieldSpec::blank(10, 6),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[0], 16, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[1], 34, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[2], 52, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[3], 70, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[4], 88, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[5], 106, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[6], 124, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[7], 142, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[8], 160, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[9], 178, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[10], 196, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[11], 214, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[12], 232, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[13], 250, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[14], 268, 18).derived(),
        FieldSpec::signed(CONTROL_TOTAL_FIELDS[15], 286, 18).derived(),
        FieldSpec::blank(304, 196),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 199),
        FieldSpec::signed("state_income_tax_withheld_total", 707, 18).derived(),
        FieldSpec::signed("local_income_tax_withheld_total", 725, 18).derived(),
        FieldSpec::blank(743, 4),
        FieldSpec::alpha("combined_federal_state_code", 747, 2).required(),
        FieldSpec::blank(749, 2),
    ],
};

pub static END_OF_TRANSMISSION: RecordLayout = RecordLayout {
    record_type: RecordType::EndOfTransmission,
    fields: &[
        FieldSpec::fill("record_type", 1, 1, b'F'),
        FieldSpec::numeric("number_of_a_records", 2, 8).derived(),
        FieldSpec::fill("zero", 10, 21, b'0'),
        FieldSpec::blank(31, 19),
        FieldSpec::numeric("total_number_of_payees", 50, 8).derived(),
        FieldSpec::blank(58, 442),
        FieldSpec::numeric(RECORD_SEQUENCE_NUMBER, 500, 8).derived(),
        FieldSpec::blank(508, 243),
    ],
};
