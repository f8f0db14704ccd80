//! Taxpayer identification number checks.
//!
//! The IRS publishes no check digit for TINs, so the rules are structural:
//! nine digits, no placeholder patterns, and the number ranges each kind of
//! identifier is issued from.

use super::{DocumentView, Finding, Located};

const RULE: &str = "taxpayer-id";

/// Kind of identifier, as declared by the payee's `type_of_tin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TinKind {
    /// Employer identification number (`1`).
    Ein,
    /// Social security number (`2`).
    Ssn,
    /// Individual taxpayer identification number (`3`).
    Itin,
    /// Adoption taxpayer identification number (`4`).
    Atin,
    /// Type not declared; only the common rules apply.
    Unknown,
}

impl TinKind {
    #[must_use]
    pub fn from_type_of_tin(code: Option<&str>) -> Self {
        match code {
            Some("1") => Self::Ein,
            Some("2") => Self::Ssn,
            Some("3") => Self::Itin,
            Some("4") => Self::Atin,
            _ => Self::Unknown,
        }
    }
}

/// EIN prefixes the IRS does not assign.
const INVALID_EIN_PREFIXES: [u32; 17] = [0, 7, 8, 9, 17, 18, 19, 28, 29, 49, 69, 70, 78, 79, 89, 96, 97];

/// Describes what is wrong with `tin` for the given kind, if anything.
///
/// # Examples
///
/// ```
/// use irs_codec::validation::{TinKind, tin_problem};
///
/// assert_eq!(tin_problem("323456789", TinKind::Ssn), None);
/// assert!(tin_problem("666123456", TinKind::Ssn).is_some());
/// assert!(tin_problem("07-1234567", TinKind::Ein).is_some());
/// ```
#[must_use]
pub fn tin_problem(tin: &str, kind: TinKind) -> Option<String> {
    if tin.len() != 9 || !tin.bytes().all(|b| b.is_ascii_digit()) {
        return Some(format!("'{tin}' is not 9 digits"));
    }
    if tin.bytes().all(|b| b == tin.as_bytes()[0]) || tin == "123456789" || tin == "987654321" {
        return Some(format!("'{tin}' is a placeholder number"));
    }

    let digits = |range: std::ops::Range<usize>| tin[range].parse::<u32>().unwrap_or(0);
    let (area, group, serial) = (digits(0..3), digits(3..5), digits(5..9));

    match kind {
        TinKind::Ein if INVALID_EIN_PREFIXES.contains(&digits(0..2)) => {
            Some(format!("EIN prefix {} is not assigned", &tin[..2]))
        }
        TinKind::Ssn if area == 0 || area == 666 || area >= 900 => {
            Some(format!("SSN area number {area:03} is not assigned"))
        }
        TinKind::Ssn if group == 0 => Some("SSN group number 00 is not assigned".to_string()),
        TinKind::Ssn if serial == 0 => Some("SSN serial number 0000 is not assigned".to_string()),
        TinKind::Itin if !tin.starts_with('9') || !is_itin_group(group) => {
            Some(format!("'{tin}' is outside the ITIN ranges"))
        }
        TinKind::Atin if !tin.starts_with('9') || group != 93 => Some(format!("'{tin}' is not an ATIN")),
        _ => None,
    }
}

fn is_itin_group(group: u32) -> bool {
    matches!(group, 50..=65 | 70..=88 | 90..=92 | 94..=99)
}

pub(super) fn taxpayer_identifiers(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    if let Some(transmitter) = &view.transmitter {
        check(transmitter, "transmitter_tin", TinKind::Ein, out);
    }
    for group in &view.payers {
        check(&group.payer, "payer_tin", TinKind::Ein, out);
    }
    for payee in view.payees() {
        if payee.record.get("payee_tin").is_none() {
            out.push(Finding::warning(payee.index, Some("payee_tin"), RULE, "payee TIN is blank"));
            continue;
        }
        let kind = TinKind::from_type_of_tin(payee.record.text("type_of_tin"));
        check(payee, "payee_tin", kind, out);
    }
}

/// Blank values are left to the required-field rule.
fn check(located: &Located<'_>, field: &str, kind: TinKind, out: &mut Vec<Finding>) {
    let Some(value) = located.record.get(field) else {
        return;
    };
    if let Some(problem) = tin_problem(&value.to_string(), kind) {
        out.push(Finding::error(located.index, Some(field), RULE, problem));
    }
}
