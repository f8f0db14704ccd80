//! End-to-end tests for the `irs-converter` binary.
//!
//! Fixtures live in `fixtures/`:
//! - `one_payee.json`: a valid submission with one payer and one payee;
//! - `invalid_payment.json`: the same submission with a negative payment
//!   amount, which the publication does not allow on `payment_amount_1`.
//!
//! Positional files are produced from these fixtures inside the tests.

use std::path::PathBuf;

/// Directory holding the fixture files.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Path to the fixture named `name`.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}
