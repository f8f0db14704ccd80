//! Business-rule validation.
//!
//! The validator never fails: it walks a [`Document`] and returns every
//! [`Finding`] it can produce, sorted by record index and field name.
//! Record indexes are zero-based positions in file order, counting only the
//! records present in the document.
//!
//! # Example
//!
//! ```
//! use irs_codec::{Document, PayerGroup, Record, RecordType};
//! use irs_codec::validation::{RuleCategory, Validator};
//!
//! let document = Document::new(Record::new(RecordType::Transmitter))
//!     .with_payer(PayerGroup::new(Record::new(RecordType::Payer)));
//!
//! let findings = Validator::default()
//!     .with_categories([RuleCategory::Structure])
//!     .validate(&document);
//! assert!(findings.iter().any(|f| f.rule == "structure"));
//! ```

mod cross;
mod field;
mod record;
mod tin;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use self::tin::{TinKind, tin_problem};
use crate::{
    document::Document,
    error::{IrsError, Result},
    record::Record,
};

/// Rule id of the finding produced for a category that is not implemented.
pub const RULE_NOT_AVAILABLE: &str = "rule-not-available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation or decode result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Zero-based position of the record in file order.
    pub record_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Stable kebab-case rule identifier.
    pub rule: String,
    pub message: String,
}

impl Finding {
    pub fn error(
        record_index: usize,
        field: Option<&str>,
        rule: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, record_index, field, rule, message)
    }

    pub fn warning(
        record_index: usize,
        field: Option<&str>,
        rule: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, record_index, field, rule, message)
    }

    fn new(
        severity: Severity,
        record_index: usize,
        field: Option<&str>,
        rule: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            record_index,
            field: field.map(str::to_owned),
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    /// Error finding describing a decode or assembly failure.
    #[must_use]
    pub fn from_error(record_index: usize, error: &IrsError) -> Self {
        Self::error(record_index, error.field(), error.rule_id(), error.to_string())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity} [{}] record {}", self.rule, self.record_index)?;
        if let Some(field) = &self.field {
            write!(f, " field '{field}'")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Group of related rules that can be switched on and off together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    RequiredFields,
    AllowedValues,
    NumericRange,
    FieldLengths,
    RecordConsistency,
    Structure,
    PayeeCounts,
    ControlTotals,
    AmountCodes,
    PaymentYears,
    SequenceNumbers,
    TaxpayerIdentifiers,
    NameControl,
    CombinedFederalState,
}

impl RuleCategory {
    pub const ALL: [Self; 14] = [
        Self::RequiredFields,
        Self::AllowedValues,
        Self::NumericRange,
        Self::FieldLengths,
        Self::RecordConsistency,
        Self::Structure,
        Self::PayeeCounts,
        Self::ControlTotals,
        Self::AmountCodes,
        Self::PaymentYears,
        Self::SequenceNumbers,
        Self::TaxpayerIdentifiers,
        Self::NameControl,
        Self::CombinedFederalState,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequiredFields => "required-fields",
            Self::AllowedValues => "allowed-values",
            Self::NumericRange => "numeric-range",
            Self::FieldLengths => "field-lengths",
            Self::RecordConsistency => "record-consistency",
            Self::Structure => "structure",
            Self::PayeeCounts => "payee-counts",
            Self::ControlTotals => "control-totals",
            Self::AmountCodes => "amount-codes",
            Self::PaymentYears => "payment-years",
            Self::SequenceNumbers => "sequence-numbers",
            Self::TaxpayerIdentifiers => "taxpayer-identifiers",
            Self::NameControl => "name-control",
            Self::CombinedFederalState => "combined-federal-state",
        }
    }

    /// Whether the engine has rules for this category.
    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::NameControl | Self::CombinedFederalState)
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown rule category '{s}'"))
    }
}

/// Configurable rule runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    categories: Vec<RuleCategory>,
}

impl Default for Validator {
    /// Every implemented category.
    fn default() -> Self {
        Self { categories: RuleCategory::ALL.into_iter().filter(|c| c.is_available()).collect() }
    }
}

impl Validator {
    /// Replaces the selected categories. Duplicates are ignored.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = RuleCategory>) -> Self {
        self.categories.clear();
        for category in categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        self
    }

    #[must_use]
    pub fn categories(&self) -> &[RuleCategory] {
        &self.categories
    }

    /// Runs the selected categories against `document`.
    #[must_use]
    pub fn validate(&self, document: &Document) -> Vec<Finding> {
        let view = DocumentView::new(document);
        let mut findings = Vec::new();

        for category in &self.categories {
            let out = &mut findings;
            match category {
                RuleCategory::RequiredFields => field::required_fields(&view, out),
                RuleCategory::AllowedValues => field::allowed_values(&view, out),
                RuleCategory::NumericRange => field::numeric_range(&view, out),
                RuleCategory::FieldLengths => field::field_lengths(&view, out),
                RuleCategory::RecordConsistency => record::consistency(&view, out),
                RuleCategory::Structure => cross::structure(&view, out),
                RuleCategory::PayeeCounts => cross::payee_counts(&view, out),
                RuleCategory::ControlTotals => cross::control_totals(&view, out),
                RuleCategory::AmountCodes => cross::amount_codes(&view, out),
                RuleCategory::PaymentYears => cross::payment_years(&view, out),
                RuleCategory::SequenceNumbers => cross::sequence_numbers(&view, out),
                RuleCategory::TaxpayerIdentifiers => tin::taxpayer_identifiers(&view, out),
                RuleCategory::NameControl | RuleCategory::CombinedFederalState => {
                    out.push(Finding::warning(
                        0,
                        None,
                        RULE_NOT_AVAILABLE,
                        format!("rule category '{category}' is not available"),
                    ));
                }
            }
        }

        findings.sort_by(|a, b| (a.record_index, &a.field).cmp(&(b.record_index, &b.field)));
        tracing::debug!(findings = findings.len(), "validated document");
        findings
    }
}

/// Runs every implemented rule category.
#[must_use]
pub fn validate(document: &Document) -> Vec<Finding> {
    Validator::default().validate(document)
}

/// Findings split by severity; the shape reported to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    pub fn from_findings(findings: impl IntoIterator<Item = Finding>) -> Self {
        let (errors, warnings) = findings.into_iter().partition(Finding::is_error);
        Self { errors, warnings }
    }

    /// True when there are no error findings.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`IrsError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A record together with its position in file order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Located<'a> {
    pub index: usize,
    pub record: &'a Record,
}

#[derive(Debug)]
pub(crate) struct GroupView<'a> {
    pub payer: Located<'a>,
    pub payees: Vec<Located<'a>>,
    pub end_of_payer: Option<Located<'a>>,
    pub state_totals: Vec<Located<'a>>,
}

/// Index-annotated mirror of a document.
#[derive(Debug)]
pub(crate) struct DocumentView<'a> {
    pub transmitter: Option<Located<'a>>,
    pub payers: Vec<GroupView<'a>>,
    pub end_of_transmission: Option<Located<'a>>,
    /// Every record in file order; `records[i].index == i`.
    pub records: Vec<Located<'a>>,
}

impl<'a> DocumentView<'a> {
    pub fn new(document: &'a Document) -> Self {
        let mut records = Vec::new();
        let mut locate = |record: &'a Record| {
            let located = Located { index: records.len(), record };
            records.push(located);
            located
        };

        let transmitter = document.transmitter.as_ref().map(&mut locate);
        let payers = document
            .payers
            .iter()
            .map(|group| GroupView {
                payer: locate(&group.payer),
                payees: group.payees.iter().map(&mut locate).collect(),
                end_of_payer: group.end_of_payer.as_ref().map(&mut locate),
                state_totals: group.state_totals.iter().map(&mut locate).collect(),
            })
            .collect();
        let end_of_transmission = document.end_of_transmission.as_ref().map(&mut locate);

        Self { transmitter, payers, end_of_transmission, records }
    }

    /// Payees of every group, in file order.
    pub fn payees(&self) -> impl Iterator<Item = &Located<'a>> {
        self.payers.iter().flat_map(|group| &group.payees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document::PayerGroup, layout::RecordType};

    fn document() -> Document {
        Document::new(Record::new(RecordType::Transmitter))
            .with_payer(PayerGroup::new(Record::new(RecordType::Payer)).with_payee(Record::new(RecordType::Payee)))
    }

    #[test]
    fn view_indexes_records_in_file_order() {
        let mut document = document();
        document.refresh_derived().unwrap();
        let view = DocumentView::new(&document);

        assert_eq!(view.records.len(), 5);
        assert!(view.records.iter().enumerate().all(|(i, located)| located.index == i));
        assert_eq!(view.payers[0].payer.index, 1);
        assert_eq!(view.payers[0].payees[0].index, 2);
        assert_eq!(view.payers[0].end_of_payer.map(|l| l.index), Some(3));
        assert_eq!(view.end_of_transmission.map(|l| l.index), Some(4));
        assert_eq!(view.payees().map(|l| l.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn findings_are_sorted_by_index_then_field() {
        let findings = validate(&document());
        let keys: Vec<_> = findings.iter().map(|f| (f.record_index, f.field.clone())).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn validation_is_deterministic() {
        let document = document();
        assert_eq!(validate(&document), validate(&document));
    }

    #[test]
    fn unavailable_category_reports_warning() {
        let findings = Validator::default().with_categories([RuleCategory::NameControl]).validate(&document());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].rule, RULE_NOT_AVAILABLE);
        assert_eq!(findings[0].record_index, 0);
        assert!(findings[0].field.is_none());
    }

    #[test]
    fn default_runs_available_categories_only() {
        let validator = Validator::default();
        assert!(validator.categories().iter().all(|c| c.is_available()));
        assert_eq!(validator.categories().len(), RuleCategory::ALL.len() - 2);
        assert!(!validate(&document()).iter().any(|f| f.rule == RULE_NOT_AVAILABLE));
    }

    #[test]
    fn with_categories_ignores_duplicates() {
        let validator = Validator::default()
            .with_categories([RuleCategory::Structure, RuleCategory::Structure, RuleCategory::AmountCodes]);
        assert_eq!(validator.categories(), &[RuleCategory::Structure, RuleCategory::AmountCodes]);
    }

    #[test]
    fn category_names_parse() {
        for category in RuleCategory::ALL {
            assert_eq!(category.as_str().parse::<RuleCategory>(), Ok(category));
        }
        assert!("spelling".parse::<RuleCategory>().is_err());
    }

    #[test]
    fn report_splits_by_severity() {
        let report = ValidationReport::from_findings([
            Finding::error(1, Some("payer_tin"), "taxpayer-id", "bad"),
            Finding::warning(2, None, "taxpayer-id", "blank"),
        ]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.is_valid());

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["errors"][0]["severity"], "error");
        assert_eq!(json["errors"][0]["record_index"], 1);
        assert_eq!(json["errors"][0]["field"], "payer_tin");
        assert!(json["warnings"][0].get("field").is_none());
    }

    #[test]
    fn finding_from_error_keeps_rule_and_field() {
        let error = IrsError::FieldFormat { field: "payment_year", message: "expected digits".to_string() };
        let finding = Finding::from_error(4, &error);
        assert_eq!(finding.rule, "field-format");
        assert_eq!(finding.field.as_deref(), Some("payment_year"));
        assert!(finding.to_string().starts_with("error [field-format] record 4 field 'payment_year'"));
    }
}
