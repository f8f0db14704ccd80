//! Rules that look at one field at a time.

use super::{DocumentView, Finding};
use crate::field::{FieldSpec, Value, encode_field};

fn each_field<'a>(view: &DocumentView<'a>, mut check: impl FnMut(usize, &'static FieldSpec, Option<&'a Value>)) {
    for located in &view.records {
        for spec in located.record.layout().data_fields() {
            check(located.index, spec, located.record.get(spec.name));
        }
    }
}

pub(super) fn required_fields(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    each_field(view, |index, spec, value| {
        if spec.required && value.is_none() {
            out.push(Finding::error(
                index,
                Some(spec.name),
                "required-field",
                format!("'{}' is required", spec.name),
            ));
        }
    });
}

pub(super) fn allowed_values(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    each_field(view, |index, spec, value| {
        let (Some(allowed), Some(value)) = (spec.allowed, value) else {
            return;
        };
        let value = value.to_string();
        if !allowed.contains(&value.as_str()) {
            out.push(Finding::error(
                index,
                Some(spec.name),
                "allowed-value",
                format!("'{value}' is not one of {}", allowed.join(", ")),
            ));
        }
    });
}

pub(super) fn numeric_range(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    each_field(view, |index, spec, value| {
        let (Some((min, max)), Some(n)) = (spec.range, value.and_then(Value::as_number)) else {
            return;
        };
        if !(min..=max).contains(&n) {
            out.push(Finding::error(
                index,
                Some(spec.name),
                "numeric-range",
                format!("{n} is outside {min}..={max}"),
            ));
        }
    });
}

/// Values that could not be written into their columns.
pub(super) fn field_lengths(view: &DocumentView<'_>, out: &mut Vec<Finding>) {
    each_field(view, |index, spec, value| {
        if let Err(e) = encode_field(value, spec) {
            out.push(Finding::error(index, Some(spec.name), "field-length", e.to_string()));
        }
    });
}
