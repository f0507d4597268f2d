//! Shared validation helpers for request schemas

use chrono::NaiveDate;
use validator::{Validate, ValidationErrors};

use crate::error::FieldErrors;

/// Date format used on the wire (`24-12-1798`)
pub const WIRE_DATE_FORMAT: &str = "%d-%m-%Y";

/// A wire payload that validates into a typed record
pub trait Schema: Sized {
    type Output;

    /// Validate every field, reporting all violations at once
    fn into_valid(self) -> Result<Self::Output, FieldErrors>;
}

/// Run the derived field rules and collect their messages per field
pub fn field_errors<T: Validate>(payload: &T) -> FieldErrors {
    match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => collect(&errors),
    }
}

fn collect(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", e.code))
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

pub fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Parse a `DD-MM-YYYY` date
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT).ok()
}

/// Serde adapter rendering dates as `DD-MM-YYYY`
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    use super::WIRE_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(WIRE_DATE_FORMAT))
    }
}
