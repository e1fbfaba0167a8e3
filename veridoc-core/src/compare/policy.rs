//! Deterministic tolerance and normalization rules.
//!
//! These are the same rules the comparison prompt mandates for the
//! external service, implemented locally so they are testable and so
//! downstream code can re-check findings without another service call.
//!
//! Canonical monetary tolerance table: deviation <= 0.5% is info,
//! (0.5%, 2%] is warning, above 2% is critical.

use super::types::Severity;
use chrono::NaiveDate;

/// Relative deviation below which a monetary difference is noise.
pub const MONETARY_INFO_THRESHOLD: f64 = 0.005;
/// Relative deviation above which a monetary difference blocks approval.
pub const MONETARY_CRITICAL_THRESHOLD: f64 = 0.02;

/// Classifies a monetary deviation `|candidate - reference| / reference`.
pub fn monetary_severity(reference: f64, candidate: f64) -> Severity {
    if reference == 0.0 {
        return if candidate == 0.0 {
            Severity::Info
        } else {
            Severity::Critical
        };
    }
    let deviation = ((candidate - reference) / reference).abs();
    if deviation <= MONETARY_INFO_THRESHOLD {
        Severity::Info
    } else if deviation <= MONETARY_CRITICAL_THRESHOLD {
        Severity::Warning
    } else {
        Severity::Critical
    }
}

/// Normalizes a tax identifier to digits-only form.
///
/// Identifier fields must match exactly after normalization; any
/// mismatch is critical.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a monetary string into a canonical decimal value.
///
/// Accepts currency symbols and both separator conventions:
/// `R$ 2.335,87`, `2,335.87`, and `2335.87` all parse to `2335.87`.
pub fn normalize_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        // Both present: the later one is the decimal separator.
        (Some(dot), Some(comma)) => {
            if dot > comma {
                cleaned.replace(',', "")
            } else {
                cleaned.replace('.', "").replace(',', ".")
            }
        }
        // Comma only: decimal separator when followed by <= 2 digits,
        // thousands separator otherwise.
        (None, Some(comma)) => {
            let digits_after = cleaned.len() - comma - 1;
            if digits_after <= 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        _ => cleaned,
    };

    normalized.parse().ok()
}

/// Whether a candidate's issuance date violates the reference period.
///
/// The candidate must not be issued before the reference's coverage
/// period ends; a violation is critical. Dates are ISO (`YYYY-MM-DD`).
pub fn issued_before_period_end(issue_date: &str, period_end: &str) -> Option<bool> {
    let issued = NaiveDate::parse_from_str(issue_date.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(period_end.trim(), "%Y-%m-%d").ok()?;
    Some(issued < end)
}
