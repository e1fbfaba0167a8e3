//! Defensive parsing of the reasoning service's structured response.

use super::types::AnalysisResult;
use thiserror::Error;

/// Why a response was rejected as malformed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing required key: {0}")]
    MissingKey(&'static str),

    #[error("\"comparisons\" is not an array")]
    ComparisonsNotAnArray,
}

/// Parses a raw completion into an [`AnalysisResult`].
///
/// Strips incidental code-fence wrapping, then validates that
/// `comparisons` is present and is a list and that `overallStatus` and
/// `summary` are present before deserializing. Any failure means the
/// whole response is discarded by the caller - a partial accept is
/// never produced.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ParseError> {
    let body = strip_code_fences(raw);
    let value: serde_json::Value = serde_json::from_str(body)?;

    let object = value.as_object().ok_or(ParseError::NotAnObject)?;
    let comparisons = object
        .get("comparisons")
        .ok_or(ParseError::MissingKey("comparisons"))?;
    if !comparisons.is_array() {
        return Err(ParseError::ComparisonsNotAnArray);
    }
    if !object.contains_key("overallStatus") {
        return Err(ParseError::MissingKey("overallStatus"));
    }
    if !object.contains_key("summary") {
        return Err(ParseError::MissingKey("summary"));
    }

    Ok(serde_json::from_value(value)?)
}

/// Removes a wrapping Markdown code fence, with or without a language
/// tag. Anything else passes through untouched.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line, if any.
    match rest.split_once('\n') {
        Some((first_line, body)) if !first_line.trim().contains(char::is_whitespace) => body.trim(),
        _ => rest.trim(),
    }
}
