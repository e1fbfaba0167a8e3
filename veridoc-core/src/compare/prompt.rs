//! Structured comparison request construction.

use super::types::DocumentKind;

/// System instructions for the comparison call.
///
/// Enumerates the exact fields required for the candidate's kind, the
/// normalization rules, the severity policy, and the response schema.
/// The policy is mandated identically regardless of which reasoning
/// service executes the extraction.
pub fn system_instructions(kind: DocumentKind) -> String {
    let fields = kind
        .required_fields()
        .iter()
        .map(|field| format!("- {field}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a document verification assistant. Compare a candidate document of kind "{kind}" against the reference order document.

Extract and compare exactly these fields:
{fields}

Normalization rules, applied before any comparison:
- Monetary values: canonical decimal form with a dot separator (e.g. 2335.87).
- Tax identifiers: digits only, strip punctuation.
- Dates: ISO form YYYY-MM-DD.

Severity policy (mandatory):
- Monetary fields, relative deviation |candidate - reference| / reference: at most 0.5% is "info"; above 0.5% up to 2% is "warning"; above 2% is "critical".
- Identifier fields (tax id, legal name): any mismatch after normalization is "critical".
- The candidate must textually reference the reference document's order number: absence is "critical"; presence without the expected standard-deduction notice is "warning".
- The candidate's issuance date must not precede the end of the reference's coverage period: a violation is "critical".

Respond with JSON only, no prose, exactly this shape:
{{
  "comparisons": [
    {{
      "field": "<field name>",
      "piValue": "<normalized reference value>",
      "documentValue": "<normalized candidate value>",
      "match": true,
      "confidence": 0.0,
      "severity": "info" | "warning" | "critical",
      "explanation": "<one sentence>"
    }}
  ],
  "overallStatus": "approved" | "warning" | "rejected",
  "summary": "<one paragraph>"
}}"#
    )
}

/// User content for a text candidate.
pub fn user_content(reference_text: &str, candidate_text: &str) -> String {
    format!(
        "REFERENCE DOCUMENT:\n{reference_text}\n\nCANDIDATE DOCUMENT:\n{candidate_text}"
    )
}

/// User content when the candidate is an attached image.
pub fn user_content_for_image(reference_text: &str) -> String {
    format!(
        "REFERENCE DOCUMENT:\n{reference_text}\n\nThe candidate document is the attached image. Read it and compare."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_enumerate_required_fields() {
        let instructions = system_instructions(DocumentKind::Invoice);
        for field in DocumentKind::Invoice.required_fields() {
            assert!(instructions.contains(field), "missing field {field}");
        }
        assert!(instructions.contains("\"invoice\""));
    }

    #[test]
    fn instructions_carry_the_tolerance_table() {
        let instructions = system_instructions(DocumentKind::MediaPlan);
        assert!(instructions.contains("0.5%"));
        assert!(instructions.contains("2%"));
    }

    #[test]
    fn user_content_includes_both_documents() {
        let content = user_content("ref text", "candidate text");
        assert!(content.contains("ref text"));
        assert!(content.contains("candidate text"));
    }
}
