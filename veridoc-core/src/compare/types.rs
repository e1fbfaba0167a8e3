//! Comparison result types and document kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity tier of one field-level finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Non-blocking observation.
    Info,
    /// Requires review.
    Warning,
    /// Blocks approval.
    Critical,
}

/// Deterministic aggregate of all field severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Approved,
    Warning,
    Rejected,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Warning => write!(f, "warning"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// One compared field between the reference and a candidate document.
///
/// The wire names (`piValue`, `documentValue`, `match`) are part of the
/// external service contract and load-bearing for re-aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: String,
    #[serde(rename = "piValue")]
    pub reference_value: String,
    #[serde(rename = "documentValue")]
    pub candidate_value: String,
    #[serde(rename = "match")]
    pub matched: bool,
    pub confidence: f32,
    pub severity: Severity,
    pub explanation: String,
}

/// The full result of comparing one candidate against the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub comparisons: Vec<FieldComparison>,
    #[serde(rename = "overallStatus")]
    pub overall_status: OverallStatus,
    pub summary: String,
}

impl AnalysisResult {
    /// Re-derives the aggregate status from the comparison list.
    ///
    /// Rejected if any comparison is critical, else warning if any is a
    /// warning, else approved. This local rule is authoritative; the
    /// external service's own claim is advisory only.
    pub fn derive_status(comparisons: &[FieldComparison]) -> OverallStatus {
        if comparisons
            .iter()
            .any(|c| c.severity == Severity::Critical)
        {
            OverallStatus::Rejected
        } else if comparisons.iter().any(|c| c.severity == Severity::Warning) {
            OverallStatus::Warning
        } else {
            OverallStatus::Approved
        }
    }

    /// Synthesizes a rejected result carrying exactly one critical
    /// finding. Used when the external service's response is unusable:
    /// an unparseable response must never pass as an approval.
    pub fn rejected(summary: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            comparisons: vec![FieldComparison {
                field: "analysis".to_string(),
                reference_value: String::new(),
                candidate_value: String::new(),
                matched: false,
                confidence: 1.0,
                severity: Severity::Critical,
                explanation: explanation.into(),
            }],
            overall_status: OverallStatus::Rejected,
            summary: summary.into(),
        }
    }
}

/// Closed set of candidate document kinds, each with the fields the
/// comparison request must extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Invoice,
    ComplianceDeclaration,
    BroadcastProof,
    MediaPlan,
}

impl DocumentKind {
    /// Fields the external service must extract and compare for this
    /// kind of candidate document.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Invoice => &[
                "supplier_legal_name",
                "supplier_tax_id",
                "total_amount",
                "issue_date",
                "reference_order_number",
                "standard_deduction_notice",
            ],
            Self::ComplianceDeclaration => &[
                "declarant_legal_name",
                "declarant_tax_id",
                "declared_amount",
                "issue_date",
                "reference_order_number",
            ],
            Self::BroadcastProof => &[
                "vehicle_name",
                "campaign_period",
                "insertion_count",
                "reference_order_number",
            ],
            Self::MediaPlan => &[
                "vehicle_name",
                "total_amount",
                "campaign_period",
                "placement_schedule",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::ComplianceDeclaration => "compliance-declaration",
            Self::BroadcastProof => "broadcast-proof",
            Self::MediaPlan => "media-plan",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
