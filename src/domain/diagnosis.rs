//! Diagnosis result types.
//!
//! Represents the scoring service's verdict exactly as returned. The client
//! never recomputes GFR, stage, or the TDF advisory.

use serde::{Deserialize, Serialize};

/// Traffic-light color of the TDF advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TdfColor {
    Red,
    Yellow,
    Green,
}

impl TdfColor {
    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Green => (16, 185, 129),  // Emerald (#10B981)
            Self::Yellow => (251, 191, 36), // Amber (#FBBF24)
            Self::Red => (244, 63, 94),     // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for TdfColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Yellow => write!(f, "yellow"),
            Self::Green => write!(f, "green"),
        }
    }
}

/// Tenofovir disoproxil (TDF) toxicity advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdfAdvisory {
    /// e.g. "SAFE", "CONTRAINDICATED"
    pub status: String,
    pub color: TdfColor,
    pub msg: String,
}

/// Display-ready outcome of one scoring request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// e.g. "CKD DETECTED" / "NO CKD DETECTED"
    pub prediction: String,
    /// Preformatted percentage, e.g. "87.3%"
    pub confidence: String,
    /// CKD stage label, e.g. "Stage 3a"
    pub stage: String,
    /// eGFR, preformatted
    pub gfr: String,
    pub tdf: TdfAdvisory,
}

impl DiagnosisResult {
    /// Whether the prediction is a negative finding.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        is_negative_label(&self.prediction)
    }
}

/// The scoring service phrases negative findings with "NO".
#[must_use]
pub fn is_negative_label(label: &str) -> bool {
    label.to_ascii_uppercase().contains("NO")
}
