//! Masking fallbacks for viewers without RED clearance.
//!
//! Every redaction shape lives behind the single [`mask_value`] table so all
//! call sites agree on what a masked passport or salary looks like. Masking is
//! pure and irreversible; it is the policy-sanctioned degradation used when a
//! value must be shown but its content must not.

use serde::{Deserialize, Serialize};

/// The redaction shape to apply to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    /// Passport number: first 2 + stars + last 2, e.g. `C1****67`.
    Passport,
    /// 10-digit seafarer code: first 4 + `****` + last 2.
    SeamanCode,
    /// Generic document number: first 2 + stars + last 2.
    DocumentNumber,
    /// Salary / monetary amount: always fully redacted. Partial amounts are
    /// themselves sensitive, so nothing of the magnitude may survive.
    Currency,
    /// Medical result such as `FIT` / `UNFIT`: first + stars + last.
    MedicalResult,
    /// Free-text remarks: a short visible prefix, the rest starred.
    Remarks,
}

impl MaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskKind::Passport => "passport",
            MaskKind::SeamanCode => "seaman_code",
            MaskKind::DocumentNumber => "document_number",
            MaskKind::Currency => "currency",
            MaskKind::MedicalResult => "medical_result",
            MaskKind::Remarks => "remarks",
        }
    }
}

impl std::fmt::Display for MaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies the redaction shape for `kind` to `raw`.
///
/// Deterministic and char-based, so multi-byte input can never split a
/// codepoint or panic.
pub fn mask_value(kind: MaskKind, raw: &str) -> String {
    match kind {
        MaskKind::Passport => mask_edges(raw, 2, 2, "****"),
        MaskKind::SeamanCode => mask_seaman_code(raw),
        MaskKind::DocumentNumber => mask_document_number(raw),
        MaskKind::Currency => "****".to_string(),
        MaskKind::MedicalResult => mask_edges(raw, 1, 1, "***"),
        MaskKind::Remarks => mask_remarks(raw),
    }
}

/// Keeps `lead` chars at the front and `trail` at the back, starring the
/// middle. Values too short to keep anything hidden collapse to `fallback`.
fn mask_edges(raw: &str, lead: usize, trail: usize, fallback: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() <= lead + trail {
        return fallback.to_string();
    }

    let mut masked = String::with_capacity(chars.len());
    masked.extend(&chars[..lead]);
    masked.extend(std::iter::repeat('*').take(chars.len() - lead - trail));
    masked.extend(&chars[chars.len() - trail..]);
    masked
}

fn mask_seaman_code(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    // Seafarer codes are exactly 10 digits; anything else is fully redacted.
    if chars.len() != 10 {
        return "****".to_string();
    }

    let mut masked = String::with_capacity(10);
    masked.extend(&chars[..4]);
    masked.push_str("****");
    masked.extend(&chars[8..]);
    masked
}

fn mask_document_number(raw: &str) -> String {
    let normalized = raw.trim();
    let len = normalized.chars().count();
    if len == 0 {
        return "****".to_string();
    }
    if len <= 4 {
        return "*".repeat(len);
    }
    mask_edges(normalized, 2, 2, "****")
}

fn mask_remarks(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = raw.chars().collect();
    let visible = chars.len().min(10);
    let mut masked = String::with_capacity(chars.len());
    masked.extend(&chars[..visible]);
    masked.extend(std::iter::repeat('*').take(chars.len() - visible));
    masked
}
