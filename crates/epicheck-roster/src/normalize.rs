//! Scanned-identifier normalization.
//!
//! A scan may deliver a bare login, a full email, or a JSON payload (QR
//! codes on student cards embed a serialized object). Normalization
//! extracts both a bare-login candidate and the literal raw string; the
//! matcher tries both. Normalization never fails — worst case both
//! candidates are the trimmed input unchanged.

use serde_json::Value;

// ---------------------------------------------------------------------------
// NormalizedLogin
// ---------------------------------------------------------------------------

/// Candidate identifiers extracted from one raw scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLogin {
    /// The identifier as scanned (JSON payloads: the extracted email field),
    /// trimmed. Kept because the remote sometimes stores a full email in the
    /// login field.
    pub raw: String,
    /// The part before `@`, or the whole string when there is no `@`.
    pub bare: String,
}

impl NormalizedLogin {
    fn from_literal(s: &str) -> Self {
        let raw = s.trim().to_string();
        let bare = raw.split('@').next().unwrap_or(&raw).to_string();
        NormalizedLogin { raw, bare }
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Canonicalize a raw scanned string into comparable login candidates.
///
/// JSON-shaped input is parsed and an `email` field (case-insensitive key)
/// extracted; parse failure falls back to treating the input as a literal
/// login/email.
pub fn normalize(raw: &str) -> NormalizedLogin {
    let trimmed = raw.trim();

    if looks_like_json(trimmed) {
        if let Some(email) = extract_email_field(trimmed) {
            return NormalizedLogin::from_literal(&email);
        }
    }

    NormalizedLogin::from_literal(trimmed)
}

fn looks_like_json(s: &str) -> bool {
    s.starts_with('{')
}

/// Pull an `email`-named string field out of a JSON object payload.
///
/// Key comparison is case-insensitive so both `email` and `Email` (seen in
/// the wild on printed card payloads) are accepted.
fn extract_email_field(s: &str) -> Option<String> {
    let value: Value = serde_json::from_str(s).ok()?;
    let obj = value.as_object()?;
    obj.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("email"))
        .and_then(|(_, v)| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
