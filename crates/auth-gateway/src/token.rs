//! Access token inspection.
//!
//! Tokens are three dot-separated segments; the middle one is a base64 JSON
//! object whose `exp` field holds the expiry in seconds since the epoch. The
//! signature is never checked here: the backend is the authority, this is
//! only used to decide whether the client still considers itself signed in.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Expiry of `token` in milliseconds since the epoch, or `None` when the
/// token is malformed or carries no numeric `exp`.
pub fn expiry_millis(token: &str) -> Option<f64> {
    let segment = token.split('.').nth(1)?;
    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_f64()?;

    let millis = exp * 1000.0;
    millis.is_finite().then_some(millis)
}

/// True iff the token decodes and its expiry is strictly after `now_millis`.
pub fn is_token_valid_at(token: &str, now_millis: i64) -> bool {
    expiry_millis(token).is_some_and(|expiry| expiry > now_millis as f64)
}

/// Masked version of a token for logs (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(8).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
pub(crate) fn make_token(exp: serde_json::Value) -> String {
    let header = URL_SAFE_LENIENT.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_LENIENT.encode(
        serde_json::json!({ "sub": "admin", "exp": exp })
            .to_string()
            .as_bytes(),
    );
    format!("{}.{}.signature", header, payload)
}
