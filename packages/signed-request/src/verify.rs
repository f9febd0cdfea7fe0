use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::error::InvalidToken;

type HmacSha256 = Hmac<Sha256>;

/// The only signature algorithm accepted, compared ignoring ASCII case.
pub const SIGNATURE_ALGORITHM: &str = "HMAC-SHA256";

/// The decoded payload of a signed request: `algorithm` plus whatever claims
/// the issuer included (`user_id`, `code`, `issued_at`, ...).
pub type Claims = Map<String, Value>;

/// URL-safe alphabet; padding is accepted but not required.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Verify a `signature.payload` signed request against the shared secret and
/// return its claims.
///
/// The signature is HMAC-SHA256 over the payload segment exactly as it
/// appears in the token, i.e. the base64url text rather than the decoded
/// JSON. It is checked in constant time.
pub fn verify(signed_request: &str, secret: impl AsRef<[u8]>) -> Result<Claims, InvalidToken> {
    let (encoded_sig, payload) = signed_request
        .split_once('.')
        .ok_or(InvalidToken::MissingSeparator)?;

    let signature = decode_segment("signature", encoded_sig)?;
    let data = decode_segment("payload", payload)?;

    let claims = match serde_json::from_slice::<Value>(&data)? {
        Value::Object(claims) => claims,
        _ => return Err(InvalidToken::NotAnObject),
    };

    match claims.get("algorithm") {
        Some(Value::String(algorithm)) if algorithm.eq_ignore_ascii_case(SIGNATURE_ALGORITHM) => {}
        other => {
            return Err(InvalidToken::UnsupportedAlgorithm {
                algorithm: other.map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            })
        }
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_ref()).map_err(|_| InvalidToken::InvalidSecret)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| InvalidToken::SignatureMismatch)?;

    Ok(claims)
}

/// [`verify`] for callers that only care whether the request is valid.
pub fn parse_signed_request(signed_request: &str, secret: impl AsRef<[u8]>) -> Option<Claims> {
    verify(signed_request, secret).ok()
}

fn decode_segment(segment: &'static str, encoded: &str) -> Result<Vec<u8>, InvalidToken> {
    URL_SAFE_LENIENT
        .decode(encoded)
        .map_err(|source| InvalidToken::Encoding { segment, source })
}
