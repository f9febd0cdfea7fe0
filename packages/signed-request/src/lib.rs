//! # graph-signed-request
//!
//! Verification of signed requests: compact `signature.payload` tokens where
//! both segments are base64url and the signature is HMAC-SHA256 over the
//! payload segment, keyed by the application secret.
//!
//! A valid token authenticates its claims without a round trip to the API:
//!
//! ```ignore
//! use graph_signed_request::parse_signed_request;
//!
//! if let Some(claims) = parse_signed_request(&cookie_value, app_secret) {
//!     let user_id = claims.get("user_id");
//! }
//! ```
//!
//! Rejection is an ordinary outcome, so [`parse_signed_request`] returns
//! `None` rather than an error. Use [`verify`] to learn why a token was
//! rejected.

mod error;
mod verify;

pub use error::InvalidToken;
pub use verify::{parse_signed_request, verify, Claims, SIGNATURE_ALGORITHM};
