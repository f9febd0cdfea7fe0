/// Why a signed request was rejected.
#[derive(thiserror::Error, Debug)]
pub enum InvalidToken {
    #[error("signed request has no '.' separator")]
    MissingSeparator,

    #[error("{segment} segment is not valid base64url: {source}")]
    Encoding {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("unsupported signature algorithm: {}", .algorithm.as_deref().unwrap_or("<missing>"))]
    UnsupportedAlgorithm { algorithm: Option<String> },

    #[error("secret cannot be used as an HMAC key")]
    InvalidSecret,

    #[error("signature does not match payload")]
    SignatureMismatch,
}
