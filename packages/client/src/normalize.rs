//! Turning raw responses into [`Payload`]s or [`ApiError`]s.
//!
//! Bodies are tried as JSON, then as an image, then as a URL-encoded
//! access-token reply. The first interpretation that fits wins.

use serde_json::{json, Map, Value};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::types::{is_truthy, HttpResponse, Payload};

const UNPARSEABLE_BODY: &str = "Body was not JSON, image, or querystring";

/// Classify a response as a result or an API error.
pub fn normalize(response: &HttpResponse) -> Result<Payload, ApiError> {
    let status = response.status;
    let payload =
        parse_body(response).ok_or_else(|| ApiError::new(UNPARSEABLE_BODY, Some(status)))?;

    if status >= 400 {
        return Err(match payload {
            Payload::Json(result) if is_truthy(&result) => {
                ApiError::from_result(result, Some(status))
            }
            Payload::Binary { mime_type, url, .. } => {
                ApiError::from_result(json!({"mime-type": mime_type, "url": url}), Some(status))
            }
            Payload::Json(_) => ApiError::new(
                format!(
                    "Received status_code {} but body type could not be determined",
                    status
                ),
                Some(status),
            ),
        });
    }

    if let Payload::Json(result) = &payload {
        if result.get("error").is_some_and(is_truthy) {
            return Err(ApiError::from_result(result.clone(), Some(status)));
        }
    }

    Ok(payload)
}

fn parse_body(response: &HttpResponse) -> Option<Payload> {
    parse_json(&response.body)
        .or_else(|| parse_image(response))
        .or_else(|| parse_access_token(&response.body))
}

fn parse_json(body: &[u8]) -> Option<Payload> {
    serde_json::from_slice::<Value>(body).ok().map(Payload::Json)
}

fn parse_image(response: &HttpResponse) -> Option<Payload> {
    let content_type = response.header("content-type")?;
    if !content_type.contains("image/") {
        return None;
    }
    Some(Payload::Binary {
        data: response.body.clone(),
        mime_type: content_type.to_string(),
        url: response.url.clone(),
    })
}

/// `access_token=...&expires=...` replies from the token endpoints.
fn parse_access_token(body: &[u8]) -> Option<Payload> {
    let mut access_token = None;
    let mut expires = None;
    for (key, value) in form_urlencoded::parse(body) {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "access_token" if access_token.is_none() => access_token = Some(value.into_owned()),
            "expires" if expires.is_none() => expires = Some(value.into_owned()),
            _ => {}
        }
    }

    let mut result = Map::new();
    result.insert("access_token".to_string(), Value::String(access_token?));
    if let Some(expires) = expires {
        result.insert("expires".to_string(), Value::String(expires));
    }
    Some(Payload::Json(Value::Object(result)))
}
