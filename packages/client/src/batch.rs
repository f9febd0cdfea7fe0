//! Several API calls sent as one HTTP request.
//!
//! A [`Batch`] buffers [`BatchDescriptor`]s instead of performing I/O. When
//! executed, the descriptors go out as a JSON array in the `batch` form field
//! and the server answers with one `{code, headers, body}` entry per call,
//! each of which is normalized on its own.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::GraphClient;
use crate::error::{ApiError, Error};
use crate::normalize::normalize;
use crate::request::{encode_params, ApiRequest};
use crate::types::{is_truthy, HttpRequest, HttpResponse, Method, Params, Payload};

/// One buffered call, in the shape the batch endpoint expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDescriptor {
    pub method: Method,
    pub relative_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl BatchDescriptor {
    fn from_request(request: &ApiRequest) -> Self {
        let body = match (request.method, &request.post_args) {
            (Method::POST | Method::PUT, Some(post_args)) if !post_args.is_empty() => {
                Some(encode_params(post_args))
            }
            _ => None,
        };
        Self {
            method: request.method,
            relative_url: request.relative_url(),
            body,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    code: u16,
    #[serde(default)]
    headers: Option<Vec<BatchHeader>>,
    #[serde(default)]
    body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BatchHeader {
    name: String,
    value: String,
}

/// Outcome of one call in an executed batch.
pub type BatchResult = Result<Payload, ApiError>;

/// Calls collected for a single batch request.
///
/// Created by [`GraphClient::batch`]; consumed by [`Batch::execute`].
pub struct Batch<'a> {
    client: &'a GraphClient,
    requests: Vec<BatchDescriptor>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(client: &'a GraphClient) -> Self {
        Self {
            client,
            requests: Vec::new(),
        }
    }

    /// Buffer a call. Nothing is sent until [`Batch::execute`].
    ///
    /// File uploads cannot be batched.
    pub fn request(&mut self, request: ApiRequest) -> Result<(), Error> {
        if !request.files.is_empty() {
            return Err(Error::InvalidRequest {
                message: "file uploads are not supported in batch requests".to_string(),
            });
        }
        let request = request.with_credential(self.client.access_token());
        let descriptor = BatchDescriptor::from_request(&request);
        debug!(
            "Adding request ({}) to batch: {}",
            descriptor.method, descriptor.relative_url
        );
        self.requests.push(descriptor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn descriptors(&self) -> &[BatchDescriptor] {
        &self.requests
    }

    /// Send the buffered calls and split the reply back into one result per
    /// call, in the order they were added.
    ///
    /// The outer error covers the batch request itself; a failed call only
    /// shows up as an `Err` in its own position.
    pub fn execute(self) -> Result<Vec<BatchResult>, Error> {
        let mut form = Params::new();
        form.insert("batch".to_string(), serde_json::to_string(&self.requests)?);
        if let Some(token) = self.client.access_token() {
            form.insert("access_token".to_string(), token.to_string());
        }

        let url = self.client.base_url();
        debug!(
            "Batch request to {} with {} requests",
            url,
            self.requests.len()
        );
        let request = HttpRequest::post(url).with_form(form);
        let response = self
            .client
            .executor()
            .execute(&request)
            .map_err(|e| ApiError::new(e.to_string(), None))?;

        if !response.is_success() {
            return Err(submission_error(&response).into());
        }

        let items = match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Array(items)) => items,
            _ => {
                return Err(ApiError::new(
                    "Batch response was not a JSON array",
                    Some(response.status),
                )
                .into())
            }
        };

        Ok(items.into_iter().map(normalize_item).collect())
    }
}

fn submission_error(response: &HttpResponse) -> ApiError {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(body) if is_truthy(&body) => {
            let mut err = ApiError::from_result(body, None);
            err.status = Some(response.status);
            err
        }
        _ => ApiError::new(
            format!("Batch request failed with HTTP status {}", response.status),
            Some(response.status),
        ),
    }
}

fn normalize_item(item: Value) -> BatchResult {
    let item: BatchItem = serde_json::from_value(item)
        .map_err(|e| ApiError::new(format!("Malformed batch response entry: {}", e), None))?;

    let headers = item
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|header| (header.name.to_ascii_lowercase(), header.value))
        .collect();
    let body = match item.body {
        Some(Value::String(body)) => body.into_bytes(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => other.to_string().into_bytes(),
    };

    normalize(&HttpResponse {
        status: item.code,
        headers,
        body,
        url: None,
    })
}
