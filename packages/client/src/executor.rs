//! HTTP execution abstraction for testing.
//!
//! The client talks to the network only through [`HttpExecutor`], so the
//! retry, paging and batch logic can be exercised against scripted responses.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Implementations return the raw response for any status code; only
/// failures to get a response at all are errors.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create a new executor. The timeout applies to each call separately;
    /// `None` disables it.
    pub fn new(timeout: Option<Duration>) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();
        let mut req_builder = self.client.request(method, &request.url);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if !request.files.is_empty() {
            let mut form = Form::new();
            for (name, value) in request.form.iter().flatten() {
                form = form.text(name.clone(), value.clone());
            }
            for file in &request.files {
                let mut part = Part::bytes(file.data.clone());
                if let Some(file_name) = &file.file_name {
                    part = part.file_name(file_name.clone());
                }
                if let Some(mime_type) = &file.mime_type {
                    part = part.mime_str(mime_type)?;
                }
                form = form.part(file.field.clone(), part);
            }
            req_builder = req_builder.multipart(form);
        } else if let Some(form) = &request.form {
            req_builder = req_builder.form(form);
        }

        let response = req_builder.send()?;

        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        let body = response.bytes()?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
            url: Some(url),
        })
    }
}
