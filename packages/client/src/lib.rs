//! # graph-client
//!
//! Blocking client for the Graph API.
//!
//! Every call is described by an [`ApiRequest`] and goes through the same
//! pipeline: the session's access token is attached, the request is sent
//! through an [`HttpExecutor`], transient errors are retried according to
//! the [`RetryPolicy`], and the response is normalized into a [`Payload`] or
//! an [`ApiError`]. With paging enabled, continuation links are followed and
//! the pages merged into one result.
//!
//! ```ignore
//! use graph_client::{ApiRequest, ClientConfig, GraphClient};
//!
//! let graph = GraphClient::new(
//!     ClientConfig::default()
//!         .with_access_token(token)
//!         .with_retries(3, Duration::from_secs(1)),
//! )?;
//!
//! let me = graph.get_object("me")?;
//! let friends = graph.get_connections("me", "friends")?;
//! ```
//!
//! ## Batch requests
//!
//! Calls added to a [`Batch`] are sent together in one HTTP request and come
//! back as one result per call:
//!
//! ```ignore
//! let mut batch = graph.batch();
//! batch.request(ApiRequest::object("me"))?;
//! batch.request(ApiRequest::connections("me", "friends"))?;
//! for result in batch.execute()? {
//!     match result {
//!         Ok(payload) => println!("{:?}", payload),
//!         Err(e) => eprintln!("call failed: {}", e),
//!     }
//! }
//! ```

pub mod batch;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod request;
pub mod retry;
pub mod types;

mod client;
mod operations;
mod paging;

pub use batch::{Batch, BatchDescriptor, BatchResult};
pub use client::{ClientConfig, GraphClient, DEFAULT_BASE_URL};
pub use error::{ApiError, Error, ErrorCode, PartialPages, TRANSIENT_ERROR_CODE};
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use normalize::normalize;
pub use request::ApiRequest;
pub use retry::RetryPolicy;
pub use types::{FilePart, HttpRequest, HttpResponse, Method, Params, Payload};
