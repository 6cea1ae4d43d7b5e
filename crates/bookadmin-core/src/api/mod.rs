//! REST API client module for the booking platform admin backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! backend: request construction, bearer token handling, JSON and
//! multipart bodies, and a typed error for every way a call can fail.
//!
//! Every response uses the `{ success, message, data }` envelope. A 401
//! drops the token and emits `ClientEvent::SessionInvalidated`.

mod admin;
pub mod client;
pub mod envelope;
pub mod error;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, ClientEvent, DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};
pub use envelope::Envelope;
pub use error::ApiError;
pub use request::{FileUpload, Method, MultipartForm, Part, Request, RequestBody};
pub use transport::{HttpBody, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
