//! The wire seam between `ApiClient` and the network.
//!
//! `ApiClient` builds a fully resolved `HttpRequest` (URL, headers, encoded
//! body) and hands it to a `Transport`. The production transport is backed by
//! `reqwest`; anything else that can move bytes (a test double, a proxy) can
//! implement the trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use super::request::{Method, MultipartForm, Part};

/// Transport-level failure: no HTTP response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Empty,
    Bytes(Vec<u8>),
    Multipart(MultipartForm),
}

/// A request with every header fixed at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

impl HttpRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn multipart(form: MultipartForm) -> Result<reqwest::multipart::Form, TransportError> {
        let mut out = reqwest::multipart::Form::new();
        for (name, part) in form.into_parts() {
            out = match part {
                Part::Text(value) => out.text(name, value),
                Part::File(file) => {
                    let part = reqwest::multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)?;
                    out.part(name, part)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            HttpBody::Empty => builder,
            HttpBody::Bytes(bytes) => builder.body(bytes),
            // reqwest sets multipart/form-data with its own boundary
            HttpBody::Multipart(form) => builder.multipart(Self::multipart(form)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: Method::Get,
            url: "https://api.example.test/".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: HttpBody::Empty,
        };
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(ReqwestTransport::method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(ReqwestTransport::method(Method::Delete), reqwest::Method::DELETE);
    }
}
