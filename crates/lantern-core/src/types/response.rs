//! Responses produced by plugins and handed back to the host.

use bytes::Bytes;
use serde_json::Value;

use crate::error::AppError;

/// A ready-made response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// `content-type` header value.
    pub content_type: String,
    /// Extra headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Creates a response with an explicit body and content type.
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `text/plain` response with status 200.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, "text/plain; charset=utf-8", body.into())
    }

    /// `text/html` response with status 200.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, "text/html; charset=utf-8", body.into())
    }

    /// `application/json` response with status 200.
    pub fn json(value: &Value) -> Self {
        Self::new(200, "application/json", value.to_string())
    }

    /// Replaces the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text_body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Generic failure response for an error that reached the top level.
    ///
    /// Server-side failures never include the error message, so internal
    /// detail does not leak to untrusted callers.
    pub fn from_error(err: &AppError) -> Self {
        let status = err.status_code();
        let message = if status >= 500 {
            "Internal server error".to_string()
        } else {
            err.message.clone()
        };
        Self::json(&serde_json::json!({
            "ok": false,
            "status": status,
            "error": message,
        }))
        .with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_hides_internal_detail() {
        let err = AppError::plugin("secret stack detail");
        let resp = Response::from_error(&err);
        assert_eq!(resp.status, 500);
        assert!(!resp.text_body().contains("secret"));
    }

    #[test]
    fn test_from_error_keeps_client_message() {
        let resp = Response::from_error(&AppError::not_found("Table not found"));
        assert_eq!(resp.status, 404);
        assert!(resp.text_body().contains("Table not found"));
    }

    #[test]
    fn test_headers() {
        let resp = Response::text("hi").with_header("X-Three", "1");
        assert_eq!(resp.header("x-three"), Some("1"));
        assert_eq!(resp.text_body(), "hi");
    }
}
