//! # Response Assembly
//!
//! Successful reads produce a fully buffered body; the response carries its
//! exact byte length.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Content type of every successful read
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Buffered gateway response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// 200 with a markup body
    pub fn xml(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: XML_CONTENT_TYPE,
            body: body.into(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let headers = [
            (header::CONTENT_TYPE, HeaderValue::from_static(self.content_type)),
            (header::CONTENT_LENGTH, HeaderValue::from(self.content_length())),
        ];
        (self.status, headers, self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers() {
        let response = GatewayResponse::xml("<a>é</a>").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XML_CONTENT_TYPE);
        // Length counts bytes, not characters.
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "9");
    }
}
