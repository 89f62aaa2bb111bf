//! Response sinks that rendered views are written into
//!
//! A [`ResponseSink`] receives the view's metadata followed by the body.
//! [`BufferedResponse`] is the sink the view middleware uses; it collects
//! everything in memory and then becomes an axum [`Response`].

mod charset;
mod cookie;

pub use charset::{Charset, TranscodingWriter};
pub use cookie::{Cookie, CookieBuilder, SameSite};

use std::io;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};

/// Destination for a rendered view
///
/// Metadata setters are applied before any body bytes are written, and stay
/// applied even if rendering fails afterwards.
pub trait ResponseSink {
    /// Set the response status
    fn set_status(&mut self, status: StatusCode);

    /// Set the content type, without charset
    fn set_content_type(&mut self, content_type: &str);

    /// Set the character encoding of the body
    fn set_character_encoding(&mut self, encoding: &str);

    /// Set a header, replacing any previous value
    fn set_header(&mut self, name: &str, value: &str);

    /// Attach a cookie
    fn add_cookie(&mut self, cookie: &Cookie);

    /// Writer for the response body
    fn writer(&mut self) -> &mut dyn io::Write;
}

/// In-memory response sink
///
/// # Examples
///
/// ```rust
/// use acton_views::{BufferedResponse, ResponseSink};
/// use axum::http::StatusCode;
/// use std::io::Write;
///
/// let mut response = BufferedResponse::new();
/// response.set_status(StatusCode::ACCEPTED);
/// response.set_content_type("text/plain");
/// response.writer().write_all(b"done").unwrap();
///
/// assert_eq!(response.content(), "done");
/// assert_eq!(response.content_type_header().as_deref(), Some("text/plain"));
/// ```
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: StatusCode,
    content_type: Option<String>,
    character_encoding: Option<String>,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// An empty `200 OK` response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Response status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type as set, without charset
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Character encoding as set
    #[must_use]
    pub fn character_encoding(&self) -> Option<&str> {
        self.character_encoding.as_deref()
    }

    /// The `Content-Type` header value this response will carry
    ///
    /// Combines the content type with the character encoding, for example
    /// `text/html; charset=UTF-8`.
    #[must_use]
    pub fn content_type_header(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?;
        Some(match &self.character_encoding {
            Some(encoding) => format!("{content_type}; charset={encoding}"),
            None => content_type.to_string(),
        })
    }

    /// Value of a header set through [`ResponseSink::set_header`]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Headers set through [`ResponseSink::set_header`]
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Cookies attached so far
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Raw body bytes
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    #[must_use]
    pub fn content(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
    }

    fn set_character_encoding(&mut self, encoding: &str) {
        self.character_encoding = Some(encoding.to_string());
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Skipping invalid response header"),
        }
    }

    fn add_cookie(&mut self, cookie: &Cookie) {
        self.cookies.push(cookie.clone());
    }

    fn writer(&mut self) -> &mut dyn io::Write {
        &mut self.body
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let content_type = self.content_type_header();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        *headers = self.headers;
        if let Some(content_type) = content_type {
            match HeaderValue::from_str(&content_type) {
                Ok(value) => {
                    headers.insert(CONTENT_TYPE, value);
                }
                Err(_) => tracing::warn!(%content_type, "Skipping invalid content type"),
            }
        }
        for cookie in &self.cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                headers.append(SET_COOKIE, value);
            } else {
                tracing::warn!(cookie = cookie.name(), "Skipping invalid cookie");
            }
        }

        response
    }
}
