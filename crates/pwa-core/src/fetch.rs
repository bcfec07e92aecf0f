//! Platform-neutral request and response model.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub use http::Method;

use crate::network::NetworkError;

/// Content type of synthesized HTML documents.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type of JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Same-origin only.
    SameOrigin,
    /// No CORS.
    NoCors,
    /// CORS.
    #[default]
    Cors,
    /// Full-document navigation.
    Navigate,
}

/// What the response will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDestination {
    /// Unknown (fetch/XHR).
    #[default]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Audio,
    Video,
    Worker,
}

impl RequestDestination {
    /// Parse the platform's destination string. Unknown values map to `Empty`.
    pub fn from_platform(value: &str) -> Self {
        match value {
            "document" => Self::Document,
            "script" => Self::Script,
            "style" => Self::Style,
            "image" => Self::Image,
            "font" => Self::Font,
            "manifest" => Self::Manifest,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "worker" => Self::Worker,
            _ => Self::Empty,
        }
    }

    /// Scripts and stylesheets.
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Script | Self::Style)
    }
}

/// Response tainting as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response with CORS headers.
    Cors,
    /// Synthesized locally.
    Default,
    /// Network error.
    Error,
    /// Cross-origin no-cors response with hidden body and status.
    Opaque,
    /// Manual redirect.
    #[serde(rename = "opaqueredirect")]
    OpaqueRedirect,
}

impl ResponseType {
    /// Parse the platform's response type string.
    pub fn from_platform(value: &str) -> Self {
        match value {
            "basic" => Self::Basic,
            "cors" => Self::Cors,
            "error" => Self::Error,
            "opaque" => Self::Opaque,
            "opaqueredirect" => Self::OpaqueRedirect,
            _ => Self::Default,
        }
    }
}

/// An outbound or intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request mode.
    pub mode: RequestMode,
    /// Request destination.
    pub destination: RequestDestination,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Create a request with the given method.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            destination: RequestDestination::default(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a full-document navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(RequestDestination::Document)
    }

    /// Create a POST request carrying a JSON body.
    pub fn post_json<T: Serialize>(url: Url, body: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(Self::new(Method::POST, url)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(bytes))
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the request destination.
    pub fn with_destination(mut self, destination: RequestDestination) -> Self {
        self.destination = destination;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// URL path component.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Whether this is a full-document navigation.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response produced by the network, the cache, or synthesized locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response tainting.
    pub response_type: ResponseType,
    /// Final URL, if known.
    pub url: Option<Url>,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a same-origin response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            response_type: ResponseType::Basic,
            url: None,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a locally synthesized HTML response.
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::new(status, body.into().into_bytes());
        response.response_type = ResponseType::Default;
        response
            .headers
            .insert("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string());
        response
    }

    /// Create an opaque cross-origin response (status 0, empty body).
    pub fn opaque() -> Self {
        Self {
            status: 0,
            response_type: ResponseType::Opaque,
            url: None,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Set the response type.
    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Set the final URL.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, NetworkError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| NetworkError::Decode(format!("invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        serde_json::from_slice(&self.body).map_err(|e| NetworkError::Decode(e.to_string()))
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, NetworkError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NetworkError::Http {
                status: self.status,
                url: self.url.as_ref().map(|u| u.to_string()).unwrap_or_default(),
            })
        }
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
