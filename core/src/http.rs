//! HTTP transport types shared by descriptors, clients and endpoint builders.
//!
//! # Design
//! Requests and responses are plain data. Endpoint builders produce
//! `HttpRequest` values, the interceptor hands them to an `HttpClient`, and
//! the resulting `HttpResponse` flows back into the caller's continuations.
//! Any status code is a valid `HttpResponse`; deciding whether a status is a
//! failure happens above the transport.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use tokio_util::sync::CancellationToken;

use crate::error::DescriptorError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DescriptorError::EmptyMethod);
        }
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(DescriptorError::UnknownMethod(s.to_string())),
        }
    }
}

/// Credentials attached to a request as an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Basic { username: String, password: String },
    Bearer(String),
}

impl AuthConfig {
    pub fn header_value(&self) -> String {
        match self {
            AuthConfig::Basic { username, password } => {
                let raw = format!("{username}:{password}");
                format!(
                    "Basic {}",
                    base64::engine::general_purpose::STANDARD.encode(raw)
                )
            }
            AuthConfig::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

// Credentials never end up in logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            AuthConfig::Bearer(_) => f.debug_tuple("Bearer").field(&"***").finish(),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `timeout` and `cancel` are per-call limits for the transport. The
/// interceptor fills them from the descriptor before sending.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub auth: Option<AuthConfig>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            auth: None,
            timeout: None,
            cancel: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Headers as sent on the wire, with `Authorization` derived from `auth`
    /// unless one was set explicitly.
    pub fn wire_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        let has_explicit = headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("authorization"));
        if let (Some(auth), false) = (&self.auth, has_explicit) {
            headers.push(("authorization".to_string(), auth.header_value()));
        }
        headers
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" Patch ".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    }

    #[test]
    fn empty_method_is_rejected() {
        let err = "  ".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, DescriptorError::EmptyMethod));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = "BREW".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, DescriptorError::UnknownMethod(m) if m == "BREW"));
    }

    #[test]
    fn basic_auth_is_base64_encoded() {
        let auth = AuthConfig::Basic {
            username: "admin".to_string(),
            password: "admin".to_string(),
        };
        assert_eq!(auth.header_value(), "Basic YWRtaW46YWRtaW4=");
    }

    #[test]
    fn auth_debug_hides_secrets() {
        let auth = AuthConfig::Bearer("secret-token".to_string());
        assert!(!format!("{auth:?}").contains("secret-token"));
    }

    #[test]
    fn wire_headers_add_authorization_once() {
        let mut req = HttpRequest::new(HttpMethod::Get, "http://localhost/scim2/Users");
        req.auth = Some(AuthConfig::Bearer("t".to_string()));
        assert_eq!(
            req.wire_headers(),
            vec![("authorization".to_string(), "Bearer t".to_string())]
        );

        req.headers
            .push(("Authorization".to_string(), "Custom x".to_string()));
        assert_eq!(req.wire_headers().len(), 1);
    }

    #[test]
    fn response_status_classes() {
        let ok = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(ok.is_success());
        let redirect = HttpResponse { status: 302, ..ok.clone() };
        assert!(!redirect.is_success());
    }
}
