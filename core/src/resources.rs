//! Endpoint builders and response parsers for console resources.
//!
//! # Design
//! `ResourceClient` holds only a base URL, parsed once on construction.
//! Every operation is split into a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming an `HttpResponse`. The built request is typically wrapped in a
//! `RequestDescriptor` whose continuations call the matching parser.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, DescriptorError};
use crate::http::{AuthConfig, HttpMethod, HttpRequest, HttpResponse};
use crate::types::ListResponse;

/// Resource families exposed by the identity server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Groups,
    Roles,
    Applications,
    IdentityProviders,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Users => "/scim2/Users",
            ResourceKind::Groups => "/scim2/Groups",
            ResourceKind::Roles => "/scim2/Roles",
            ResourceKind::Applications => "/api/server/v1/applications",
            ResourceKind::IdentityProviders => "/api/server/v1/identity-providers",
        }
    }

    /// Loader key used by descriptors that fetch this resource.
    pub fn dispatcher_key(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Groups => "groups",
            ResourceKind::Roles => "roles",
            ResourceKind::Applications => "applications",
            ResourceKind::IdentityProviders => "identity-providers",
        }
    }

    fn is_scim(&self) -> bool {
        matches!(
            self,
            ResourceKind::Users | ResourceKind::Groups | ResourceKind::Roles
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dispatcher_key())
    }
}

#[derive(Debug, Clone)]
pub struct ResourceClient {
    base: url::Url,
    base_url: String,
    auth: Option<AuthConfig>,
}

impl ResourceClient {
    /// Fails unless `base_url` is an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, DescriptorError> {
        let invalid = |reason: String| DescriptorError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = url::Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", base.scheme())));
        }
        Ok(Self {
            base_url: base.as_str().trim_end_matches('/').to_string(),
            base,
            auth: None,
        })
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn url(&self, kind: ResourceKind) -> String {
        format!("{}{}", self.base_url, kind.path())
    }

    pub fn item_url(&self, kind: ResourceKind, id: &str) -> String {
        format!("{}{}/{id}", self.base_url, kind.path())
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        let mut req = HttpRequest::new(method, url);
        req.auth = self.auth.clone();
        req
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        url: String,
        kind: ResourceKind,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let content_type = if kind.is_scim() {
            "application/scim+json"
        } else {
            "application/json"
        };
        let mut req = self.request(method, url);
        req.headers
            .push(("content-type".to_string(), content_type.to_string()));
        req.body = Some(body);
        Ok(req)
    }

    /// `filter` is passed through as the SCIM `filter` query parameter.
    pub fn build_list(&self, kind: ResourceKind, filter: Option<&str>) -> HttpRequest {
        let Some(filter) = filter else {
            return self.request(HttpMethod::Get, self.url(kind));
        };
        let mut url = self.base.clone();
        let path = format!("{}{}", self.base.path().trim_end_matches('/'), kind.path());
        url.set_path(&path);
        url.query_pairs_mut().append_pair("filter", filter);
        self.request(HttpMethod::Get, url.to_string())
    }

    pub fn build_get(&self, kind: ResourceKind, id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.item_url(kind, id))
    }

    pub fn build_create<T: Serialize>(
        &self,
        kind: ResourceKind,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.url(kind), kind, input)
    }

    pub fn build_update<T: Serialize>(
        &self,
        kind: ResourceKind,
        id: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, self.item_url(kind, id), kind, input)
    }

    pub fn build_patch<T: Serialize>(
        &self,
        kind: ResourceKind,
        id: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, self.item_url(kind, id), kind, input)
    }

    pub fn build_delete(&self, kind: ResourceKind, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.item_url(kind, id))
    }

    pub fn parse_list<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<ListResponse<T>, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_get<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_create<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response, 201)?;
        parse_body(&response)
    }

    pub fn parse_update<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}
