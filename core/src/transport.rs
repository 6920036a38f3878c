// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request executor
//!
//! [`Transport::send`] is the only path by which the engine talks to the
//! remote service. For every call it:
//!
//! 1. picks the scheme (never weaker than the scheme of the base URL),
//! 2. joins the relative path onto the base,
//! 3. layers default, per-call and global headers,
//! 4. attaches authentication, logging in first if a session is needed,
//! 5. classifies the status and decodes the body,
//! 6. filters a single property or follows `Members@odata.nextLink`.

use crate::context::ConnectionContext;
use crate::error::Error;
use crate::http::default_headers;
use crate::http::merge_headers;
use crate::http::HttpClient;
use crate::http::HttpRequest;
use crate::http::HttpResponse;
use crate::http::RequestAuth;
use crate::http::TransportFailure;
use crate::odata::ODataETag;
use crate::odata::MEMBERS;
use crate::odata::MEMBERS_NEXT_LINK;
use crate::scheme::select_scheme;
use crate::scheme::ApiClass;
use crate::scheme::AuthMode;
use crate::scheme::Scheme;
use http::header;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing::warn;
use url::Url;

/// Maximum number of `Members@odata.nextLink` pages followed after the
/// first one.
pub const MAX_NEXT_LINKS: usize = 10;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body (204, HEAD, or empty 200/201).
    Empty,
    Json(JsonValue),
    /// Raw text, e.g. the XML `$metadata` document.
    Text(String),
}

/// Result of one successful call.
#[derive(Debug, Clone)]
pub struct Response {
    /// URL the response came from. Later calls use it as their base.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Response {
    /// Header value as string.
    #[must_use]
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `ETag` header, verbatim.
    #[must_use]
    pub fn etag(&self) -> Option<ODataETag> {
        self.header(header::ETAG).map(|v| ODataETag::from(v.to_string()))
    }

    /// JSON body if the body is JSON.
    #[must_use]
    pub const fn json(&self) -> Option<&JsonValue> {
        match &self.body {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    /// JSON body, or an error naming this resource.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON.
    pub fn require_json(&self) -> Result<&JsonValue, Error> {
        self.json().ok_or_else(|| Error::UnexpectedBody {
            resource: self.url.path().to_string(),
            expected: "a JSON body",
        })
    }

    /// Consume the response and return its JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON.
    pub fn into_json(self) -> Result<JsonValue, Error> {
        match self.body {
            Body::Json(v) => Ok(v),
            _ => Err(Error::UnexpectedBody {
                resource: self.url.path().to_string(),
                expected: "a JSON body",
            }),
        }
    }
}

/// One outbound call.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) api: ApiClass,
    pub(crate) method: Method,
    pub(crate) base: Option<Url>,
    pub(crate) path: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<String>,
    pub(crate) property: Option<String>,
    pub(crate) json: bool,
}

impl Request {
    #[must_use]
    pub fn new(api: ApiClass, method: Method) -> Self {
        Self {
            api,
            method,
            base: None,
            path: None,
            headers: HeaderMap::new(),
            body: None,
            property: None,
            json: true,
        }
    }

    #[must_use]
    pub fn get(api: ApiClass) -> Self {
        Self::new(api, Method::GET)
    }

    /// Base URL. Defaults to the negotiated service root URI.
    #[must_use]
    pub fn base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    /// Path resolved against the base with relative-URL rules.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Per-call header, overriding the method defaults.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn json_body(mut self, body: &JsonValue) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Keep only `property` of a GET response.
    #[must_use]
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Return the body as raw text instead of parsing JSON.
    #[must_use]
    pub const fn raw_text(mut self) -> Self {
        self.json = false;
        self
    }
}

/// Transport bound to a connection context.
pub struct Transport<C: HttpClient> {
    pub(crate) client: C,
    pub(crate) ctx: ConnectionContext,
}

impl<C: HttpClient> Transport<C> {
    pub const fn new(client: C, ctx: ConnectionContext) -> Self {
        Self { client, ctx }
    }

    #[must_use]
    pub const fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Service root URI, negotiating on first use.
    ///
    /// # Errors
    ///
    /// Returns error if negotiation fails.
    pub async fn root_uri(&mut self) -> Result<Url, Error> {
        if self.ctx.root().is_none() {
            self.negotiate(false).await?;
        }
        self.ctx
            .root()
            .map(|r| r.root_uri.clone())
            .ok_or(Error::SessionState("service root not negotiated"))
    }

    /// Send a request.
    ///
    /// With auth mode `Session` and no cached token, an authenticated call
    /// logs in first; the token is then reused for every later call.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, error status, undecodable body,
    /// missing property, or failed login.
    pub async fn send(&mut self, mut request: Request) -> Result<Response, Error> {
        if request.base.is_none() {
            request.base = Some(self.root_uri().await?);
        }
        let auth = self.request_auth(request.api).await?;
        self.execute(request, auth).await
    }

    async fn request_auth(&mut self, api: ApiClass) -> Result<RequestAuth, Error> {
        if !api.is_authenticated() {
            return Ok(RequestAuth::None);
        }
        match self.ctx.auth {
            AuthMode::None => Ok(RequestAuth::None),
            AuthMode::Basic => Ok(RequestAuth::Basic(self.ctx.credentials.clone())),
            AuthMode::Session => {
                if self.ctx.session().token().is_none() {
                    self.login(true).await?;
                }
                self.ctx
                    .session()
                    .token()
                    .map(|t| RequestAuth::Token(t.to_string()))
                    .ok_or(Error::SessionState("no session token after login"))
            }
        }
    }

    /// Effective URL of a request: scheme never weaker than the base,
    /// relative path joined onto the base.
    pub(crate) fn request_url(&self, request: &Request) -> Result<Url, Error> {
        let mut base = match &request.base {
            Some(base) => base.clone(),
            None => self.ctx.host_url(Scheme::Http)?,
        };
        let wanted = select_scheme(self.ctx.secure, request.api, self.ctx.auth);
        let scheme = wanted.max(Scheme::of(&base));
        set_scheme(&mut base, scheme)?;
        let mut url = match &request.path {
            Some(path) => base
                .join(path)
                .map_err(|e| Error::InvalidUrl(path.clone(), e))?,
            None => base,
        };
        if Scheme::of(&url) < scheme {
            set_scheme(&mut url, scheme)?;
        }
        Ok(url)
    }

    /// Build the wire request: defaults, per-call overrides, then `-H`.
    pub(crate) fn prepare(
        &self,
        request: &Request,
        url: Url,
        auth: RequestAuth,
    ) -> HttpRequest {
        let mut headers = default_headers(&request.method);
        merge_headers(&mut headers, &request.headers);
        merge_headers(&mut headers, &self.ctx.extra_headers);
        HttpRequest {
            method: request.method.clone(),
            url,
            headers,
            auth,
            body: request.body.clone(),
            timeout: self.ctx.timeout,
            connect_timeout: None,
        }
    }

    pub(crate) async fn wire(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(%method, %url, "send");
        let response = self.client.send(request).await.map_err(|e| {
            Error::Transport {
                method: method.clone(),
                url: url.clone(),
                kind: e.failure(),
                source: Box::new(e),
            }
        })?;
        debug!(%method, %url, status = response.status.as_u16(), "receive");
        Ok(response)
    }

    /// Send without resolving authentication. Login, logout, version
    /// discovery and service-root reads go through here directly.
    pub(crate) async fn execute(
        &self,
        request: Request,
        auth: RequestAuth,
    ) -> Result<Response, Error> {
        let url = self.request_url(&request)?;
        let page_base = url.clone();
        let response = self
            .wire(self.prepare(&request, url, auth.clone()))
            .await?;
        let first = classify(&request, response)?;

        let Body::Json(first_body) = &first.body else {
            return Ok(first);
        };
        if request.method == Method::GET {
            if let Some(property) = &request.property {
                return filter_property(first, property);
            }
        }
        let Some(mut next) = next_link(first_body) else {
            return Ok(first);
        };

        let mut merged = first;
        let mut pages = 0;
        loop {
            if pages == MAX_NEXT_LINKS {
                warn!(
                    url = %merged.url,
                    pages = MAX_NEXT_LINKS + 1,
                    "collection truncated: too many next links"
                );
                if let Body::Json(JsonValue::Object(map)) = &mut merged.body {
                    map.insert(MEMBERS_NEXT_LINK.into(), JsonValue::String(next));
                }
                break;
            }
            pages += 1;
            let page_request = Request {
                base: Some(page_base.clone()),
                path: Some(next.clone()),
                body: None,
                ..request.clone()
            };
            let page_url = self.request_url(&page_request)?;
            let response = self
                .wire(self.prepare(&page_request, page_url, auth.clone()))
                .await?;
            let page = classify(&page_request, response)?;
            let page_body = page.require_json()?;
            append_members(&mut merged, page_body)?;
            match next_link(page_body) {
                Some(link) => next = link,
                None => {
                    if let Body::Json(JsonValue::Object(map)) = &mut merged.body {
                        map.remove(MEMBERS_NEXT_LINK);
                    }
                    break;
                }
            }
        }
        Ok(merged)
    }
}

fn set_scheme(url: &mut Url, scheme: Scheme) -> Result<(), Error> {
    if Scheme::of(url) == scheme {
        return Ok(());
    }
    url.set_scheme(scheme.as_str())
        .map_err(|()| Error::Unsupported(format!("cannot use {scheme} for {url}")))
}

fn next_link(body: &JsonValue) -> Option<String> {
    body.get(MEMBERS_NEXT_LINK)
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
}

fn append_members(merged: &mut Response, page: &JsonValue) -> Result<(), Error> {
    let resource = merged.url.path().to_string();
    let more = page
        .get(MEMBERS)
        .and_then(JsonValue::as_array)
        .cloned()
        .ok_or_else(|| Error::NoMembers {
            resource: resource.clone(),
        })?;
    let members = match &mut merged.body {
        Body::Json(JsonValue::Object(map)) => map
            .entry(MEMBERS)
            .or_insert_with(|| JsonValue::Array(Vec::new())),
        _ => {
            return Err(Error::UnexpectedBody {
                resource,
                expected: "a collection",
            })
        }
    };
    match members {
        JsonValue::Array(members) => {
            members.extend(more);
            Ok(())
        }
        _ => Err(Error::UnexpectedBody {
            resource,
            expected: "a Members array",
        }),
    }
}

/// Keep only `property` of a JSON response.
///
/// # Errors
///
/// Returns error if the body is not JSON or lacks `property`.
pub fn filter_property(mut response: Response, property: &str) -> Result<Response, Error> {
    let value = response
        .json()
        .and_then(|v| v.get(property))
        .cloned()
        .ok_or_else(|| Error::MissingProperty {
            resource: response.url.path().to_string(),
            property: property.to_string(),
        })?;
    let mut map = JsonMap::new();
    map.insert(property.to_string(), value);
    response.body = Body::Json(JsonValue::Object(map));
    Ok(response)
}

/// Classify the status and decode the body.
fn classify(request: &Request, response: HttpResponse) -> Result<Response, Error> {
    let HttpResponse {
        url,
        status,
        headers,
        body,
    } = response;
    if status.is_client_error() || status.is_server_error() {
        return Err(Error::Http {
            method: request.method.clone(),
            url,
            status,
            body,
        });
    }
    if status == StatusCode::FOUND {
        let location = headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        return Err(Error::Redirect { url, location });
    }
    let body = match status {
        StatusCode::NO_CONTENT => Body::Empty,
        StatusCode::OK if request.method == Method::HEAD => Body::Empty,
        StatusCode::OK | StatusCode::CREATED => {
            if body.trim().is_empty() {
                Body::Empty
            } else if request.json {
                Body::Json(serde_json::from_str(&body).map_err(|source| Error::Json {
                    context: format!("{} {}", request.method, url),
                    source,
                })?)
            } else {
                Body::Text(body)
            }
        }
        _ => return Err(Error::UnexpectedStatus { url, status }),
    };
    Ok(Response {
        url,
        status,
        headers,
        body,
    })
}

/// Human readable description of an error status. Other 4xx codes
/// have no description.
#[must_use]
pub fn status_description(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden--user not authorized to perform action",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        500.. => "Internal Server Error",
        _ => "",
    }
}
