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

//! HTTP seam between the engine and a concrete HTTP library.
//!
//! The engine only builds [`HttpRequest`] values and consumes
//! [`HttpResponse`] values. Whatever implements [`HttpClient`] owns
//! sockets, TLS and connection reuse.

use crate::credentials::Credentials;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use http::header;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Session token header, both in login responses and in requests.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");
/// OData protocol version header.
pub const ODATA_VERSION: HeaderName = HeaderName::from_static("odata-version");

pub trait HttpClient: Send + Sync {
    type Error: StdError + TransportFailure + Send + Sync + 'static;

    /// Send one request and return the response regardless of its status.
    /// Only transport-level problems are errors.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, Self::Error>> + Send;
}

/// Class of a transport failure.
///
/// Version negotiation retries `ConnectTimeout` and `Connection`;
/// every other call treats all classes as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection was not established within the connect timeout.
    ConnectTimeout,
    /// Connection refused, DNS failure, socket error.
    Connection,
    /// Connected but the response did not arrive in time.
    ReadTimeout,
    /// Anything else reported by the HTTP library.
    Other,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ConnectTimeout => "connect timeout".fmt(f),
            Self::Connection => "connection error".fmt(f),
            Self::ReadTimeout => "read timeout".fmt(f),
            Self::Other => "request failure".fmt(f),
        }
    }
}

/// Trait for transport errors that can tell which [`FailureKind`] they are.
pub trait TransportFailure {
    fn failure(&self) -> FailureKind;
}

/// Authentication attached to an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestAuth {
    #[default]
    None,
    /// `Authorization: Basic ...`
    Basic(Credentials),
    /// `X-Auth-Token: ...`
    Token(String),
}

/// Fully prepared outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub auth: RequestAuth,
    pub body: Option<String>,
    /// Total request timeout.
    pub timeout: Duration,
    /// Connect timeout. `None` uses the client default.
    pub connect_timeout: Option<Duration>,
}

impl HttpRequest {
    /// Request with no headers, no body and no authentication.
    #[must_use]
    pub fn new(method: Method, url: Url, timeout: Duration) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            auth: RequestAuth::None,
            body: None,
            timeout,
            connect_timeout: None,
        }
    }
}

/// Response as received from the wire.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL of the response.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Default headers for a method.
///
/// Write methods (`PATCH`, `POST`, `PUT`) carry a JSON content type,
/// every method asks for JSON and OData 4.0.
#[must_use]
pub fn default_headers(method: &Method) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ODATA_VERSION, HeaderValue::from_static("4.0"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    if is_write_method(method) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    headers
}

/// True for methods that carry a request body.
#[must_use]
pub fn is_write_method(method: &Method) -> bool {
    *method == Method::PATCH || *method == Method::POST || *method == Method::PUT
}

/// Apply `overrides` on top of `headers`, last write wins per name.
pub fn merge_headers(headers: &mut HeaderMap, overrides: &HeaderMap) {
    for name in overrides.keys() {
        headers.remove(name);
        for value in overrides.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
}
