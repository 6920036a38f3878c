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

use http::HeaderMap;
use redfishtool_core::http::X_AUTH_TOKEN;
use redfishtool_core::FailureKind;
use redfishtool_core::HttpClient;
use redfishtool_core::HttpRequest;
use redfishtool_core::HttpResponse;
use redfishtool_core::RequestAuth;
use redfishtool_core::TransportFailure;
use std::time::Duration;
use tracing::trace;

#[derive(Debug)]
pub enum BmcError {
    ReqwestError(reqwest::Error),
}

impl From<reqwest::Error> for BmcError {
    fn from(value: reqwest::Error) -> Self {
        Self::ReqwestError(value)
    }
}

impl TransportFailure for BmcError {
    fn failure(&self) -> FailureKind {
        match self {
            Self::ReqwestError(e) if e.is_connect() && e.is_timeout() => FailureKind::ConnectTimeout,
            Self::ReqwestError(e) if e.is_timeout() => FailureKind::ReadTimeout,
            Self::ReqwestError(e) if e.is_connect() => FailureKind::Connection,
            Self::ReqwestError(_) => FailureKind::Other,
        }
    }
}

#[allow(clippy::absolute_paths)]
impl std::fmt::Display for BmcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReqwestError(e) => write!(f, "HTTP client error: {e}"),
        }
    }
}

#[allow(clippy::absolute_paths)]
impl std::error::Error for BmcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReqwestError(e) => Some(e),
        }
    }
}

/// Configuration parameters for the reqwest HTTP client.
///
/// Redirects are not followed unless `max_redirects` is set: a `302`
/// must reach the caller.
///
/// # Examples
///
/// ```rust
/// use redfishtool_bmc_http::reqwest::ClientParams;
/// use std::time::Duration;
///
/// let params = ClientParams::new()
///     .connect_timeout(Duration::from_secs(3))
///     .user_agent("MyApp/1.0")
///     .accept_invalid_certs(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientParams {
    /// TCP connection timeout
    pub connect_timeout: Option<Duration>,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Whether to accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Maximum number of HTTP redirects to follow
    pub max_redirects: Option<usize>,
    /// TCP keep-alive timeout
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: Option<usize>,
    /// List of default headers, added to every request
    pub default_headers: Option<HeaderMap>,
    /// Forces use of rust TLS, enabled by default
    pub use_rust_tls: bool,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            user_agent: Some(concat!("redfishtool/", env!("CARGO_PKG_VERSION")).to_string()),
            accept_invalid_certs: false,
            max_redirects: None,
            tcp_keepalive: Some(Duration::from_secs(60)),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: Some(1),
            default_headers: None,
            use_rust_tls: true,
        }
    }
}

impl ClientParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub const fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    #[must_use]
    pub const fn tcp_keepalive(mut self, keepalive: Duration) -> Self {
        self.tcp_keepalive = Some(keepalive);
        self
    }

    #[must_use]
    pub const fn pool_max_idle_per_host(mut self, pool_max_idle_per_host: usize) -> Self {
        self.pool_max_idle_per_host = Some(pool_max_idle_per_host);
        self
    }

    #[must_use]
    pub const fn idle_timeout(mut self, pool_idle_timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(pool_idle_timeout);
        self
    }

    #[must_use]
    pub fn default_headers(mut self, default_headers: HeaderMap) -> Self {
        self.default_headers = Some(default_headers);
        self
    }

    fn build(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();

        if self.use_rust_tls {
            builder = builder.use_rustls_tls();
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder = builder.redirect(match self.max_redirects {
            Some(max_redirects) => reqwest::redirect::Policy::limited(max_redirects),
            None => reqwest::redirect::Policy::none(),
        });

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle_timeout);
        }

        if let Some(max_idle) = self.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        if let Some(default_headers) = &self.default_headers {
            builder = builder.default_headers(default_headers.clone());
        }

        builder.build()
    }
}

/// HTTP client implementation using the reqwest library.
///
/// reqwest only knows a connect timeout per client, so a request asking
/// for a different one is sent through a client built for it.
///
/// # Examples
///
/// ```rust,no_run
/// use redfishtool_bmc_http::reqwest::Client;
/// use redfishtool_bmc_http::reqwest::ClientParams;
/// use redfishtool_core::ConnectionContext;
/// use redfishtool_core::Transport;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::with_params(ClientParams::new().accept_invalid_certs(true))?;
/// let transport = Transport::new(client, ConnectionContext::new("192.168.1.100"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    params: ClientParams,
}

#[allow(clippy::missing_errors_doc)]
impl Client {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_params(ClientParams::default())
    }

    pub fn with_params(params: ClientParams) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: params.build()?,
            params,
        })
    }

    fn client_for(&self, connect_timeout: Option<Duration>) -> Result<reqwest::Client, BmcError> {
        match connect_timeout {
            Some(timeout) if Some(timeout) != self.params.connect_timeout => Ok(self
                .params
                .clone()
                .connect_timeout(timeout)
                .build()?),
            _ => Ok(self.client.clone()),
        }
    }
}

impl HttpClient for Client {
    type Error = BmcError;

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
        let HttpRequest {
            method,
            url,
            headers,
            auth,
            body,
            timeout,
            connect_timeout,
        } = request;
        let mut builder = self
            .client_for(connect_timeout)?
            .request(method, url)
            .headers(headers)
            .timeout(timeout);
        builder = match auth {
            RequestAuth::None => builder,
            RequestAuth::Basic(credentials) => {
                builder.basic_auth(&credentials.username, Some(credentials.password()))
            }
            RequestAuth::Token(token) => builder.header(X_AUTH_TOKEN, token),
        };
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        trace!(%url, status = status.as_u16(), body_len = body.len(), "response");
        Ok(HttpResponse {
            url,
            status,
            headers,
            body,
        })
    }
}
