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

//! Connection context
//!
//! Configuration of one invocation plus the little state that changes
//! while a command runs: the negotiated service root, the cached service
//! root resource and the [`SessionState`].

use crate::credentials::Credentials;
use crate::error::Error;
use crate::scheme::AuthMode;
use crate::scheme::Scheme;
use crate::scheme::SecurePolicy;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use http::HeaderMap;
use serde_json::Value as JsonValue;
use std::mem;
use std::time::Duration;
use url::Url;

/// Protocol version used when none is requested.
pub const DEFAULT_PROTOCOL_VERSION: &str = "v1";
/// Requested version meaning "highest common version".
pub const LATEST: &str = "Latest";

/// Configuration and state of one invocation.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Remote host, `host[:port]`.
    pub host: String,
    pub credentials: Credentials,
    pub auth: AuthMode,
    pub secure: SecurePolicy,
    /// Total timeout of each request.
    pub timeout: Duration,
    /// Version discovery attempts.
    pub wait_num: u32,
    /// Version discovery connect timeout and back-off between attempts.
    pub wait_time: Duration,
    /// Requested protocol version, `v1` or `Latest`.
    pub protocol_version: String,
    /// Verify the protocol version with `GET /redfish` before the first call.
    pub check_protocol_version: bool,
    /// Headers applied on top of every request (`-H`).
    pub extra_headers: HeaderMap,
    root: Option<RootInfo>,
    service_root: Option<JsonValue>,
    session: SessionState,
}

impl ConnectionContext {
    /// Context with default settings for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credentials: Credentials::default(),
            auth: AuthMode::Basic,
            secure: SecurePolicy::IfLoginOrAuthenticatedApi,
            timeout: Duration::from_secs(10),
            wait_num: 1,
            wait_time: Duration::from_secs(3),
            protocol_version: DEFAULT_PROTOCOL_VERSION.into(),
            check_protocol_version: false,
            extra_headers: HeaderMap::new(),
            root: None,
            service_root: None,
            session: SessionState::NoSession,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub const fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub const fn with_secure(mut self, secure: SecurePolicy) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Version discovery retry parameters.
    #[must_use]
    pub const fn with_wait(mut self, wait_num: u32, wait_time: Duration) -> Self {
        self.wait_num = wait_num;
        self.wait_time = wait_time;
        self
    }

    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    #[must_use]
    pub const fn with_check_protocol_version(mut self, check: bool) -> Self {
        self.check_protocol_version = check;
        self
    }

    #[must_use]
    pub fn with_extra_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers = headers;
        self
    }

    /// Seed an externally obtained session token. Such a session is
    /// never deleted at exit.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.session = SessionState::Active(Session {
            id: None,
            link: None,
            token: token.into(),
            cleanup_on_exit: false,
        });
        self
    }

    /// `scheme://host` of the remote service.
    ///
    /// # Errors
    ///
    /// Returns error if the host does not form a valid URL.
    pub fn host_url(&self, scheme: Scheme) -> Result<Url, Error> {
        let s = format!("{scheme}://{}/", self.host);
        Url::parse(&s).map_err(|e| Error::InvalidUrl(s, e))
    }

    /// Negotiated service root, if any.
    #[must_use]
    pub const fn root(&self) -> Option<&RootInfo> {
        self.root.as_ref()
    }

    pub(crate) fn set_root(&mut self, root: RootInfo) {
        self.root = Some(root);
    }

    /// Cached service root resource.
    #[must_use]
    pub const fn service_root(&self) -> Option<&JsonValue> {
        self.service_root.as_ref()
    }

    pub(crate) fn set_service_root(&mut self, v: JsonValue) {
        self.service_root = Some(v);
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }
}

/// Result of version negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootInfo {
    /// Negotiated version tag, e.g. `v1`.
    pub version: String,
    /// Service root path, e.g. `/redfish/v1/`.
    pub root_path: String,
    /// `scheme://host/<root_path>`.
    pub root_uri: Url,
    /// Versions offered by the service. `None` when discovery was skipped.
    pub service_versions: Option<Vec<String>>,
    /// `GET /redfish` document. `None` when discovery was skipped.
    pub versions_document: Option<JsonValue>,
}

/// Server-side session known to this process.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Option<String>,
    /// Session resource path (`Location` of the login response).
    pub link: Option<String>,
    pub token: String,
    /// Delete the session when the command completes.
    pub cleanup_on_exit: bool,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("link", &self.link)
            .field("token", &"[REDACTED]")
            .field("cleanup_on_exit", &self.cleanup_on_exit)
            .finish()
    }
}

/// Session lifecycle: `NoSession -> LoggingIn -> Active -> LoggingOut -> NoSession`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    NoSession,
    LoggingIn,
    Active(Session),
    LoggingOut(Session),
}

impl SessionState {
    /// Token usable for authenticated requests.
    ///
    /// A session being logged out still authenticates its own `DELETE`.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Active(s) | Self::LoggingOut(s) => Some(&s.token),
            Self::NoSession | Self::LoggingIn => None,
        }
    }

    /// Active session, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&Session> {
        match self {
            Self::Active(s) => Some(s),
            _ => None,
        }
    }

    /// Enter `LoggingIn`.
    ///
    /// An active session created for this command and not yet cleaned
    /// up cannot be replaced.
    ///
    /// # Errors
    ///
    /// Returns error if a login or logout is in progress or an auto-created
    /// session is active.
    pub fn begin_login(&mut self) -> Result<(), Error> {
        match self {
            Self::NoSession => {}
            Self::Active(s) if !s.cleanup_on_exit => {}
            Self::Active(_) => {
                return Err(Error::SessionState(
                    "a session created for this command is still active",
                ))
            }
            Self::LoggingIn => return Err(Error::SessionState("login already in progress")),
            Self::LoggingOut(_) => return Err(Error::SessionState("logout in progress")),
        }
        *self = Self::LoggingIn;
        Ok(())
    }

    /// `LoggingIn -> Active` on success, `LoggingIn -> NoSession` on failure.
    pub fn finish_login(&mut self, session: Option<Session>) {
        if matches!(self, Self::LoggingIn) {
            *self = session.map_or(Self::NoSession, Self::Active);
        }
    }

    /// `Active -> LoggingOut`. Returns the session being logged out.
    pub fn begin_logout(&mut self) -> Option<Session> {
        match mem::take(self) {
            Self::Active(s) => {
                *self = Self::LoggingOut(s.clone());
                Some(s)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    /// `LoggingOut -> NoSession` on success, back to `Active` on failure.
    pub fn finish_logout(&mut self, deleted: bool) {
        if let Self::LoggingOut(s) = mem::take(self) {
            if !deleted {
                *self = Self::Active(s);
            }
        }
    }
}
