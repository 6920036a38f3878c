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

//! Scheme selection
//!
//! Every outbound call is tagged with an [`ApiClass`]. Together with the
//! configured [`SecurePolicy`] and [`AuthMode`] it decides the minimum
//! scheme of the call. See [`select_scheme`].

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::str::FromStr;
use serde::Deserialize;

/// Classification of an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiClass {
    /// No authentication, no credentials in the body (e.g. `GET /redfish`).
    UnauthenticatedNoCreds,
    /// Authenticated call that does not carry credentials in the body.
    AuthenticatedNoCreds,
    /// Authenticated call that carries credentials (password change, add user).
    AuthenticatedWithCreds,
    /// Unauthenticated call that carries credentials (session login).
    UnauthenticatedWithCreds,
}

impl ApiClass {
    /// True if authentication must be attached to the request.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::AuthenticatedNoCreds | Self::AuthenticatedWithCreds)
    }

    /// True if the request body carries credentials.
    #[must_use]
    pub const fn sends_credentials(self) -> bool {
        matches!(
            self,
            Self::AuthenticatedWithCreds | Self::UnauthenticatedWithCreds
        )
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AuthMode {
    None,
    Basic,
    Session,
}

/// When to use https.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SecurePolicy {
    Never,
    IfSendingCredentials,
    IfLoginOrAuthenticatedApi,
    Always,
}

/// URL scheme. Ordered by security: `Http < Https`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Scheme of the URL. Anything that is not `https` counts as `http`.
    #[must_use]
    pub fn of(url: &url::Url) -> Self {
        if url.scheme() == "https" {
            Self::Https
        } else {
            Self::Http
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.as_str().fmt(f)
    }
}

/// Minimum scheme of a call. First match wins:
///
/// | policy                      | condition                                        | scheme |
/// |-----------------------------|--------------------------------------------------|--------|
/// | `Always`                    |                                                  | https  |
/// | `Never`                     |                                                  | http   |
/// | `IfSendingCredentials`      | call sends credentials, or basic auth is attached | https  |
/// | `IfLoginOrAuthenticatedApi` | `AuthenticatedNoCreds` or `UnauthenticatedWithCreds` | https |
/// | otherwise                   |                                                  | http   |
#[must_use]
pub fn select_scheme(policy: SecurePolicy, api: ApiClass, auth: AuthMode) -> Scheme {
    match policy {
        SecurePolicy::Always => Scheme::Https,
        SecurePolicy::Never => Scheme::Http,
        SecurePolicy::IfSendingCredentials
            if api.sends_credentials()
                || (api == ApiClass::AuthenticatedNoCreds && auth == AuthMode::Basic) =>
        {
            Scheme::Https
        }
        SecurePolicy::IfLoginOrAuthenticatedApi
            if matches!(
                api,
                ApiClass::AuthenticatedNoCreds | ApiClass::UnauthenticatedWithCreds
            ) =>
        {
            Scheme::Https
        }
        _ => Scheme::Http,
    }
}

/// Error of parsing an enumerated option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub value: String,
    pub valid: &'static [&'static str],
}

impl Display for InvalidValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "invalid value '{}'; valid values: {}",
            self.value,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for InvalidValue {}

impl FromStr for AuthMode {
    type Err = InvalidValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Basic" => Ok(Self::Basic),
            "Session" => Ok(Self::Session),
            _ => Err(InvalidValue {
                value: s.into(),
                valid: &["None", "Basic", "Session"],
            }),
        }
    }
}

impl FromStr for SecurePolicy {
    type Err = InvalidValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Never" => Ok(Self::Never),
            "IfSendingCredentials" => Ok(Self::IfSendingCredentials),
            "IfLoginOrAuthenticatedApi" => Ok(Self::IfLoginOrAuthenticatedApi),
            "Always" => Ok(Self::Always),
            _ => Err(InvalidValue {
                value: s.into(),
                valid: &[
                    "Never",
                    "IfSendingCredentials",
                    "IfLoginOrAuthenticatedApi",
                    "Always",
                ],
            }),
        }
    }
}
