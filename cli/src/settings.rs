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

//! Settings
//!
//! Connection settings merge, in increasing priority, built-in defaults,
//! an optional TOML configuration file and command-line options:
//!
//! ```toml
//! rhost = "10.0.0.1:443"
//! user = "root"
//! password = "calvin"
//! auth = "Session"
//! secure = "Always"
//! redfish_version = "v1"
//! timeout = 10
//! wait_num = 3
//! wait_time = 5
//!
//! [headers]
//! X-Trace = "1"
//! ```

use crate::cli::Options;
use crate::error::Error;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use redfishtool_core::AuthMode;
use redfishtool_core::ConnectionContext;
use redfishtool_core::Credentials;
use redfishtool_core::SecurePolicy;
use serde::Deserialize;
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Version discovery attempts when none are configured.
pub const DEFAULT_WAIT_NUM: u32 = 1;
/// Version discovery back-off when none is configured.
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(3);
/// Protocol version when none is configured.
pub const DEFAULT_REDFISH_VERSION: &str = "v1";

/// Configuration file.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rhost: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub auth: Option<AuthMode>,
    pub secure: Option<SecurePolicy>,
    pub redfish_version: Option<String>,
    /// Seconds.
    pub timeout: Option<u64>,
    pub wait_num: Option<u32>,
    /// Seconds.
    pub wait_time: Option<u64>,
    pub headers: Option<BTreeMap<String, String>>,
}

impl FileConfig {
    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if failed to read file
    /// - `Error::Toml` if the content is not a valid configuration
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|e| Error::Io(path.into(), e))?;
        toml::from_str(&content).map_err(|e| Error::Toml(path.into(), e))
    }
}

/// Merged connection settings of one invocation.
pub struct Settings {
    pub rhost: String,
    pub credentials: Credentials,
    pub token: Option<String>,
    pub auth: AuthMode,
    pub secure: SecurePolicy,
    pub redfish_version: String,
    pub check_version: bool,
    pub timeout: Duration,
    pub wait_num: u32,
    pub wait_time: Duration,
    pub headers: HeaderMap,
}

impl Settings {
    /// Read the configuration file named by `-c`, if any, and merge.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the merged settings
    /// are invalid.
    pub fn load(options: &Options) -> Result<Self, Error> {
        let file = match &options.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::merge(options, file)
    }

    /// Merge command-line options over the configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Usage` if the remote host is missing, a token is
    /// given without session authentication, or headers are invalid.
    pub fn merge(options: &Options, file: FileConfig) -> Result<Self, Error> {
        let rhost = options
            .rhost
            .clone()
            .or(file.rhost)
            .ok_or_else(|| Error::Usage("remote host is required (-r <rhost>)".into()))?;
        let auth = options.auth.or(file.auth).unwrap_or(AuthMode::Basic);
        let token = options.token.clone().or(file.token);
        if token.is_some() && auth != AuthMode::Session {
            return Err(Error::Usage("-t <token> requires -A Session".into()));
        }
        let credentials = Credentials::new(
            options.user.clone().or(file.user).unwrap_or_default(),
            options.password.clone().or(file.password).unwrap_or_default(),
        );
        let (wait_num, wait_time) = match options.wait {
            Some(wait) => (wait.num, Duration::from_secs(wait.time)),
            None => (
                file.wait_num.unwrap_or(DEFAULT_WAIT_NUM),
                file.wait_time
                    .map_or(DEFAULT_WAIT_TIME, Duration::from_secs),
            ),
        };
        if wait_num == 0 || wait_time.is_zero() {
            return Err(Error::Usage("wait_num and wait_time must be positive".into()));
        }
        let timeout = options
            .timeout
            .or(file.timeout)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        if timeout.is_zero() {
            return Err(Error::Usage("timeout must be positive".into()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in file.headers.unwrap_or_default() {
            insert_header(&mut headers, &name, &value)?;
        }
        if let Some(json) = &options.headers {
            for (name, value) in parse_json_headers(json)? {
                insert_header(&mut headers, &name, &value)?;
            }
        }

        Ok(Self {
            rhost,
            credentials,
            token,
            auth,
            secure: options
                .secure
                .or(file.secure)
                .unwrap_or(SecurePolicy::IfLoginOrAuthenticatedApi),
            redfish_version: options
                .redfish_version
                .clone()
                .or(file.redfish_version)
                .unwrap_or_else(|| DEFAULT_REDFISH_VERSION.into()),
            check_version: options.check_version || options.wait.is_some(),
            timeout,
            wait_num,
            wait_time,
            headers,
        })
    }

    /// Connection context for the engine.
    #[must_use]
    pub fn into_context(self) -> ConnectionContext {
        let ctx = ConnectionContext::new(self.rhost)
            .with_credentials(self.credentials)
            .with_auth(self.auth)
            .with_secure(self.secure)
            .with_timeout(self.timeout)
            .with_wait(self.wait_num, self.wait_time)
            .with_protocol_version(self.redfish_version)
            .with_check_protocol_version(self.check_version)
            .with_extra_headers(self.headers);
        match self.token {
            Some(token) => ctx.with_token(token),
            None => ctx,
        }
    }
}

/// `-H '{"Name": "value", ...}'`.
fn parse_json_headers(json: &str) -> Result<Vec<(String, String)>, Error> {
    let map: JsonMap<String, JsonValue> = serde_json::from_str(json)
        .map_err(|e| Error::Usage(format!("-H expects a JSON object: {e}")))?;
    map.into_iter()
        .map(|(name, value)| match value {
            JsonValue::String(value) => Ok((name, value)),
            other => Err(Error::Usage(format!(
                "-H header {name} must be a string, got {other}"
            ))),
        })
        .collect()
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), Error> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::Usage(format!("invalid header name {name}: {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::Usage(format!("invalid value of header {name}: {e}")))?;
    headers.insert(name, value);
    Ok(())
}
