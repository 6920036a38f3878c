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

//! Protocol version negotiation
//!
//! `GET /redfish` returns `{"v1": "/redfish/v1/"}`: a map from protocol
//! version to service root path. Discovery is skipped unless it is forced,
//! requested with `check_protocol_version`, or the requested version is
//! `Latest`.
//!
//! Discovery is the only place where transport failures are retried:
//! connect timeouts are retried immediately, connection errors after
//! `wait_time`. Read timeouts and other failures stop discovery at once.

use crate::context::RootInfo;
use crate::context::LATEST;
use crate::error::Error;
use crate::error::VersionSide;
use crate::http::FailureKind;
use crate::http::HttpClient;
use crate::http::RequestAuth;
use crate::scheme::select_scheme;
use crate::scheme::ApiClass;
use crate::transport::Request;
use crate::transport::Transport;
use http::StatusCode;
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

/// Protocol versions supported by this program.
pub const SUPPORTED_VERSIONS: &[&str] = &["v1"];

/// Pick the protocol version to use.
///
/// `Latest` picks the highest client version offered by the service.
/// An explicit version must be supported on both sides.
///
/// # Errors
///
/// Returns [`Error::ProtocolMismatch`] naming the side lacking support.
pub fn select_version(
    requested: &str,
    client: &[&str],
    service: &[String],
) -> Result<String, Error> {
    let mismatch = |side| Error::ProtocolMismatch {
        requested: requested.to_string(),
        side,
        client: client.iter().map(ToString::to_string).collect(),
        service: service.to_vec(),
    };
    if requested == LATEST {
        let mut ordered = client.to_vec();
        ordered.sort_by_key(|v| std::cmp::Reverse(version_number(v)));
        return ordered
            .into_iter()
            .find(|v| service.iter().any(|s| s == v))
            .map(ToString::to_string)
            .ok_or_else(|| mismatch(VersionSide::Both));
    }
    if !client.contains(&requested) {
        return Err(mismatch(VersionSide::Client));
    }
    if !service.iter().any(|s| s == requested) {
        return Err(mismatch(VersionSide::Service));
    }
    Ok(requested.to_string())
}

/// Numeric part of `v<N>`.
fn version_number(v: &str) -> u64 {
    v.strip_prefix('v')
        .and_then(|n| n.parse().ok())
        .unwrap_or_default()
}

impl<C: HttpClient> Transport<C> {
    /// Establish the service root and store it in the context.
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails, the versions document is
    /// malformed, or there is no common version.
    pub async fn negotiate(&mut self, force: bool) -> Result<RootInfo, Error> {
        let requested = self.ctx.protocol_version.clone();
        let scheme = select_scheme(
            self.ctx.secure,
            ApiClass::UnauthenticatedNoCreds,
            self.ctx.auth,
        );
        if !force && !self.ctx.check_protocol_version && requested != LATEST {
            let root_path = format!("/redfish/{requested}/");
            let root = RootInfo {
                root_uri: join(&self.ctx.host_url(scheme)?, &root_path)?,
                version: requested,
                root_path,
                service_versions: None,
                versions_document: None,
            };
            debug!(root = %root.root_uri, "protocol version not checked");
            self.ctx.set_root(root.clone());
            return Ok(root);
        }

        let (url, document) = self.discover_versions().await?;
        let offered = document
            .as_object()
            .ok_or_else(|| Error::UnexpectedBody {
                resource: url.path().to_string(),
                expected: "a map of protocol versions",
            })?;
        let service: Vec<String> = offered.keys().cloned().collect();
        let version = select_version(&requested, SUPPORTED_VERSIONS, &service)?;
        let root_path = offered
            .get(&version)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::MissingProperty {
                resource: url.path().to_string(),
                property: version.clone(),
            })?
            .to_string();
        let root = RootInfo {
            root_uri: join(&url, &root_path)?,
            version,
            root_path,
            service_versions: Some(service),
            versions_document: Some(document),
        };
        debug!(version = %root.version, root = %root.root_uri, "protocol version negotiated");
        self.ctx.set_root(root.clone());
        Ok(root)
    }

    /// `GET /redfish` with up to `wait_num` attempts.
    async fn discover_versions(&self) -> Result<(Url, JsonValue), Error> {
        let scheme = select_scheme(
            self.ctx.secure,
            ApiClass::UnauthenticatedNoCreds,
            self.ctx.auth,
        );
        let url = join(&self.ctx.host_url(scheme)?, "/redfish")?;
        let request = Request::get(ApiClass::UnauthenticatedNoCreds).base(url.clone());
        let attempts = self.ctx.wait_num.max(1);
        let mut last_status = None;
        for attempt in 1..=attempts {
            let mut wire = self.prepare(&request, url.clone(), RequestAuth::None);
            wire.connect_timeout = Some(self.ctx.wait_time);
            match self.wire(wire).await {
                Ok(response) if response.status == StatusCode::OK => {
                    let document = serde_json::from_str(&response.body).map_err(|source| {
                        Error::Json {
                            context: format!("versions from {}", response.url),
                            source,
                        }
                    })?;
                    return Ok((response.url, document));
                }
                Ok(response) => {
                    debug!(attempt, status = response.status.as_u16(), "versions not available");
                    last_status = Some(response.status);
                }
                Err(err) => match err.failure_kind() {
                    Some(FailureKind::ConnectTimeout) => {
                        debug!(attempt, "connect timeout, try again");
                    }
                    Some(FailureKind::Connection) => {
                        debug!(attempt, "connection error, wait and try again");
                        if attempt < attempts {
                            tokio::time::sleep(self.ctx.wait_time).await;
                        }
                    }
                    _ => return Err(err),
                },
            }
        }
        Err(Error::ServiceUnavailable {
            url,
            attempts,
            last_status,
        })
    }
}

fn join(base: &Url, path: &str) -> Result<Url, Error> {
    base.join(path)
        .map_err(|e| Error::InvalidUrl(path.to_string(), e))
}
