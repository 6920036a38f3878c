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

//! Conditional update
//!
//! A PATCH starts from a previous GET of the resource. Its `ETag` goes to
//! `If-Match` verbatim. What the service returns decides whether the
//! resource has to be read again:
//!
//! ```text
//! Patched --204 No Content, refetch on--> NeedsRefetch --GET--> Done
//!         --200 without @odata.id-------> NeedsRefetch --GET--> Done
//!         --anything else-----------------------------------> Done
//! ```

use crate::error::Error;
use crate::http::HttpClient;
use crate::odata::ODATA_ID;
use crate::scheme::ApiClass;
use crate::transport::Request;
use crate::transport::Response;
use crate::transport::Transport;
use http::header;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Why the resource is read again after a PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchReason {
    /// `204 No Content`.
    NoContent,
    /// `200 OK` with a body that is not the resource.
    NoODataId,
}

/// State of a conditional update.
#[derive(Debug)]
pub enum PatchState {
    /// PATCH response received.
    Patched(Response),
    /// Resource must be read again.
    NeedsRefetch {
        response: Response,
        reason: RefetchReason,
    },
    Done(Response),
}

impl PatchState {
    /// Next state without network access. `NeedsRefetch` is left by the
    /// GET, so it stays where it is.
    #[must_use]
    pub fn next(self, refetch: bool) -> Self {
        match self {
            Self::Patched(response) => {
                let reason = match response.status {
                    StatusCode::NO_CONTENT => Some(RefetchReason::NoContent),
                    StatusCode::OK
                        if response.json().and_then(|v| v.get(ODATA_ID)).is_none() =>
                    {
                        Some(RefetchReason::NoODataId)
                    }
                    _ => None,
                };
                match reason {
                    Some(RefetchReason::NoContent) if !refetch => Self::Done(response),
                    Some(reason) => Self::NeedsRefetch { response, reason },
                    None => Self::Done(response),
                }
            }
            other => other,
        }
    }
}

/// Options of [`Transport::patch`].
#[derive(Debug, Clone, Copy)]
pub struct PatchOptions {
    pub api: ApiClass,
    /// Read the resource again after `204 No Content`. Disabled when the
    /// credential in use is being changed. A `200` body that is not the
    /// resource is always followed by a GET.
    pub refetch: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            api: ApiClass::AuthenticatedNoCreds,
            refetch: true,
        }
    }
}

impl PatchOptions {
    /// Options for patching a credential (password change).
    #[must_use]
    pub const fn credential_change() -> Self {
        Self {
            api: ApiClass::AuthenticatedWithCreds,
            refetch: false,
        }
    }
}

impl<C: HttpClient> Transport<C> {
    /// PATCH the resource `current` was read from.
    ///
    /// # Errors
    ///
    /// Returns error if the body is empty, or the PATCH or the follow-up
    /// GET fails.
    pub async fn patch(
        &mut self,
        current: &Response,
        body: &JsonValue,
        options: PatchOptions,
    ) -> Result<Response, Error> {
        let empty = match body {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(Error::InvalidArgument(format!(
                "empty patch for {}",
                current.url.path()
            )));
        }

        let mut request = Request::new(options.api, Method::PATCH)
            .base(current.url.clone())
            .json_body(body);
        if let Some(etag) = current.etag() {
            let value = HeaderValue::from_str(etag.as_str()).map_err(|_| Error::UnexpectedBody {
                resource: current.url.path().to_string(),
                expected: "a valid ETag header",
            })?;
            request = request
                .header(header::IF_MATCH, value)
                .header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
        }

        let mut state = PatchState::Patched(self.send(request).await?);
        loop {
            state = match state.next(options.refetch) {
                PatchState::NeedsRefetch { response, reason } => {
                    debug!(url = %response.url, ?reason, "read resource after patch");
                    let request = Request::get(options.api).base(response.url);
                    PatchState::Done(self.send(request).await?)
                }
                PatchState::Done(response) => return Ok(response),
                patched @ PatchState::Patched(_) => patched,
            };
        }
    }
}
