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

use crate::http::FailureKind;
use crate::transport::status_description;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use http::Method;
use http::StatusCode;
use std::error::Error as StdError;
use url::Url;

/// Which side of the version negotiation lacks a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSide {
    /// Version is not supported by this program.
    Client,
    /// Version is not supported by the remote service.
    Service,
    /// No common version at all.
    Both,
}

/// Engine error. Every failure path ends in exactly one of these.
#[derive(Debug)]
pub enum Error {
    /// Operation not supported by this program or by the resource.
    Unsupported(String),
    /// Invalid URL supplied or produced by joining.
    InvalidUrl(String, url::ParseError),
    /// Transport error (no HTTP response).
    Transport {
        method: Method,
        url: Url,
        kind: FailureKind,
        source: Box<dyn StdError + Send + Sync>,
    },
    /// HTTP status >= 400.
    Http {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
    },
    /// HTTP 302. Redirects are not followed.
    Redirect { url: Url, location: Option<String> },
    /// Status that is neither an error nor one of the accepted codes.
    UnexpectedStatus { url: Url, status: StatusCode },
    /// Version discovery never got `200 OK`.
    ServiceUnavailable {
        url: Url,
        attempts: u32,
        last_status: Option<StatusCode>,
    },
    /// No common protocol version.
    ProtocolMismatch {
        requested: String,
        side: VersionSide,
        client: Vec<String>,
        service: Vec<String>,
    },
    /// Response body is not valid JSON (or user JSON is invalid).
    Json {
        context: String,
        source: serde_json::Error,
    },
    /// Collection member without `@odata.id`.
    MissingODataId { resource: String, index: usize },
    /// Collection without a `Members` array, or with an empty one.
    NoMembers { resource: String },
    /// Resource lacks a property the operation needs.
    MissingProperty { resource: String, property: String },
    /// Response lacks a header the operation needs.
    MissingHeader { resource: String, header: String },
    /// Response body is not what the operation needs.
    UnexpectedBody { resource: String, expected: &'static str },
    /// No member matched the selection.
    NoMatch { resource: String, selection: String },
    /// More than one member matched the selection.
    MultipleMatches { resource: String, selection: String },
    /// `OnlyOne` selection on a collection with more than one member.
    NotOnlyOne { resource: String, count: usize },
    /// Invalid operation argument.
    InvalidArgument(String),
    /// Value not permitted by the service for an action parameter.
    ValueNotAllowed {
        action: String,
        parameter: String,
        value: String,
        allowed: Vec<String>,
    },
    /// Session operation not valid in the current session state.
    SessionState(&'static str),
}

impl Error {
    /// Process exit code of this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SessionState(_) => 1,
            Self::Unsupported(_) => 2,
            Self::NoMatch { .. } | Self::MultipleMatches { .. } | Self::NotOnlyOne { .. } => 3,
            Self::ProtocolMismatch { .. }
            | Self::MissingODataId { .. }
            | Self::NoMembers { .. }
            | Self::MissingProperty { .. }
            | Self::MissingHeader { .. }
            | Self::UnexpectedBody { .. } => 4,
            Self::InvalidUrl(..)
            | Self::Transport { .. }
            | Self::Http { .. }
            | Self::Redirect { .. }
            | Self::UnexpectedStatus { .. }
            | Self::ServiceUnavailable { .. } => 5,
            Self::Json { .. } => 6,
            Self::InvalidArgument(_) | Self::ValueNotAllowed { .. } => 8,
        }
    }

    /// Transport failure class if this is a transport error.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// HTTP status if this error is caused by a response status.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Redirect { .. } => Some(StatusCode::FOUND),
            Self::ServiceUnavailable { last_status, .. } => *last_status,
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
            Self::InvalidUrl(url, err) => write!(f, "invalid url {url}: {err}"),
            Self::Transport {
                method,
                url,
                kind,
                source,
            } => write!(f, "{method} {url}: {kind}: {source}"),
            Self::Http {
                method,
                url,
                status,
                ..
            } => {
                write!(f, "{method} {url}: response error: status_code: {}", status.as_u16())?;
                let description = status_description(*status);
                if description.is_empty() {
                    Ok(())
                } else {
                    write!(f, " -- {description}")
                }
            }
            Self::Redirect { url, location } => match location {
                Some(location) => write!(f, "{url}: redirected to {location}"),
                None => write!(f, "{url}: redirected"),
            },
            Self::UnexpectedStatus { url, status } => {
                write!(f, "{url}: unexpected response status: {}", status.as_u16())
            }
            Self::ServiceUnavailable {
                url,
                attempts,
                last_status,
            } => {
                write!(
                    f,
                    "cannot connect to remote redfish service at {url} after {attempts} attempt(s)"
                )?;
                match last_status {
                    Some(status) => write!(
                        f,
                        ": last status: {} {}",
                        status.as_u16(),
                        status_description(*status)
                    ),
                    None => write!(f, ": no response"),
                }
            }
            Self::ProtocolMismatch {
                requested,
                side,
                client,
                service,
            } => {
                match side {
                    VersionSide::Client => write!(
                        f,
                        "protocol version {requested} is not supported by this program"
                    )?,
                    VersionSide::Service => write!(
                        f,
                        "protocol version {requested} is not supported by remote service"
                    )?,
                    VersionSide::Both => write!(f, "no common protocol version")?,
                }
                write!(
                    f,
                    "; this program supports {client:?}, remote service supports {service:?}"
                )
            }
            Self::Json { context, source } => write!(f, "{context}: bad JSON: {source}"),
            Self::MissingODataId { resource, index } => write!(
                f,
                "{resource}: improperly formatted link: member {index} has no @odata.id"
            ),
            Self::NoMembers { resource } => {
                write!(f, "{resource}: no members in collection")
            }
            Self::MissingProperty { resource, property } => {
                write!(f, "{resource}: the resource does not have a {property} property")
            }
            Self::MissingHeader { resource, header } => {
                write!(f, "{resource}: response does not have a {header} header")
            }
            Self::UnexpectedBody { resource, expected } => {
                write!(f, "{resource}: expected {expected} in response")
            }
            Self::NoMatch {
                resource,
                selection,
            } => write!(f, "{resource}: no match found for {selection}"),
            Self::MultipleMatches {
                resource,
                selection,
            } => write!(f, "{resource}: found multiple matches for {selection}"),
            Self::NotOnlyOne { resource, count } => write!(
                f,
                "{resource}: more than one member in collection ({count})"
            ),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::ValueNotAllowed {
                action,
                parameter,
                value,
                allowed,
            } => write!(
                f,
                "{action}: {value} is not an allowable value of {parameter}; allowable values: {allowed:?}"
            ),
            Self::SessionState(msg) => write!(f, "session error: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidUrl(_, err) => Some(err),
            Self::Transport { source, .. } => Some(source.as_ref()),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
