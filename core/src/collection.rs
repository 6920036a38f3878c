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

//! Collection member resolution
//!
//! A fetched collection plus a [`Selection`] yields the path of one
//! member. Every member must have `@odata.id`; this is checked for the
//! whole collection before any member is fetched.

use crate::error::Error;
use crate::http::HttpClient;
use crate::odata::ODataId;
use crate::odata::MEMBERS;
use crate::odata::MEMBERS_COUNT;
use crate::scheme::ApiClass;
use crate::transport::Body;
use crate::transport::Request;
use crate::transport::Response;
use crate::transport::Transport;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use serde_json::json;
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing::warn;
use url::Url;

/// How to pick a member of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Member whose `Id` equals the value. First match wins.
    Id(String),
    /// Member whose `property` equals `value` exactly. With `first` the
    /// scan stops at the first match, otherwise the match must be unique.
    Match {
        property: String,
        value: JsonValue,
        first: bool,
    },
    /// Member whose `@odata.id` equals the link.
    Link(String),
    /// First member.
    First,
    /// The only member.
    OnlyOne,
    /// Every member, expanded. See [`Transport::expand_members`].
    All,
}

impl Selection {
    /// Match on a string property.
    #[must_use]
    pub fn matching(property: impl Into<String>, value: impl Into<String>, first: bool) -> Self {
        Self::Match {
            property: property.into(),
            value: JsonValue::String(value.into()),
            first,
        }
    }

    /// `Id` selection as the equivalent property match.
    fn normalized(&self) -> Self {
        match self {
            Self::Id(id) => Self::matching("Id", id.clone(), true),
            other => other.clone(),
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Id(id) => write!(f, "Id {id}"),
            Self::Match {
                property, value, ..
            } => match value {
                JsonValue::String(s) => write!(f, "{property}:{s}"),
                v => write!(f, "{property}:{v}"),
            },
            Self::Link(link) => write!(f, "link {link}"),
            Self::First => "first member".fmt(f),
            Self::OnlyOne => "only member".fmt(f),
            Self::All => "all members".fmt(f),
        }
    }
}

/// Resolved member.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Member path (`@odata.id`).
    pub path: ODataId,
    /// Member representation when resolution had to fetch it.
    pub response: Option<Response>,
}

impl Resolved {
    const fn path_only(path: ODataId) -> Self {
        Self {
            path,
            response: None,
        }
    }
}

/// `@odata.id` of every member, in order.
///
/// # Errors
///
/// Returns error if there is no `Members` array or a member has no
/// `@odata.id`.
pub fn member_paths(collection: &JsonValue, resource: &str) -> Result<Vec<ODataId>, Error> {
    let members = collection
        .get(MEMBERS)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::NoMembers {
            resource: resource.to_string(),
        })?;
    members
        .iter()
        .enumerate()
        .map(|(index, m)| {
            ODataId::of(m).ok_or_else(|| Error::MissingODataId {
                resource: resource.to_string(),
                index,
            })
        })
        .collect()
}

fn non_empty_member_paths(collection: &Response) -> Result<Vec<ODataId>, Error> {
    let resource = collection.url.path();
    let paths = member_paths(collection.require_json()?, resource)?;
    if paths.is_empty() {
        return Err(Error::NoMembers {
            resource: resource.to_string(),
        });
    }
    Ok(paths)
}

impl<C: HttpClient> Transport<C> {
    /// Resolve a member of a fetched collection.
    ///
    /// `Link`, `First` and `OnlyOne` do not fetch anything. A match fetches
    /// members in order; a member that cannot be fetched or lacks the
    /// property does not match.
    ///
    /// # Errors
    ///
    /// Returns error if the collection is malformed or empty, nothing
    /// matches, a unique match is ambiguous, or the selection is `All`.
    pub async fn resolve(
        &mut self,
        collection: &Response,
        selection: &Selection,
    ) -> Result<Resolved, Error> {
        let paths = non_empty_member_paths(collection)?;
        let resource = collection.url.path().to_string();
        match selection.normalized() {
            Selection::Link(link) => find_link(&paths, &link, &resource),
            Selection::OnlyOne => {
                if paths.len() > 1 {
                    return Err(Error::NotOnlyOne {
                        resource,
                        count: paths.len(),
                    });
                }
                Ok(Resolved::path_only(paths[0].clone()))
            }
            Selection::First => Ok(Resolved::path_only(paths[0].clone())),
            Selection::Match {
                property,
                value,
                first,
            } => {
                let mut found: Option<Resolved> = None;
                for path in paths {
                    let Some(member) = self
                        .fetch_member(&collection.url, &path, &property, &value)
                        .await
                    else {
                        continue;
                    };
                    if found.is_some() {
                        return Err(Error::MultipleMatches {
                            resource,
                            selection: selection.to_string(),
                        });
                    }
                    let resolved = Resolved {
                        path,
                        response: Some(member),
                    };
                    if first {
                        return Ok(resolved);
                    }
                    found = Some(resolved);
                }
                found.ok_or_else(|| Error::NoMatch {
                    resource,
                    selection: selection.to_string(),
                })
            }
            Selection::All => Err(Error::Unsupported(
                "all members are read with expand_members".into(),
            )),
            Selection::Id(_) => Err(Error::Unsupported("unnormalized Id selection".into())),
        }
    }

    /// Resolve a member of a second-level collection (Processors of a
    /// System, Sessions of the session service). A match returns the
    /// first hit without checking uniqueness.
    ///
    /// # Errors
    ///
    /// Returns error if the collection is malformed or empty, nothing
    /// matches, or the selection is not a link, id or match.
    pub async fn resolve_level2(
        &mut self,
        collection: &Response,
        selection: &Selection,
    ) -> Result<Resolved, Error> {
        match selection.normalized() {
            Selection::Link(_) => self.resolve(collection, selection).await,
            Selection::Match {
                property, value, ..
            } => {
                let first = Selection::Match {
                    property,
                    value,
                    first: true,
                };
                self.resolve(collection, &first).await
            }
            other => Err(Error::Unsupported(format!(
                "{other} cannot select a second-level member"
            ))),
        }
    }

    /// GET a member and return it if `property == value`.
    async fn fetch_member(
        &mut self,
        base: &Url,
        path: &ODataId,
        property: &str,
        value: &JsonValue,
    ) -> Option<Response> {
        let request = Request::get(ApiClass::AuthenticatedNoCreds)
            .base(base.clone())
            .path(path.as_str());
        match self.send(request).await {
            Ok(member) => {
                let actual = member.json().and_then(|v| v.get(property));
                if actual == Some(value) {
                    Some(member)
                } else {
                    debug!(%path, property, ?actual, "member does not match");
                    None
                }
            }
            Err(err) => {
                warn!(%path, error = %err, "failed to read collection member");
                None
            }
        }
    }

    /// GET a collection and replace each member link with the member's
    /// full representation. Members that cannot be read are left out.
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be read or a member has no
    /// `@odata.id`.
    pub async fn expand_members(&mut self, request: Request) -> Result<Response, Error> {
        let mut collection = self.send(request).await?;
        let paths = member_paths(collection.require_json()?, collection.url.path())?;
        let mut expanded = Vec::with_capacity(paths.len());
        for path in paths {
            let request = Request::get(ApiClass::AuthenticatedNoCreds)
                .base(collection.url.clone())
                .path(path.as_str());
            match self.send(request).await {
                Ok(member) => match member.into_json() {
                    Ok(v) => expanded.push(v),
                    Err(err) => warn!(%path, error = %err, "collection member is not JSON"),
                },
                Err(err) => warn!(%path, error = %err, "failed to read collection member"),
            }
        }
        if let Body::Json(JsonValue::Object(map)) = &mut collection.body {
            map.insert(MEMBERS.into(), JsonValue::Array(expanded));
        }
        Ok(collection)
    }

    /// Summary of a collection: `_Path`, `Name`, member count and, per
    /// member, `Id`, `@odata.id` and optionally `property`.
    ///
    /// # Errors
    ///
    /// Returns error if the collection is malformed or a member has no `Id`.
    pub async fn list_collection(
        &mut self,
        collection: &Response,
        property: Option<&str>,
    ) -> Result<JsonValue, Error> {
        let body = collection.require_json()?;
        let resource = collection.url.path();
        let paths = member_paths(body, resource)?;
        if paths.is_empty() {
            return Ok(body.clone());
        }
        let mut members = Vec::with_capacity(paths.len());
        for path in &paths {
            let request = Request::get(ApiClass::AuthenticatedNoCreds)
                .base(collection.url.clone())
                .path(path.as_str());
            let member = match self.send(request).await {
                Ok(member) => member,
                Err(err) => {
                    warn!(%path, error = %err, "failed to read collection member");
                    continue;
                }
            };
            let member = member.require_json()?;
            let id = member.get("Id").ok_or_else(|| Error::MissingProperty {
                resource: path.to_string(),
                property: "Id".into(),
            })?;
            let mut entry = json!({
                "Id": id,
                "@odata.id": member.get("@odata.id").cloned().unwrap_or_else(|| path.as_str().into()),
            });
            if let (Some(property), JsonValue::Object(entry)) = (property, &mut entry) {
                entry.insert(
                    property.to_string(),
                    member.get(property).cloned().unwrap_or(JsonValue::Null),
                );
            }
            members.push(entry);
        }
        Ok(json!({
            "_Path": resource,
            "Name": body.get("Name").cloned().unwrap_or_else(|| "".into()),
            MEMBERS_COUNT: paths.len(),
            MEMBERS: members,
        }))
    }
}

fn find_link(paths: &[ODataId], link: &str, resource: &str) -> Result<Resolved, Error> {
    paths
        .iter()
        .find(|p| p.as_str() == link)
        .map(|p| Resolved::path_only(p.clone()))
        .ok_or_else(|| Error::NoMatch {
            resource: resource.to_string(),
            selection: format!("link {link}"),
        })
}
