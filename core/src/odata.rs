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

//! OData identifiers and annotations found in Redfish payloads
//!
//! - [`ODataId`]: value of `@odata.id`, the canonical resource path (opaque string)
//! - [`ODataETag`]: value of the `ETag` response header, echoed verbatim in `If-Match`
//! - [`ODataType`]: parsed `@odata.type` (`#<Namespace>.<Version>.<Type>`)
//!
//! Example
//! ```rust
//! use redfishtool_core::ODataType;
//! use serde_json::json;
//!
//! let system = json!({"@odata.type": "#ComputerSystem.v1_5_0.ComputerSystem"});
//! let t = ODataType::parse_from(&system).unwrap();
//! assert_eq!(t.namespace, "ComputerSystem");
//! assert_eq!(t.version, Some("v1_5_0"));
//! assert_eq!(t.type_name, "ComputerSystem");
//! ```

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Name of the property holding a resource link.
pub const ODATA_ID: &str = "@odata.id";
/// Name of the property holding a resource type.
pub const ODATA_TYPE: &str = "@odata.type";
/// Collection members property.
pub const MEMBERS: &str = "Members";
/// Collection continuation link property.
pub const MEMBERS_NEXT_LINK: &str = "Members@odata.nextLink";
/// Collection member count property.
pub const MEMBERS_COUNT: &str = "Members@odata.count";

/// Type for `@odata.id` identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ODataId(String);

impl ODataId {
    /// Read `@odata.id` of a JSON object.
    #[must_use]
    pub fn of(v: &JsonValue) -> Option<Self> {
        v.get(ODATA_ID)
            .and_then(JsonValue::as_str)
            .map(|s| Self(s.to_string()))
    }

    /// Path as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ODataId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ODataId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for ODataId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

/// Entity tag as returned by the service. Weak tags keep their `W/`
/// prefix and quotes are part of the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ODataETag(String);

impl ODataETag {
    /// Raw tag value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ODataETag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for ODataETag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.0.fmt(f)
    }
}

/// Parsed `@odata.type` of a JSON payload.
#[derive(Debug, PartialEq, Eq)]
pub struct ODataType<'a> {
    /// Namespace of the data type. For example: `Chassis`.
    pub namespace: &'a str,
    /// Schema version, for example `v1_22_0`. Unversioned types have none.
    pub version: Option<&'a str>,
    /// Name of the type. For example "Chassis".
    pub type_name: &'a str,
}

impl ODataType<'_> {
    /// Get `@odata.type` from a JSON payload and parse it.
    #[must_use]
    pub fn parse_from(v: &JsonValue) -> Option<ODataType<'_>> {
        v.get(ODATA_TYPE)
            .and_then(JsonValue::as_str)
            .and_then(ODataType::parse)
    }

    /// Parse `#<Namespace>[.<Version>].<Type>`. Version may itself
    /// contain dots.
    #[must_use]
    pub fn parse(s: &str) -> Option<ODataType<'_>> {
        let s = s.strip_prefix('#')?;
        let (namespace, rest) = s.split_once('.')?;
        let (version, type_name) = match rest.rsplit_once('.') {
            Some((version, type_name)) => (Some(version), type_name),
            None => (None, rest),
        };
        let valid = |p: &str| !p.is_empty() && p.chars().all(char::is_alphanumeric);
        if !valid(namespace) || !valid(type_name) {
            return None;
        }
        if version.is_some_and(|v| {
            v.is_empty()
                || !v
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '.' || c == '_')
        }) {
            return None;
        }
        Some(ODataType {
            namespace,
            version,
            type_name,
        })
    }
}
