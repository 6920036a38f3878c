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

//! Redfish actions
//!
//! An action lives under `Actions["#<Type>.<Action>"]` of a resource and
//! carries a `target`. Permitted parameter values are published either
//! inline as `<Parameter>@Redfish.AllowableValues` or in a separate
//! ActionInfo resource linked by `@Redfish.ActionInfo`.

use crate::error::Error;
use crate::http::HttpClient;
use crate::odata::ODataType;
use crate::scheme::ApiClass;
use crate::transport::Request;
use crate::transport::Response;
use crate::transport::Transport;
use http::Method;
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use tracing::debug;

const ACTIONS: &str = "Actions";
const ACTION_INFO: &str = "@Redfish.ActionInfo";
const ALLOWABLE_VALUES: &str = "@Redfish.AllowableValues";

/// Values a parameter may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowableValues {
    /// The service publishes no restriction.
    Unrestricted,
    Values(Vec<String>),
}

impl AllowableValues {
    #[must_use]
    pub fn permits(&self, value: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Values(values) => values.iter().any(|v| v == value),
        }
    }
}

/// Find the action object of a resource.
///
/// The key is built from the resource type (`#Manager.Reset` for a
/// Manager). Resources without a usable `@odata.type` fall back to the
/// first key ending in `.<action>`.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] if the resource has no such action.
pub fn find_action<'a>(
    resource: &'a JsonValue,
    action: &str,
) -> Result<(String, &'a JsonMap<String, JsonValue>), Error> {
    let actions = resource.get(ACTIONS).and_then(JsonValue::as_object);
    let typed_key = ODataType::parse_from(resource).map(|t| format!("#{}.{action}", t.type_name));
    let suffix = format!(".{action}");
    let found = actions.and_then(|actions| {
        typed_key
            .as_ref()
            .and_then(|key| actions.get_key_value(key.as_str()))
            .or_else(|| actions.iter().find(|(k, _)| k.ends_with(&suffix)))
    });
    match found {
        Some((key, JsonValue::Object(props))) => Ok((key.clone(), props)),
        _ => Err(Error::Unsupported(format!(
            "the remote service does not have an Actions: {} property",
            typed_key.unwrap_or_else(|| format!("#<Type>{suffix}"))
        ))),
    }
}

fn string_values(v: &JsonValue) -> Option<Vec<String>> {
    v.as_array().map(|a| {
        a.iter()
            .filter_map(JsonValue::as_str)
            .map(ToString::to_string)
            .collect()
    })
}

/// Allowable values published by an ActionInfo resource.
#[must_use]
pub fn action_info_values(action_info: &JsonValue, parameter: &str) -> AllowableValues {
    action_info
        .get("Parameters")
        .and_then(JsonValue::as_array)
        .and_then(|params| {
            params
                .iter()
                .find(|p| p.get("Name").and_then(JsonValue::as_str) == Some(parameter))
        })
        .and_then(|p| p.get("AllowableValues"))
        .and_then(string_values)
        .map_or(AllowableValues::Unrestricted, AllowableValues::Values)
}

impl<C: HttpClient> Transport<C> {
    /// Allowable values of an action parameter.
    ///
    /// # Errors
    ///
    /// Returns error if the resource has no such action or the ActionInfo
    /// resource cannot be read.
    pub async fn action_allowable_values(
        &mut self,
        resource: &Response,
        action: &str,
        parameter: &str,
    ) -> Result<AllowableValues, Error> {
        let (_, props) = find_action(resource.require_json()?, action)?;
        if let Some(values) = props
            .get(&format!("{parameter}{ALLOWABLE_VALUES}"))
            .and_then(string_values)
        {
            return Ok(AllowableValues::Values(values));
        }
        let Some(info) = props.get(ACTION_INFO).and_then(JsonValue::as_str) else {
            debug!(action, parameter, "no allowable values published");
            return Ok(AllowableValues::Unrestricted);
        };
        let request = Request::get(ApiClass::AuthenticatedNoCreds)
            .base(resource.url.clone())
            .path(info);
        let info = self.send(request).await?;
        Ok(action_info_values(info.require_json()?, parameter))
    }

    /// Invoke an action with a single parameter after checking the value
    /// against the allowable values.
    ///
    /// # Errors
    ///
    /// Returns error if the action is missing, the value is not allowed,
    /// there is no `target`, or the POST fails.
    pub async fn invoke_action(
        &mut self,
        resource: &Response,
        action: &str,
        parameter: &str,
        value: &str,
    ) -> Result<Response, Error> {
        let allowed = self
            .action_allowable_values(resource, action, parameter)
            .await?;
        let (key, props) = find_action(resource.require_json()?, action)?;
        if let AllowableValues::Values(values) = allowed {
            if !values.iter().any(|v| v == value) {
                return Err(Error::ValueNotAllowed {
                    action: key,
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                    allowed: values,
                });
            }
        }
        let target = props
            .get("target")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::MissingProperty {
                resource: format!("{}#{key}", resource.url.path()),
                property: "target".into(),
            })?;
        let mut body = JsonMap::new();
        body.insert(parameter.to_string(), JsonValue::String(value.to_string()));
        let request = Request::new(ApiClass::AuthenticatedNoCreds, Method::POST)
            .base(resource.url.clone())
            .path(target)
            .json_body(&JsonValue::Object(body));
        self.send(request).await
    }
}
