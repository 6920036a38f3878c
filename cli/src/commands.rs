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

//! Subcommand execution
//!
//! Every subcommand maps to a short sequence of engine calls. Top-level
//! collections are found through the service root, members through the
//! `-I|-M|-F|-1|-L` selector, second-level members through `-i|-m|-l|-a`.

use crate::cli::AccountOp;
use crate::cli::Command;
use crate::cli::MemberOp;
use crate::cli::Options;
use crate::cli::SessionOp;
use crate::error::Error;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use http::Method;
use redfishtool_core::odata::ODATA_ID;
use redfishtool_core::transport::filter_property;
use redfishtool_core::version::SUPPORTED_VERSIONS;
use redfishtool_core::ApiClass;
use redfishtool_core::Body;
use redfishtool_core::Error as CoreError;
use redfishtool_core::HttpClient;
use redfishtool_core::PatchOptions;
use redfishtool_core::Request;
use redfishtool_core::Response;
use redfishtool_core::Selection;
use redfishtool_core::Transport;
use serde_json::json;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Reset types accepted by `reset`. The service narrows them further.
pub const RESET_TYPES: &[&str] = &[
    "On",
    "ForceOff",
    "GracefulShutdown",
    "ForceRestart",
    "Nmi",
    "GracefulRestart",
    "ForceOn",
    "PushPowerButton",
    "PowerCycle",
];

/// Result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(JsonValue),
    /// Non-JSON body, printed verbatim.
    Text(String),
    Empty,
}

impl From<Response> for Output {
    fn from(response: Response) -> Self {
        match response.body {
            Body::Json(v) => Self::Json(v),
            Body::Text(s) => Self::Text(s),
            Body::Empty => Self::Empty,
        }
    }
}

/// Top-level collection linked from the service root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Systems,
    Chassis,
    Managers,
}

impl Collection {
    /// Property of the service root that links the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Systems => "Systems",
            Self::Chassis => "Chassis",
            Self::Managers => "Managers",
        }
    }

    /// Property reported per member by `list`.
    #[must_use]
    pub const fn list_property(self) -> &'static str {
        match self {
            Self::Systems | Self::Chassis => "AssetTag",
            Self::Managers => "UUID",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.name().fmt(f)
    }
}

/// Run a command.
///
/// # Errors
///
/// Returns error if the command is used incorrectly or any request fails.
pub async fn run<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    command: &Command,
) -> Result<Output, Error> {
    debug!(?command, "run");
    match command {
        Command::Versions => versions(t).await,
        Command::Root => Ok(t.service_root(options.prop.as_deref()).await?.into()),
        Command::Odata => Ok(t.odata_document().await?.into()),
        Command::Metadata => Ok(t.metadata_document().await?.into()),
        Command::Systems { op } => {
            member_command(t, options, Collection::Systems, op.as_ref()).await
        }
        Command::Chassis { op } => {
            member_command(t, options, Collection::Chassis, op.as_ref()).await
        }
        Command::Managers { op } => {
            member_command(t, options, Collection::Managers, op.as_ref()).await
        }
        Command::SessionService { op } => session_command(t, options, op.as_ref()).await,
        Command::AccountService { op } => account_command(t, options, op.as_ref()).await,
        Command::Raw { method, path, data } => {
            raw(t, options, method, path, data.as_deref()).await
        }
    }
}

async fn versions<C: HttpClient>(t: &mut Transport<C>) -> Result<Output, Error> {
    let info = t.versions().await?;
    Ok(Output::Json(json!({
        "ClientSupported": SUPPORTED_VERSIONS,
        "ServiceSupported": info.service_versions,
        "Negotiated": info.version,
        "RootPath": info.root_path,
        "Versions": info.versions_document,
    })))
}

async fn member_command<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    collection: Collection,
    op: Option<&MemberOp>,
) -> Result<Output, Error> {
    let link = root_link(t, collection.name()).await?;
    let selection = options.selection();
    let op = match (op, &selection) {
        (Some(op), _) => op,
        (None, Some(_)) => &MemberOp::Get,
        (None, None) => return collection_output(t, options, &link).await,
    };
    match op {
        MemberOp::List => {
            let members = t.send(get(&link)).await?;
            let list = t
                .list_collection(&members, Some(collection.list_property()))
                .await?;
            Ok(Output::Json(list))
        }
        MemberOp::Get => {
            let selection = required(selection, collection)?;
            let member = fetch_member(t, &link, &selection, false).await?;
            with_property(member, options)
        }
        MemberOp::Patch { data } => {
            let data = parse_json(data)?;
            let selection = required(selection, collection)?;
            let member = fetch_member(t, &link, &selection, false).await?;
            Ok(t.patch(&member, &data, PatchOptions::default()).await?.into())
        }
        MemberOp::Reset { reset_type } => {
            if !RESET_TYPES.contains(&reset_type.as_str()) {
                return Err(CoreError::InvalidArgument(format!(
                    "invalid reset type {reset_type}; valid types: {}",
                    RESET_TYPES.join(", ")
                ))
                .into());
            }
            let selection = required(selection, collection)?;
            let member = fetch_member(t, &link, &selection, false).await?;
            t.invoke_action(&member, "Reset", "ResetType", reset_type)
                .await?;
            Ok(Output::Empty)
        }
    }
}

fn required(selection: Option<Selection>, collection: Collection) -> Result<Selection, Error> {
    selection.ok_or_else(|| {
        Error::Usage(format!(
            "{collection}: one of -I, -M, -F, -1, -L is required to select a member"
        ))
    })
}

async fn session_command<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    op: Option<&SessionOp>,
) -> Result<Output, Error> {
    match op.unwrap_or(&SessionOp::Get) {
        SessionOp::Get => {
            let link = root_link(t, "SessionService").await?;
            with_property(t.send(get(&link)).await?, options)
        }
        SessionOp::Sessions => {
            let link = sessions_link(t).await?;
            second_level(t, options, &link).await
        }
        SessionOp::Login => {
            let session = t.login(false).await?;
            Ok(Output::Json(json!({
                "SessionId": session.id,
                "SessionLocation": session.link,
                "X-Auth-Token": session.token,
            })))
        }
        SessionOp::Logout => {
            let selection = match options.sub_selection() {
                Some(s @ (Selection::Id(_) | Selection::Link(_))) => s,
                _ => {
                    return Err(Error::Usage(
                        "logout requires -i <SessionId> or -l <SessionLink>".into(),
                    ))
                }
            };
            let link = sessions_link(t).await?;
            let sessions = t.send(get(&link)).await?;
            let session = t.resolve_level2(&sessions, &selection).await?;
            t.logout(Some(session.path.as_str())).await?;
            Ok(Output::Empty)
        }
    }
}

async fn account_command<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    op: Option<&AccountOp>,
) -> Result<Output, Error> {
    let service_link = root_link(t, "AccountService").await?;
    let service = t.send(get(&service_link)).await?;
    match op.unwrap_or(&AccountOp::Get) {
        AccountOp::Get => with_property(service, options),
        AccountOp::Accounts => {
            let link = link_of(&service, "Accounts")?;
            second_level(t, options, &link).await
        }
    }
}

async fn raw<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<Output, Error> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::Usage(format!("invalid HTTP method {method}")))?;
    let mut request = Request::new(ApiClass::AuthenticatedNoCreds, method.clone()).path(path);
    if let Some(data) = data {
        request = request.json_body(&parse_json(data)?);
    }
    if let Some(prop) = options.prop.as_ref().filter(|_| method == Method::GET) {
        request = request.property(prop);
    }
    Ok(t.send(request).await?.into())
}

/// Collection at `link`: expanded with `-a`, otherwise as returned.
async fn collection_output<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    link: &str,
) -> Result<Output, Error> {
    if options.all {
        return Ok(t.expand_members(get(link)).await?.into());
    }
    let mut request = get(link);
    if let Some(prop) = &options.prop {
        request = request.property(prop);
    }
    Ok(t.send(request).await?.into())
}

/// Collection at `link`, or the member picked by `-i|-m|-l|-a`.
async fn second_level<C: HttpClient>(
    t: &mut Transport<C>,
    options: &Options,
    link: &str,
) -> Result<Output, Error> {
    match options.sub_selection() {
        None | Some(Selection::All) => collection_output(t, options, link).await,
        Some(selection) => {
            let member = fetch_member(t, link, &selection, true).await?;
            with_property(member, options)
        }
    }
}

/// Resolve a member of the collection at `link` and read it unless
/// resolution already did.
async fn fetch_member<C: HttpClient>(
    t: &mut Transport<C>,
    link: &str,
    selection: &Selection,
    level2: bool,
) -> Result<Response, Error> {
    let members = t.send(get(link)).await?;
    let resolved = if level2 {
        t.resolve_level2(&members, selection).await?
    } else {
        t.resolve(&members, selection).await?
    };
    match resolved.response {
        Some(member) => Ok(member),
        None => {
            let request = Request::get(ApiClass::AuthenticatedNoCreds)
                .base(members.url.clone())
                .path(resolved.path.as_str());
            Ok(t.send(request).await?)
        }
    }
}

fn with_property(response: Response, options: &Options) -> Result<Output, Error> {
    match &options.prop {
        Some(prop) => Ok(filter_property(response, prop)?.into()),
        None => Ok(response.into()),
    }
}

/// Link named `name` in the service root.
async fn root_link<C: HttpClient>(t: &mut Transport<C>, name: &str) -> Result<String, Error> {
    let root = t.service_root(None).await?;
    Ok(link_of(&root, name)?)
}

async fn sessions_link<C: HttpClient>(t: &mut Transport<C>) -> Result<String, Error> {
    let link = root_link(t, "SessionService").await?;
    let service = t.send(get(&link)).await?;
    Ok(link_of(&service, "Sessions")?)
}

fn link_of(response: &Response, name: &str) -> Result<String, CoreError> {
    response
        .require_json()?
        .get(name)
        .and_then(|v| v.get(ODATA_ID))
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| CoreError::MissingProperty {
            resource: response.url.path().to_string(),
            property: format!("{name}.{ODATA_ID}"),
        })
}

fn get(path: &str) -> Request {
    Request::get(ApiClass::AuthenticatedNoCreds).path(path)
}

fn parse_json(data: &str) -> Result<JsonValue, CoreError> {
    serde_json::from_str(data).map_err(|source| CoreError::Json {
        context: "command-line data".into(),
        source,
    })
}
