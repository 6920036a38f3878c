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

use crate::Bmc;
use crate::Expect;
use crate::Transport;
use crate::ODATA_ID;
use crate::ODATA_TYPE;
use http::StatusCode;
use redfishtool_core::ApiClass;
use redfishtool_core::ConnectionContext;
use redfishtool_core::Credentials;
use redfishtool_core::Request;
use redfishtool_core::SecurePolicy;
use serde_json::json;
use serde_json::Value as JsonValue;
use std::time::Duration;

pub const HOST: &str = "bmc.test";
pub const REDFISH: &str = "/redfish";
pub const ROOT: &str = "/redfish/v1/";
pub const SYSTEMS: &str = "/redfish/v1/Systems";
pub const SESSIONS: &str = "/redfish/v1/SessionService/Sessions";
pub const TOKEN: &str = "b8f7e1a2";

pub fn credentials() -> Credentials {
    Credentials::new("root".into(), "calvin".into())
}

/// Plain-http context with basic auth and no discovery retry delay.
pub fn context() -> ConnectionContext {
    ConnectionContext::new(HOST)
        .with_credentials(credentials())
        .with_secure(SecurePolicy::Never)
        .with_wait(1, Duration::ZERO)
}

pub fn transport(ctx: ConnectionContext, expectations: impl IntoIterator<Item = Expect>) -> Transport {
    Transport::new(Bmc::with(expectations), ctx)
}

pub fn get(path: &str) -> Request {
    Request::get(ApiClass::AuthenticatedNoCreds).path(path)
}

pub fn system_path(id: &str) -> String {
    format!("{SYSTEMS}/{id}")
}

pub fn system(id: &str, extra: &JsonValue) -> JsonValue {
    let mut v = json!({
        ODATA_ID: system_path(id),
        ODATA_TYPE: "#ComputerSystem.v1_5_0.ComputerSystem",
        "Id": id,
        "Name": format!("System {id}"),
    });
    if let (Some(v), Some(extra)) = (v.as_object_mut(), extra.as_object()) {
        for (k, x) in extra {
            v.insert(k.clone(), x.clone());
        }
    }
    v
}

/// Collection with the given member paths.
pub fn collection(path: &str, members: &[String]) -> JsonValue {
    json!({
        ODATA_ID: path,
        "Name": "Computer System Collection",
        "Members@odata.count": members.len(),
        "Members": members.iter().map(|m| json!({ODATA_ID: m})).collect::<Vec<_>>(),
    })
}

pub fn system_paths(count: usize) -> Vec<String> {
    (1..=count).map(|i| system_path(&i.to_string())).collect()
}

pub fn expect_versions() -> Expect {
    Expect::get(REDFISH, json!({"v1": ROOT}))
}

pub fn service_root() -> JsonValue {
    json!({
        ODATA_ID: ROOT,
        ODATA_TYPE: "#ServiceRoot.v1_0_0.ServiceRoot",
        "Id": "RootService",
        "Systems": {ODATA_ID: SYSTEMS},
        "Links": {"Sessions": {ODATA_ID: SESSIONS}},
    })
}

pub fn expect_root() -> Expect {
    Expect::get(ROOT, service_root())
}

/// Session creation answered with `TOKEN` and session `id`.
pub fn expect_login(id: &str) -> Expect {
    let link = format!("{SESSIONS}/{id}");
    Expect::post(
        SESSIONS,
        json!({"UserName": "root", "Password": "calvin"}),
        StatusCode::CREATED,
        json!({ODATA_ID: &link, "Id": id, "UserName": "root"}),
    )
    .header("X-Auth-Token", TOKEN)
    .header("Location", link)
}
