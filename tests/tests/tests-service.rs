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

use http::header;
use http::Method;
use http::StatusCode;
use redfishtool_core::AllowableValues;
use redfishtool_core::Body;
use redfishtool_core::Error as CoreError;
use redfishtool_tests::base::context;
use redfishtool_tests::base::expect_root;
use redfishtool_tests::base::get;
use redfishtool_tests::base::service_root;
use redfishtool_tests::base::transport;
use redfishtool_tests::Error;
use redfishtool_tests::Expect;
use redfishtool_tests::ODATA_ID;
use redfishtool_tests::ODATA_TYPE;
use serde_json::json;
use serde_json::Value as JsonValue;
use tokio::test;

const MANAGER: &str = "/redfish/v1/Managers/BMC";
const RESET_TARGET: &str = "/redfish/v1/Managers/BMC/Actions/Manager.Reset";
const RESET_INFO: &str = "/redfish/v1/Managers/BMC/ResetActionInfo";

fn manager(reset: JsonValue) -> JsonValue {
    json!({
        ODATA_ID: MANAGER,
        ODATA_TYPE: "#Manager.v1_3_1.Manager",
        "Id": "BMC",
        "Actions": {"#Manager.Reset": reset},
    })
}

// The service root is read without authentication and cached.
#[test]
async fn service_root_is_cached() -> Result<(), Error> {
    let mut t = transport(context(), [expect_root()]);
    let root = t.service_root(None).await?;
    assert_eq!(root.json(), Some(&service_root()));
    assert_eq!(t.context().service_root(), Some(&service_root()));
    Ok(())
}

// The metadata document is XML and comes back as text.
#[test]
async fn metadata_is_text() -> Result<(), Error> {
    let xml = r#"<edmx:Edmx Version="4.0"></edmx:Edmx>"#;
    let mut t = transport(
        context(),
        [Expect::status(Method::GET, "/redfish/v1/$metadata", StatusCode::OK)],
    );
    let doc = t.metadata_document().await?;
    assert_eq!(doc.body, Body::Empty);
    let requests = t.client().requests();
    assert_eq!(requests[0].headers[header::ACCEPT], "application/xml");

    let mut t = transport(
        context(),
        [Expect::get("/redfish/v1/$metadata", xml)],
    );
    let doc = t.metadata_document().await?;
    assert_eq!(doc.body, Body::Text(xml.to_string()));
    Ok(())
}

// The OData service document is plain JSON.
#[test]
async fn odata_document() -> Result<(), Error> {
    let odata = json!({"@odata.context": "/redfish/v1/$metadata", "value": []});
    let mut t = transport(context(), [Expect::get("/redfish/v1/odata", &odata)]);
    let doc = t.odata_document().await?;
    assert_eq!(doc.json(), Some(&odata));
    Ok(())
}

// Inline allowable values gate the action POST.
#[test]
async fn reset_with_inline_allowable_values() -> Result<(), Error> {
    let reset = json!({
        "target": RESET_TARGET,
        "ResetType@Redfish.AllowableValues": ["ForceRestart", "GracefulRestart"],
    });
    let mut t = transport(
        context(),
        [
            Expect::get(MANAGER, manager(reset)),
            Expect::post(
                RESET_TARGET,
                json!({"ResetType": "GracefulRestart"}),
                StatusCode::NO_CONTENT,
                "",
            ),
        ],
    );
    let bmc = t.send(get(MANAGER)).await?;
    let done = t
        .invoke_action(&bmc, "Reset", "ResetType", "GracefulRestart")
        .await?;
    assert_eq!(done.status, StatusCode::NO_CONTENT);
    assert_eq!(t.client().requests()[1].method, Method::POST);

    let err = t
        .invoke_action(&bmc, "Reset", "ResetType", "On")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValueNotAllowed { ref allowed, .. } if allowed.len() == 2));
    assert_eq!(err.exit_code(), 8);
    assert_eq!(t.client().requests().len(), 2);
    Ok(())
}

// Allowable values published through ActionInfo are fetched first.
#[test]
async fn reset_with_action_info() -> Result<(), Error> {
    let reset = json!({"target": RESET_TARGET, "@Redfish.ActionInfo": RESET_INFO});
    let info = json!({
        ODATA_ID: RESET_INFO,
        "Parameters": [{"Name": "ResetType", "AllowableValues": ["ForceRestart"]}],
    });
    let mut t = transport(
        context(),
        [
            Expect::get(MANAGER, manager(reset)),
            Expect::get(RESET_INFO, &info),
        ],
    );
    let bmc = t.send(get(MANAGER)).await?;
    let values = t
        .action_allowable_values(&bmc, "Reset", "ResetType")
        .await?;
    assert_eq!(values, AllowableValues::Values(vec!["ForceRestart".into()]));
    Ok(())
}

// No published values means any value is posted.
#[test]
async fn reset_unrestricted() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            Expect::get(MANAGER, manager(json!({"target": RESET_TARGET}))),
            Expect::post(RESET_TARGET, json!({"ResetType": "Nmi"}), StatusCode::OK, "{}"),
        ],
    );
    let bmc = t.send(get(MANAGER)).await?;
    t.invoke_action(&bmc, "Reset", "ResetType", "Nmi").await?;
    Ok(())
}

// A resource without the action cannot be reset.
#[test]
async fn missing_action_is_unsupported() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [Expect::get(MANAGER, json!({ODATA_ID: MANAGER, ODATA_TYPE: "#Manager.v1_3_1.Manager"}))],
    );
    let bmc = t.send(get(MANAGER)).await?;
    let err = t
        .invoke_action(&bmc, "Reset", "ResetType", "On")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unsupported(_)));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}
