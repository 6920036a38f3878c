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

use clap::Parser as _;
use http::Method;
use http::StatusCode;
use redfishtool::commands::run;
use redfishtool::Cli;
use redfishtool::Error;
use redfishtool::Output;
use redfishtool_core::AuthMode;
use redfishtool_core::Error as CoreError;
use redfishtool_core::RequestAuth;
use redfishtool_tests::base::collection;
use redfishtool_tests::base::context;
use redfishtool_tests::base::expect_login;
use redfishtool_tests::base::expect_versions;
use redfishtool_tests::base::system;
use redfishtool_tests::base::system_path;
use redfishtool_tests::base::system_paths;
use redfishtool_tests::base::transport;
use redfishtool_tests::base::ROOT;
use redfishtool_tests::base::SESSIONS;
use redfishtool_tests::base::SYSTEMS;
use redfishtool_tests::base::TOKEN;
use redfishtool_tests::Expect;
use redfishtool_tests::Transport;
use redfishtool_tests::ODATA_ID;
use serde_json::json;
use serde_json::Value as JsonValue;
use std::iter;
use tokio::test;

const SESSION_SERVICE: &str = "/redfish/v1/SessionService";
const ACCOUNT_SERVICE: &str = "/redfish/v1/AccountService";
const ACCOUNTS: &str = "/redfish/v1/AccountService/Accounts";

fn root() -> JsonValue {
    json!({
        ODATA_ID: ROOT,
        "Systems": {ODATA_ID: SYSTEMS},
        "SessionService": {ODATA_ID: SESSION_SERVICE},
        "AccountService": {ODATA_ID: ACCOUNT_SERVICE},
        "Links": {"Sessions": {ODATA_ID: SESSIONS}},
    })
}

fn expect_root() -> Expect {
    Expect::get(ROOT, root())
}

fn expect_systems(count: usize) -> Expect {
    Expect::get(SYSTEMS, collection(SYSTEMS, &system_paths(count)))
}

fn expect_session_service() -> Expect {
    Expect::get(
        SESSION_SERVICE,
        json!({ODATA_ID: SESSION_SERVICE, "Sessions": {ODATA_ID: SESSIONS}}),
    )
}

async fn redfishtool(t: &mut Transport, args: &[&str]) -> Result<Output, Error> {
    let cli = Cli::try_parse_from(iter::once("redfishtool").chain(args.iter().copied()))
        .map_err(|e| Error::Usage(e.to_string()))?;
    cli.options.validate()?;
    run(t, &cli.options, &cli.command).await
}

fn json_output(output: Output) -> JsonValue {
    match output {
        Output::Json(v) => v,
        other => panic!("expected JSON output, got {other:?}"),
    }
}

// `-I` selects the member by Id and the member read during the scan is
// the result.
#[test]
async fn get_member_by_id() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(3),
            Expect::get(system_path("1"), system("1", &json!({}))),
            Expect::get(system_path("2"), system("2", &json!({"PowerState": "On"}))),
        ],
    );
    let output = redfishtool(&mut t, &["Systems", "-I", "2", "get"]).await?;
    assert_eq!(json_output(output)["PowerState"], json!("On"));
    assert_eq!(t.client().remaining(), 0);
    Ok(())
}

// A selector without an operation means get; -P narrows the result.
#[test]
async fn selector_implies_get() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(2),
            Expect::get(system_path("1"), system("1", &json!({"AssetTag": "rack-7"}))),
        ],
    );
    let output = redfishtool(&mut t, &["-F", "-P", "AssetTag", "Systems"]).await?;
    assert_eq!(output, Output::Json(json!({"AssetTag": "rack-7"})));
    Ok(())
}

// Without selector and operation the collection itself is returned;
// -a expands it.
#[test]
async fn collection_and_expanded_collection() -> Result<(), Error> {
    let mut t = transport(context(), [expect_root(), expect_systems(2)]);
    let output = json_output(redfishtool(&mut t, &["Systems"]).await?);
    assert_eq!(output["Members@odata.count"], json!(2));

    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(2),
            Expect::get(system_path("1"), system("1", &json!({}))),
            Expect::get(system_path("2"), system("2", &json!({}))),
        ],
    );
    let output = json_output(redfishtool(&mut t, &["Systems", "-a"]).await?);
    assert_eq!(output["Members"][1]["Id"], json!("2"));
    Ok(())
}

// list reports Id, link and AssetTag of every system.
#[test]
async fn list_systems() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(1),
            Expect::get(system_path("1"), system("1", &json!({"AssetTag": "a"}))),
        ],
    );
    let output = json_output(redfishtool(&mut t, &["Systems", "list"]).await?);
    assert_eq!(
        output["Members"],
        json!([{"Id": "1", ODATA_ID: system_path("1"), "AssetTag": "a"}])
    );
    Ok(())
}

// Member operations without a selector are usage errors.
#[test]
async fn member_operation_requires_selector() {
    let mut t = transport(context(), [expect_root()]);
    let err = redfishtool(&mut t, &["Systems", "patch", r#"{"AssetTag": "x"}"#])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(err.exit_code(), 1);
}

// Conflicting selectors fail before any request.
#[test]
async fn conflicting_selectors_send_nothing() {
    let mut t = transport(context(), []);
    let err = redfishtool(&mut t, &["-I", "1", "-1", "Systems", "get"])
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(t.client().requests().is_empty());
}

// Patch data must be JSON; nothing but the service root is read.
#[test]
async fn patch_with_invalid_json() {
    let mut t = transport(context(), [expect_root()]);
    let err = redfishtool(&mut t, &["Systems", "-1", "patch", "{AssetTag"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::Json { .. })));
    assert_eq!(err.exit_code(), 6);
    assert_eq!(t.client().requests().len(), 1);
}

// patch sends the data to the selected system.
#[test]
async fn patch_member() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(1),
            Expect::get(system_path("1"), system("1", &json!({"AssetTag": "old"}))),
            Expect::patch(
                system_path("1"),
                json!({"AssetTag": "new"}),
                StatusCode::OK,
                system("1", &json!({"AssetTag": "new"})),
            ),
        ],
    );
    let output = redfishtool(&mut t, &["Systems", "-1", "patch", r#"{"AssetTag": "new"}"#])
        .await?;
    assert_eq!(json_output(output)["AssetTag"], json!("new"));
    Ok(())
}

// An unknown reset type is rejected before the member is read.
#[test]
async fn reset_type_is_validated() {
    let mut t = transport(context(), [expect_root()]);
    let err = redfishtool(&mut t, &["Systems", "-F", "reset", "Reboot"])
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 8);
    assert_eq!(t.client().requests().len(), 1);
}

// reset posts the reset type to the action target.
#[test]
async fn reset_member() -> Result<(), Error> {
    let target = format!("{}/Actions/ComputerSystem.Reset", system_path("1"));
    let actions = json!({
        "Actions": {"#ComputerSystem.Reset": {
            "target": &target,
            "ResetType@Redfish.AllowableValues": ["On", "GracefulRestart"],
        }}
    });
    let mut t = transport(
        context(),
        [
            expect_root(),
            expect_systems(2),
            Expect::get(system_path("1"), system("1", &actions)),
            Expect::post(
                &target,
                json!({"ResetType": "GracefulRestart"}),
                StatusCode::NO_CONTENT,
                "",
            ),
        ],
    );
    let output = redfishtool(&mut t, &["Systems", "-F", "reset", "GracefulRestart"]).await?;
    assert_eq!(output, Output::Empty);
    assert_eq!(t.client().remaining(), 0);
    Ok(())
}

// login reports the session and leaves it in place.
#[test]
async fn session_login() -> Result<(), Error> {
    let mut t = transport(
        context().with_auth(AuthMode::Session),
        [expect_root(), expect_login("4")],
    );
    let output = json_output(redfishtool(&mut t, &["SessionService", "login"]).await?);
    assert_eq!(
        output,
        json!({
            "SessionId": "4",
            "SessionLocation": format!("{SESSIONS}/4"),
            "X-Auth-Token": TOKEN,
        })
    );
    t.cleanup().await?;
    assert_eq!(t.client().requests().len(), 2);
    Ok(())
}

// logout -i finds the session in the Sessions collection and deletes it
// with the given token.
#[test]
async fn session_logout_by_id() -> Result<(), Error> {
    let session = format!("{SESSIONS}/4");
    let mut t = transport(
        context().with_auth(AuthMode::Session).with_token(TOKEN),
        [
            expect_root(),
            expect_session_service(),
            Expect::get(SESSIONS, collection(SESSIONS, &[session.clone()])),
            Expect::get(&session, json!({ODATA_ID: &session, "Id": "4"})),
            Expect::delete(&session),
        ],
    );
    let output = redfishtool(&mut t, &["SessionService", "-i", "4", "logout"]).await?;
    assert_eq!(output, Output::Empty);
    let requests = t.client().requests();
    let delete = &requests[4];
    assert_eq!(delete.method, Method::DELETE);
    assert!(matches!(&delete.auth, RequestAuth::Token(token) if token == TOKEN));
    Ok(())
}

// logout needs to know which session.
#[test]
async fn session_logout_requires_session() {
    let mut t = transport(context().with_auth(AuthMode::Session), []);
    let err = redfishtool(&mut t, &["SessionService", "logout"])
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

// Second-level match over the accounts collection.
#[test]
async fn account_by_user_name() -> Result<(), Error> {
    let accounts = [format!("{ACCOUNTS}/1"), format!("{ACCOUNTS}/2")];
    let mut t = transport(
        context(),
        [
            expect_root(),
            Expect::get(
                ACCOUNT_SERVICE,
                json!({ODATA_ID: ACCOUNT_SERVICE, "Accounts": {ODATA_ID: ACCOUNTS}}),
            ),
            Expect::get(ACCOUNTS, collection(ACCOUNTS, &accounts)),
            Expect::get(
                &accounts[0],
                json!({ODATA_ID: &accounts[0], "Id": "1", "UserName": "root"}),
            ),
            Expect::get(
                &accounts[1],
                json!({ODATA_ID: &accounts[1], "Id": "2", "UserName": "ops"}),
            ),
        ],
    );
    let output = redfishtool(&mut t, &["AccountService", "-m", "UserName:ops", "Accounts"]).await?;
    assert_eq!(json_output(output)["Id"], json!("2"));
    Ok(())
}

// A service root without the link is a malformed response.
#[test]
async fn missing_service_link() {
    let mut t = transport(context(), [Expect::get(ROOT, json!({ODATA_ID: ROOT}))]);
    let err = redfishtool(&mut t, &["AccountService"]).await.unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::MissingProperty { .. })));
    assert_eq!(err.exit_code(), 4);
}

// versions always asks the service.
#[test]
async fn versions() -> Result<(), Error> {
    let mut t = transport(context(), [expect_versions()]);
    let output = json_output(redfishtool(&mut t, &["versions"]).await?);
    assert_eq!(output["ClientSupported"], json!(["v1"]));
    assert_eq!(output["ServiceSupported"], json!(["v1"]));
    assert_eq!(output["Negotiated"], json!("v1"));
    Ok(())
}

// metadata is printed as the service returns it.
#[test]
async fn metadata_is_text() -> Result<(), Error> {
    let xml = r#"<edmx:Edmx Version="4.0"/>"#;
    let mut t = transport(context(), [Expect::get("/redfish/v1/$metadata", xml)]);
    let output = redfishtool(&mut t, &["metadata"]).await?;
    assert_eq!(output, Output::Text(xml.to_string()));
    Ok(())
}

// raw sends any method to any path.
#[test]
async fn raw_requests() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            Expect::get(system_path("1"), system("1", &json!({"PowerState": "Off"}))),
            Expect::post(SYSTEMS, json!({"Name": "x"}), StatusCode::CREATED, ""),
        ],
    );
    let output = redfishtool(&mut t, &["-P", "PowerState", "raw", "get", "Systems/1"]).await?;
    assert_eq!(output, Output::Json(json!({"PowerState": "Off"})));
    let output = redfishtool(&mut t, &["raw", "POST", "Systems", "-d", r#"{"Name": "x"}"#]).await?;
    assert_eq!(output, Output::Empty);

    let err = redfishtool(&mut t, &["raw", "G T", "Systems"]).await.unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    Ok(())
}
