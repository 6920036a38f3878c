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
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use redfishtool_core::transport::MAX_NEXT_LINKS;
use redfishtool_core::ApiClass;
use redfishtool_core::AuthMode;
use redfishtool_core::Body;
use redfishtool_core::Error as CoreError;
use redfishtool_core::Request;
use redfishtool_core::RequestAuth;
use redfishtool_core::SecurePolicy;
use redfishtool_tests::base::context;
use redfishtool_tests::base::expect_login;
use redfishtool_tests::base::expect_root;
use redfishtool_tests::base::get;
use redfishtool_tests::base::system;
use redfishtool_tests::base::system_path;
use redfishtool_tests::base::transport;
use redfishtool_tests::base::SESSIONS;
use redfishtool_tests::base::SYSTEMS;
use redfishtool_tests::base::TOKEN;
use redfishtool_tests::Error;
use redfishtool_tests::Expect;
use redfishtool_tests::ODATA_ID;
use serde_json::json;
use serde_json::Value as JsonValue;
use tokio::test;
use url::Url;

fn page(ids: &[&str], next: Option<&str>) -> JsonValue {
    let mut v = json!({
        ODATA_ID: SYSTEMS,
        "Name": "Computer System Collection",
        "Members@odata.count": 5,
        "Members": ids.iter().map(|id| json!({ODATA_ID: system_path(id)})).collect::<Vec<_>>(),
    });
    if let (Some(next), Some(map)) = (next, v.as_object_mut()) {
        map.insert("Members@odata.nextLink".into(), json!(next));
    }
    v
}

fn member_ids(body: &JsonValue) -> Vec<String> {
    body["Members"]
        .as_array()
        .map(|m| {
            m.iter()
                .filter_map(|m| m[ODATA_ID].as_str())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// Three chained pages become one Members array in page order.
#[test]
async fn pagination_concatenates_pages() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            Expect::get(SYSTEMS, page(&["1", "2"], Some("/redfish/v1/Systems?$skip=2"))),
            Expect::get(SYSTEMS, page(&["3"], Some("/redfish/v1/Systems?$skip=3"))),
            Expect::get(SYSTEMS, page(&["4", "5"], None)),
        ],
    );
    let response = t.send(get("Systems")).await?;
    let body = response.require_json()?;
    assert_eq!(
        member_ids(body),
        ["1", "2", "3", "4", "5"].map(system_path).to_vec()
    );
    assert!(body.get("Members@odata.nextLink").is_none());
    assert_eq!(body["Members@odata.count"], json!(5));

    let requests = t.client().requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].url.query(), Some("$skip=2"));
    assert_eq!(requests[2].url.query(), Some("$skip=3"));
    Ok(())
}

// A follow-up page without Members fails the whole read.
#[test]
async fn pagination_rejects_page_without_members() {
    let mut t = transport(
        context(),
        [
            Expect::get(SYSTEMS, page(&["1"], Some("/redfish/v1/Systems?$skip=1"))),
            Expect::get(SYSTEMS, json!({"error": {"code": "Base.1.0.GeneralError"}})),
        ],
    );
    let err = t.send(get("Systems")).await.unwrap_err();
    assert!(matches!(err, CoreError::NoMembers { .. }));
    assert_eq!(err.exit_code(), 4);
    assert_eq!(t.client().requests().len(), 2);
}

// Pagination stops after MAX_NEXT_LINKS extra pages and keeps the link
// that was not followed.
#[test]
async fn pagination_is_bounded() -> Result<(), Error> {
    let pages = (0..=MAX_NEXT_LINKS + 1).map(|i| {
        let id = i.to_string();
        let next = format!("/redfish/v1/Systems?$skip={}", i + 1);
        Expect::get(SYSTEMS, page(&[id.as_str()], Some(&next)))
    });
    let mut t = transport(context(), pages);
    let response = t.send(get("Systems")).await?;
    let body = response.require_json()?;
    assert_eq!(member_ids(body).len(), MAX_NEXT_LINKS + 1);
    assert_eq!(
        body["Members@odata.nextLink"],
        json!(format!("/redfish/v1/Systems?$skip={}", MAX_NEXT_LINKS + 1))
    );
    assert_eq!(t.client().requests().len(), MAX_NEXT_LINKS + 1);
    assert_eq!(t.client().remaining(), 1);
    Ok(())
}

// Once a response comes from https, later calls based on it stay on
// https even if the policy asks for http.
#[test]
async fn scheme_never_downgrades() -> Result<(), Error> {
    let secure = Url::parse("https://bmc.test/redfish/v1/Systems").unwrap();
    let mut t = transport(
        context().with_secure(SecurePolicy::Never),
        [
            Expect::get(SYSTEMS, page(&["1"], None)).served_from(secure),
            Expect::get(system_path("1"), system("1", &json!({}))),
            Expect::get(system_path("1"), system("1", &json!({}))),
        ],
    );
    let collection = t.send(get("Systems")).await?;
    assert_eq!(collection.url.scheme(), "https");

    let member = t
        .send(
            Request::get(ApiClass::AuthenticatedNoCreds)
                .base(collection.url.clone())
                .path(system_path("1")),
        )
        .await?;
    assert_eq!(member.url.scheme(), "https");

    // An absolute http link is upgraded as well.
    t.send(
        Request::get(ApiClass::AuthenticatedNoCreds)
            .base(member.url.clone())
            .path("http://bmc.test/redfish/v1/Systems/1"),
    )
    .await?;

    let requests = t.client().requests();
    assert_eq!(requests[0].url.scheme(), "http");
    assert_eq!(requests[1].url.scheme(), "https");
    assert_eq!(requests[2].url.as_str(), "https://bmc.test/redfish/v1/Systems/1");
    Ok(())
}

// IfSendingCredentials protects only calls that carry credentials.
#[test]
async fn secure_policy_by_api_class() -> Result<(), Error> {
    let mut t = transport(
        context()
            .with_auth(AuthMode::Session)
            .with_secure(SecurePolicy::IfSendingCredentials),
        [expect_root(), expect_login("1"), Expect::get(SYSTEMS, page(&[], None))],
    );
    t.send(get("Systems")).await?;
    let schemes: Vec<_> = t
        .client()
        .requests()
        .iter()
        .map(|r| r.url.scheme().to_string())
        .collect();
    assert_eq!(schemes, ["http", "https", "http"]);
    Ok(())
}

// Defaults, per-call headers and -H headers are layered in this order.
#[test]
async fn headers_are_layered() -> Result<(), Error> {
    let mut extra = HeaderMap::new();
    extra.insert(header::ACCEPT, HeaderValue::from_static("application/json;charset=utf-8"));
    extra.insert("x-trace", HeaderValue::from_static("1"));
    let mut t = transport(
        context().with_extra_headers(extra),
        [
            Expect::get(SYSTEMS, page(&[], None)),
            Expect::post(SYSTEMS, json!({"Name": "x"}), StatusCode::CREATED, ""),
        ],
    );
    t.send(get("Systems").header(header::ACCEPT, HeaderValue::from_static("text/plain")))
        .await?;
    let created = t
        .send(
            Request::new(ApiClass::AuthenticatedNoCreds, Method::POST)
                .path("Systems")
                .json_body(&json!({"Name": "x"})),
        )
        .await?;
    assert_eq!(created.body, Body::Empty);

    let requests = t.client().requests();
    let get_headers = &requests[0].headers;
    assert_eq!(get_headers["odata-version"], "4.0");
    assert_eq!(get_headers[header::ACCEPT], "application/json;charset=utf-8");
    assert_eq!(get_headers["x-trace"], "1");
    assert!(get_headers.get(header::CONTENT_TYPE).is_none());
    assert_eq!(requests[1].headers[header::CONTENT_TYPE], "application/json");
    Ok(())
}

// Error statuses keep their body and map to the HTTP exit code.
#[test]
async fn error_status_is_reported() {
    let mut t = transport(
        context(),
        [Expect::status(Method::GET, system_path("9"), StatusCode::NOT_FOUND)],
    );
    let err = t.send(get(&system_path("9"))).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("status_code: 404 -- Not Found"));
}

// A missing property is a malformed response.
#[test]
async fn property_filter() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [
            Expect::get(system_path("1"), system("1", &json!({"PowerState": "On"}))),
            Expect::get(system_path("1"), system("1", &json!({}))),
        ],
    );
    let r = t.send(get(&system_path("1")).property("PowerState")).await?;
    assert_eq!(r.json(), Some(&json!({"PowerState": "On"})));
    let err = t
        .send(get(&system_path("1")).property("PowerState"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingProperty { .. }));
    Ok(())
}

// With session auth and no token, the first authenticated call logs in
// once; the token is reused afterwards.
#[test]
async fn session_auth_logs_in_once() -> Result<(), Error> {
    let mut t = transport(
        context().with_auth(AuthMode::Session),
        [
            expect_root(),
            expect_login("1"),
            Expect::get(SYSTEMS, page(&[], None)),
            Expect::get(SYSTEMS, page(&[], None)),
        ],
    );
    t.send(get("Systems")).await?;
    t.send(get("Systems")).await?;

    let requests = t.client().requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.method == Method::POST && r.url.path() == SESSIONS)
            .count(),
        1
    );
    assert!(matches!(requests[0].auth, RequestAuth::None));
    assert!(matches!(requests[1].auth, RequestAuth::None));
    for r in &requests[2..] {
        assert!(matches!(&r.auth, RequestAuth::Token(token) if token == TOKEN));
    }
    let session = t
        .context()
        .session()
        .active()
        .ok_or(Error::ExpectedProperty("session"))?;
    assert!(session.cleanup_on_exit);
    Ok(())
}

// A 401 with a cached token is final: no second login.
#[test]
async fn expired_token_is_not_renewed() {
    let mut t = transport(
        context().with_auth(AuthMode::Session).with_token("stale"),
        [Expect::status(Method::GET, SYSTEMS, StatusCode::UNAUTHORIZED)],
    );
    let err = t.send(get("Systems")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    let requests = t.client().requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(&requests[0].auth, RequestAuth::Token(token) if token == "stale"));
}

// Basic auth attaches credentials only to authenticated calls.
#[test]
async fn basic_auth_only_when_authenticated() -> Result<(), Error> {
    let mut t = transport(
        context(),
        [expect_root(), Expect::get(SYSTEMS, page(&[], None))],
    );
    t.service_root(None).await?;
    t.send(get("Systems")).await?;
    let requests = t.client().requests();
    assert!(matches!(requests[0].auth, RequestAuth::None));
    assert!(matches!(&requests[1].auth, RequestAuth::Basic(c) if c.username == "root"));
    Ok(())
}

// Redirects are reported, not followed.
#[test]
async fn redirect_is_an_error() {
    let mut t = transport(
        context(),
        [Expect::status(Method::GET, SYSTEMS, StatusCode::FOUND).header("Location", "/login")],
    );
    let err = t.send(get("Systems")).await.unwrap_err();
    assert!(matches!(err, CoreError::Redirect { location: Some(ref l), .. } if l == "/login"));
    assert_eq!(err.exit_code(), 5);
}
