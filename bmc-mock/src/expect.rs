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

//! Expectations for Bmc Mock.

use http::Method;
use http::StatusCode;
use redfishtool_core::FailureKind;
use serde_json::from_str;
use serde_json::Value as JsonValue;
use std::fmt::Display;
use url::Url;

/// Request expected by BMC.
#[derive(Debug, Clone)]
pub struct ExpectedRequest {
    pub method: Method,
    /// Path of the request URL, without query.
    pub path: String,
    /// Expected JSON body. `None` accepts any body.
    pub body: Option<String>,
}

impl ExpectedRequest {
    /// True if a request with these parts satisfies the expectation.
    #[must_use]
    pub fn matches(&self, method: &Method, url: &Url, body: Option<&str>) -> bool {
        self.method == *method && self.path == url.path() && self.body_matches(body)
    }

    fn body_matches(&self, body: Option<&str>) -> bool {
        match (&self.body, body) {
            (None, _) => true,
            (Some(expected), Some(actual)) => {
                match (from_str::<JsonValue>(expected), from_str::<JsonValue>(actual)) {
                    (Ok(expected), Ok(actual)) => expected == actual,
                    _ => expected == actual,
                }
            }
            (Some(_), None) => false,
        }
    }
}

/// What the BMC answers.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply {
        status: StatusCode,
        headers: Vec<(String, String)>,
        body: String,
        /// URL the response claims to come from, e.g. after a redirect.
        url: Option<Url>,
    },
    /// Transport failure of the given class.
    Fail(FailureKind),
}

/// Expectation for the tests.
#[derive(Debug, Clone)]
pub struct Expect {
    pub request: ExpectedRequest,
    pub response: MockResponse,
}

impl Expect {
    fn new(method: Method, uri: impl Display, status: StatusCode, body: String) -> Self {
        Self {
            request: ExpectedRequest {
                method,
                path: uri.to_string(),
                body: None,
            },
            response: MockResponse::Reply {
                status,
                headers: Vec::new(),
                body,
                url: None,
            },
        }
    }

    /// `GET uri` answered with `200` and a JSON body.
    pub fn get(uri: impl Display, response: impl Display) -> Self {
        Self::new(Method::GET, uri, StatusCode::OK, response.to_string())
    }

    /// `PATCH uri` with `request` as body.
    pub fn patch(
        uri: impl Display,
        request: impl Display,
        status: StatusCode,
        response: impl Display,
    ) -> Self {
        Self::new(Method::PATCH, uri, status, response.to_string()).with_body(request)
    }

    /// `POST uri` with `request` as body.
    pub fn post(
        uri: impl Display,
        request: impl Display,
        status: StatusCode,
        response: impl Display,
    ) -> Self {
        Self::new(Method::POST, uri, status, response.to_string()).with_body(request)
    }

    /// `DELETE uri` answered with `204`.
    pub fn delete(uri: impl Display) -> Self {
        Self::new(Method::DELETE, uri, StatusCode::NO_CONTENT, String::new())
    }

    /// Any request answered with `status` and an empty body.
    pub fn status(method: Method, uri: impl Display, status: StatusCode) -> Self {
        Self::new(method, uri, status, String::new())
    }

    /// Any request answered with a transport failure.
    pub fn fail(method: Method, uri: impl Display, kind: FailureKind) -> Self {
        Self {
            request: ExpectedRequest {
                method,
                path: uri.to_string(),
                body: None,
            },
            response: MockResponse::Fail(kind),
        }
    }

    #[must_use]
    pub fn with_body(mut self, request: impl Display) -> Self {
        self.request.body = Some(request.to_string());
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn header(mut self, name: impl Display, value: impl Display) -> Self {
        if let MockResponse::Reply { headers, .. } = &mut self.response {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Answer as if the response came from `url`.
    #[must_use]
    pub fn served_from(mut self, served: Url) -> Self {
        if let MockResponse::Reply { url, .. } = &mut self.response {
            *url = Some(served);
        }
        self
    }
}
