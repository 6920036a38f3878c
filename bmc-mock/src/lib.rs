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

//! Scripted [`HttpClient`] for tests.
//!
//! Expectations are answered strictly in order. Every request is recorded,
//! matched or not, so tests can assert on outgoing headers.

pub mod expect;

#[doc(inline)]
pub use expect::Expect;
pub use expect::ExpectedRequest;
pub use expect::MockResponse;

use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::Method;
use redfishtool_core::FailureKind;
use redfishtool_core::HttpClient;
use redfishtool_core::HttpRequest;
use redfishtool_core::HttpResponse;
use redfishtool_core::TransportFailure;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Mutex;
use std::sync::PoisonError;
use url::Url;

#[derive(Debug)]
pub enum Error {
    MutexLock(String),
    NothingIsExpected(Method, Url),
    Unexpected {
        method: Method,
        url: Url,
        body: Option<String>,
        expected: ExpectedRequest,
    },
    BadHeader(String),
    /// Failure injected by an expectation.
    Injected(FailureKind),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::MutexLock(err) => write!(f, "lock error: {err}"),
            Self::NothingIsExpected(method, url) => {
                write!(f, "nothing is expected to happen but got {method} {url}")
            }
            Self::Unexpected {
                method,
                url,
                body,
                expected,
            } => write!(
                f,
                "unexpected request: {method} {url}; body: {body:?}; expected: {expected:?}"
            ),
            Self::BadHeader(name) => write!(f, "bad mock response header: {name}"),
            Self::Injected(kind) => write!(f, "injected failure: {kind}"),
        }
    }
}

impl StdError for Error {}

impl TransportFailure for Error {
    fn failure(&self) -> FailureKind {
        match self {
            Self::Injected(kind) => *kind,
            _ => FailureKind::Other,
        }
    }
}

impl Error {
    pub fn mutex_lock<T>(err: PoisonError<T>) -> Self {
        Self::MutexLock(err.to_string())
    }
}

#[derive(Default)]
pub struct Bmc {
    expect: Mutex<VecDeque<Expect>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Bmc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock answering `expectations` in order.
    #[must_use]
    pub fn with(expectations: impl IntoIterator<Item = Expect>) -> Self {
        let bmc = Self::new();
        for exp in expectations {
            bmc.expect(exp);
        }
        bmc
    }

    /// Queue one more expectation.
    pub fn expect(&self, exp: Expect) {
        self.expect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(exp);
    }

    /// Expectations not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.expect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn debug_expect(&self) {
        let expect = self.expect.lock().unwrap_or_else(PoisonError::into_inner);
        println!("Expectations (total: {})", expect.len());
        for v in expect.iter() {
            println!("{:#?}", v.request);
        }
    }
}

fn response_headers(headers: &[(String, String)]) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::try_from(name.as_str()).map_err(|_| Error::BadHeader(name.clone()))?;
        let value =
            HeaderValue::try_from(value.as_str()).map_err(|_| Error::BadHeader(name.to_string()))?;
        map.append(name, value);
    }
    Ok(map)
}

impl HttpClient for Bmc {
    type Error = Error;

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests
            .lock()
            .map_err(Error::mutex_lock)?
            .push(request.clone());
        let expect = self
            .expect
            .lock()
            .map_err(Error::mutex_lock)?
            .pop_front()
            .ok_or_else(|| Error::NothingIsExpected(request.method.clone(), request.url.clone()))?;
        if !expect
            .request
            .matches(&request.method, &request.url, request.body.as_deref())
        {
            return Err(Error::Unexpected {
                method: request.method,
                url: request.url,
                body: request.body,
                expected: expect.request,
            });
        }
        match expect.response {
            MockResponse::Reply {
                status,
                headers,
                body,
                url,
            } => Ok(HttpResponse {
                url: url.unwrap_or(request.url),
                status,
                headers: response_headers(&headers)?,
                body,
            }),
            MockResponse::Fail(kind) => Err(Error::Injected(kind)),
        }
    }
}
