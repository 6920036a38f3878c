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

//! Transport and resource-resolution engine of redfishtool.
//!
//! A [`Transport`] owns an [`HttpClient`] and a [`ConnectionContext`].
//! Commands call, in this order, [`Transport::negotiate`] (implicitly on
//! first use), [`Transport::send`], and the operations built on top of
//! it: [`Transport::resolve`], [`Transport::patch`],
//! [`Transport::login`] / [`Transport::logout`], and finally
//! [`Transport::cleanup`].

/// Redfish actions and allowable values.
pub mod action;
/// Collection member resolution.
pub mod collection;
/// Connection context and session state.
pub mod context;
/// Credentials.
pub mod credentials;
/// Engine errors and exit codes.
pub mod error;
/// HTTP client seam.
pub mod http;
/// OData identifiers.
pub mod odata;
/// Conditional update.
pub mod patch;
/// Scheme selection.
pub mod scheme;
/// Service root and sessions.
pub mod session;
/// Request executor.
pub mod transport;
/// Protocol version negotiation.
pub mod version;

#[doc(inline)]
pub use action::AllowableValues;
#[doc(inline)]
pub use collection::Resolved;
#[doc(inline)]
pub use collection::Selection;
#[doc(inline)]
pub use context::ConnectionContext;
#[doc(inline)]
pub use context::RootInfo;
#[doc(inline)]
pub use context::Session;
#[doc(inline)]
pub use context::SessionState;
#[doc(inline)]
pub use credentials::Credentials;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use crate::http::FailureKind;
#[doc(inline)]
pub use crate::http::HttpClient;
#[doc(inline)]
pub use crate::http::HttpRequest;
#[doc(inline)]
pub use crate::http::HttpResponse;
#[doc(inline)]
pub use crate::http::RequestAuth;
#[doc(inline)]
pub use crate::http::TransportFailure;
#[doc(inline)]
pub use odata::ODataETag;
#[doc(inline)]
pub use odata::ODataId;
#[doc(inline)]
pub use odata::ODataType;
#[doc(inline)]
pub use patch::PatchOptions;
#[doc(inline)]
pub use scheme::ApiClass;
#[doc(inline)]
pub use scheme::AuthMode;
#[doc(inline)]
pub use scheme::Scheme;
#[doc(inline)]
pub use scheme::SecurePolicy;
#[doc(inline)]
pub use transport::Body;
#[doc(inline)]
pub use transport::Request;
#[doc(inline)]
pub use transport::Response;
#[doc(inline)]
pub use transport::Transport;
