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

//! Service root and sessions
//!
//! Login and the reads it depends on (version discovery, service root)
//! never go through authentication resolution, so an authenticated call
//! can log in on demand.

use crate::context::RootInfo;
use crate::context::Session;
use crate::error::Error;
use crate::http::HttpClient;
use crate::http::RequestAuth;
use crate::http::X_AUTH_TOKEN;
use crate::odata::ODATA_ID;
use crate::scheme::ApiClass;
use crate::transport::filter_property;
use crate::transport::Request;
use crate::transport::Response;
use crate::transport::Transport;
use http::header;
use http::HeaderValue;
use http::Method;
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing::info;

impl<C: HttpClient> Transport<C> {
    /// Read the service root and keep it for session login.
    ///
    /// # Errors
    ///
    /// Returns error if negotiation or the GET fails, or `property` is
    /// missing.
    pub async fn service_root(&mut self, property: Option<&str>) -> Result<Response, Error> {
        let root = self.root_uri().await?;
        let request = Request::get(ApiClass::UnauthenticatedNoCreds).base(root);
        let response = self.execute(request, RequestAuth::None).await?;
        self.ctx.set_service_root(response.require_json()?.clone());
        match property {
            Some(property) => filter_property(response, property),
            None => Ok(response),
        }
    }

    /// `<root>odata`: the OData service document.
    ///
    /// # Errors
    ///
    /// Returns error if the GET fails.
    pub async fn odata_document(&mut self) -> Result<Response, Error> {
        let request = Request::get(ApiClass::UnauthenticatedNoCreds).path("odata");
        self.send(request).await
    }

    /// `<root>$metadata`: the CSDL metadata document, as XML text.
    ///
    /// # Errors
    ///
    /// Returns error if the GET fails.
    pub async fn metadata_document(&mut self) -> Result<Response, Error> {
        let request = Request::get(ApiClass::UnauthenticatedNoCreds)
            .path("$metadata")
            .header(header::ACCEPT, HeaderValue::from_static("application/xml"))
            .raw_text();
        self.send(request).await
    }

    /// Forced version discovery.
    ///
    /// # Errors
    ///
    /// Returns error if discovery fails or there is no common version.
    pub async fn versions(&mut self) -> Result<RootInfo, Error> {
        self.negotiate(true).await
    }

    /// Create a session with the configured credentials.
    ///
    /// Sessions created on demand by [`Transport::send`] are deleted by
    /// [`Transport::cleanup`]; sessions created with `cleanup_on_exit`
    /// unset outlive the process.
    ///
    /// # Errors
    ///
    /// Returns error if a session cannot be created now, the service root
    /// has no sessions link, the POST fails, or the response lacks the
    /// token, the location or the session id.
    pub async fn login(&mut self, cleanup_on_exit: bool) -> Result<Session, Error> {
        self.ctx.session_mut().begin_login()?;
        let result = self.create_session(cleanup_on_exit).await;
        self.ctx
            .session_mut()
            .finish_login(result.as_ref().ok().cloned());
        result
    }

    async fn create_session(&mut self, cleanup_on_exit: bool) -> Result<Session, Error> {
        if self.ctx.service_root().is_none() {
            self.service_root(None).await?;
        }
        let root = self.root_uri().await?;
        let sessions = self
            .ctx
            .service_root()
            .and_then(|v| v.pointer("/Links/Sessions"))
            .and_then(|v| v.get(ODATA_ID))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::MissingProperty {
                resource: root.path().to_string(),
                property: "Links.Sessions.@odata.id".into(),
            })?
            .to_string();
        let credentials =
            serde_json::to_value(&self.ctx.credentials).map_err(|source| Error::Json {
                context: "session credentials".into(),
                source,
            })?;
        let request = Request::new(ApiClass::UnauthenticatedWithCreds, Method::POST)
            .base(root)
            .path(sessions)
            .json_body(&credentials);
        let response = self.execute(request, RequestAuth::None).await?;

        let missing_header = |header: &str| Error::MissingHeader {
            resource: response.url.path().to_string(),
            header: header.to_string(),
        };
        let token = response
            .header(X_AUTH_TOKEN)
            .ok_or_else(|| missing_header("X-Auth-Token"))?
            .to_string();
        let link = response
            .header(header::LOCATION)
            .ok_or_else(|| missing_header("Location"))?
            .to_string();
        let id = match response.json().and_then(|v| v.get("Id")) {
            Some(JsonValue::String(id)) => id.clone(),
            Some(id) => id.to_string(),
            None => {
                return Err(Error::MissingProperty {
                    resource: response.url.path().to_string(),
                    property: "Id".into(),
                })
            }
        };
        info!(session = %id, location = %link, "session created");
        Ok(Session {
            id: Some(id),
            link: Some(link),
            token,
            cleanup_on_exit,
        })
    }

    /// Delete a session: `link`, or the stored session when `None`.
    ///
    /// The stored session is forgotten only if it is the one deleted.
    ///
    /// # Errors
    ///
    /// Returns error if there is no session to delete or the DELETE fails.
    pub async fn logout(&mut self, link: Option<&str>) -> Result<(), Error> {
        let stored = self
            .ctx
            .session()
            .active()
            .and_then(|s| s.link.clone());
        let target = match (link, &stored) {
            (Some(link), _) => link.to_string(),
            (None, Some(stored)) => stored.clone(),
            (None, None) => return Err(Error::SessionState("no session to log out")),
        };
        let own = stored.as_deref() == Some(target.as_str());
        if own {
            self.ctx.session_mut().begin_logout();
        }
        let request =
            Request::new(ApiClass::AuthenticatedWithCreds, Method::DELETE).path(target.clone());
        let result = self.send(request).await;
        if own {
            self.ctx.session_mut().finish_logout(result.is_ok());
        }
        result?;
        info!(location = %target, "session deleted");
        Ok(())
    }

    /// Delete the session created on demand for this command, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the DELETE fails.
    pub async fn cleanup(&mut self) -> Result<(), Error> {
        match self.ctx.session().active() {
            Some(s) if s.cleanup_on_exit && s.link.is_some() => {
                debug!(session = ?s.id, "cleanup session");
                self.logout(None).await
            }
            _ => Ok(()),
        }
    }
}
