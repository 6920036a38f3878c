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

//! Command line
//!
//! Options follow the classic redfishtool layout: connection options,
//! one collection-member selector (`-I|-M|-F|-1|-L`), one second-level
//! selector (`-i|-m|-l|-a`) and a subcommand with its operation. Options
//! may appear before or after the subcommand.

use crate::error::Error;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::str::FromStr;
use redfishtool_core::AuthMode;
use redfishtool_core::SecurePolicy;
use redfishtool_core::Selection;
use std::path::PathBuf;

/// Redfish command-line client.
#[derive(Parser, Debug)]
#[command(name = "redfishtool", version)]
#[command(about = "Command-line client for Redfish management controllers", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct Options {
    /// More logging; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    /// Remote host, `host[:port]`.
    #[arg(short = 'r', long = "rhost", global = true)]
    pub rhost: Option<String>,
    /// User name.
    #[arg(short, long, global = true)]
    pub user: Option<String>,
    /// Password.
    #[arg(short, long, global = true)]
    pub password: Option<String>,
    /// Session token obtained by an earlier `SessionService login`.
    #[arg(short, long, global = true)]
    pub token: Option<String>,
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Request timeout in seconds.
    #[arg(short = 'T', long, global = true,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
    /// Only return this property of the resource.
    #[arg(short = 'P', long = "prop", global = true)]
    pub prop: Option<String>,
    /// Authentication mode: None, Basic or Session.
    #[arg(short = 'A', long, global = true)]
    pub auth: Option<AuthMode>,
    /// When to use https: Never, IfSendingCredentials,
    /// IfLoginOrAuthenticatedApi or Always.
    #[arg(short = 'S', long, global = true)]
    pub secure: Option<SecurePolicy>,
    /// Protocol version: `v1` or `Latest`.
    #[arg(short = 'R', long = "redfish-version", global = true)]
    pub redfish_version: Option<String>,
    /// Verify the protocol version with the service before the first call.
    #[arg(short = 'C', long = "check-version", global = true)]
    pub check_version: bool,
    /// Version discovery attempts and seconds between them, `num:time`.
    /// Implies `-C`.
    #[arg(short = 'W', long, global = true)]
    pub wait: Option<Wait>,
    /// Extra request headers as a JSON object.
    #[arg(short = 'H', long, global = true)]
    pub headers: Option<String>,

    /// Select the collection member with this Id.
    #[arg(short = 'I', long = "Id", global = true)]
    pub id: Option<String>,
    /// Select the collection member whose property has this value,
    /// `prop:value`.
    #[arg(short = 'M', long = "Match", global = true)]
    pub matching: Option<PropMatch>,
    /// Select the first member (with `-M`: the first match).
    #[arg(short = 'F', long = "First", global = true)]
    pub first: bool,
    /// Select the only member; more than one is an error.
    #[arg(short = '1', long = "One", global = true)]
    pub one: bool,
    /// Select the member with this link.
    #[arg(short = 'L', long = "Link", global = true)]
    pub link: Option<String>,

    /// Second-level member Id.
    #[arg(short = 'i', long = "id", global = true)]
    pub sub_id: Option<String>,
    /// Second-level member match, `prop:value`.
    #[arg(short = 'm', long = "match", global = true)]
    pub sub_match: Option<PropMatch>,
    /// Second-level member link.
    #[arg(short = 'l', long = "link", global = true)]
    pub sub_link: Option<String>,
    /// All second-level members, expanded.
    #[arg(short = 'a', long = "all", global = true)]
    pub all: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Protocol versions of this program and the remote service.
    Versions,
    /// The service root.
    #[command(alias = "serviceRoot")]
    Root,
    /// The OData service document.
    Odata,
    /// The CSDL metadata document.
    Metadata,
    /// Computer systems.
    #[command(name = "Systems")]
    Systems {
        #[command(subcommand)]
        op: Option<MemberOp>,
    },
    /// Chassis.
    #[command(name = "Chassis")]
    Chassis {
        #[command(subcommand)]
        op: Option<MemberOp>,
    },
    /// Managers.
    #[command(name = "Managers")]
    Managers {
        #[command(subcommand)]
        op: Option<MemberOp>,
    },
    /// Session service and sessions.
    #[command(name = "SessionService")]
    SessionService {
        #[command(subcommand)]
        op: Option<SessionOp>,
    },
    /// Account service and accounts.
    #[command(name = "AccountService")]
    AccountService {
        #[command(subcommand)]
        op: Option<AccountOp>,
    },
    /// Send a request to any path.
    Raw {
        /// HTTP method.
        method: String,
        /// Path, relative to the service root or absolute.
        path: String,
        /// JSON request body.
        #[arg(short, long)]
        data: Option<String>,
    },
}

/// Operations on a member of a top-level collection.
///
/// Without an operation the collection is returned, or the selected
/// member if a selector is given.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MemberOp {
    /// Read the selected member.
    Get,
    /// Id, link and a summary property of every member.
    List,
    /// Update the selected member.
    Patch {
        /// JSON object with the properties to change.
        data: String,
    },
    /// Reset the selected member.
    Reset {
        /// Reset type, e.g. `GracefulRestart`.
        reset_type: String,
    },
}

/// Session service operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionOp {
    /// Read the session service.
    Get,
    /// Sessions collection, or the member selected with `-i|-m|-l|-a`.
    #[command(name = "Sessions")]
    Sessions,
    /// Create a session that outlives this command.
    Login,
    /// Delete the session selected with `-i` or `-l`.
    Logout,
}

/// Account service operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AccountOp {
    /// Read the account service.
    Get,
    /// Accounts collection, or the member selected with `-i|-m|-l|-a`.
    #[command(name = "Accounts")]
    Accounts,
}

/// `prop:value` member match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropMatch {
    pub property: String,
    pub value: String,
}

impl FromStr for PropMatch {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((property, value)) if !property.is_empty() => Ok(Self {
                property: property.into(),
                value: value.into(),
            }),
            _ => Err(format!("expected <prop>:<value>, got '{s}'")),
        }
    }
}

impl Display for PropMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.property, self.value)
    }
}

/// `num:time` version discovery retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub num: u32,
    /// Seconds.
    pub time: u64,
}

impl FromStr for Wait {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("expected <num>:<seconds> with positive integers, got '{s}'");
        let (num, time) = s.split_once(':').ok_or_else(err)?;
        let num = num.parse::<u32>().map_err(|_| err())?;
        let time = time.parse::<u64>().map_err(|_| err())?;
        if num == 0 || time == 0 {
            return Err(err());
        }
        Ok(Self { num, time })
    }
}

impl Options {
    /// Check option combinations that do not depend on configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Usage` for conflicting selectors.
    pub fn validate(&self) -> Result<(), Error> {
        let level1 = [
            self.id.is_some(),
            self.matching.is_some(),
            self.first,
            self.one,
            self.link.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        let match_first = level1 == 2 && self.matching.is_some() && self.first;
        if level1 > 1 && !match_first {
            return Err(Error::Usage(
                "only one of -I, -M, -F, -1, -L may be given (except -M with -F)".into(),
            ));
        }
        let level2 = [
            self.sub_id.is_some(),
            self.sub_match.is_some(),
            self.sub_link.is_some(),
            self.all,
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if level2 > 1 {
            return Err(Error::Usage(
                "only one of -i, -m, -l, -a may be given".into(),
            ));
        }
        Ok(())
    }

    /// Collection member selector, if any.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        if let Some(id) = &self.id {
            Some(Selection::Id(id.clone()))
        } else if let Some(m) = &self.matching {
            Some(Selection::matching(&m.property, &m.value, self.first))
        } else if let Some(link) = &self.link {
            Some(Selection::Link(link.clone()))
        } else if self.first {
            Some(Selection::First)
        } else if self.one {
            Some(Selection::OnlyOne)
        } else {
            None
        }
    }

    /// Second-level member selector, if any.
    #[must_use]
    pub fn sub_selection(&self) -> Option<Selection> {
        if let Some(id) = &self.sub_id {
            Some(Selection::Id(id.clone()))
        } else if let Some(m) = &self.sub_match {
            Some(Selection::matching(&m.property, &m.value, true))
        } else if let Some(link) = &self.sub_link {
            Some(Selection::Link(link.clone()))
        } else if self.all {
            Some(Selection::All)
        } else {
            None
        }
    }
}
