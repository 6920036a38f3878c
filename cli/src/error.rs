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

//! Command-line errors.

use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use redfishtool_core::Error as CoreError;
use std::error::Error as StdError;
use std::io::Error as IoError;
use std::path::PathBuf;
use toml::de::Error as TomlError;

/// Exit code of a usage or configuration error.
pub const USAGE_EXIT_CODE: i32 = 1;

/// Error of a redfishtool invocation.
#[derive(Debug)]
pub enum Error {
    /// Bad option or option combination.
    Usage(String),
    /// Configuration file cannot be read.
    Io(PathBuf, IoError),
    /// Configuration file is not valid.
    Toml(PathBuf, TomlError),
    /// Error reported by the engine.
    Core(CoreError),
}

impl Error {
    /// Process exit code of this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Io(..) | Self::Toml(..) => USAGE_EXIT_CODE,
            Self::Core(err) => err.exit_code(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Usage(msg) => write!(f, "usage error: {msg}"),
            Self::Io(path, err) => write!(f, "cannot read {}: {err}", path.display()),
            Self::Toml(path, err) => write!(f, "invalid configuration {}: {err}", path.display()),
            Self::Core(err) => err.fmt(f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Io(_, err) => Some(err),
            Self::Toml(_, err) => Some(err),
            Self::Core(err) => Some(err),
        }
    }
}

impl From<CoreError> for Error {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
