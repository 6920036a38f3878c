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

//! redfishtool command-line driver.
//!
//! [`cli::Cli`] parses the command line, [`settings::Settings`] merges it
//! with the configuration file into a connection context and
//! [`commands::run`] executes the subcommand on a transport.

/// Command line.
pub mod cli;
/// Subcommand execution.
pub mod commands;
/// Command-line errors.
pub mod error;
/// Configuration file and settings.
pub mod settings;

#[doc(inline)]
pub use cli::Cli;
#[doc(inline)]
pub use commands::Output;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use settings::Settings;
