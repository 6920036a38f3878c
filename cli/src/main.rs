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

use clap::Parser;
use redfishtool::commands::run;
use redfishtool::error::USAGE_EXIT_CODE;
use redfishtool::Cli;
use redfishtool::Error;
use redfishtool::Output;
use redfishtool::Settings;
use redfishtool_bmc_http::Client;
use redfishtool_bmc_http::ClientParams;
use redfishtool_core::Transport;
use std::process;
use tracing::warn;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { USAGE_EXIT_CODE } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };
    init_tracing(cli.options.verbose, cli.options.quiet);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let code = match runtime {
        Ok(runtime) => runtime.block_on(execute(&cli)),
        Err(err) => {
            eprintln!("redfishtool: cannot start runtime: {err}");
            USAGE_EXIT_CODE
        }
    };
    process::exit(code);
}

/// `RUST_LOG` wins over `-v`/`-q`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn execute(cli: &Cli) -> i32 {
    if let Err(err) = cli.options.validate() {
        return report(&err);
    }
    let settings = match Settings::load(&cli.options) {
        Ok(settings) => settings,
        Err(err) => return report(&err),
    };
    let params = ClientParams::new().accept_invalid_certs(true);
    let client = match Client::with_params(params) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("redfishtool: cannot create HTTP client: {err}");
            return USAGE_EXIT_CODE;
        }
    };
    let mut transport = Transport::new(client, settings.into_context());

    let result = run(&mut transport, &cli.options, &cli.command).await;
    let cleanup = transport.cleanup().await;
    let code = match result {
        Ok(output) => {
            print(&output);
            0
        }
        Err(err) => report(&err),
    };
    match cleanup {
        Err(err) if code == 0 => report(&Error::from(err)),
        Err(err) => {
            warn!(error = %err, "session cleanup failed");
            code
        }
        Ok(()) => code,
    }
}

fn print(output: &Output) {
    match output {
        Output::Json(v) => match serde_json::to_string_pretty(v) {
            Ok(s) => println!("{s}"),
            Err(_) => println!("{v}"),
        },
        Output::Text(s) => print!("{s}"),
        Output::Empty => {}
    }
}

fn report(err: &Error) -> i32 {
    eprintln!("redfishtool: {err}");
    err.exit_code()
}
