// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the openings service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use jobs_core::logger::Logger;
use jobs_openings::{serve, Config};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let logger = Logger::new("main");

    let config = match Config::from_env("OPENINGS") {
        Ok(config) => config,
        Err(e) => {
            logger.errorf(format_args!("config initialization error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger.install(config.log_level) {
        logger.warnf(format_args!("cannot route library logs: {}", e));
    }

    match serve(config, logger.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.errorf(format_args!("server error: {}", e));
            ExitCode::FAILURE
        }
    }
}
