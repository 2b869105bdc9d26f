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

//! API to list all openings.

use crate::driver::Driver;
use crate::model::Opening;
use axum::extract::State;
use http::StatusCode;
use jobs_core::rest::{send_success, EmptyBody, RestError, RestResult, Success};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> RestResult<Success<Vec<Opening>>> {
    let logger = driver.logger().clone();
    match driver.get_openings().await {
        Ok(openings) => Ok(send_success(StatusCode::OK, "list-openings", openings)),
        Err(e) => {
            logger.errorf(format_args!("error listing openings: {}", e));
            Err(RestError::InternalError("error listing openings".to_owned()))
        }
    }
}
