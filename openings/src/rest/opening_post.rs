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

//! API to create a new opening.

use crate::driver::Driver;
use crate::model::{Opening, OpeningSpec, OpeningUpdate};
use axum::extract::State;
use http::StatusCode;
use jobs_core::rest::{send_success, JsonBody, RestError, RestResult, Success};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    JsonBody(request): JsonBody<OpeningUpdate>,
) -> RestResult<Success<Opening>> {
    let spec = OpeningSpec::try_from(request)?;

    let logger = driver.logger().clone();
    match driver.create_opening(spec).await {
        Ok(opening) => Ok(send_success(StatusCode::CREATED, "create-opening", opening)),
        Err(e) => {
            logger.errorf(format_args!("error creating opening: {}", e));
            Err(RestError::InternalError("error creating opening".to_owned()))
        }
    }
}
