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

//! API to delete an existing opening.

use crate::driver::Driver;
use crate::model::Opening;
use crate::rest::{opening_failure, IdQuery};
use axum::extract::State;
use http::StatusCode;
use jobs_core::rest::{send_success, EmptyBody, RestResult, Success};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    query: IdQuery,
    _: EmptyBody,
) -> RestResult<Success<Opening>> {
    let id = query.id()?;

    let logger = driver.logger().clone();
    match driver.delete_opening(id).await {
        Ok(opening) => Ok(send_success(StatusCode::OK, "delete-opening", opening)),
        Err(e) => Err(opening_failure(&logger, e, "deleting")),
    }
}
