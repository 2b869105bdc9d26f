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

//! Entry point to the REST server.

use crate::driver::Driver;
use crate::model::OpeningId;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::Router;
use http::request::Parts;
use jobs_core::driver::DriverError;
use jobs_core::logger::Logger;
use jobs_core::rest::{required_param, RestError, RestResult};

mod opening_delete;
mod opening_get;
mod opening_post;
mod opening_put;
mod openings_get;
#[cfg(test)]
mod testutils;

/// Where the identifier of the opening to operate on comes from.
const ID_SOURCE: &str = "queryParameter";

/// Message returned to the client when the requested opening does not exist.
const OPENING_NOT_FOUND: &str = "opening not found";

/// Query parameters for the APIs that operate on a single opening.
///
/// Only the first `id` in the query string is considered; repeated values are ignored.
pub(crate) struct IdQuery {
    /// Raw identifier of the opening.  Empty if the parameter was not provided.
    id: String,
}

impl IdQuery {
    /// Builds the query from the decoded `pairs` of a query string.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let id = pairs.into_iter().find(|(name, _)| name == "id").map(|(_, value)| value);
        Self { id: id.unwrap_or_default() }
    }

    /// Validates and returns the identifier carried by this query.
    pub(crate) fn id(&self) -> RestResult<OpeningId> {
        let raw = required_param(&self.id, "id", ID_SOURCE)?;
        raw.parse::<OpeningId>()
            .map_err(|e| RestError::InvalidRequest(format!("{} ({})", e, ID_SOURCE)))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IdQuery
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::InvalidRequest(e.body_text()))?;
        Ok(IdQuery::from_pairs(pairs))
    }
}

/// Translates the failure `e` of a driver operation on an existing opening into the error returned
/// to the client, logging the details with `logger`.
///
/// `action` names the operation in the generic message returned for unexpected failures.
pub(crate) fn opening_failure(logger: &Logger, e: DriverError, action: &str) -> RestError {
    match e {
        DriverError::NotFound(_) => {
            logger.warnf(format_args!("opening not found while {}: {}", action, e));
            RestError::NotFound(OPENING_NOT_FOUND.to_owned())
        }
        DriverError::InvalidInput(_) => RestError::from(e),
        DriverError::AlreadyExists(_) | DriverError::BackendError(_) => {
            logger.errorf(format_args!("error {} opening: {}", action, e));
            RestError::InternalError(format!("error {} opening", action))
        }
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;
    Router::new()
        .route(
            "/openings",
            get(opening_get::handler)
                .post(opening_post::handler)
                .put(opening_put::handler)
                .delete(opening_delete::handler),
        )
        .route("/openings/all", get(openings_get::handler))
        .with_state(driver)
}
