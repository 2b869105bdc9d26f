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

//! API to update an existing opening.

use crate::driver::Driver;
use crate::model::{Opening, OpeningUpdate};
use crate::rest::{opening_failure, IdQuery};
use axum::extract::State;
use http::StatusCode;
use jobs_core::rest::{send_success, JsonBody, RestError, RestResult, Success};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    query: IdQuery,
    body: Result<JsonBody<OpeningUpdate>, RestError>,
) -> RestResult<Success<Opening>> {
    let id = query.id()?;
    let JsonBody(request) = body?;
    let update = request.validate()?;

    let logger = driver.logger().clone();
    match driver.update_opening(id, update).await {
        Ok(opening) => Ok(send_success(StatusCode::OK, "update-opening", opening)),
        Err(e) => Err(opening_failure(&logger, e, "updating")),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::testutils::full_update;
    use crate::model::*;
    use crate::rest::testutils::*;
    use axum::http;
    use jobs_core::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::PUT, "/openings".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let id = context.put_opening("Old title").await;
        let before = context.get_opening(id).await;

        let request = OpeningUpdate {
            title: Some("New title".to_owned()),
            company: Some("".to_owned()),
            salary: Some(75000),
            ..Default::default()
        };
        let response = OneShotBuilder::new(context.app(), route())
            .with_query([("id", id.to_string())])
            .send_json(request)
            .await
            .expect_success::<Opening>("update-opening")
            .await;

        assert_eq!("New title", response.title());
        assert_eq!(before.company(), response.company());
        assert_eq!(75000, *response.salary());
        assert_eq!(response, context.get_opening(id).await);
        assert_eq!(
            vec![format!("INFO: 2023/10/17 08:15:00 updated opening {}", id)],
            context.log_lines()
        );
    }

    #[tokio::test]
    async fn test_id_missing() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(full_update("x"))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^id is required \\(queryParameter\\)$")
            .await;

        assert_eq!(0, context.db_calls());
    }

    #[tokio::test]
    async fn test_id_checked_before_body() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_text("this is not json")
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^id is required \\(queryParameter\\)$")
            .await;

        assert_eq!(0, context.db_calls());
    }

    #[tokio::test]
    async fn test_body_wrong_types() {
        let context = TestContext::setup().await;

        let id = context.put_opening("Title").await;

        OneShotBuilder::new(context.app(), route())
            .with_query([("id", id.to_string())])
            .with_header(http::header::CONTENT_TYPE, "application/json")
            .send_text(r#"{"salary": "x"}"#)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("invalid type")
            .await;

        assert_eq!(0, context.db_calls());
    }

    #[tokio::test]
    async fn test_no_valid_fields() {
        let context = TestContext::setup().await;

        let id = context.put_opening("Title").await;

        let request = OpeningUpdate {
            title: Some("".to_owned()),
            salary: Some(-1),
            ..Default::default()
        };
        OneShotBuilder::new(context.app(), route())
            .with_query([("id", id.to_string())])
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^at least one valid field must be provided$")
            .await;

        assert_eq!(0, context.db_calls());
        assert_eq!("Title", context.get_opening(id).await.title());
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query([("id", "999")])
            .send_json(full_update("x"))
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("^opening not found$")
            .await;

        assert_eq!(
            vec![
                "WARNING: 2023/10/17 08:15:00 opening not found while updating: Entity not found"
            ],
            context.log_lines()
        );
    }

    #[tokio::test]
    async fn test_backend_error() {
        let context = TestContext::setup().await;

        context.break_db().await;

        OneShotBuilder::new(context.app(), route())
            .with_query([("id", "1")])
            .send_json(full_update("x"))
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("^error updating opening$")
            .await;

        let lines = context.log_lines();
        assert_eq!(1, lines.len());
        assert!(lines[0].starts_with("ERROR: 2023/10/17 08:15:00 error updating opening: "));
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(), [("id", "1")]);
}
