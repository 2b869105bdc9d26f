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

//! Generic code for REST handlers.
//!
//! All services should implement an `app` function in this module that returns the `Router` for the
//! application.
//!
//! Every API should be put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This
//! may seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! Every response is wrapped in an envelope.  Successful responses carry the name of the operation
//! that was performed and its payload:
//!
//! ```json
//! {"status": "success", "operation": "show-opening", "payload": {"id": 1}}
//! ```
//!
//! while failed responses only carry a human-readable message:
//!
//! ```json
//! {"status": "error", "message": "opening not found"}
//! ```
//!
//! Handlers produce the former with `send_success` and the latter by returning a `RestError`, which
//! renders itself via `send_error`.  A handler returns exactly one of these values, so no request
//! can ever get two responses.
//!
//! More specifically, the `tests` module within an API should define a `route` method that
//! returns the HTTP method and the API path under test.  All integration tests within the module
//! then rely on `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::DriverError;
use crate::model::{param_is_required, ModelError};
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Value of the `status` field in successful responses.
const STATUS_SUCCESS: &str = "success";

/// Value of the `status` field in failed responses.
const STATUS_ERROR: &str = "error";

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,
}

impl RestError {
    /// Returns the HTTP status code that represents this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        send_error(self.status(), self.to_string())
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Representation of a failed response.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    /// Always `error`.
    pub status: String,

    /// Textual representation of the error message.
    pub message: String,
}

/// Representation of a successful response.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct SuccessEnvelope<T> {
    /// Always `success`.
    pub status: String,

    /// Name of the operation that produced this response, such as `show-opening`.
    pub operation: String,

    /// Result of the operation.
    pub payload: T,
}

/// A successful response ready to be returned from a handler.
#[must_use]
pub struct Success<T> {
    /// HTTP status code of the response.
    status: StatusCode,

    /// Body of the response.
    envelope: SuccessEnvelope<T>,
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Wraps `payload` in a success envelope for `operation` to be returned with `status`.
pub fn send_success<O: Into<String>, T: Serialize>(
    status: StatusCode,
    operation: O,
    payload: T,
) -> Success<T> {
    let envelope =
        SuccessEnvelope { status: STATUS_SUCCESS.to_owned(), operation: operation.into(), payload };
    Success { status, envelope }
}

/// Renders an error envelope carrying `message` with `status`.
pub fn send_error<M: Into<String>>(status: StatusCode, message: M) -> Response {
    let envelope = ErrorEnvelope { status: STATUS_ERROR.to_owned(), message: message.into() };
    (status, Json(envelope)).into_response()
}

/// Ensures that the `name` parameter, whose `value` came from `source`, is not empty.
pub fn required_param<'a>(value: &'a str, name: &str, source: &str) -> RestResult<&'a str> {
    if value.is_empty() {
        return Err(param_is_required(name, source).into());
    }
    Ok(value)
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that we
/// don't care about.  This future-proofs the service.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// A JSON request body extractor whose failures are reported as error envelopes.
///
/// Wraps `axum::Json` so that a missing content type, malformed JSON or a payload that does not
/// match `T` become `RestError::InvalidRequest` instead of plain-text responses.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(e) => Err(RestError::InvalidRequest(e.body_text())),
        }
    }
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::http::{self, HeaderName, HeaderValue};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: axum::http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Extends the URI in the request with a `query`.
        pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
            let uri = self.builder.uri_ref().unwrap().to_string();
            assert!(!uri.contains('?'), "URI already contains a query: {}", uri);
            self.builder = self.builder.uri(format!(
                "{}?{}",
                uri,
                serde_urlencoded::to_string(query).unwrap()
            ));
            self
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
                .body(axum::body::Body::from(text.into()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }
    }

    /// Type alias for the complex type returned by the `oneshot` function.
    type HttpResponse = http::Response<axum::body::Body>;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: HttpResponse,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<HttpResponse> for ResponseChecker {
        fn from(response: HttpResponse) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Performs common validation operations on the response.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Consumes the response and returns its raw body.
        async fn take_body(self) -> Vec<u8> {
            self.verify();
            axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap().to_vec()
        }

        /// Finishes checking the response and expects its body to be an `ErrorEnvelope` whose
        /// message matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.take_body().await;
            let response: ErrorEnvelope = match serde_json::from_slice(&body) {
                Ok(response) => response,
                Err(e) => {
                    let body = String::from_utf8(body).unwrap();
                    panic!("Invalid error response due to {}; content was {}", e, body);
                }
            };
            assert_eq!(STATUS_ERROR, response.status);
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.message),
                "Response content '{:?}' does not match re '{}'",
                response,
                exp_re
            );
        }

        /// Finishes checking the response and expects its body to be a `SuccessEnvelope` for
        /// `exp_operation`.  Returns the payload of the envelope.
        pub async fn expect_success<T: DeserializeOwned>(self, exp_operation: &str) -> T {
            let body = self.take_body().await;
            let response: SuccessEnvelope<T> = match serde_json::from_slice(&body) {
                Ok(response) => response,
                Err(e) => {
                    let body = String::from_utf8(body).unwrap();
                    panic!("Invalid success response due to {}; content was {}", e, body);
                }
            };
            assert_eq!(STATUS_SUCCESS, response.status);
            assert_eq!(exp_operation, response.operation);
            response.payload
        }

        /// Finishes checking the response and expects it to contain a valid JSON object of
        /// type `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            let body = self.take_body().await;
            serde_json::from_slice::<T>(&body).unwrap()
        }

        /// Finishes checking the response and expects its body to be valid UTF-8 and to match
        /// `exp_re`.
        pub async fn expect_text(self, exp_re: &str) {
            let body = String::from_utf8(self.take_body().await).unwrap();
            assert!(
                !body.contains("\"status\":"),
                "Use expect_error or expect_success to validate envelopes"
            );
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&body), "Body content '{}' does not match re '{}'", body, exp_re);
        }

        /// Finishes checking the response and returns the body of the response as UTF-8.
        pub async fn take_body_as_text(self) -> String {
            String::from_utf8(self.take_body().await).unwrap()
        }
    }

    /// Generates a test to verify that an API that expects JSON fails when it gets something else.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("Content-Type")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("expected ident")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test to verify that an API that does not expect a payload fails as necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Extracts the status and the JSON body of `response`.
    async fn split(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_send_success() {
        #[derive(Serialize)]
        struct Payload {
            id: i64,
            title: &'static str,
        }

        let response =
            send_success(StatusCode::CREATED, "create-thing", Payload { id: 3, title: "abc" })
                .into_response();

        let (status, body) = split(response).await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(
            serde_json::json!({
                "status": "success",
                "operation": "create-thing",
                "payload": {"id": 3, "title": "abc"},
            }),
            body
        );
    }

    #[tokio::test]
    async fn test_send_error() {
        let (status, body) = split(send_error(StatusCode::NOT_FOUND, "opening not found")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(serde_json::json!({"status": "error", "message": "opening not found"}), body);
    }

    #[tokio::test]
    async fn test_rest_error_into_response() {
        for (err, exp_status, exp_message) in [
            (RestError::InternalError("boom".to_owned()), StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            (RestError::InvalidRequest("bad".to_owned()), StatusCode::BAD_REQUEST, "bad"),
            (RestError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND, "gone"),
            (RestError::PayloadNotEmpty, StatusCode::PAYLOAD_TOO_LARGE, "Content should be empty"),
        ] {
            let (status, body) = split(err.into_response()).await;
            assert_eq!(exp_status, status);
            assert_eq!(serde_json::json!({"status": "error", "message": exp_message}), body);
        }
    }

    #[test]
    fn test_from_driver_error() {
        assert_eq!(
            RestError::NotFound("Entity not found".to_owned()),
            DriverError::NotFound("Entity not found".to_owned()).into()
        );
        assert_eq!(
            RestError::InternalError("Database error: x".to_owned()),
            DriverError::BackendError("Database error: x".to_owned()).into()
        );
        assert_eq!(
            RestError::InvalidRequest("bad field".to_owned()),
            DriverError::InvalidInput("bad field".to_owned()).into()
        );
    }

    /// Runs the `JsonBody` extractor on a request with the given `content_type` and `body`.
    async fn extract_json(content_type: &str, body: &'static str) -> RestResult<i64> {
        #[derive(Deserialize)]
        struct Payload {
            salary: i64,
        }

        let request = http::Request::builder()
            .header(http::header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap();
        JsonBody::<Payload>::from_request(request, &()).await.map(|JsonBody(p)| p.salary)
    }

    #[tokio::test]
    async fn test_json_body_ok() {
        assert_eq!(Ok(50000), extract_json("application/json", r#"{"salary": 50000}"#).await);
    }

    #[tokio::test]
    async fn test_json_body_rejections_are_invalid_requests() {
        for (content_type, body, exp_message) in [
            ("text/plain", r#"{"salary": 1}"#, "Content-Type"),
            ("application/json", "this is not json", "expected ident"),
            ("application/json", r#"{"salary": "x"}"#, "invalid type"),
        ] {
            match extract_json(content_type, body).await {
                Err(RestError::InvalidRequest(message)) => {
                    assert!(message.contains(exp_message), "Unexpected message {}", message)
                }
                other => panic!("Unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn test_required_param_present() {
        assert_eq!(Ok("12"), required_param("12", "id", "queryParameter"));
    }

    #[test]
    fn test_required_param_missing() {
        assert_eq!(
            Err(RestError::InvalidRequest("id is required (queryParameter)".to_owned())),
            required_param("", "id", "queryParameter")
        );
    }
}
