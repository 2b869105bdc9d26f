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

//! Generic types for the model layer.
//!
//! Every service should implement its own `model` module with the high-level data types of its
//! domain.  Types that accept untrusted input validate it at construction time and report failures
//! with `ModelError`.

/// Errors caused by invalid data in the model layer.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Builds the error for a missing `name` parameter that was expected in `source`.
///
/// The `source` names where the parameter should have come from, such as `queryParameter` or
/// `body`, so that callers can tell apart the different inputs of a request.
pub fn param_is_required(name: &str, source: &str) -> ModelError {
    ModelError(format!("{} is required ({})", name, source))
}
