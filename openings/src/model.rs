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

//! High-level data types.

use derive_getters::Getters;
use derive_more::Constructor;
use jobs_core::model::{param_is_required, ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Where the fields of an opening come from in a request.
const BODY: &str = "body";

/// Identifier of an opening, which is always a positive integer.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub(crate) struct OpeningId(i64);

impl OpeningId {
    /// Creates a new identifier from a raw `id`, validating that it is positive.
    pub(crate) fn new(id: i64) -> ModelResult<Self> {
        if id <= 0 {
            return Err(ModelError("id must be a positive integer".to_owned()));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as an `i64` for storage purposes.
    pub(crate) fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OpeningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OpeningId {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.parse::<i64>() {
            Ok(id) => Self::new(id),
            Err(_) => Err(ModelError("id must be a positive integer".to_owned())),
        }
    }
}

impl TryFrom<i64> for OpeningId {
    type Error = ModelError;

    fn try_from(id: i64) -> ModelResult<Self> {
        Self::new(id)
    }
}

impl From<OpeningId> for i64 {
    fn from(id: OpeningId) -> Self {
        id.0
    }
}

/// A job opening.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub(crate) struct Opening {
    /// Unique identifier of the opening.
    id: OpeningId,

    /// Name of the role being offered.
    title: String,

    /// Name of the company that offers the role.
    company: String,

    /// Where the role is based.
    location: String,

    /// Whether the role can be performed remotely.
    remote: bool,

    /// Address of the page where candidates can apply.
    link: String,

    /// Yearly salary offered for the role.
    salary: i64,

    /// When the opening was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// When the opening was last modified.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Opening {
    /// Applies the fields present in `update` to this opening and marks it as modified at `now`.
    pub(crate) fn with_update(mut self, update: OpeningUpdate, now: OffsetDateTime) -> Self {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(company) = update.company {
            self.company = company;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(remote) = update.remote {
            self.remote = remote;
        }
        if let Some(link) = update.link {
            self.link = link;
        }
        if let Some(salary) = update.salary {
            self.salary = salary;
        }
        self.updated_at = now;
        self
    }
}

/// Content of a new opening, validated to have all of its fields.
#[derive(Clone, Constructor, Debug, Getters, PartialEq)]
pub(crate) struct OpeningSpec {
    /// Name of the role being offered.
    title: String,

    /// Name of the company that offers the role.
    company: String,

    /// Where the role is based.
    location: String,

    /// Whether the role can be performed remotely.
    remote: bool,

    /// Address of the page where candidates can apply.
    link: String,

    /// Yearly salary offered for the role.  Always positive.
    salary: i64,
}

impl TryFrom<OpeningUpdate> for OpeningSpec {
    type Error = ModelError;

    fn try_from(fields: OpeningUpdate) -> ModelResult<Self> {
        let fields = fields.usable();
        if fields.is_empty() {
            return Err(ModelError("request body is empty or malformed".to_owned()));
        }

        let title = fields.title.ok_or_else(|| param_is_required("title", BODY))?;
        let company = fields.company.ok_or_else(|| param_is_required("company", BODY))?;
        let location = fields.location.ok_or_else(|| param_is_required("location", BODY))?;
        let link = fields.link.ok_or_else(|| param_is_required("link", BODY))?;
        let remote = fields.remote.ok_or_else(|| param_is_required("remote", BODY))?;
        let salary = fields
            .salary
            .ok_or_else(|| ModelError(format!("salary must be a positive integer ({})", BODY)))?;

        Ok(Self { title, company, location, remote, link, salary })
    }
}

/// Partial content of an opening as received from a client.
///
/// Any field may be missing.  Fields that are present but carry no usable value, such as empty
/// strings or non-positive salaries, are treated as missing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct OpeningUpdate {
    /// New name of the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,

    /// New name of the company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) company: Option<String>,

    /// New location of the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) location: Option<String>,

    /// New remote flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) remote: Option<bool>,

    /// New application link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) link: Option<String>,

    /// New salary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) salary: Option<i64>,
}

impl OpeningUpdate {
    /// Drops all fields that carry no usable value.
    pub(crate) fn usable(self) -> Self {
        /// Keeps `s` only if it is not empty.
        fn non_empty(s: Option<String>) -> Option<String> {
            s.filter(|s| !s.is_empty())
        }

        Self {
            title: non_empty(self.title),
            company: non_empty(self.company),
            location: non_empty(self.location),
            remote: self.remote,
            link: non_empty(self.link),
            salary: self.salary.filter(|salary| *salary > 0),
        }
    }

    /// Returns true if none of the fields are present.
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.remote.is_none()
            && self.link.is_none()
            && self.salary.is_none()
    }

    /// Drops all unusable fields and ensures that at least one field remains.
    pub(crate) fn validate(self) -> ModelResult<Self> {
        let update = self.usable();
        if update.is_empty() {
            return Err(ModelError("at least one valid field must be provided".to_owned()));
        }
        Ok(update)
    }
}
