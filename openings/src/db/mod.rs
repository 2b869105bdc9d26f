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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::{Opening, OpeningId, OpeningSpec};
use futures::TryStreamExt;
use jobs_core::db::sqlite::{self, build_timestamp, map_sqlx_error, unpack_timestamp};
use jobs_core::db::{DbError, DbResult, Executor};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;


/// Initializes the database schema.
pub(crate) async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    sqlite::run_schema(ex, include_str!("sqlite.sql")).await
}

impl TryFrom<SqliteRow> for Opening {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(map_sqlx_error)?;
        let company: String = row.try_get("company").map_err(map_sqlx_error)?;
        let location: String = row.try_get("location").map_err(map_sqlx_error)?;
        let remote: bool = row.try_get("remote").map_err(map_sqlx_error)?;
        let link: String = row.try_get("link").map_err(map_sqlx_error)?;
        let salary: i64 = row.try_get("salary").map_err(map_sqlx_error)?;
        let created_at_secs: i64 = row.try_get("created_at_secs").map_err(map_sqlx_error)?;
        let created_at_nsecs: i64 = row.try_get("created_at_nsecs").map_err(map_sqlx_error)?;
        let updated_at_secs: i64 = row.try_get("updated_at_secs").map_err(map_sqlx_error)?;
        let updated_at_nsecs: i64 = row.try_get("updated_at_nsecs").map_err(map_sqlx_error)?;

        Ok(Opening::new(
            OpeningId::new(id)?,
            title,
            company,
            location,
            remote,
            link,
            salary,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// Gets the opening identified by `id`.
pub(crate) async fn get_opening(ex: &mut Executor, id: OpeningId) -> DbResult<Opening> {
    let query_str = "SELECT * FROM openings WHERE id = ?";
    let row = sqlx::query(query_str)
        .bind(id.as_i64())
        .fetch_one(ex)
        .await
        .map_err(map_sqlx_error)?;
    Opening::try_from(row)
}

/// Gets all existing openings sorted by their identifier.
pub(crate) async fn get_openings(ex: &mut Executor) -> DbResult<Vec<Opening>> {
    let query_str = "SELECT * FROM openings ORDER BY id";
    let mut rows = sqlx::query(query_str).fetch(ex);

    let mut openings = vec![];
    while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
        openings.push(Opening::try_from(row)?);
    }
    Ok(openings)
}

/// Creates a new opening with the contents of `spec` as of `now` and returns its identifier.
pub(crate) async fn put_opening(
    ex: &mut Executor,
    spec: &OpeningSpec,
    now: OffsetDateTime,
) -> DbResult<OpeningId> {
    let (now_secs, now_nsecs) = unpack_timestamp(now)?;

    let query_str = "
        INSERT INTO openings (
            title, company, location, remote, link, salary,
            created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
    let done = sqlx::query(query_str)
        .bind(spec.title())
        .bind(spec.company())
        .bind(spec.location())
        .bind(spec.remote())
        .bind(spec.link())
        .bind(spec.salary())
        .bind(now_secs)
        .bind(now_nsecs)
        .bind(now_secs)
        .bind(now_nsecs)
        .execute(ex)
        .await
        .map_err(map_sqlx_error)?;
    if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(OpeningId::new(done.last_insert_rowid())?)
}

/// Replaces the stored contents of an existing opening with `opening`.
pub(crate) async fn update_opening(ex: &mut Executor, opening: &Opening) -> DbResult<()> {
    let (created_at_secs, created_at_nsecs) = unpack_timestamp(*opening.created_at())?;
    let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*opening.updated_at())?;

    let query_str = "
        UPDATE openings
        SET
            title = ?, company = ?, location = ?, remote = ?, link = ?, salary = ?,
            created_at_secs = ?, created_at_nsecs = ?, updated_at_secs = ?, updated_at_nsecs = ?
        WHERE id = ?";
    let done = sqlx::query(query_str)
        .bind(opening.title())
        .bind(opening.company())
        .bind(opening.location())
        .bind(opening.remote())
        .bind(opening.link())
        .bind(opening.salary())
        .bind(created_at_secs)
        .bind(created_at_nsecs)
        .bind(updated_at_secs)
        .bind(updated_at_nsecs)
        .bind(opening.id().as_i64())
        .execute(ex)
        .await
        .map_err(map_sqlx_error)?;
    match done.rows_affected() {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the opening identified by `id`.
pub(crate) async fn delete_opening(ex: &mut Executor, id: OpeningId) -> DbResult<()> {
    let query_str = "DELETE FROM openings WHERE id = ?";
    let done = sqlx::query(query_str)
        .bind(id.as_i64())
        .execute(ex)
        .await
        .map_err(map_sqlx_error)?;
    match done.rows_affected() {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
