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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::testutils::spec;
use crate::model::*;
use crate::rest::app;
use async_trait::async_trait;
use axum::Router;
use jobs_core::clocks::testutils::SettableClock;
use jobs_core::clocks::Clock;
use jobs_core::db::{sqlite, Db, DbResult, Executor, TxExecutor};
use jobs_core::logger::testutils::CapturedSink;
use jobs_core::logger::Logger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use time::macros::datetime;
use time::OffsetDateTime;

/// Database wrapper that counts how many times the app requests access to the database.
struct CountingDb {
    /// The real database.
    inner: Arc<dyn Db + Send + Sync>,

    /// Number of executors and transactions handed out so far.
    calls: AtomicUsize,
}

#[async_trait]
impl Db for CountingDb {
    async fn ex(&self) -> DbResult<Executor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.ex().await
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.begin().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

/// State of a test for the REST layer.
pub(crate) struct TestContext {
    /// Database for direct access from the tests.  Accesses through this are not counted.
    db: Arc<dyn Db + Send + Sync>,

    /// Database as seen by the app.
    counting_db: Arc<CountingDb>,

    /// Clock used by the app.
    clock: Arc<SettableClock>,

    /// Output of the logger used by the app.
    sink: CapturedSink,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes an in-memory database and an app around it.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let counting_db = Arc::from(CountingDb { inner: db.clone(), calls: AtomicUsize::new(0) });
        let clock = Arc::from(SettableClock::new(datetime!(2023-10-17 08:15:00 UTC)));
        let sink = CapturedSink::default();
        let logger = Logger::with_sink("test", Box::new(sink.clone()), clock.clone());
        let driver = Driver::new(counting_db.clone(), clock.clone(), logger);
        let app = app(driver);
        Self { db, counting_db, clock, sink, app }
    }

    /// Returns a copy of the app under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Returns how many times the app has accessed the database.
    pub(crate) fn db_calls(&self) -> usize {
        self.counting_db.calls.load(Ordering::SeqCst)
    }

    /// Closes the database so that all further accesses from the app fail.
    pub(crate) async fn break_db(&self) {
        self.db.close().await;
    }

    /// Returns the current time as seen by the app.
    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Returns the lines logged so far by the app.
    pub(crate) fn log_lines(&self) -> Vec<String> {
        self.sink.lines()
    }

    /// Creates an opening named `title` directly in the database.
    pub(crate) async fn put_opening(&self, title: &str) -> OpeningId {
        db::put_opening(&mut self.db.ex().await.unwrap(), &spec(title), self.now()).await.unwrap()
    }

    /// Fetches the opening `id` directly from the database.
    pub(crate) async fn get_opening(&self, id: OpeningId) -> Opening {
        db::get_opening(&mut self.db.ex().await.unwrap(), id).await.unwrap()
    }

    /// Returns all openings directly from the database.
    pub(crate) async fn get_openings(&self) -> Vec<Opening> {
        db::get_openings(&mut self.db.ex().await.unwrap()).await.unwrap()
    }
}
