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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::testutils::spec;
use crate::model::*;
use jobs_core::clocks::testutils::SettableClock;
use jobs_core::clocks::Clock;
use jobs_core::db::sqlite;
use jobs_core::db::{Db, Executor};
use jobs_core::logger::testutils::CapturedSink;
use jobs_core::logger::Logger;
use std::sync::Arc;
use time::macros::datetime;
use time::OffsetDateTime;

/// State of a test for the business layer.
pub(crate) struct TestContext {
    /// Database backing the driver, for direct inspection.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock used by the driver.
    clock: Arc<SettableClock>,

    /// Output of the logger used by the driver.
    sink: CapturedSink,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes an in-memory database and a driver around it whose clock starts at
    /// `2023-10-17 08:15:00 UTC`.
    pub(crate) async fn setup() -> Self {
        let db = Arc::from(sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::from(SettableClock::new(datetime!(2023-10-17 08:15:00 UTC)));
        let sink = CapturedSink::default();
        let logger = Logger::with_sink("test", Box::new(sink.clone()), clock.clone());
        let driver = Driver::new(db.clone(), clock.clone(), logger);
        Self { db, clock, sink, driver }
    }

    /// Returns a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Returns the clock used by the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Returns the current time as seen by the driver.
    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Returns the lines logged so far by the driver.
    pub(crate) fn log_lines(&self) -> Vec<String> {
        self.sink.lines()
    }

    /// Returns a copy of the driver under test.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates an opening named `title` directly in the database, bypassing the driver.
    pub(crate) async fn put_opening(&self, title: &str) -> OpeningId {
        db::put_opening(&mut self.ex().await, &spec(title), self.now()).await.unwrap()
    }

    /// Fetches the opening `id` directly from the database.
    pub(crate) async fn get_opening(&self, id: OpeningId) -> Opening {
        db::get_opening(&mut self.ex().await, id).await.unwrap()
    }
}
