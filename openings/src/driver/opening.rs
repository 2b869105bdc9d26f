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

//! Operations on one opening.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use jobs_core::driver::DriverResult;

impl Driver {
    /// Gets the opening identified by `id`.
    pub(crate) async fn get_opening(self, id: OpeningId) -> DriverResult<Opening> {
        let opening = db::get_opening(&mut self.db.ex().await?, id).await?;
        Ok(opening)
    }

    /// Creates a new opening from `spec` and returns it as stored.
    pub(crate) async fn create_opening(self, spec: OpeningSpec) -> DriverResult<Opening> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let id = db::put_opening(tx.ex(), &spec, now).await?;
        let opening = db::get_opening(tx.ex(), id).await?;
        tx.commit().await?;

        self.logger.infof(format_args!("created opening {}", id));
        Ok(opening)
    }

    /// Applies `update` to the existing opening identified by `id` and returns the result.
    ///
    /// The `update` is expected to have been validated already.
    pub(crate) async fn update_opening(
        self,
        id: OpeningId,
        update: OpeningUpdate,
    ) -> DriverResult<Opening> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let opening = db::get_opening(tx.ex(), id).await?.with_update(update, now);
        db::update_opening(tx.ex(), &opening).await?;
        tx.commit().await?;

        self.logger.infof(format_args!("updated opening {}", id));
        Ok(opening)
    }

    /// Deletes the opening identified by `id` and returns its last contents.
    pub(crate) async fn delete_opening(self, id: OpeningId) -> DriverResult<Opening> {
        let mut tx = self.db.begin().await?;
        let opening = db::get_opening(tx.ex(), id).await?;
        db::delete_opening(tx.ex(), id).await?;
        tx.commit().await?;

        self.logger.infof(format_args!("deleted opening {}", id));
        Ok(opening)
    }
}
