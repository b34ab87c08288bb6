//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use crate::db::models::SmokeTest;
use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::schema::job_groups;
use crate::status::Status;
use crate::status::Tracked;
use crate::status::TrackedKind;

/// A batch of jobs executed together under one smoke test
#[derive(Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize, Deserialize)]
#[diesel(belongs_to(SmokeTest))]
#[diesel(table_name = job_groups)]
pub struct JobGroup {
    pub id: i32,
    pub status: Status,
    pub smoke_test_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = job_groups)]
pub struct NewJobGroup {
    pub status: Status,
    pub smoke_test_id: i32,
}

impl NewJobGroup {
    pub fn for_smoke_test(parent: i32) -> Self {
        NewJobGroup {
            status: Status::Pending,
            smoke_test_id: parent,
        }
    }
}

impl Tracked for JobGroup {
    const KIND: TrackedKind = TrackedKind::JobGroup;

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, next: Status, at: NaiveDateTime) {
        self.status = next;
        self.updated_at = at;
    }
}

impl JobGroup {
    pub fn create(database_connection: &mut PgConnection, new_group: &NewJobGroup) -> Result<JobGroup> {
        let now = crate::db::now();
        trace!("Creating job group in database: {:?}", new_group);

        diesel::insert_into(job_groups::table)
            .values((new_group, job_groups::created_at.eq(now), job_groups::updated_at.eq(now)))
            .returning(JobGroup::as_returning())
            .get_result(database_connection)
            .map_err(Error::from)
    }

    pub fn with_id(database_connection: &mut PgConnection, group_id: i32) -> Result<JobGroup> {
        job_groups::table
            .find(group_id)
            .select(JobGroup::as_select())
            .first(database_connection)
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::JobGroup, group_id))
    }

    pub fn of_smoke_test(database_connection: &mut PgConnection, smoke_test: &SmokeTest) -> Result<Vec<JobGroup>> {
        JobGroup::belonging_to(smoke_test)
            .select(JobGroup::as_select())
            .order(job_groups::id.desc())
            .load(database_connection)
            .map_err(Error::from)
    }

    /// Row-locking status transition, must run inside a transaction
    pub fn transition(database_connection: &mut PgConnection, group_id: i32, next: Status) -> Result<Status> {
        let row = job_groups::table
            .find(group_id)
            .select(JobGroup::as_select())
            .for_update()
            .first::<JobGroup>(database_connection)
            .optional()?;

        crate::db::transition(row, group_id, next, |row: &JobGroup| {
            diesel::update(job_groups::table.find(group_id))
                .set((job_groups::status.eq(row.status), job_groups::updated_at.eq(row.updated_at)))
                .execute(database_connection)?;
            Ok(())
        })
    }
}
