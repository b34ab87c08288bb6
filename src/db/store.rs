//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::r2d2::PooledConnection;
use diesel::Connection;
use tracing::debug;

use crate::db::models::*;
use crate::error::Error;
use crate::error::Result;
use crate::status::Status;
use crate::status::TrackedKind;

/// Durable, id-addressed storage for every entity kind
///
/// Lookups by id fail with [`Error::NotFound`] if there is no such row. Inserts assign the id and
/// the timestamps, updates stamp `updated_at`.
pub trait Store: Send + Sync {
    fn create_smoke_test(&self, new: NewSmokeTest) -> Result<SmokeTest>;
    fn smoke_test(&self, id: i32) -> Result<SmokeTest>;
    fn smoke_tests(&self) -> Result<Vec<SmokeTest>>;

    fn create_config_template(&self, new: NewConfigTemplate) -> Result<ConfigTemplate>;
    fn config_template(&self, id: i32) -> Result<ConfigTemplate>;
    fn config_templates(&self) -> Result<Vec<ConfigTemplate>>;
    fn config_templates_of(&self, smoke_test_id: i32) -> Result<Vec<ConfigTemplate>>;
    fn attach_config_template(&self, smoke_test_id: i32, config_template_id: i32) -> Result<()>;

    fn create_package_builder(&self, new: NewPackageBuilder) -> Result<PackageBuilder>;
    fn package_builders_of(&self, smoke_test_id: i32) -> Result<Vec<PackageBuilder>>;

    fn create_job_group(&self, new: NewJobGroup) -> Result<JobGroup>;
    fn job_group(&self, id: i32) -> Result<JobGroup>;
    fn job_groups_of(&self, smoke_test_id: i32) -> Result<Vec<JobGroup>>;

    /// Every job, most recent first, joined with its config template and smoke test
    fn job_listings(&self) -> Result<Vec<JobListing>>;
    fn job(&self, id: i32) -> Result<Job>;
    fn insert_job(&self, new: NewJob) -> Result<Job>;
    fn update_job_output(&self, id: i32, output: JobOutput) -> Result<Job>;
    fn delete_job(&self, id: i32) -> Result<()>;

    fn create_user(&self, new: NewUser) -> Result<User>;
    fn user_by_name(&self, username: &str) -> Result<User>;

    /// Atomically move a tracked entity to `next`, returning the new status
    fn set_status(&self, kind: TrackedKind, id: i32, next: Status) -> Result<Status>;
}

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// [`Store`] on top of a postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool.get().map_err(Error::from)
    }
}

impl Store for PgStore {
    fn create_smoke_test(&self, new: NewSmokeTest) -> Result<SmokeTest> {
        SmokeTest::create(&mut *self.conn()?, &new)
    }

    fn smoke_test(&self, id: i32) -> Result<SmokeTest> {
        SmokeTest::with_id(&mut *self.conn()?, id)
    }

    fn smoke_tests(&self) -> Result<Vec<SmokeTest>> {
        SmokeTest::all(&mut *self.conn()?)
    }

    fn create_config_template(&self, new: NewConfigTemplate) -> Result<ConfigTemplate> {
        ConfigTemplate::create(&mut *self.conn()?, &new)
    }

    fn config_template(&self, id: i32) -> Result<ConfigTemplate> {
        ConfigTemplate::with_id(&mut *self.conn()?, id)
    }

    fn config_templates(&self) -> Result<Vec<ConfigTemplate>> {
        ConfigTemplate::all(&mut *self.conn()?)
    }

    fn config_templates_of(&self, smoke_test_id: i32) -> Result<Vec<ConfigTemplate>> {
        let mut conn = self.conn()?;
        let smoke_test = SmokeTest::with_id(&mut *conn, smoke_test_id)?;
        ConfigTemplate::of_smoke_test(&mut *conn, smoke_test.id)
    }

    fn attach_config_template(&self, smoke_test_id: i32, config_template_id: i32) -> Result<()> {
        self.conn()?.transaction::<_, Error, _>(|conn| {
            SmokeTest::with_id(conn, smoke_test_id)?;
            ConfigTemplate::with_id(conn, config_template_id)?;
            ConfigTemplate::attach(conn, config_template_id, smoke_test_id)
        })
    }

    fn create_package_builder(&self, new: NewPackageBuilder) -> Result<PackageBuilder> {
        self.conn()?.transaction::<_, Error, _>(|conn| {
            SmokeTest::with_id(conn, new.smoke_test_id)?;
            PackageBuilder::create(conn, &new)
        })
    }

    fn package_builders_of(&self, smoke_test_id: i32) -> Result<Vec<PackageBuilder>> {
        let mut conn = self.conn()?;
        let smoke_test = SmokeTest::with_id(&mut *conn, smoke_test_id)?;
        PackageBuilder::of_smoke_test(&mut *conn, &smoke_test)
    }

    fn create_job_group(&self, new: NewJobGroup) -> Result<JobGroup> {
        self.conn()?.transaction::<_, Error, _>(|conn| {
            SmokeTest::with_id(conn, new.smoke_test_id)?;
            JobGroup::create(conn, &new)
        })
    }

    fn job_group(&self, id: i32) -> Result<JobGroup> {
        JobGroup::with_id(&mut *self.conn()?, id)
    }

    fn job_groups_of(&self, smoke_test_id: i32) -> Result<Vec<JobGroup>> {
        let mut conn = self.conn()?;
        let smoke_test = SmokeTest::with_id(&mut *conn, smoke_test_id)?;
        JobGroup::of_smoke_test(&mut *conn, &smoke_test)
    }

    fn job_listings(&self) -> Result<Vec<JobListing>> {
        Job::listings(&mut *self.conn()?)
    }

    fn job(&self, id: i32) -> Result<Job> {
        Job::with_id(&mut *self.conn()?, id)
    }

    fn insert_job(&self, new: NewJob) -> Result<Job> {
        self.conn()?.transaction::<_, Error, _>(|conn| {
            JobGroup::with_id(conn, new.job_group_id)?;
            ConfigTemplate::with_id(conn, new.config_template_id)?;
            Job::create(conn, &new)
        })
    }

    fn update_job_output(&self, id: i32, output: JobOutput) -> Result<Job> {
        Job::update_output(&mut *self.conn()?, id, &output)
    }

    fn delete_job(&self, id: i32) -> Result<()> {
        Job::delete(&mut *self.conn()?, id)
    }

    fn create_user(&self, new: NewUser) -> Result<User> {
        User::create(&mut *self.conn()?, &new)
    }

    fn user_by_name(&self, username: &str) -> Result<User> {
        User::with_name(&mut *self.conn()?, username)
    }

    fn set_status(&self, kind: TrackedKind, id: i32, next: Status) -> Result<Status> {
        debug!("Transition of {} {} to {}", kind, id, next);
        self.conn()?.transaction::<_, Error, _>(|conn| match kind {
            TrackedKind::SmokeTest => SmokeTest::transition(conn, id, next),
            TrackedKind::JobGroup => JobGroup::transition(conn, id, next),
            TrackedKind::Job => Job::transition(conn, id, next),
        })
    }
}
