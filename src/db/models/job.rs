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

use crate::db::models::ConfigTemplate;
use crate::db::models::ConfigTemplateRef;
use crate::db::models::JobGroup;
use crate::db::models::SmokeTestRef;
use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::schema;
use crate::schema::jobs;
use crate::status::Status;
use crate::status::Tracked;
use crate::status::TrackedKind;
use crate::variant::JobKind;

/// A single unit of work, with its output capture
#[derive(Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize, Deserialize)]
#[diesel(belongs_to(JobGroup))]
#[diesel(belongs_to(ConfigTemplate))]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: i32,
    pub status: Status,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub nova_revision: Option<String>,
    #[serde(default)]
    pub glance_revision: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    pub job_group_id: i32,
    pub config_template_id: i32,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The columns shown in job listings, everything but the output blobs
#[derive(Clone, Debug, Eq, PartialEq, Queryable, Selectable)]
#[diesel(table_name = jobs)]
pub struct JobSummary {
    pub id: i32,
    pub status: Status,
    pub job_group_id: i32,
    pub nova_revision: Option<String>,
    pub glance_revision: Option<String>,
    pub msg: Option<String>,
    pub config_template_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A [`JobSummary`] joined with its config template and the smoke test of its job group
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: i32,
    pub status: Status,
    pub job_group_id: i32,
    #[serde(default)]
    pub nova_revision: Option<String>,
    #[serde(default)]
    pub glance_revision: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    pub config_template_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_template: Option<ConfigTemplateRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoke_test: Option<SmokeTestRef>,
}

impl JobListing {
    pub fn new(summary: JobSummary, template: ConfigTemplateRef, smoke_test: SmokeTestRef) -> Self {
        JobListing {
            id: summary.id,
            status: summary.status,
            job_group_id: summary.job_group_id,
            nova_revision: summary.nova_revision,
            glance_revision: summary.glance_revision,
            msg: summary.msg,
            config_template_id: summary.config_template_id,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            config_template: Some(template),
            smoke_test: Some(smoke_test),
        }
    }

    /// Drop the eagerly loaded records
    pub fn without_related(self) -> Self {
        JobListing {
            config_template: None,
            smoke_test: None,
            ..self
        }
    }
}

/// Fields accepted when creating a job. Everything is optional here, presence is checked when
/// the job is validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobFields {
    pub job_group_id: Option<i32>,
    pub config_template_id: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<JobKind>,
    pub status: Option<Status>,
    pub nova_revision: Option<String>,
    pub glance_revision: Option<String>,
    pub msg: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub status: Status,
    pub job_group_id: i32,
    pub config_template_id: i32,
    pub kind: JobKind,
    pub nova_revision: Option<String>,
    pub glance_revision: Option<String>,
    pub msg: Option<String>,
}

/// Output of a job, written while or after it ran. `None` leaves the column untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = jobs)]
pub struct JobOutput {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub nova_revision: Option<String>,
    pub glance_revision: Option<String>,
    pub msg: Option<String>,
}

impl JobOutput {
    pub fn apply_to(self, job: &mut Job) {
        fn set(target: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut job.stdout, self.stdout);
        set(&mut job.stderr, self.stderr);
        set(&mut job.nova_revision, self.nova_revision);
        set(&mut job.glance_revision, self.glance_revision);
        set(&mut job.msg, self.msg);
    }
}

impl Tracked for Job {
    const KIND: TrackedKind = TrackedKind::Job;

    fn status(&self) -> Status {
        self.status
    }

    fn set_status(&mut self, next: Status, at: NaiveDateTime) {
        self.status = next;
        self.updated_at = at;
    }
}

impl Job {
    pub fn create(database_connection: &mut PgConnection, new_job: &NewJob) -> Result<Job> {
        let now = crate::db::now();
        trace!("Creating Job in database: {:?}", new_job);

        diesel::insert_into(jobs::table)
            .values((new_job, jobs::created_at.eq(now), jobs::updated_at.eq(now)))
            .returning(Job::as_returning())
            .get_result(database_connection)
            .map_err(Error::from)
    }

    pub fn with_id(database_connection: &mut PgConnection, job_id: i32) -> Result<Job> {
        jobs::table
            .find(job_id)
            .select(Job::as_select())
            .first(database_connection)
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::Job, job_id))
    }

    /// All jobs, most recent first, with their config template and smoke test
    pub fn listings(database_connection: &mut PgConnection) -> Result<Vec<JobListing>> {
        let rows = jobs::table
            .inner_join(schema::config_templates::table)
            .inner_join(schema::job_groups::table.inner_join(schema::smoke_tests::table))
            .select((
                JobSummary::as_select(),
                ConfigTemplateRef::as_select(),
                SmokeTestRef::as_select(),
            ))
            .order(jobs::id.desc())
            .load::<(JobSummary, ConfigTemplateRef, SmokeTestRef)>(database_connection)?;

        trace!("Loaded {} job listings", rows.len());
        Ok(rows
            .into_iter()
            .map(|(summary, template, smoke_test)| JobListing::new(summary, template, smoke_test))
            .collect())
    }

    pub fn update_output(database_connection: &mut PgConnection, job_id: i32, output: &JobOutput) -> Result<Job> {
        trace!("Updating output of job {}", job_id);
        diesel::update(jobs::table.find(job_id))
            .set((output, jobs::updated_at.eq(crate::db::now())))
            .returning(Job::as_returning())
            .get_result(database_connection)
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::Job, job_id))
    }

    pub fn delete(database_connection: &mut PgConnection, job_id: i32) -> Result<()> {
        trace!("Deleting job {}", job_id);
        let deleted = diesel::delete(jobs::table.find(job_id)).execute(database_connection)?;

        if deleted == 0 {
            Err(Error::not_found(EntityKind::Job, job_id))
        } else {
            Ok(())
        }
    }

    /// Row-locking status transition, must run inside a transaction
    pub fn transition(database_connection: &mut PgConnection, job_id: i32, next: Status) -> Result<Status> {
        let row = jobs::table
            .find(job_id)
            .select(Job::as_select())
            .for_update()
            .first::<Job>(database_connection)
            .optional()?;

        crate::db::transition(row, job_id, next, |row: &Job| {
            diesel::update(jobs::table.find(job_id))
                .set((jobs::status.eq(row.status), jobs::updated_at.eq(row.updated_at)))
                .execute(database_connection)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tests::job;

    #[test]
    fn test_output_only_overwrites_given_fields() {
        let mut j = job(1, 1, 1);
        j.msg = Some(String::from("old"));
        j.nova_revision = Some(String::from("abc"));

        JobOutput {
            stdout: Some(String::from("ok\n")),
            msg: Some(String::from("new")),
            ..JobOutput::default()
        }
        .apply_to(&mut j);

        assert_eq!(j.stdout.as_deref(), Some("ok\n"));
        assert_eq!(j.msg.as_deref(), Some("new"));
        assert_eq!(j.nova_revision.as_deref(), Some("abc"));
        assert!(j.stderr.is_none());
    }

    #[test]
    fn test_listing_without_related() {
        let j = job(3, 1, 2);
        let summary = JobSummary {
            id: j.id,
            status: j.status,
            job_group_id: j.job_group_id,
            nova_revision: None,
            glance_revision: None,
            msg: None,
            config_template_id: j.config_template_id,
            created_at: j.created_at,
            updated_at: j.updated_at,
        };
        let template = ConfigTemplateRef { id: 2, name: String::from("t") };
        let smoke_test = SmokeTestRef { id: 9, description: None, status: Status::Running };

        let listing = JobListing::new(summary, template, smoke_test);
        assert_eq!(listing.smoke_test.as_ref().map(|s| s.id), Some(9));

        let bare = listing.without_related();
        assert_eq!(bare.id, 3);
        assert!(bare.config_template.is_none());
        assert!(bare.smoke_test.is_none());
    }

    #[test]
    fn test_job_fields_from_json() {
        let f: JobFields = serde_json::from_str(r#"{"job_group_id": 5, "config_template_id": 3}"#).unwrap();
        assert_eq!(f.job_group_id, Some(5));
        assert_eq!(f.config_template_id, Some(3));
        assert!(f.kind.is_none());
        assert!(f.status.is_none());

        let f: JobFields = serde_json::from_str(r#"{"type": "JobUnitTester"}"#).unwrap();
        assert_eq!(f.kind, Some(JobKind::UnitTester));
    }
}
