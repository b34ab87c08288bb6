//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Operations on the job resource
//!
//! Reading is open to everyone, every mutating operation takes an [`Authorized`] token.

use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::auth::Authorized;
use crate::db::models::Job;
use crate::db::models::JobFields;
use crate::db::models::JobListing;
use crate::db::models::JobOutput;
use crate::db::models::NewJob;
use crate::db::Store;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::format::Snapshot;
use crate::status::Status;
use crate::status::TrackedKind;

#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn Store>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        JobRepository { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// All jobs, most recent first
    ///
    /// Each call queries the store again. With `include_related` each listing carries its config
    /// template and the smoke test of its job group.
    pub fn list_jobs(&self, include_related: bool) -> Result<Vec<JobListing>> {
        let listings = self.store.job_listings()?;
        debug!("Listing {} jobs", listings.len());

        if include_related {
            Ok(listings)
        } else {
            Ok(listings.into_iter().map(JobListing::without_related).collect())
        }
    }

    pub fn get_job(&self, id: i32) -> Result<Job> {
        self.store.job(id)
    }

    /// Validate and insert a job. Nothing is written if validation fails.
    pub fn create_job(&self, who: &Authorized, fields: JobFields) -> Result<Job> {
        let mut errors = ValidationErrors::default();

        let job_group_id = match fields.job_group_id {
            None => {
                errors.add("job_group_id", "can't be blank");
                None
            }
            Some(group) => match self.store.job_group(group) {
                Ok(group) => Some(group.id),
                Err(Error::NotFound { .. }) => {
                    errors.add("job_group_id", "must reference an existing job group");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        let config_template_id = match fields.config_template_id {
            None => {
                errors.add("config_template_id", "can't be blank");
                None
            }
            Some(template) => match self.store.config_template(template) {
                Ok(template) => Some(template.id),
                Err(Error::NotFound { .. }) => {
                    errors.add("config_template_id", "must reference an existing config template");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        match (job_group_id, config_template_id) {
            (Some(job_group_id), Some(config_template_id)) if errors.is_empty() => {
                let job = self.store.insert_job(NewJob {
                    status: fields.status.unwrap_or_default(),
                    job_group_id,
                    config_template_id,
                    kind: fields.kind.unwrap_or_default(),
                    nova_revision: fields.nova_revision,
                    glance_revision: fields.glance_revision,
                    msg: fields.msg,
                })?;

                info!("{} created job {}", who.username(), job.id);
                Ok(job)
            }
            _ => {
                debug!("Rejecting job: {}", errors);
                Err(Error::ValidationFailed(errors))
            }
        }
    }

    /// Overwrite the given output fields of a job
    pub fn update_job(&self, who: &Authorized, id: i32, output: JobOutput) -> Result<Job> {
        let job = self.store.update_job_output(id, output)?;
        info!("{} updated job {}", who.username(), id);
        Ok(job)
    }

    /// Delete a job, returning both wire forms of it as they were right before the deletion
    pub fn delete_job(&self, who: &Authorized, id: i32) -> Result<Snapshot> {
        let snapshot = Snapshot::capture(self.store.job(id)?)?;
        self.store.delete_job(id)?;

        info!("{} deleted job {}", who.username(), id);
        Ok(snapshot)
    }

    pub fn transition(&self, who: &Authorized, kind: TrackedKind, id: i32, next: Status) -> Result<Status> {
        let status = self.store.set_status(kind, id, next)?;
        info!("{} moved {} {} to {}", who.username(), kind, id, status);
        Ok(status)
    }
}
