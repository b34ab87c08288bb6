//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! In-memory [`Store`], following the same rules as the postgres one

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::db::models::*;
use crate::db::transition;
use crate::db::Store;
use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::status::Status;
use crate::status::TrackedKind;

#[derive(Default)]
struct Tables {
    next_id: BTreeMap<EntityKind, i32>,
    smoke_tests: BTreeMap<i32, SmokeTest>,
    config_templates: BTreeMap<i32, ConfigTemplate>,
    config_templates_smoke_tests: BTreeSet<(i32, i32)>,
    package_builders: BTreeMap<i32, PackageBuilder>,
    job_groups: BTreeMap<i32, JobGroup>,
    jobs: BTreeMap<i32, Job>,
    users: BTreeMap<i32, User>,
}

impl Tables {
    fn next_id(&mut self, kind: EntityKind) -> i32 {
        let id = self.next_id.entry(kind).or_insert(0);
        *id += 1;
        *id
    }

    fn smoke_test(&self, id: i32) -> Result<&SmokeTest> {
        self.smoke_tests.get(&id).ok_or_else(|| Error::not_found(EntityKind::SmokeTest, id))
    }

    fn config_template(&self, id: i32) -> Result<&ConfigTemplate> {
        self.config_templates
            .get(&id)
            .ok_or_else(|| Error::not_found(EntityKind::ConfigTemplate, id))
    }

    fn job_group(&self, id: i32) -> Result<&JobGroup> {
        self.job_groups.get(&id).ok_or_else(|| Error::not_found(EntityKind::JobGroup, id))
    }

    fn job(&self, id: i32) -> Result<&Job> {
        self.jobs.get(&id).ok_or_else(|| Error::not_found(EntityKind::Job, id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_count(&self) -> usize {
        self.tables.lock().jobs.len()
    }
}

impl Store for MemoryStore {
    fn create_smoke_test(&self, new: NewSmokeTest) -> Result<SmokeTest> {
        let mut t = self.tables.lock();
        let now = crate::db::now();
        let st = SmokeTest {
            id: t.next_id(EntityKind::SmokeTest),
            description: new.description,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        t.smoke_tests.insert(st.id, st.clone());
        Ok(st)
    }

    fn smoke_test(&self, id: i32) -> Result<SmokeTest> {
        self.tables.lock().smoke_test(id).cloned()
    }

    fn smoke_tests(&self) -> Result<Vec<SmokeTest>> {
        Ok(self.tables.lock().smoke_tests.values().rev().cloned().collect())
    }

    fn create_config_template(&self, new: NewConfigTemplate) -> Result<ConfigTemplate> {
        let mut t = self.tables.lock();
        let now = crate::db::now();
        let template = ConfigTemplate {
            id: t.next_id(EntityKind::ConfigTemplate),
            name: new.name,
            description: new.description,
            cookbook_repo_url: new.cookbook_repo_url,
            nodes_spec: new.nodes_spec,
            server_group_spec: new.server_group_spec,
            job_type: new.job_type,
            created_at: now,
            updated_at: now,
        };
        t.config_templates.insert(template.id, template.clone());
        Ok(template)
    }

    fn config_template(&self, id: i32) -> Result<ConfigTemplate> {
        self.tables.lock().config_template(id).cloned()
    }

    fn config_templates(&self) -> Result<Vec<ConfigTemplate>> {
        Ok(self.tables.lock().config_templates.values().cloned().collect())
    }

    fn config_templates_of(&self, smoke_test_id: i32) -> Result<Vec<ConfigTemplate>> {
        let t = self.tables.lock();
        t.smoke_test(smoke_test_id)?;
        t.config_templates_smoke_tests
            .iter()
            .filter(|(_, st)| *st == smoke_test_id)
            .map(|(ct, _)| t.config_template(*ct).cloned())
            .collect()
    }

    fn attach_config_template(&self, smoke_test_id: i32, config_template_id: i32) -> Result<()> {
        let mut t = self.tables.lock();
        t.smoke_test(smoke_test_id)?;
        t.config_template(config_template_id)?;
        t.config_templates_smoke_tests.insert((config_template_id, smoke_test_id));
        Ok(())
    }

    fn create_package_builder(&self, new: NewPackageBuilder) -> Result<PackageBuilder> {
        let mut t = self.tables.lock();
        t.smoke_test(new.smoke_test_id)?;
        let now = crate::db::now();
        let builder = PackageBuilder {
            id: t.next_id(EntityKind::PackageBuilder),
            kind: new.kind,
            url: new.url,
            branch: new.branch,
            merge_trunk: new.merge_trunk,
            smoke_test_id: new.smoke_test_id,
            packager_url: new.packager_url,
            revision_hash: new.revision_hash,
            created_at: now,
            updated_at: now,
        };
        t.package_builders.insert(builder.id, builder.clone());
        Ok(builder)
    }

    fn package_builders_of(&self, smoke_test_id: i32) -> Result<Vec<PackageBuilder>> {
        let t = self.tables.lock();
        t.smoke_test(smoke_test_id)?;
        Ok(t.package_builders
            .values()
            .filter(|b| b.smoke_test_id == smoke_test_id)
            .cloned()
            .collect())
    }

    fn create_job_group(&self, new: NewJobGroup) -> Result<JobGroup> {
        let mut t = self.tables.lock();
        t.smoke_test(new.smoke_test_id)?;
        let now = crate::db::now();
        let group = JobGroup {
            id: t.next_id(EntityKind::JobGroup),
            status: new.status,
            smoke_test_id: new.smoke_test_id,
            created_at: now,
            updated_at: now,
        };
        t.job_groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn job_group(&self, id: i32) -> Result<JobGroup> {
        self.tables.lock().job_group(id).cloned()
    }

    fn job_groups_of(&self, smoke_test_id: i32) -> Result<Vec<JobGroup>> {
        let t = self.tables.lock();
        t.smoke_test(smoke_test_id)?;
        Ok(t.job_groups
            .values()
            .rev()
            .filter(|g| g.smoke_test_id == smoke_test_id)
            .cloned()
            .collect())
    }

    fn job_listings(&self) -> Result<Vec<JobListing>> {
        let t = self.tables.lock();
        t.jobs
            .values()
            .rev()
            .map(|job| {
                let template = t.config_template(job.config_template_id)?;
                let group = t.job_group(job.job_group_id)?;
                let smoke_test = t.smoke_test(group.smoke_test_id)?;
                let summary = JobSummary {
                    id: job.id,
                    status: job.status,
                    job_group_id: job.job_group_id,
                    nova_revision: job.nova_revision.clone(),
                    glance_revision: job.glance_revision.clone(),
                    msg: job.msg.clone(),
                    config_template_id: job.config_template_id,
                    created_at: job.created_at,
                    updated_at: job.updated_at,
                };
                Ok(JobListing::new(summary, template.into(), smoke_test.into()))
            })
            .collect()
    }

    fn job(&self, id: i32) -> Result<Job> {
        self.tables.lock().job(id).cloned()
    }

    fn insert_job(&self, new: NewJob) -> Result<Job> {
        let mut t = self.tables.lock();
        t.job_group(new.job_group_id)?;
        t.config_template(new.config_template_id)?;
        let now = crate::db::now();
        let job = Job {
            id: t.next_id(EntityKind::Job),
            status: new.status,
            stdout: None,
            stderr: None,
            nova_revision: new.nova_revision,
            glance_revision: new.glance_revision,
            msg: new.msg,
            job_group_id: new.job_group_id,
            config_template_id: new.config_template_id,
            kind: new.kind,
            created_at: now,
            updated_at: now,
        };
        t.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn update_job_output(&self, id: i32, output: JobOutput) -> Result<Job> {
        let mut t = self.tables.lock();
        let job = t.jobs.get_mut(&id).ok_or_else(|| Error::not_found(EntityKind::Job, id))?;
        output.apply_to(job);
        job.updated_at = crate::db::now();
        Ok(job.clone())
    }

    fn delete_job(&self, id: i32) -> Result<()> {
        self.tables
            .lock()
            .jobs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(EntityKind::Job, id))
    }

    fn create_user(&self, new: NewUser) -> Result<User> {
        let mut t = self.tables.lock();
        let now = crate::db::now();
        let user = User {
            id: t.next_id(EntityKind::User),
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            hashed_password: new.hashed_password,
            salt: new.salt,
            is_active: new.is_active,
            is_admin: new.is_admin,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user_by_name(&self, username: &str) -> Result<User> {
        self.tables
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::User, username))
    }

    fn set_status(&self, kind: TrackedKind, id: i32, next: Status) -> Result<Status> {
        let mut t = self.tables.lock();
        match kind {
            TrackedKind::SmokeTest => transition(t.smoke_tests.get(&id).cloned(), id, next, |row| {
                t.smoke_tests.insert(id, row.clone());
                Ok(())
            }),
            TrackedKind::JobGroup => transition(t.job_groups.get(&id).cloned(), id, next, |row| {
                t.job_groups.insert(id, row.clone());
                Ok(())
            }),
            TrackedKind::Job => transition(t.jobs.get(&id).cloned(), id, next, |row| {
                t.jobs.insert(id, row.clone());
                Ok(())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tests::new_config_template;

    fn seeded() -> (MemoryStore, JobGroup, ConfigTemplate) {
        let store = MemoryStore::new();
        let st = store.create_smoke_test(NewSmokeTest::default()).unwrap();
        let group = store.create_job_group(NewJobGroup::for_smoke_test(st.id)).unwrap();
        let template = store.create_config_template(new_config_template("vpc")).unwrap();
        (store, group, template)
    }

    fn new_job(group: &JobGroup, template: &ConfigTemplate) -> NewJob {
        NewJob {
            status: Status::Pending,
            job_group_id: group.id,
            config_template_id: template.id,
            kind: Default::default(),
            nova_revision: None,
            glance_revision: None,
            msg: None,
        }
    }

    #[test]
    fn test_ids_are_assigned_per_table() {
        let (store, group, template) = seeded();
        assert_eq!(group.id, 1);
        assert_eq!(template.id, 1);

        let a = store.insert_job(new_job(&group, &template)).unwrap();
        let b = store.insert_job(new_job(&group, &template)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn test_insert_job_checks_references() {
        let (store, group, template) = seeded();
        let mut j = new_job(&group, &template);
        j.job_group_id = 42;

        assert!(matches!(
            store.insert_job(j),
            Err(Error::NotFound { kind: EntityKind::JobGroup, .. })
        ));
        assert_eq!(store.job_count(), 0);
    }

    #[test]
    fn test_listings_are_most_recent_first_and_joined() {
        let (store, group, template) = seeded();
        for _ in 0..3 {
            store.insert_job(new_job(&group, &template)).unwrap();
        }

        let listings = store.job_listings().unwrap();
        let ids = listings.iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(listings
            .iter()
            .all(|l| l.config_template.as_ref().map(|t| t.name.as_str()) == Some("vpc")));
        assert!(listings
            .iter()
            .all(|l| l.smoke_test.as_ref().map(|s| s.id) == Some(group.smoke_test_id)));
    }

    #[test]
    fn test_delete_missing_job() {
        let store = MemoryStore::new();
        assert!(matches!(store.delete_job(1), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_set_status_rejection_leaves_row_untouched() {
        let (store, group, template) = seeded();
        let job = store.insert_job(new_job(&group, &template)).unwrap();

        assert_eq!(store.set_status(TrackedKind::Job, job.id, Status::Running).unwrap(), Status::Running);
        assert_eq!(store.set_status(TrackedKind::Job, job.id, Status::Failed).unwrap(), Status::Failed);

        let before = store.job(job.id).unwrap();
        assert!(store.set_status(TrackedKind::Job, job.id, Status::Running).is_err());
        assert_eq!(store.job(job.id).unwrap(), before);
    }

    #[test]
    fn test_set_status_of_unknown_group() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_status(TrackedKind::JobGroup, 5, Status::Running),
            Err(Error::NotFound { kind: EntityKind::JobGroup, .. })
        ));
    }

    #[test]
    fn test_attach_config_template() {
        let (store, group, template) = seeded();
        store.attach_config_template(group.smoke_test_id, template.id).unwrap();
        store.attach_config_template(group.smoke_test_id, template.id).unwrap();

        let templates = store.config_templates_of(group.smoke_test_id).unwrap();
        assert_eq!(templates, vec![template]);
        assert!(store.attach_config_template(99, 1).is_err());
    }
}
