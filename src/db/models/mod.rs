//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

mod config_template;
pub use config_template::*;

mod job;
pub use job::*;

mod job_group;
pub use job_group::*;

mod package_builder;
pub use package_builder::*;

pub use smoke_test::*;

mod user;
pub use user::*;

#[cfg(test)]
pub mod tests {
    use chrono::NaiveDate;
    use chrono::NaiveDateTime;

    use super::*;
    use crate::status::Status;
    use crate::variant::JobKind;
    use crate::variant::PackageBuilderKind;

    pub fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2011, 3, 14)
            .and_then(|d| d.and_hms_opt(15, 9, 26))
            .unwrap()
    }

    pub fn job(id: i32, job_group_id: i32, config_template_id: i32) -> Job {
        Job {
            id,
            status: Status::Pending,
            stdout: None,
            stderr: None,
            nova_revision: None,
            glance_revision: None,
            msg: None,
            job_group_id,
            config_template_id,
            kind: JobKind::Vpc,
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    pub fn package_builder(id: i32, smoke_test_id: i32) -> PackageBuilder {
        PackageBuilder {
            id,
            kind: PackageBuilderKind::Nova,
            url: String::from("https://github.com/openstack/nova.git"),
            branch: None,
            merge_trunk: true,
            smoke_test_id,
            packager_url: String::new(),
            revision_hash: String::new(),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    pub fn new_config_template(name: &str) -> NewConfigTemplate {
        NewConfigTemplate::builder()
            .name(name)
            .description(format!("{} template", name))
            .cookbook_repo_url("https://github.com/example/cookbooks.git")
            .nodes_spec(r#"[{"name": "nova1", "flavor_id": 3}]"#)
            .server_group_spec(r#"{"name": "smoke", "domain_name": "vpc"}"#)
            .build()
    }
}
