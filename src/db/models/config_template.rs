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
use typed_builder::TypedBuilder;

use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::schema::config_templates;
use crate::schema::config_templates_smoke_tests;
use crate::variant::JobKind;

/// A named configuration bundle, used to parameterize jobs
#[derive(Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = config_templates)]
pub struct ConfigTemplate {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub cookbook_repo_url: String,
    pub nodes_spec: String,
    pub server_group_spec: String,
    pub job_type: JobKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The config template columns a job listing carries along
#[derive(Clone, Debug, Eq, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = config_templates)]
pub struct ConfigTemplateRef {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Insertable, TypedBuilder)]
#[diesel(table_name = config_templates)]
pub struct NewConfigTemplate {
    #[builder(setter(into))]
    pub name: String,

    #[builder(setter(into))]
    pub description: String,

    #[builder(setter(into))]
    pub cookbook_repo_url: String,

    #[builder(setter(into))]
    pub nodes_spec: String,

    #[builder(setter(into))]
    pub server_group_spec: String,

    #[builder(default)]
    pub job_type: JobKind,
}

impl NewConfigTemplate {
    pub fn validate(self) -> Result<Self> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        if self.description.trim().is_empty() {
            errors.add("description", "can't be blank");
        }
        if let Err(e) = url::Url::parse(&self.cookbook_repo_url) {
            errors.add("cookbook_repo_url", format!("is not a valid URL: {}", e));
        }
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&self.nodes_spec) {
            errors.add("nodes_spec", format!("is not valid JSON: {}", e));
        }
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&self.server_group_spec) {
            errors.add("server_group_spec", format!("is not valid JSON: {}", e));
        }

        errors.into_result().map(|_| self)
    }
}

impl From<&ConfigTemplate> for ConfigTemplateRef {
    fn from(t: &ConfigTemplate) -> Self {
        ConfigTemplateRef {
            id: t.id,
            name: t.name.clone(),
        }
    }
}

impl ConfigTemplate {
    pub fn create(database_connection: &mut PgConnection, new_template: &NewConfigTemplate) -> Result<ConfigTemplate> {
        let now = crate::db::now();
        trace!("Creating config template in database: {:?}", new_template);

        diesel::insert_into(config_templates::table)
            .values((new_template, config_templates::created_at.eq(now), config_templates::updated_at.eq(now)))
            .returning(ConfigTemplate::as_returning())
            .get_result(database_connection)
            .map_err(Error::from)
    }

    pub fn with_id(database_connection: &mut PgConnection, template_id: i32) -> Result<ConfigTemplate> {
        config_templates::table
            .find(template_id)
            .select(ConfigTemplate::as_select())
            .first(database_connection)
            .optional()?
            .ok_or_else(|| Error::not_found(EntityKind::ConfigTemplate, template_id))
    }

    pub fn all(database_connection: &mut PgConnection) -> Result<Vec<ConfigTemplate>> {
        config_templates::table
            .select(ConfigTemplate::as_select())
            .order(config_templates::id.asc())
            .load(database_connection)
            .map_err(Error::from)
    }

    pub fn of_smoke_test(database_connection: &mut PgConnection, smoke_test_id: i32) -> Result<Vec<ConfigTemplate>> {
        config_templates_smoke_tests::table
            .inner_join(config_templates::table)
            .filter(config_templates_smoke_tests::smoke_test_id.eq(smoke_test_id))
            .select(ConfigTemplate::as_select())
            .order(config_templates::id.asc())
            .load(database_connection)
            .map_err(Error::from)
    }

    /// Add a row to the join table, attaching twice is a no-op
    pub fn attach(database_connection: &mut PgConnection, template_id: i32, smoke_test_id: i32) -> Result<()> {
        trace!("Attaching config template {} to smoke test {}", template_id, smoke_test_id);
        diesel::insert_into(config_templates_smoke_tests::table)
            .values((
                config_templates_smoke_tests::config_template_id.eq(template_id),
                config_templates_smoke_tests::smoke_test_id.eq(smoke_test_id),
            ))
            .on_conflict_do_nothing()
            .execute(database_connection)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_template() -> NewConfigTemplate {
        NewConfigTemplate::builder()
            .name("nova-vpc")
            .description("Nova on a three node VPC")
            .cookbook_repo_url("https://github.com/example/cookbooks.git")
            .nodes_spec(r#"[{"name": "nova1"}]"#)
            .server_group_spec(r#"{"name": "vpc"}"#)
            .build()
    }

    #[test]
    fn test_valid_template() {
        let t = new_template().validate().unwrap();
        assert_eq!(t.job_type, JobKind::Vpc);
    }

    #[test]
    fn test_invalid_template_reports_every_field() {
        let mut t = new_template();
        t.name = String::from("  ");
        t.cookbook_repo_url = String::from("not a url");
        t.nodes_spec = String::from("{");

        match t.validate() {
            Err(Error::ValidationFailed(errors)) => {
                assert!(errors.get("name").is_some());
                assert!(errors.get("cookbook_repo_url").is_some());
                assert!(errors.get("nodes_spec").is_some());
                assert!(errors.get("description").is_none());
                assert!(errors.get("server_group_spec").is_none());
            }
            other => panic!("Expected validation failure, got {:?}", other),
        }
    }
}
