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

use crate::db::models::SmokeTest;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::schema::package_builders;
use crate::variant::PackageBuilderKind;

/// Describes how the packages of one project are built for a smoke test
#[derive(Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize, Deserialize)]
#[diesel(belongs_to(SmokeTest))]
#[diesel(table_name = package_builders)]
pub struct PackageBuilder {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: PackageBuilderKind,
    pub url: String,
    pub branch: Option<String>,
    pub merge_trunk: bool,
    pub smoke_test_id: i32,
    pub packager_url: String,
    pub revision_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable, TypedBuilder)]
#[diesel(table_name = package_builders)]
pub struct NewPackageBuilder {
    #[builder(default)]
    pub kind: PackageBuilderKind,

    #[builder(setter(into))]
    pub url: String,

    #[builder(default)]
    pub branch: Option<String>,

    #[builder(default = true)]
    pub merge_trunk: bool,

    pub smoke_test_id: i32,

    #[builder(default, setter(into))]
    pub packager_url: String,

    #[builder(default, setter(into))]
    pub revision_hash: String,
}

impl NewPackageBuilder {
    pub fn validate(self) -> Result<Self> {
        let mut errors = ValidationErrors::default();

        if let Err(e) = ::url::Url::parse(&self.url) {
            errors.add("url", format!("is not a valid URL: {}", e));
        }
        if !self.packager_url.is_empty() {
            if let Err(e) = ::url::Url::parse(&self.packager_url) {
                errors.add("packager_url", format!("is not a valid URL: {}", e));
            }
        }
        if self.branch.as_deref().map(|b| b.trim().is_empty()).unwrap_or(false) {
            errors.add("branch", "can't be blank when given");
        }

        errors.into_result().map(|_| self)
    }
}

impl PackageBuilder {
    /// Human readable source reference, e.g. `nova: https://... @ trunk (merging trunk)`
    pub fn source_ref(&self) -> String {
        let branch_name = self.branch.as_deref().unwrap_or("trunk");
        let merge = if self.merge_trunk && branch_name != "trunk" { " (merging trunk)" } else { "" };
        format!("{}: {} @ {}{}", self.kind.project(), self.url, branch_name, merge)
    }

    pub fn create(database_connection: &mut PgConnection, new_builder: &NewPackageBuilder) -> Result<PackageBuilder> {
        let now = crate::db::now();
        trace!("Creating package builder in database: {:?}", new_builder);

        diesel::insert_into(package_builders::table)
            .values((new_builder, package_builders::created_at.eq(now), package_builders::updated_at.eq(now)))
            .returning(PackageBuilder::as_returning())
            .get_result(database_connection)
            .map_err(Error::from)
    }

    pub fn of_smoke_test(database_connection: &mut PgConnection, smoke_test: &SmokeTest) -> Result<Vec<PackageBuilder>> {
        PackageBuilder::belonging_to(smoke_test)
            .select(PackageBuilder::as_select())
            .order(package_builders::id.asc())
            .load(database_connection)
            .map_err(Error::from)
    }
}
