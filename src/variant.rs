//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! The `type` discriminators of jobs and package builders
//!
//! The database stores the variant name as text. Every behaviour which differs per variant is a
//! `match` on the enum, there is no open-ended registry of kinds.

use serde::Deserialize;
use serde::Serialize;

use crate::db::models::Job;

#[derive(
    parse_display::Display,
    parse_display::FromStr,
    diesel::AsExpression,
    diesel::FromSqlRow,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    Eq,
    PartialEq,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(try_from = "String", into = "String")]
pub enum JobKind {
    /// Provisions a group of cloud servers (a "VPC") from the config template and runs the smoke
    /// tests against them
    #[default]
    #[display("JobVPC")]
    Vpc,

    /// Runs the smoke tests on a XenServer hybrid node set
    #[display("JobXenHybrid")]
    XenHybrid,

    /// Runs the project unit tests from source, no packages and no servers involved
    #[display("JobUnitTester")]
    UnitTester,
}

/// Where a job is executed
#[derive(parse_display::Display, Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecutionTarget {
    #[display("server group")]
    ServerGroup,

    #[display("xen hybrid nodes")]
    HybridNodes,

    #[display("local checkout")]
    Local,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Vpc, JobKind::XenHybrid, JobKind::UnitTester];

    /// The packages which have to be built before a job of this kind can run
    pub fn required_packages(self) -> &'static [PackageBuilderKind] {
        match self {
            JobKind::Vpc => &[
                PackageBuilderKind::Nova,
                PackageBuilderKind::Glance,
                PackageBuilderKind::Keystone,
            ],
            JobKind::XenHybrid => &[PackageBuilderKind::Nova, PackageBuilderKind::Glance],
            JobKind::UnitTester => &[],
        }
    }

    pub fn execution_target(self) -> ExecutionTarget {
        match self {
            JobKind::Vpc => ExecutionTarget::ServerGroup,
            JobKind::XenHybrid => ExecutionTarget::HybridNodes,
            JobKind::UnitTester => ExecutionTarget::Local,
        }
    }

    /// One-line outcome report for a job of this kind
    pub fn report(self, job: &Job) -> String {
        let revisions = match self {
            JobKind::UnitTester => format!("nova {}", job.nova_revision.as_deref().unwrap_or("?")),
            JobKind::Vpc | JobKind::XenHybrid => format!(
                "nova {}, glance {}",
                job.nova_revision.as_deref().unwrap_or("?"),
                job.glance_revision.as_deref().unwrap_or("?"),
            ),
        };

        let outcome = match job.msg.as_deref() {
            Some(msg) if !msg.is_empty() => format!("{}: {}", job.status, msg),
            _ => job.status.to_string(),
        };

        format!("{} job {} on {} ({}) {}", self, job.id, self.execution_target(), revisions, outcome)
    }
}

impl From<JobKind> for String {
    fn from(kind: JobKind) -> String {
        kind.to_string()
    }
}

impl TryFrom<String> for JobKind {
    type Error = parse_display::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(
    parse_display::Display,
    parse_display::FromStr,
    diesel::AsExpression,
    diesel::FromSqlRow,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    Eq,
    PartialEq,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(try_from = "String", into = "String")]
pub enum PackageBuilderKind {
    #[default]
    #[display("NovaPackageBuilder")]
    Nova,

    #[display("GlancePackageBuilder")]
    Glance,

    #[display("KeystonePackageBuilder")]
    Keystone,
}

impl PackageBuilderKind {
    pub const ALL: [PackageBuilderKind; 3] = [
        PackageBuilderKind::Nova,
        PackageBuilderKind::Glance,
        PackageBuilderKind::Keystone,
    ];

    /// The project whose packages this builder produces
    pub fn project(self) -> &'static str {
        match self {
            PackageBuilderKind::Nova => "nova",
            PackageBuilderKind::Glance => "glance",
            PackageBuilderKind::Keystone => "keystone",
        }
    }
}

impl From<PackageBuilderKind> for String {
    fn from(kind: PackageBuilderKind) -> String {
        kind.to_string()
    }
}

impl TryFrom<String> for PackageBuilderKind {
    type Error = parse_display::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tests::job;
    use crate::status::Status;

    #[test]
    fn test_job_kind_names() {
        assert_eq!(JobKind::default().to_string(), "JobVPC");
        assert_eq!("JobXenHybrid".parse::<JobKind>().unwrap(), JobKind::XenHybrid);
        assert!("JobVpc".parse::<JobKind>().is_err());
    }

    #[test]
    fn test_job_kind_serde_uses_stored_name() {
        assert_eq!(serde_json::to_string(&JobKind::UnitTester).unwrap(), "\"JobUnitTester\"");
        let k: JobKind = serde_json::from_str("\"JobVPC\"").unwrap();
        assert_eq!(k, JobKind::Vpc);
    }

    #[test]
    fn test_package_builder_kind_names() {
        assert_eq!(PackageBuilderKind::default().to_string(), "NovaPackageBuilder");
        for kind in PackageBuilderKind::ALL {
            assert_eq!(kind.to_string().parse::<PackageBuilderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unit_tester_builds_nothing() {
        assert!(JobKind::UnitTester.required_packages().is_empty());
        assert_eq!(JobKind::UnitTester.execution_target(), ExecutionTarget::Local);
        assert!(JobKind::Vpc.required_packages().contains(&PackageBuilderKind::Keystone));
    }

    #[test]
    fn test_report() {
        let mut j = job(7, 1, 1);
        j.status = Status::Failed;
        j.nova_revision = Some(String::from("abc"));
        j.msg = Some(String::from("3 tests failed"));

        assert_eq!(
            JobKind::Vpc.report(&j),
            "JobVPC job 7 on server group (nova abc, glance ?) Failed: 3 tests failed"
        );
        assert_eq!(
            JobKind::UnitTester.report(&j),
            "JobUnitTester job 7 on local checkout (nova abc) Failed: 3 tests failed"
        );
    }
}
