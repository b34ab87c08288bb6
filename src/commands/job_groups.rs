//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'job-groups' subcommand

use anyhow::anyhow;
use anyhow::Result;
use clap::ArgMatches;
use tracing::info;

use crate::api::JobRepository;
use crate::commands::jobs::status;
use crate::commands::util::colored_status;
use crate::commands::util::print_listing;
use crate::commands::util::print_text;
use crate::commands::util::ListFormat;
use crate::config::Configuration;
use crate::db::models::NewJobGroup;
use crate::status::Status;
use crate::status::TrackedKind;

pub fn job_groups(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("create", matches)) => create(repository, matches),
        Some(("list", matches)) => list(repository, config, matches),
        Some(("status", matches)) => status(repository, TrackedKind::JobGroup, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn smoke_test_id(matches: &ArgMatches) -> Result<i32> {
    matches
        .get_one::<i32>("smoke_test")
        .copied()
        .ok_or_else(|| anyhow!("No smoke test given"))
}

fn create(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let new = NewJobGroup {
        status: Status::Pending,
        smoke_test_id: smoke_test_id(matches)?,
    };

    let group = repository.store().create_job_group(new)?;
    info!("Created job group {} for smoke test {}", group.id, group.smoke_test_id);
    print_text(&format!("{} ({})", group.id, colored_status(group.status)))
}

fn list(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let format = ListFormat::from_matches(matches, config)?;
    let groups = repository.store().job_groups_of(smoke_test_id(matches)?)?;

    print_listing(
        format,
        "job groups",
        ("job_groups", "job_group"),
        &["Id", "Status", "Smoke Test", "Updated"],
        &groups,
        |g| {
            vec![
                g.id.to_string(),
                g.status.to_string(),
                g.smoke_test_id.to_string(),
                g.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        },
    )
}
