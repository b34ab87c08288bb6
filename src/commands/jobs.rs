//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'jobs' subcommand

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use tracing::info;

use crate::api::JobRepository;
use crate::auth::Authorized;
use crate::commands::util::colored_status;
use crate::commands::util::display_data;
use crate::commands::util::print_text;
use crate::commands::util::wire_format;
use crate::commands::util::ListFormat;
use crate::config::Configuration;
use crate::db::models::JobFields;
use crate::format::job_rows;
use crate::format::render_job;
use crate::format::render_job_list;
use crate::format::JOB_LIST_HEADER;
use crate::status::Status;
use crate::status::TrackedKind;
use crate::variant::JobKind;

pub fn jobs(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", matches)) => list(repository, config, matches),
        Some(("show", matches)) => show(repository, matches),
        Some(("create", matches)) => create(repository, matches),
        Some(("delete", matches)) => delete(repository, matches),
        Some(("status", matches)) => status(repository, TrackedKind::Job, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn list(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let include_related = !matches.get_flag("no_related");
    let table_only = matches.get_flag("table_only");
    let listings = repository.list_jobs(include_related)?;

    let csv = match ListFormat::from_matches(matches, config)? {
        ListFormat::Wire(format) => return print_text(&render_job_list(format, &listings, table_only)?),
        ListFormat::Csv => true,
        ListFormat::Table => false,
    };

    if listings.is_empty() {
        info!("No jobs in database");
        return Ok(());
    }

    if !table_only && !csv {
        print_text("Listing jobs\n")?;
    }
    display_data(&JOB_LIST_HEADER, job_rows(&listings), csv)
}

fn show(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let id = id(matches)?;
    let format = wire_format(matches)?;
    let job = repository.get_job(id)?;
    print_text(&render_job(format, &job)?)
}

fn create(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let fields = JobFields {
        job_group_id: matches.get_one::<i32>("job_group").copied(),
        config_template_id: matches.get_one::<i32>("config_template").copied(),
        kind: matches.get_one::<JobKind>("type").copied(),
        ..JobFields::default()
    };

    let job = repository.create_job(&Authorized::local(), fields)?;
    info!("Created job {}", job.id);
    print_text(&job.kind.report(&job))
}

fn delete(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let id = id(matches)?;
    let format = wire_format(matches)?;
    let snapshot = repository.delete_job(&Authorized::local(), id)?;
    info!("Deleted job {}", id);
    print_text(&snapshot.render(format))
}

/// Shared by the 'status' subcommands of jobs, job groups and smoke tests
pub fn status(repository: JobRepository, kind: TrackedKind, matches: &ArgMatches) -> Result<()> {
    let id = id(matches)?;
    let next = matches
        .get_one::<Status>("status")
        .copied()
        .ok_or_else(|| anyhow!("No status given"))?;

    let status = repository
        .transition(&Authorized::local(), kind, id, next)
        .with_context(|| format!("Moving {} {} to {}", kind, id, next))?;
    print_text(&format!("{} {} is now {}", kind, id, colored_status(status)))
}

pub fn id(matches: &ArgMatches) -> Result<i32> {
    matches
        .get_one::<i32>("id")
        .copied()
        .ok_or_else(|| anyhow!("No id given"))
}
