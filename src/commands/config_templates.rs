//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'config-templates' subcommand

use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use tracing::debug;
use tracing::info;

use crate::api::JobRepository;
use crate::commands::util::print_listing;
use crate::commands::util::print_text;
use crate::commands::util::ListFormat;
use crate::config::Configuration;
use crate::db::models::NewConfigTemplate;
use crate::variant::JobKind;

pub fn config_templates(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("create", matches)) => create(repository, matches),
        Some(("list", matches)) => list(repository, config, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument: {}", name))
}

fn spec_file(matches: &ArgMatches, name: &str) -> Result<String> {
    let path = matches
        .get_one::<PathBuf>(name)
        .ok_or_else(|| anyhow!("Missing argument: {}", name))?;

    debug!("Reading {}", path.display());
    std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))
}

fn create(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let new = NewConfigTemplate::builder()
        .name(string_arg(matches, "name")?)
        .description(string_arg(matches, "description")?)
        .cookbook_repo_url(string_arg(matches, "cookbook_url")?)
        .nodes_spec(spec_file(matches, "nodes_spec")?)
        .server_group_spec(spec_file(matches, "server_group_spec")?)
        .job_type(matches.get_one::<JobKind>("job_type").copied().unwrap_or_default())
        .build()
        .validate()?;

    let template = repository.store().create_config_template(new)?;
    info!("Created config template {}", template.id);
    print_text(&format!("{} ({}, {})", template.id, template.name, template.job_type))
}

fn list(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let format = ListFormat::from_matches(matches, config)?;
    let templates = match matches.get_one::<i32>("smoke_test") {
        Some(smoke_test_id) => repository.store().config_templates_of(*smoke_test_id)?,
        None => repository.store().config_templates()?,
    };

    print_listing(
        format,
        "config templates",
        ("config_templates", "config_template"),
        &["Id", "Name", "Type", "Description", "Cookbook"],
        &templates,
        |t| {
            vec![
                t.id.to_string(),
                t.name.clone(),
                t.job_type.to_string(),
                t.description.clone(),
                t.cookbook_repo_url.clone(),
            ]
        },
    )
}
