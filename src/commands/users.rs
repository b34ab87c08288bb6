//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'users' subcommand

use anyhow::anyhow;
use anyhow::Result;
use clap::ArgMatches;
use tracing::info;

use crate::api::JobRepository;
use crate::db::models::NewUser;

pub fn users(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("add", matches)) => {
            let password = dialoguer::Password::new()
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;
            add(repository, matches, &password)
        }
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn add(repository: JobRepository, matches: &ArgMatches, password: &str) -> Result<()> {
    let arg = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Missing argument: {}", name))
    };

    let new = NewUser::with_password(
        arg("username")?,
        arg("first_name")?,
        arg("last_name")?,
        password,
        matches.get_flag("admin"),
    )?;

    let user = repository.store().create_user(new)?;
    info!("Added user {} ({})", user.username, user.id);
    Ok(())
}
