//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

#![deny(
    non_ascii_idents,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    while_true
)]

use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod db;
mod error;
mod format;
mod schema;
mod server;
mod status;
mod variant;

use crate::api::JobRepository;
use crate::db::DbConnectionConfig;
use crate::db::PgStore;
use crate::db::Store;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    debug!("Debugging enabled");

    let cli = cli::cli().get_matches();

    let config_path = cli
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config");
    let config = config::load(config_path)?;
    debug!("Configuration loaded from '{}'", config_path);

    let pool = DbConnectionConfig::parse(&config, &cli).establish_pool()?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let repository = JobRepository::new(store);

    match cli.subcommand() {
        Some(("serve", matches)) => commands::serve(repository, &config, matches).await?,
        Some(("jobs", matches)) => commands::jobs(repository, &config, matches)?,
        Some(("smoke-tests", matches)) => commands::smoke_tests(repository, &config, matches)?,
        Some(("config-templates", matches)) => commands::config_templates(repository, &config, matches)?,
        Some(("job-groups", matches)) => commands::job_groups(repository, &config, matches)?,
        Some(("package-builders", matches)) => commands::package_builders(repository, &config, matches)?,
        Some(("users", matches)) => commands::users(repository, matches)?,
        Some((other, _)) => return Err(anyhow!("Unknown subcommand: {}", other)),
        None => return Err(anyhow!("No subcommand")),
    }

    Ok(())
}
