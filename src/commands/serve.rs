//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'serve' subcommand

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::ArgMatches;

use crate::api::JobRepository;
use crate::auth::UserAuthorizer;
use crate::config::Configuration;
use crate::server::AppState;

pub async fn serve(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let addr = matches
        .get_one::<SocketAddr>("listen")
        .copied()
        .unwrap_or_else(|| config.listen_address());

    let state = AppState {
        authorizer: Arc::new(UserAuthorizer::new(repository.store().clone())),
        repository,
    };

    crate::server::serve(state, addr).await
}
