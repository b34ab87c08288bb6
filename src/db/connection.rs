//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::time::Duration;

use anyhow::Error;
use anyhow::Result;
use clap::ArgMatches;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use getset::Getters;
use tracing::debug;

use crate::config::Configuration;
use crate::db::PgPool;

/// Default database connection timeout, in seconds
const DEFAULT_CONNECTION_TIMEOUT: u16 = 30;

/// Connection settings, taken from the command line if given there, from the configuration otherwise
#[derive(Getters)]
pub struct DbConnectionConfig<'a> {
    #[getset(get = "pub")]
    database_host: &'a str,

    #[getset(get = "pub")]
    database_port: u16,

    #[getset(get = "pub")]
    database_user: &'a str,

    #[getset(get = "pub")]
    database_password: &'a str,

    #[getset(get = "pub")]
    database_name: &'a str,

    #[getset(get = "pub")]
    database_connection_timeout: u16,

    #[getset(get = "pub")]
    database_pool_size: Option<u32>,
}

impl<'a> std::fmt::Debug for DbConnectionConfig<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "postgres://{user}:PASSWORD@{host}:{port}/{name}?connect_timeout={timeout}",
            host = self.database_host,
            port = self.database_port,
            user = self.database_user,
            name = self.database_name,
            timeout = self.database_connection_timeout
        )
    }
}

impl<'a> DbConnectionConfig<'a> {
    pub fn parse(config: &'a Configuration, cli: &'a ArgMatches) -> DbConnectionConfig<'a> {
        DbConnectionConfig {
            database_host: cli
                .get_one::<String>("database_host")
                .map(String::as_str)
                .unwrap_or_else(|| config.database_host()),
            database_port: cli
                .get_one::<u16>("database_port")
                .copied()
                .unwrap_or_else(|| *config.database_port()),
            database_user: cli
                .get_one::<String>("database_user")
                .map(String::as_str)
                .unwrap_or_else(|| config.database_user()),
            database_password: cli
                .get_one::<String>("database_password")
                .map(String::as_str)
                .unwrap_or_else(|| config.database_password()),
            database_name: cli
                .get_one::<String>("database_name")
                .map(String::as_str)
                .unwrap_or_else(|| config.database_name()),
            database_connection_timeout: cli
                .get_one::<u16>("database_connection_timeout")
                .copied()
                .or(*config.database_connection_timeout())
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT),
            database_pool_size: *config.database_pool_size(),
        }
    }

    fn get_database_uri(&self) -> String {
        format!(
            "postgres://{user}:{password}@{host}:{port}/{name}?connect_timeout={timeout}",
            host = self.database_host,
            port = self.database_port,
            user = self.database_user,
            password = self.database_password,
            name = self.database_name,
            timeout = self.database_connection_timeout,
        )
    }

    pub fn establish_pool(self) -> Result<PgPool> {
        debug!("Trying to create a connection pool for database: {:?}", self);
        let manager = ConnectionManager::<PgConnection>::new(self.get_database_uri());
        let mut builder = Pool::builder()
            .min_idle(Some(1))
            .connection_timeout(Duration::from_secs(u64::from(self.database_connection_timeout)));

        if let Some(size) = self.database_pool_size {
            builder = builder.max_size(size);
        }

        builder.build(manager).map_err(Error::from)
    }
}
