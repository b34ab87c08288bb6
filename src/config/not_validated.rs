//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::net::SocketAddr;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use getset::Getters;
use serde::Deserialize;

use crate::config::util::*;
use crate::config::Configuration;

/// The configuration as loaded from the file and the environment
#[derive(Debug, Getters, Deserialize)]
pub struct NotValidatedConfiguration {
    #[getset(get = "pub")]
    database_host: String,

    #[getset(get = "pub")]
    #[serde(default = "default_database_port")]
    database_port: u16,

    #[getset(get = "pub")]
    database_user: String,

    #[getset(get = "pub")]
    database_password: String,

    #[getset(get = "pub")]
    database_name: String,

    /// Seconds to wait for a database connection
    #[getset(get = "pub")]
    #[serde(default)]
    database_connection_timeout: Option<u16>,

    /// Maximum number of pooled database connections, the r2d2 default if not set
    #[getset(get = "pub")]
    #[serde(default)]
    database_pool_size: Option<u32>,

    #[serde(default = "default_listen_address")]
    listen_address: String,

    /// Default output format of the listing subcommands
    #[getset(get = "pub")]
    #[serde(default = "default_list_format")]
    list_format: String,
}

impl NotValidatedConfiguration {
    pub fn validate(self) -> Result<Configuration> {
        let listen_address = self
            .listen_address
            .parse::<SocketAddr>()
            .with_context(|| anyhow!("Parsing listen_address = '{}'", self.listen_address))?;

        if !LIST_FORMATS.contains(&self.list_format.as_str()) {
            return Err(anyhow!(
                "Unknown list_format = '{}', expected one of: {}",
                self.list_format,
                LIST_FORMATS.join(", ")
            ));
        }

        if self.database_pool_size == Some(0) {
            return Err(anyhow!("database_pool_size must be at least 1"));
        }

        Ok(Configuration {
            inner: self,
            listen_address,
        })
    }
}
