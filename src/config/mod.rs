//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! The configuration handling code
//!
//! This module contains all the code for loading the configuration file, overlaying it with
//! `SMOKESTACK_*` environment variables and validating the result.

mod configuration;
pub use configuration::*;

mod not_validated;
pub use not_validated::*;

mod util;
pub use util::LIST_FORMATS;

use anyhow::Context;
use anyhow::Result;

/// Prefix of the environment variables which override configuration values
pub const ENV_PREFIX: &str = "SMOKESTACK";

/// Load the configuration file `path` (the extension may be omitted), overlaid with the environment
pub fn load(path: &str) -> Result<Configuration> {
    ::config::Config::builder()
        .add_source(::config::File::with_name(path))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .with_context(|| format!("Loading configuration from '{}'", path))?
        .try_deserialize::<NotValidatedConfiguration>()
        .context("Reading configuration")?
        .validate()
        .context("Validating configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Configuration> {
        ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
            .build()?
            .try_deserialize::<NotValidatedConfiguration>()?
            .validate()
    }

    const MINIMAL: &str = r#"
        database_host = "localhost"
        database_user = "smokestack"
        database_password = "secret"
        database_name = "smokestack"
    "#;

    #[test]
    fn test_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(*config.database_port(), 5432);
        assert_eq!(config.listen_address(), "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.list_format(), "table");
        assert!(config.database_connection_timeout().is_none());
        assert!(config.database_pool_size().is_none());
    }

    #[test]
    fn test_overrides() {
        let toml = format!(
            "{}\ndatabase_port = 5433\nlisten_address = \"0.0.0.0:8080\"\nlist_format = \"csv\"\ndatabase_connection_timeout = 5",
            MINIMAL
        );
        let config = parse(&toml).unwrap();
        assert_eq!(*config.database_port(), 5433);
        assert_eq!(config.listen_address().port(), 8080);
        assert_eq!(config.list_format(), "csv");
        assert_eq!(*config.database_connection_timeout(), Some(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&format!("{}\nlisten_address = \"nowhere\"", MINIMAL)).is_err());
        assert!(parse(&format!("{}\nlist_format = \"yaml\"", MINIMAL)).is_err());
        assert!(parse(&format!("{}\ndatabase_pool_size = 0", MINIMAL)).is_err());
        assert!(parse(r#"database_host = "localhost""#).is_err());
    }
}
