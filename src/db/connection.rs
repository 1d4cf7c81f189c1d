//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::r2d2::Pool;
use diesel::r2d2::PooledConnection;
use getset::CopyGetters;
use getset::Getters;
use tracing::debug;

use crate::config::Configuration;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Where to find the database, settings from the commandline win over the configuration file
#[derive(Getters, CopyGetters)]
pub struct DbConnectionConfig<'a> {
    #[getset(get = "pub")]
    database_host: &'a str,

    #[getset(get_copy = "pub")]
    database_port: u16,

    #[getset(get = "pub")]
    database_user: &'a str,

    #[getset(get = "pub")]
    database_password: &'a str,

    #[getset(get = "pub")]
    database_name: &'a str,

    #[getset(get_copy = "pub")]
    database_connection_timeout: u16,
}

impl<'a> std::fmt::Debug for DbConnectionConfig<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "postgres://{user}:PASSWORD@{host}:{port}/{name}?connect_timeout={timeout}",
            host = self.database_host,
            port = self.database_port,
            user = self.database_user,
            name = self.database_name,
            timeout = self.database_connection_timeout
        )
    }
}

impl<'a> DbConnectionConfig<'a> {
    pub fn parse(config: &'a Configuration, cli: &'a ArgMatches) -> Result<DbConnectionConfig<'a>> {
        Ok(DbConnectionConfig {
            database_host: cli_value(cli, "database_host").unwrap_or_else(|| config.database_host().as_str()),
            database_port: cli_number(cli, "database_port")?.unwrap_or_else(|| *config.database_port()),
            database_user: cli_value(cli, "database_user").unwrap_or_else(|| config.database_user().as_str()),
            database_password: cli_value(cli, "database_password").unwrap_or_else(|| config.database_password().as_str()),
            database_name: cli_value(cli, "database_name").unwrap_or_else(|| config.database_name().as_str()),
            database_connection_timeout: cli_number(cli, "database_connection_timeout")?
                // 30 seconds unless configured otherwise
                .unwrap_or_else(|| config.database_connection_timeout().unwrap_or(30)),
        })
    }

    fn database_uri(&self) -> String {
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

    pub fn establish_pool(&self) -> Result<PgPool> {
        debug!("Trying to create a connection pool for database: {:?}", self);
        let manager = ConnectionManager::<PgConnection>::new(self.database_uri());
        Pool::builder()
            .min_idle(Some(1))
            .connection_timeout(std::time::Duration::from_secs(u64::from(self.database_connection_timeout)))
            .build(manager)
            .with_context(|| anyhow!("Connecting to {:?}", self))
    }

    /// A pool which connects on first use
    ///
    /// Requests refused before they reach the database are answered without waiting for it.
    pub fn lazy_pool(&self) -> PgPool {
        debug!("Creating a lazy connection pool for database: {:?}", self);
        let manager = ConnectionManager::<PgConnection>::new(self.database_uri());
        Pool::builder()
            .min_idle(Some(0))
            .connection_timeout(std::time::Duration::from_secs(u64::from(self.database_connection_timeout)))
            .build_unchecked(manager)
    }
}

fn cli_value<'a>(cli: &'a ArgMatches, name: &str) -> Option<&'a str> {
    cli.get_one::<String>(name).map(String::as_str)
}

fn cli_number(cli: &ArgMatches, name: &str) -> Result<Option<u16>> {
    cli_value(cli, name)
        .map(|s| s.parse::<u16>().with_context(|| anyhow!("Parsing {} = '{}'", name, s)))
        .transpose()
}
