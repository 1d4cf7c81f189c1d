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
    non_camel_case_types,
    non_snake_case,
    path_statements,
    trivial_numeric_casts,
    unstable_features,
    unused_allocation,
    unused_import_braces,
    unused_must_use,
    while_true,
)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cache;
mod cli;
mod commands;
mod config;
mod db;
mod dispatch;
mod error;
mod identity;
mod model;
mod policy;
mod registry;
mod schema;
mod store;
mod vm;

#[cfg(test)]
mod test_util;

use crate::commands::Services;
use crate::config::*;
use crate::db::DbConnectionConfig;
use crate::store::PgStore;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    debug!("Debugging enabled");

    let app = cli::cli();
    let cli = app.get_matches();

    let config = load_configuration(&cli)?;
    debug!("Configuration loaded: compatibility {}", config.compatibility());

    let db_connection_config = DbConnectionConfig::parse(&config, &cli)?;

    match cli.subcommand() {
        Some(("db", matches)) => commands::db(db_connection_config, matches),

        Some((name, matches)) => {
            let pool = db_connection_config.lazy_pool();
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            let services = Services::new(&config, store)?;

            match name {
                "authorize" => commands::authorize(&services, matches),
                "evaluate" => commands::evaluate(&services, matches).await,
                "evaluation" => commands::evaluation(&services, matches).await,
                "review" => commands::review(&services, matches),
                "run" => commands::run(&services, matches),
                "vm" => commands::vm(&services, matches).await,
                other => Err(anyhow!("Unknown subcommand: {}", other)),
            }
        },

        None => Err(anyhow!("No subcommand")),
    }
}

/// Configuration file from `--config`, or from the XDG config directory and the working
/// directory, overridden by `TIRA_*` environment variables
fn load_configuration(cli: &ArgMatches) -> Result<Configuration> {
    let mut config = ::config::Config::default();

    if let Some(path) = cli.get_one::<String>("config") {
        debug!("Loading configuration from {}", path);
        config.merge(::config::File::from(PathBuf::from(path)).required(true))
            .with_context(|| anyhow!("Loading configuration file {}", path))?;
    } else {
        let xdg = xdg::BaseDirectories::with_prefix("tira")?;
        if let Some(xdg_config) = xdg.find_config_file("config.toml") {
            debug!("Loading configuration from {}", xdg_config.display());
            config.merge(::config::File::from(xdg_config).required(true))?;
        }
        config.merge(::config::File::with_name("config").required(false))?;
    }

    // Add in settings from the environment (with a prefix of TIRA)
    // Eg.. `TIRA_DATABASE_HOST=db.example.org tira ...` would set the `database_host` key
    config.merge(::config::Environment::with_prefix("TIRA"))?;

    config
        .try_into::<NotValidatedConfiguration>()
        .context("Parsing the configuration")?
        .validate()
        .context("Validating the configuration")
}
