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
use tracing::info;

use crate::db::DbConnectionConfig;

/// Implementation of the "db" subcommand
pub fn db(db_connection_config: DbConnectionConfig<'_>, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("setup", _)) => setup(db_connection_config),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn setup(db_connection_config: DbConnectionConfig<'_>) -> Result<()> {
    let pool = db_connection_config.establish_pool()?;
    let mut conn = pool.get().context("Getting a database connection from the pool")?;
    let applied = crate::db::run_migrations(&mut conn)?;

    if applied.is_empty() {
        info!("Database schema is up to date");
    }
    println!("{} migration(s) applied", applied.len());
    Ok(())
}
