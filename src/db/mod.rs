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
use anyhow::Result;
use diesel::pg::PgConnection;
use diesel_migrations::embed_migrations;
use diesel_migrations::EmbeddedMigrations;
use diesel_migrations::MigrationHarness;
use tracing::info;

mod connection;
pub use connection::*;

pub mod models;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Bring the database schema up to date, returns the names of the migrations that ran
pub fn run_migrations(database_connection: &mut PgConnection) -> Result<Vec<String>> {
    let applied = database_connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Running database migrations: {}", e))?
        .into_iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>();

    for version in applied.iter() {
        info!("Applied migration {}", version);
    }
    Ok(applied)
}
