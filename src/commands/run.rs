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
use clap::ArgMatches;
use serde_json::json;

use crate::commands::util::required;
use crate::commands::util::respond;
use crate::commands::Services;
use crate::model::RunId;

/// Implementation of the "run" subcommand
pub fn run(services: &Services, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("delete", matches)) => delete(services, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn delete(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let outcome = services.registry()
        .delete_run(&run)
        .map(|()| json!({ "run": run, "deleted": true }));
    respond(outcome)
}
