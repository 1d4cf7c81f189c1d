//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Result;
use clap::ArgMatches;
use serde_json::json;

use crate::commands::util::optional;
use crate::commands::util::required;
use crate::commands::util::respond;
use crate::commands::Services;
use crate::error::CoreError;
use crate::model::HostName;
use crate::model::RunId;
use crate::model::TeamId;
use crate::vm::VmCommand;

/// Implementation of the "vm" subcommand
pub async fn vm(services: &Services, matches: &ArgMatches) -> Result<()> {
    let (name, matches) = matches.subcommand().ok_or_else(|| anyhow!("No subcommand"))?;
    let vm: TeamId = required(matches, "vm")?;

    let host = match host_of(services, &vm, optional(matches, "host")) {
        Ok(host) => host,
        Err(e) => return respond::<()>(Err(e)),
    };

    match name {
        "info" => respond(services.tracker().info(&host, &vm).await),
        "execute" => {
            let command = matches.get_one::<String>("command")
                .ok_or_else(|| anyhow!("Missing argument: command"))?;
            let input_run: Option<RunId> = optional(matches, "input_run");
            let outcome = services.tracker()
                .execute(&host, &vm, command, input_run.as_ref())
                .await
                .map(|tx| json!({ "vm": vm, "transaction_id": tx }));
            respond(outcome)
        },
        "abort" => {
            let outcome = services.tracker()
                .abort(&host, &vm)
                .await
                .map(|tx| json!({ "vm": vm, "transaction_id": tx }));
            respond(outcome)
        },
        other => {
            let command = VmCommand::from_str(other).map_err(|_| anyhow!("Unknown subcommand: {}", other))?;
            let outcome = services.tracker()
                .command(&host, &vm, command)
                .await
                .map(|tx| json!({ "vm": vm, "command": command, "transaction_id": tx }));
            respond(outcome)
        },
    }
}

/// The given host, or the one the VM was last seen on
fn host_of(services: &Services, vm: &TeamId, given: Option<HostName>) -> Result<HostName, CoreError> {
    if let Some(host) = given {
        return Ok(host)
    }

    services.tracker()
        .state(vm)?
        .map(|record| record.host)
        .ok_or_else(|| CoreError::MalformedRequest(format!("No host known for VM '{}', please pass --host", vm)))
}
