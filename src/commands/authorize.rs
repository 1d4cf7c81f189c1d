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
use serde::Serialize;

use crate::commands::util::optional;
use crate::commands::util::request_from;
use crate::commands::util::respond;
use crate::commands::Services;
use crate::error::CoreError;
use crate::model::RunId;
use crate::policy::AccessOptions;
use crate::policy::Decision;
use crate::policy::Intent;
use crate::policy::Target;

#[derive(Serialize, Debug)]
struct Authorization {
    decision: Decision,
    rule: &'static str,
    message: String,
}

/// Implementation of the "authorize" subcommand
pub fn authorize(services: &Services, matches: &ArgMatches) -> Result<()> {
    let request = request_from(matches)?;

    let target = Target {
        task: optional(matches, "task"),
        dataset: optional(matches, "dataset"),
        team: optional(matches, "team"),
        runs: matches
            .get_many::<String>("run")
            .unwrap_or_default()
            .cloned()
            .map(RunId::from)
            .collect(),
    };

    let intent = matches
        .get_one::<String>("intent")
        .map(|s| s.parse::<Intent>().map_err(|_| anyhow!("Unknown intent: {}", s)))
        .transpose()?
        .unwrap_or(Intent::View);

    let options = AccessOptions::builder()
        .restricted(matches.get_flag("restricted"))
        .public_data_ok(matches.get_flag("public-data-ok"))
        .private_run_ok(matches.get_flag("private-run-ok"))
        .not_registered_ok(matches.get_flag("not-registered-ok"))
        .build();

    let outcome = services.gatekeeper()
        .check(&request, &target, intent, options)
        .map(|verdict| Authorization {
            message: verdict.decision.message().to_string(),
            decision: verdict.decision,
            rule: verdict.rule,
        })
        .map_err(CoreError::from);

    respond(outcome)
}
