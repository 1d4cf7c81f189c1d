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
use tracing::info;

use crate::commands::util::request_from;
use crate::commands::util::required;
use crate::commands::util::respond;
use crate::commands::Services;
use crate::model::DatasetId;
use crate::model::RunId;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::policy::AccessOptions;
use crate::policy::Intent;
use crate::policy::Target;

/// Implementation of the "evaluate" subcommand
///
/// Gated like the evaluation endpoint: participants may evaluate their runs on public datasets.
pub async fn evaluate(services: &Services, matches: &ArgMatches) -> Result<()> {
    let request = request_from(matches)?;
    let run: RunId = required(matches, "run")?;
    let dataset: DatasetId = required(matches, "dataset")?;
    let team: TeamId = required(matches, "team")?;

    let target = Target::builder()
        .dataset(dataset.clone())
        .team(team.clone())
        .runs(vec![run.clone()])
        .build();

    let verdict = services.gatekeeper().check(&request, &target, Intent::Mutate, AccessOptions::evaluate_run())?;
    let outcome = match verdict.decision.into_result() {
        Ok(()) => services.dispatcher()
            .trigger_evaluation(&run, &dataset, &team)
            .await
            .map(|tx| {
                info!("Evaluation of {} dispatched: {}", run, tx);
                json!({ "run": run, "transaction_id": tx })
            }),
        Err(e) => Err(e),
    };

    respond(outcome)
}

/// Implementation of the "evaluation" subcommand
pub async fn evaluation(services: &Services, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("poll", matches)) => poll(services, matches).await,
        Some(("complete", matches)) => complete(services, matches),
        Some(("stop", matches)) => stop(services, matches).await,
        Some(("evaluators", matches)) => evaluators(services, matches).await,
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

async fn poll(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let outcome = services.dispatcher()
        .poll(&run, matches.get_flag("force"))
        .await
        .map(|status| json!({ "run": run, "backend_status": status }));
    respond(outcome)
}

fn complete(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let evaluation_run: RunId = required(matches, "evaluation_run")?;
    let outcome = services.dispatcher()
        .complete_evaluation(&run, evaluation_run)
        .map(|(run, review)| json!({ "run": run, "review": review }));
    respond(outcome)
}

async fn stop(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let outcome = services.dispatcher()
        .stop(&run)
        .await
        .map(|()| json!({ "run": run, "stopped": true }));
    respond(outcome)
}

async fn evaluators(services: &Services, matches: &ArgMatches) -> Result<()> {
    let task: TaskId = required(matches, "task")?;
    let outcome = services.dispatcher()
        .evaluators_for_task(&task, matches.get_flag("force"))
        .await;
    respond(outcome)
}
