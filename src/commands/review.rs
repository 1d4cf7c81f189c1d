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
use chrono::Utc;
use clap::ArgMatches;
use serde_json::json;

use crate::commands::util::required;
use crate::commands::util::respond;
use crate::commands::Services;
use crate::model::ReviewPatch;
use crate::model::RunId;

/// Implementation of the "review" subcommand
pub fn review(services: &Services, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", matches)) => show(services, matches),
        Some(("auto", matches)) => auto(services, matches),
        Some(("update", matches)) => update(services, matches),
        Some(("export", matches)) => export(services, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn show(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    respond(services.registry().get_review(&run))
}

fn auto(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let outcome = services.registry()
        .get_run(&run)
        .and_then(|run| services.registry().auto_review(&run));
    respond(outcome)
}

fn update(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let patch = patch_from(matches);
    respond(services.registry().update_review(&run, &patch))
}

fn export(services: &Services, matches: &ArgMatches) -> Result<()> {
    let run: RunId = required(matches, "run")?;
    let outcome = services.registry()
        .export_review(&run)
        .map(|path| json!({ "run": run, "path": path }));
    respond(outcome)
}

/// Only the fields given on the commandline end up in the patch
fn patch_from(matches: &ArgMatches) -> ReviewPatch {
    let flag = |name: &str| matches.get_one::<bool>(name).copied();

    let comment = matches.get_one::<String>("comment").cloned();
    let reviewer_id = matches.get_one::<String>("reviewer").cloned();

    // a named reviewer makes this a manual review
    let review_date = reviewer_id.as_ref().map(|_| Utc::now());

    ReviewPatch {
        no_errors: flag("no-errors"),
        has_errors: flag("has-errors"),
        has_no_errors: flag("has-no-errors"),
        has_warnings: flag("has-warnings"),
        missing_output: flag("missing-output"),
        invalid_output: flag("invalid-output"),
        has_error_output: flag("has-error-output"),
        other_errors: flag("other-errors"),
        comment,
        reviewer_id,
        review_date,
        published: flag("published"),
        blinded: flag("blinded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["tira", "review", "update", "--run", "r1"];
        argv.extend_from_slice(args);
        crate::cli::cli()
            .try_get_matches_from(argv)
            .unwrap()
            .subcommand_matches("review")
            .and_then(|m| m.subcommand_matches("update"))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_empty_patch() {
        assert_eq!(patch_from(&update_matches(&[])), ReviewPatch::default());
    }

    #[test]
    fn test_patch_carries_given_fields_only() {
        let patch = patch_from(&update_matches(&["--published", "true", "--comment", "fine"]));
        assert_eq!(patch.published, Some(true));
        assert_eq!(patch.comment.as_deref(), Some("fine"));
        assert_eq!(patch.blinded, None);
        assert_eq!(patch.review_date, None);
    }

    #[test]
    fn test_reviewer_sets_review_date() {
        let patch = patch_from(&update_matches(&["--reviewer", "bob"]));
        assert_eq!(patch.reviewer_id.as_deref(), Some("bob"));
        assert!(patch.review_date.is_some());
    }
}
