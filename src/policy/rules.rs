//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! The rules of the standard access policy, in the order they are applied

use tracing::debug;

use crate::policy::Decision;
use crate::policy::DenialKind;
use crate::policy::Intent;
use crate::policy::PolicyContext;
use crate::policy::Role;
use crate::policy::Rule;
use crate::registry::is_run_visible;

pub struct PrivilegedRule;

impl Rule for PrivilegedRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        if cx.role.is_privileged() {
            Some(Decision::Permit)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "Privileged"
    }

    fn description(&self) -> &'static str {
        "Superusers and admins may do anything"
    }
}

pub struct OrganizerRule;

impl Rule for OrganizerRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        let task = cx.state.consistent_task()?;
        if cx.organizer_ids.contains(&task.organizer_id) {
            Some(Decision::Permit)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "OrganizerOverride"
    }

    fn description(&self) -> &'static str {
        "Organizers may do anything on their task, if all ids of the request point to that task"
    }
}

pub struct RestrictedRule;

impl Rule for RestrictedRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        if cx.options.restricted {
            Some(Decision::deny(DenialKind::Restricted, "This page is restricted to the organizers of the task"))
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "Restricted"
    }

    fn description(&self) -> &'static str {
        "Restricted endpoints are closed to everybody else"
    }
}

pub struct ExistenceRule;

impl Rule for ExistenceRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        let state = cx.state;

        if state.team.as_ref().map(|l| l.is_missing()).unwrap_or(false) {
            return Some(Decision::RedirectToLogin)
        }

        if let Some(lookup) = state.task.as_ref().filter(|l| l.is_missing()) {
            return Some(Decision::deny(DenialKind::NotFound, format!("task '{}' does not exist", lookup.id)))
        }

        if let Some(lookup) = state.dataset.as_ref().filter(|l| l.is_missing()) {
            return Some(Decision::deny(DenialKind::NotFound, format!("dataset '{}' does not exist", lookup.id)))
        }

        state.runs
            .iter()
            .find(|r| r.run.is_none())
            .map(|r| Decision::deny(DenialKind::NotFound, format!("run '{}' does not exist", r.id)))
    }

    fn name(&self) -> &'static str {
        "Existence"
    }

    fn description(&self) -> &'static str {
        "Unknown teams send the caller to the login, unknown tasks, datasets and runs are not found"
    }
}

pub struct RunVisibilityRule;

impl Rule for RunVisibilityRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        let invisible = cx.state.runs.iter().find(|r| {
            match r.dataset.as_ref() {
                Some(dataset) => !is_run_visible(r.review.as_ref(), dataset, r.listed_public, &cx.options),
                None => true,
            }
        });

        if let Some(run) = invisible {
            if cx.effective_role == Role::Participant {
                debug!("Run {} is not visible, treating caller as user", run.id);
                cx.effective_role = Role::User;
            }
        }

        None
    }

    fn name(&self) -> &'static str {
        "RunVisibility"
    }

    fn description(&self) -> &'static str {
        "Owners of runs which are not visible yet are treated like any other user"
    }
}

pub struct RegistrationRule;

impl Rule for RegistrationRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        if cx.options.not_registered_ok || cx.role == Role::Guest {
            return None
        }

        let task = cx.state.task.as_ref()?.found.as_ref()?;

        if task.require_registration {
            let admitted = cx.state.registered_teams.iter().any(|team| task.admits_team(team));
            if !admitted {
                return Some(Decision::deny(
                    DenialKind::MustRegister,
                    format!("You must register for task '{}' first", task.id),
                ))
            }
        } else if task.restrict_to_allowed_teams {
            let admitted = cx.state.candidate_teams.iter().any(|team| task.admits_team(team));
            if !admitted {
                return Some(Decision::deny(
                    DenialKind::Forbidden,
                    format!("Task '{}' is only open to selected teams", task.id),
                ))
            }
        }

        None
    }

    fn name(&self) -> &'static str {
        "Registration"
    }

    fn description(&self) -> &'static str {
        "Tasks which require a registration, or only admit some teams, reject everybody else"
    }
}

pub struct ParticipantRule;

impl Rule for ParticipantRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        if cx.effective_role == Role::Participant && !cx.options.restricted {
            Some(Decision::Permit)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "Participant"
    }

    fn description(&self) -> &'static str {
        "Participants may act on the resources of their team"
    }
}

pub struct GuestRule;

impl Rule for GuestRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        if cx.role == Role::Guest {
            Some(Decision::RedirectToLogin)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "Guest"
    }

    fn description(&self) -> &'static str {
        "Anonymous callers are asked to log in"
    }
}

pub struct DenyRule;

impl Rule for DenyRule {
    fn evaluate(&self, cx: &mut PolicyContext<'_>) -> Option<Decision> {
        let reason = match cx.intent {
            Intent::View => "You are not allowed to see this resource",
            Intent::Mutate => "You are not allowed to change this resource",
        };
        Some(Decision::deny(DenialKind::Forbidden, reason))
    }

    fn name(&self) -> &'static str {
        "Deny"
    }

    fn description(&self) -> &'static str {
        "Everything not permitted so far is forbidden"
    }
}
