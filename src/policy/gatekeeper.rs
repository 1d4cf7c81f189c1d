//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use tracing::trace;

use crate::identity::AuthenticationProvider;
use crate::identity::Request;
use crate::model::DatasetId;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::policy::AccessOptions;
use crate::policy::Intent;
use crate::policy::Lookup;
use crate::policy::Policy;
use crate::policy::PolicyContext;
use crate::policy::ResourceState;
use crate::policy::RunState;
use crate::policy::Target;
use crate::policy::Verdict;
use crate::store::Store;

/// Gates every operation: resolves the caller, loads the resources and asks the policy
pub struct Gatekeeper {
    auth: Arc<dyn AuthenticationProvider>,
    store: Arc<dyn Store>,
    policy: Policy,
    public_datasets: Vec<DatasetId>,
}

impl Gatekeeper {
    pub fn new(auth: Arc<dyn AuthenticationProvider>, store: Arc<dyn Store>, public_datasets: Vec<DatasetId>) -> Self {
        Gatekeeper {
            auth,
            store,
            policy: Policy::standard(),
            public_datasets,
        }
    }

    pub fn check(&self, request: &Request, target: &Target, intent: Intent, options: AccessOptions) -> Result<Verdict> {
        let state = self.load_state(request, target)?;
        trace!("Resource state for {:?}: {:?}", target, state);

        let resource_team = target.team
            .as_ref()
            .or_else(|| state.runs.iter().find_map(|r| r.run.as_ref().map(|run| &run.team_id)));
        let task_organizer = state.consistent_task().map(|t| &t.organizer_id);

        let role = self.auth.get_role(request, resource_team, task_organizer);
        let organizer_ids = self.auth.get_organizer_ids(request);

        let verdict = self.policy.authorize(PolicyContext::new(role, &organizer_ids, &state, intent, options));
        debug!("{} {:?} as {}: {:?} by rule {}",
            intent,
            target,
            role,
            verdict.decision,
            verdict.rule);

        Ok(verdict)
    }

    /// Look up everything the target names, and the task it implies
    ///
    /// Runs only count as found if they belong to the requested team and dataset. Without a
    /// requested team, the first run found decides which team the other runs must belong to.
    pub fn load_state(&self, request: &Request, target: &Target) -> Result<ResourceState> {
        let mut owner: Option<TeamId> = target.team.clone();
        let mut runs = Vec::with_capacity(target.runs.len());
        for id in target.runs.iter() {
            let run = self.store
                .run(id)?
                .filter(|r| !r.deleted)
                .filter(|r| {
                    let in_scope = owner.as_ref().map(|t| *t == r.team_id).unwrap_or(true)
                        && target.dataset.as_ref().map(|d| *d == r.dataset_id).unwrap_or(true);
                    if !in_scope {
                        debug!("Run {} of {} on {} is outside of {:?}", r.id, r.team_id, r.dataset_id, target);
                    }
                    in_scope
                });

            if owner.is_none() {
                owner = run.as_ref().map(|r| r.team_id.clone());
            }

            let (review, dataset) = match run.as_ref() {
                Some(r) => (self.store.review(id)?, self.store.dataset(&r.dataset_id)?),
                None => (None, None),
            };
            let listed_public = dataset.as_ref()
                .map(|d| self.public_datasets.contains(&d.id))
                .unwrap_or(false);

            runs.push(RunState { id: id.clone(), run, review, dataset, listed_public });
        }

        let dataset = target.dataset
            .as_ref()
            .map(|id| -> Result<_> { Ok(Lookup::new(id.clone(), self.store.dataset(id)?)) })
            .transpose()?;

        let task_id: Option<TaskId> = target.task.clone()
            .or_else(|| dataset.as_ref().and_then(|l| l.found.as_ref()).map(|d| d.task_id.clone()))
            .or_else(|| runs.iter().find_map(|r| r.dataset.as_ref()).map(|d| d.task_id.clone()));

        let task = task_id
            .map(|id| -> Result<_> {
                let found = self.store.task(&id)?;
                Ok(Lookup::new(id, found))
            })
            .transpose()?;

        let team = target.team
            .as_ref()
            .map(|id| -> Result<_> {
                let found = if self.store.team_exists(id)? { Some(()) } else { None };
                Ok(Lookup::new(id.clone(), found))
            })
            .transpose()?;

        let candidate_teams: Vec<TeamId> = match target.team.as_ref() {
            Some(team) => vec![team.clone()],
            None => self.auth.get_teams(request),
        };

        let mut registered_teams = Vec::new();
        if let Some(task) = task.as_ref().and_then(|l| l.found.as_ref()) {
            for team in candidate_teams.iter() {
                if self.store.is_registered(&task.id, team)? {
                    registered_teams.push(team.clone());
                }
            }
        }

        Ok(ResourceState {
            task,
            dataset,
            team,
            runs,
            candidate_teams,
            registered_teams,
        })
    }
}
