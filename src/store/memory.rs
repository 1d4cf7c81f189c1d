//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use anyhow::anyhow;
use anyhow::Result;

use crate::model::Dataset;
use crate::model::DatasetId;
use crate::model::EvaluationTicket;
use crate::model::Evaluator;
use crate::model::Review;
use crate::model::ReviewPatch;
use crate::model::Run;
use crate::model::RunId;
use crate::model::Task;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::model::UserId;
use crate::registry::DeleteVerdict;
use crate::store::Store;
use crate::vm::VmRecord;

#[derive(Debug, Default)]
struct Data {
    tasks: BTreeMap<TaskId, Task>,
    datasets: BTreeMap<DatasetId, Dataset>,
    evaluators: BTreeMap<DatasetId, Evaluator>,

    // team -> owner, if any
    teams: BTreeMap<TeamId, Option<UserId>>,
    registrations: BTreeSet<(TaskId, TeamId)>,
    runs: BTreeMap<RunId, Run>,
    reviews: BTreeMap<RunId, Review>,
    tickets: BTreeMap<RunId, EvaluationTicket>,
    vms: BTreeMap<TeamId, VmRecord>,
}

/// Keeps everything in memory, one lock for all of it
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> Result<MutexGuard<'_, Data>> {
        self.data.lock().map_err(|_| anyhow!("Memory store lock poisoned"))
    }

    fn with<T>(&self, f: impl FnOnce(&mut Data) -> T) -> Result<T> {
        let mut data = self.data()?;
        Ok(f(&mut data))
    }

    /// Poisoning only follows a panicking test, the data is still usable for setting up fixtures
    fn fixtures(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_task(&self, task: Task) {
        self.fixtures().tasks.insert(task.id.clone(), task);
    }

    pub fn add_dataset(&self, dataset: Dataset) {
        self.fixtures().datasets.insert(dataset.id.clone(), dataset);
    }

    /// `dataset` is scored by `evaluator`
    pub fn add_evaluator(&self, dataset: DatasetId, evaluator: Evaluator) {
        self.fixtures().evaluators.insert(dataset, evaluator);
    }

    pub fn add_team(&self, team: TeamId) {
        self.fixtures().teams.entry(team).or_insert(None);
    }

    pub fn register_team(&self, task: TaskId, team: TeamId) {
        let mut data = self.fixtures();
        data.teams.entry(team.clone()).or_insert(None);
        data.registrations.insert((task, team));
    }
}

impl Store for MemoryStore {
    fn task(&self, id: &TaskId) -> Result<Option<Task>> {
        self.with(|d| d.tasks.get(id).cloned())
    }

    fn dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        self.with(|d| d.datasets.get(id).cloned())
    }

    fn evaluator_for_dataset(&self, id: &DatasetId) -> Result<Option<Evaluator>> {
        self.with(|d| d.evaluators.get(id).cloned())
    }

    fn evaluators_for_task(&self, id: &TaskId) -> Result<Vec<Evaluator>> {
        self.with(|d| {
            d.evaluators
                .iter()
                .filter(|(ds, _)| d.datasets.get(*ds).map(|ds| &ds.task_id == id).unwrap_or(false))
                .map(|(_, e)| e.clone())
                .collect()
        })
    }

    fn team_exists(&self, id: &TeamId) -> Result<bool> {
        self.with(|d| d.teams.contains_key(id))
    }

    fn upsert_team(&self, id: &TeamId, owner: &UserId) -> Result<()> {
        self.with(|d| {
            d.teams.insert(id.clone(), Some(owner.clone()));
        })
    }

    fn teams_of(&self, user: &UserId) -> Result<Vec<TeamId>> {
        self.with(|d| {
            d.teams
                .iter()
                .filter(|(_, owner)| matches!(owner, Some(o) if o == user))
                .map(|(team, _)| team.clone())
                .collect()
        })
    }

    fn is_registered(&self, task: &TaskId, team: &TeamId) -> Result<bool> {
        self.with(|d| d.registrations.contains(&(task.clone(), team.clone())))
    }

    fn run(&self, id: &RunId) -> Result<Option<Run>> {
        self.with(|d| d.runs.get(id).cloned())
    }

    fn insert_run(&self, run: &Run) -> Result<bool> {
        self.with(|d| {
            if d.runs.contains_key(&run.id) {
                return false
            }
            d.runs.insert(run.id.clone(), run.clone());
            true
        })
    }

    fn runs_with_input(&self, id: &RunId) -> Result<Vec<Run>> {
        self.with(|d| {
            d.runs
                .values()
                .filter(|r| !r.deleted && r.input_run.as_ref() == Some(id))
                .cloned()
                .collect()
        })
    }

    fn soft_delete_run(&self, id: &RunId) -> Result<DeleteVerdict> {
        self.with(|d| {
            let dependents = d.runs
                .values()
                .filter(|r| r.input_run.as_ref() == Some(id))
                .cloned()
                .collect::<Vec<_>>();

            let verdict = DeleteVerdict::judge(d.runs.get(id), d.reviews.get(id), &dependents);
            if verdict == DeleteVerdict::Deleted {
                if let Some(run) = d.runs.get_mut(id) {
                    run.deleted = true;
                }
            }
            verdict
        })
    }

    fn review(&self, run: &RunId) -> Result<Option<Review>> {
        self.with(|d| d.reviews.get(run).cloned())
    }

    fn insert_review_if_absent(&self, review: &Review) -> Result<Review> {
        self.with(|d| {
            d.reviews
                .entry(review.run_id.clone())
                .or_insert_with(|| review.clone())
                .clone()
        })
    }

    fn update_review(&self, run: &RunId, patch: &ReviewPatch) -> Result<Option<Review>> {
        self.with(|d| {
            d.reviews.get_mut(run).map(|review| {
                review.apply(patch);
                review.clone()
            })
        })
    }

    fn insert_ticket(&self, ticket: &EvaluationTicket) -> Result<bool> {
        self.with(|d| {
            if d.tickets.contains_key(&ticket.run_id) {
                return false
            }
            d.tickets.insert(ticket.run_id.clone(), ticket.clone());
            true
        })
    }

    fn ticket(&self, run: &RunId) -> Result<Option<EvaluationTicket>> {
        self.with(|d| d.tickets.get(run).cloned())
    }

    fn update_ticket(&self, ticket: &EvaluationTicket) -> Result<()> {
        self.with(|d| {
            d.tickets
                .get_mut(&ticket.run_id)
                .filter(|t| t.is_same(ticket))
                .map(|t| *t = ticket.clone())
        })?
        .ok_or_else(|| anyhow!("No evaluation ticket for run {}", ticket.run_id))
    }

    fn remove_ticket(&self, ticket: &EvaluationTicket) -> Result<bool> {
        self.with(|d| {
            let current = d.tickets.get(&ticket.run_id).map(|t| t.is_same(ticket)).unwrap_or(false);
            if current {
                d.tickets.remove(&ticket.run_id);
            }
            current
        })
    }

    fn vm_record(&self, vm: &TeamId) -> Result<Option<VmRecord>> {
        self.with(|d| d.vms.get(vm).cloned())
    }

    fn upsert_vm_record(&self, record: &VmRecord) -> Result<()> {
        self.with(|d| {
            d.vms.insert(record.vm_id.clone(), record.clone());
        })
    }
}
