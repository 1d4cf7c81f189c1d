//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! The single authoritative repository of tasks, runs, reviews and evaluation tickets

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
use crate::vm::VmRecord;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

/// Persistence collaborator
///
/// Every method which decides between concurrent callers (`insert_run`, `insert_review_if_absent`,
/// `insert_ticket`, `soft_delete_run`, `update_review`) must be atomic.
pub trait Store: Send + Sync {
    fn task(&self, id: &TaskId) -> Result<Option<Task>>;

    fn dataset(&self, id: &DatasetId) -> Result<Option<Dataset>>;

    fn evaluator_for_dataset(&self, id: &DatasetId) -> Result<Option<Evaluator>>;

    fn evaluators_for_task(&self, id: &TaskId) -> Result<Vec<Evaluator>>;

    fn team_exists(&self, id: &TeamId) -> Result<bool>;

    /// Create the team if it does not exist and make `owner` own it
    fn upsert_team(&self, id: &TeamId, owner: &UserId) -> Result<()>;

    fn teams_of(&self, user: &UserId) -> Result<Vec<TeamId>>;

    fn is_registered(&self, task: &TaskId, team: &TeamId) -> Result<bool>;

    /// Including deleted runs
    fn run(&self, id: &RunId) -> Result<Option<Run>>;

    /// `false` if a run with this id exists already
    fn insert_run(&self, run: &Run) -> Result<bool>;

    /// Runs which are not deleted and use `id` as their input run
    fn runs_with_input(&self, id: &RunId) -> Result<Vec<Run>>;

    /// Check the deletion guards and mark the run as deleted, in one step
    fn soft_delete_run(&self, id: &RunId) -> Result<DeleteVerdict>;

    fn review(&self, run: &RunId) -> Result<Option<Review>>;

    /// Persist `review` unless there is one for the run already, returns the persisted review
    fn insert_review_if_absent(&self, review: &Review) -> Result<Review>;

    /// Merge `patch` into the persisted review, `None` if there is no review
    fn update_review(&self, run: &RunId, patch: &ReviewPatch) -> Result<Option<Review>>;

    /// `false` if there is a ticket for the run already
    fn insert_ticket(&self, ticket: &EvaluationTicket) -> Result<bool>;

    fn ticket(&self, run: &RunId) -> Result<Option<EvaluationTicket>>;

    /// Overwrite the stored ticket, which must be `ticket` itself (same run, same creation time)
    fn update_ticket(&self, ticket: &EvaluationTicket) -> Result<()>;

    /// Remove `ticket`, `false` if the run holds no ticket or another one by now
    fn remove_ticket(&self, ticket: &EvaluationTicket) -> Result<bool>;

    fn vm_record(&self, vm: &TeamId) -> Result<Option<VmRecord>>;

    fn upsert_vm_record(&self, record: &VmRecord) -> Result<()>;

    fn task_exists(&self, id: &TaskId) -> Result<bool> {
        self.task(id).map(|t| t.is_some())
    }

    fn dataset_exists(&self, id: &DatasetId) -> Result<bool> {
        self.dataset(id).map(|d| d.is_some())
    }

    fn vm_exists(&self, id: &TeamId) -> Result<bool> {
        self.team_exists(id)
    }

    /// Deleted runs do not exist
    fn run_exists(&self, id: &RunId) -> Result<bool> {
        self.run(id).map(|r| r.map(|r| !r.deleted).unwrap_or(false))
    }
}
