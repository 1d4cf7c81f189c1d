//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use anyhow::Context;
use anyhow::Result;
use diesel::Connection;

use crate::db::models::DatasetRow;
use crate::db::models::EvaluatorRow;
use crate::db::models::ReviewRow;
use crate::db::models::RunRow;
use crate::db::models::TaskRow;
use crate::db::models::TeamRow;
use crate::db::models::TicketRow;
use crate::db::models::VmStateRow;
use crate::db::PgPool;
use crate::db::PgPooledConnection;
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

/// Store backed by PostgreSQL
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    fn conn(&self) -> Result<PgPooledConnection> {
        self.pool.get().context("Getting a database connection from the pool")
    }
}

impl Store for PgStore {
    fn task(&self, id: &TaskId) -> Result<Option<Task>> {
        TaskRow::fetch(&mut *self.conn()?, id)
    }

    fn dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        DatasetRow::fetch(&mut *self.conn()?, id)
    }

    fn evaluator_for_dataset(&self, id: &DatasetId) -> Result<Option<Evaluator>> {
        EvaluatorRow::for_dataset(&mut *self.conn()?, id)
    }

    fn evaluators_for_task(&self, id: &TaskId) -> Result<Vec<Evaluator>> {
        EvaluatorRow::for_task(&mut *self.conn()?, id)
    }

    fn team_exists(&self, id: &TeamId) -> Result<bool> {
        TeamRow::exists(&mut *self.conn()?, id)
    }

    fn upsert_team(&self, id: &TeamId, owner: &UserId) -> Result<()> {
        TeamRow::create_or_update(&mut *self.conn()?, id, owner)
    }

    fn teams_of(&self, user: &UserId) -> Result<Vec<TeamId>> {
        TeamRow::owned_by(&mut *self.conn()?, user)
    }

    fn is_registered(&self, task: &TaskId, team: &TeamId) -> Result<bool> {
        TaskRow::is_registered(&mut *self.conn()?, task, team)
    }

    fn run(&self, id: &RunId) -> Result<Option<Run>> {
        RunRow::fetch(&mut *self.conn()?, id)
    }

    fn insert_run(&self, run: &Run) -> Result<bool> {
        RunRow::create(&mut *self.conn()?, run)
    }

    fn runs_with_input(&self, id: &RunId) -> Result<Vec<Run>> {
        RunRow::with_input(&mut *self.conn()?, id)
            .map(|runs| runs.into_iter().filter(|r| !r.deleted).collect())
    }

    fn soft_delete_run(&self, id: &RunId) -> Result<DeleteVerdict> {
        self.conn()?.transaction::<_, anyhow::Error, _>(|conn| {
            let run = RunRow::fetch_for_update(conn, id)?;
            let review = ReviewRow::fetch(conn, id)?;
            let dependents = RunRow::with_input(conn, id)?;

            let verdict = DeleteVerdict::judge(run.as_ref(), review.as_ref(), &dependents);
            if verdict == DeleteVerdict::Deleted {
                RunRow::mark_deleted(conn, id)?;
            }
            Ok(verdict)
        })
    }

    fn review(&self, run: &RunId) -> Result<Option<Review>> {
        ReviewRow::fetch(&mut *self.conn()?, run)
    }

    fn insert_review_if_absent(&self, review: &Review) -> Result<Review> {
        ReviewRow::create_or_fetch(&mut *self.conn()?, review)
    }

    fn update_review(&self, run: &RunId, patch: &ReviewPatch) -> Result<Option<Review>> {
        ReviewRow::update(&mut *self.conn()?, run, patch)
    }

    fn insert_ticket(&self, ticket: &EvaluationTicket) -> Result<bool> {
        TicketRow::create(&mut *self.conn()?, ticket)
    }

    fn ticket(&self, run: &RunId) -> Result<Option<EvaluationTicket>> {
        TicketRow::fetch(&mut *self.conn()?, run)
    }

    fn update_ticket(&self, ticket: &EvaluationTicket) -> Result<()> {
        TicketRow::update(&mut *self.conn()?, ticket)
    }

    fn remove_ticket(&self, ticket: &EvaluationTicket) -> Result<bool> {
        TicketRow::remove(&mut *self.conn()?, ticket)
    }

    fn vm_record(&self, vm: &TeamId) -> Result<Option<VmRecord>> {
        VmStateRow::fetch(&mut *self.conn()?, vm)
    }

    fn upsert_vm_record(&self, record: &VmRecord) -> Result<()> {
        VmStateRow::create_or_update(&mut *self.conn()?, record)
    }
}
