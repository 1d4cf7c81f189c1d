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
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::model::DatasetId;
use crate::model::Producer;
use crate::model::Run;
use crate::model::RunId;
use crate::model::TeamId;
use crate::schema::runs;

#[derive(Debug, Identifiable, Queryable)]
#[diesel(table_name = runs)]
pub struct RunRow {
    pub id: String,
    pub team_id: String,
    pub producer_kind: String,
    pub producer_ref: String,
    pub dataset_id: String,
    pub input_run: Option<String>,
    pub deleted: bool,
    pub downloadable: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = runs)]
struct NewRun<'a> {
    pub id: &'a str,
    pub team_id: &'a str,
    pub producer_kind: &'a str,
    pub producer_ref: &'a str,
    pub dataset_id: &'a str,
    pub input_run: Option<&'a str>,
    pub deleted: bool,
    pub downloadable: bool,
    pub created_at: &'a DateTime<Utc>,
}

impl RunRow {
    /// Returns `false` if there was a run with this id already
    pub fn create(database_connection: &mut PgConnection, run: &Run) -> Result<bool> {
        let new_run = NewRun {
            id: run.id.as_str(),
            team_id: run.team_id.as_str(),
            producer_kind: run.producer.kind(),
            producer_ref: run.producer.reference(),
            dataset_id: run.dataset_id.as_str(),
            input_run: run.input_run.as_ref().map(RunId::as_str),
            deleted: run.deleted,
            downloadable: run.downloadable,
            created_at: &run.created_at,
        };

        diesel::insert_into(runs::table)
            .values(&new_run)
            .on_conflict_do_nothing()
            .execute(database_connection)
            .with_context(|| anyhow!("Inserting run '{}'", run.id))
            .map(|inserted| inserted == 1)
    }

    pub fn fetch(database_connection: &mut PgConnection, run: &RunId) -> Result<Option<Run>> {
        runs::table
            .find(run.as_str())
            .first::<RunRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Loading run '{}'", run))?
            .map(Run::try_from)
            .transpose()
    }

    /// Same as `fetch()`, but locks the row until the end of the transaction
    pub fn fetch_for_update(database_connection: &mut PgConnection, run: &RunId) -> Result<Option<Run>> {
        runs::table
            .find(run.as_str())
            .for_update()
            .get_result::<RunRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Locking run '{}'", run))?
            .map(Run::try_from)
            .transpose()
    }

    /// All runs, deleted or not, that use `run` as their input
    pub fn with_input(database_connection: &mut PgConnection, run: &RunId) -> Result<Vec<Run>> {
        runs::table
            .filter(runs::input_run.eq(run.as_str()))
            .order_by(runs::created_at)
            .load::<RunRow>(database_connection)
            .with_context(|| anyhow!("Loading runs using '{}' as input", run))?
            .into_iter()
            .map(Run::try_from)
            .collect()
    }

    pub fn mark_deleted(database_connection: &mut PgConnection, run: &RunId) -> Result<()> {
        diesel::update(runs::table.find(run.as_str()))
            .set(runs::deleted.eq(true))
            .execute(database_connection)
            .with_context(|| anyhow!("Marking run '{}' as deleted", run))
            .map(|_| ())
    }
}

impl TryFrom<RunRow> for Run {
    type Error = anyhow::Error;

    fn try_from(row: RunRow) -> Result<Self> {
        Ok(Run {
            producer: Producer::from_parts(&row.producer_kind, row.producer_ref)
                .with_context(|| anyhow!("Reading producer of run '{}'", row.id))?,
            id: RunId::from(row.id),
            team_id: TeamId::from(row.team_id),
            dataset_id: DatasetId::from(row.dataset_id),
            input_run: row.input_run.map(RunId::from),
            deleted: row.deleted,
            downloadable: row.downloadable,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvaluatorId;

    #[test]
    fn test_row_to_run() {
        let row = RunRow {
            id: String::from("r2"),
            team_id: String::from("t1"),
            producer_kind: String::from("evaluation"),
            producer_ref: String::from("e1"),
            dataset_id: String::from("d1"),
            input_run: Some(String::from("r1")),
            deleted: false,
            downloadable: true,
            created_at: Utc::now(),
        };

        let run = Run::try_from(row).unwrap();
        assert!(run.is_evaluation());
        assert_eq!(run.producer, Producer::Evaluation(EvaluatorId::from("e1")));
        assert_eq!(run.input_run, Some(RunId::from("r1")));
    }

    #[test]
    fn test_unknown_producer_kind() {
        let row = RunRow {
            id: String::from("r2"),
            team_id: String::from("t1"),
            producer_kind: String::from("magic"),
            producer_ref: String::from("x"),
            dataset_id: String::from("d1"),
            input_run: None,
            deleted: false,
            downloadable: false,
            created_at: Utc::now(),
        };
        assert!(Run::try_from(row).is_err());
    }
}
