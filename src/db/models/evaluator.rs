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
use diesel::prelude::*;
use diesel::PgConnection;

use crate::model::DatasetId;
use crate::model::Evaluator;
use crate::model::EvaluatorBackend;
use crate::model::EvaluatorId;
use crate::model::HostName;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::schema::datasets;
use crate::schema::evaluators;

#[derive(Debug, Identifiable, Queryable)]
#[diesel(table_name = evaluators)]
pub struct EvaluatorRow {
    pub id: String,
    pub dataset_id: String,
    pub is_git_runner: bool,
    pub host: Option<String>,
    pub vm_id: Option<String>,
    pub command: String,
    pub image: Option<String>,
    pub repository_id: Option<i64>,
}

impl EvaluatorRow {
    pub fn for_dataset(database_connection: &mut PgConnection, dataset: &DatasetId) -> Result<Option<Evaluator>> {
        evaluators::table
            .filter(evaluators::dataset_id.eq(dataset.as_str()))
            .first::<EvaluatorRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Loading evaluator of dataset '{}'", dataset))?
            .map(EvaluatorRow::into_evaluator)
            .transpose()
    }

    pub fn for_task(database_connection: &mut PgConnection, task: &TaskId) -> Result<Vec<Evaluator>> {
        evaluators::table
            .inner_join(datasets::table)
            .filter(datasets::task_id.eq(task.as_str()))
            .select(evaluators::all_columns)
            .order_by(evaluators::id)
            .load::<EvaluatorRow>(database_connection)
            .with_context(|| anyhow!("Loading evaluators of task '{}'", task))?
            .into_iter()
            .map(EvaluatorRow::into_evaluator)
            .collect()
    }

    fn into_evaluator(self) -> Result<Evaluator> {
        let backend = if self.is_git_runner {
            EvaluatorBackend::GitCi {
                image: self.image.ok_or_else(|| anyhow!("Git evaluator '{}' without image", self.id))?,
                command: self.command,
                repository_id: self.repository_id
                    .ok_or_else(|| anyhow!("Git evaluator '{}' without repository", self.id))?,
            }
        } else {
            EvaluatorBackend::RemoteVm {
                host: self.host
                    .map(HostName::from)
                    .ok_or_else(|| anyhow!("VM evaluator '{}' without host", self.id))?,
                vm_id: self.vm_id
                    .map(TeamId::from)
                    .ok_or_else(|| anyhow!("VM evaluator '{}' without vm", self.id))?,
                command: self.command,
            }
        };

        Ok(Evaluator { id: EvaluatorId::from(self.id), backend })
    }
}
