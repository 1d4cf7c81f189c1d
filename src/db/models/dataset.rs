//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use anyhow::Error;
use anyhow::Result;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::model::Dataset;
use crate::model::DatasetId;
use crate::model::TaskId;
use crate::schema::datasets;

#[derive(Debug, Identifiable, Queryable)]
#[diesel(table_name = datasets)]
pub struct DatasetRow {
    pub id: String,
    pub task_id: String,
    pub is_confidential: bool,
    pub is_deprecated: bool,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            id: DatasetId::from(row.id),
            task_id: TaskId::from(row.task_id),
            is_confidential: row.is_confidential,
            is_deprecated: row.is_deprecated,
        }
    }
}

impl DatasetRow {
    pub fn fetch(database_connection: &mut PgConnection, dataset: &DatasetId) -> Result<Option<Dataset>> {
        datasets::table
            .find(dataset.as_str())
            .first::<DatasetRow>(database_connection)
            .optional()
            .map(|row| row.map(Dataset::from))
            .map_err(Error::from)
    }
}
