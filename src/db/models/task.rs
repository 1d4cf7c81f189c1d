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
use anyhow::Error;
use anyhow::Result;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::model::OrganizerId;
use crate::model::Task;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::schema::task_allowed_teams;
use crate::schema::task_registrations;
use crate::schema::tasks;

#[derive(Debug, Identifiable, Queryable)]
#[diesel(table_name = tasks)]
pub struct TaskRow {
    pub id: String,
    pub organizer_id: String,
    pub require_registration: bool,
    pub restrict_to_allowed_teams: bool,
}

impl TaskRow {
    pub fn fetch(database_connection: &mut PgConnection, task: &TaskId) -> Result<Option<Task>> {
        let row = tasks::table
            .find(task.as_str())
            .first::<TaskRow>(database_connection)
            .optional()
            .with_context(|| anyhow::anyhow!("Loading task '{}'", task))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let allowed_teams = task_allowed_teams::table
            .filter(task_allowed_teams::task_id.eq(task.as_str()))
            .select(task_allowed_teams::team_id)
            .load::<String>(database_connection)
            .with_context(|| anyhow::anyhow!("Loading allowed teams of task '{}'", task))?
            .into_iter()
            .map(TeamId::from)
            .collect();

        Ok(Some(Task {
            id: TaskId::from(row.id),
            organizer_id: OrganizerId::from(row.organizer_id),
            require_registration: row.require_registration,
            allowed_teams,
            restrict_to_allowed_teams: row.restrict_to_allowed_teams,
        }))
    }

    pub fn is_registered(database_connection: &mut PgConnection, task: &TaskId, team: &TeamId) -> Result<bool> {
        diesel::select(diesel::dsl::exists(
            task_registrations::table
                .filter(task_registrations::task_id.eq(task.as_str()))
                .filter(task_registrations::team_id.eq(team.as_str()))
        ))
        .get_result::<bool>(database_connection)
        .map_err(Error::from)
    }
}
