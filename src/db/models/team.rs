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

use crate::model::TeamId;
use crate::model::UserId;
use crate::schema::teams;

#[derive(Debug, Identifiable, Queryable)]
#[diesel(table_name = teams)]
pub struct TeamRow {
    pub id: String,
    pub owner: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = teams)]
struct NewTeam<'a> {
    pub id: &'a str,
    pub owner: Option<&'a str>,
}

impl TeamRow {
    pub fn exists(database_connection: &mut PgConnection, team: &TeamId) -> Result<bool> {
        diesel::select(diesel::dsl::exists(teams::table.find(team.as_str())))
            .get_result::<bool>(database_connection)
            .map_err(Error::from)
    }

    pub fn create_or_update(database_connection: &mut PgConnection, team: &TeamId, owner: &UserId) -> Result<()> {
        let new_team = NewTeam {
            id: team.as_str(),
            owner: Some(owner.as_str()),
        };

        diesel::insert_into(teams::table)
            .values(&new_team)
            .on_conflict(teams::id)
            .do_update()
            .set(teams::owner.eq(owner.as_str()))
            .execute(database_connection)
            .with_context(|| anyhow::anyhow!("Upserting team '{}'", team))
            .map(|_| ())
    }

    pub fn owned_by(database_connection: &mut PgConnection, user: &UserId) -> Result<Vec<TeamId>> {
        teams::table
            .filter(teams::owner.eq(user.as_str()))
            .select(teams::id)
            .order_by(teams::id)
            .load::<String>(database_connection)
            .map(|ids| ids.into_iter().map(TeamId::from).collect())
            .map_err(Error::from)
    }
}
