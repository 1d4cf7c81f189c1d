//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::dispatch::BackendKind;
use crate::dispatch::EvaluationState;
use crate::model::EvaluationTicket;
use crate::model::RunId;
use crate::model::TransactionId;
use crate::schema::evaluation_tickets;

#[derive(Debug, Queryable)]
#[diesel(table_name = evaluation_tickets)]
pub struct TicketRow {
    pub run_id: String,
    pub state: String,
    pub backend: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = evaluation_tickets)]
#[diesel(primary_key(run_id))]
#[diesel(treat_none_as_null = true)]
struct NewTicket<'a> {
    pub run_id: &'a str,
    pub state: String,
    pub backend: Option<String>,
    pub transaction_id: Option<&'a str>,
    pub created_at: &'a DateTime<Utc>,
}

impl<'a> From<&'a EvaluationTicket> for NewTicket<'a> {
    fn from(ticket: &'a EvaluationTicket) -> Self {
        NewTicket {
            run_id: ticket.run_id.as_str(),
            state: ticket.state.to_string(),
            backend: ticket.backend.map(|b| b.to_string()),
            transaction_id: ticket.transaction_id.as_ref().map(TransactionId::as_str),
            created_at: &ticket.created_at,
        }
    }
}

impl TryFrom<TicketRow> for EvaluationTicket {
    type Error = anyhow::Error;

    fn try_from(row: TicketRow) -> Result<Self> {
        Ok(EvaluationTicket {
            state: EvaluationState::from_str(&row.state)
                .map_err(|_| anyhow!("Unknown evaluation state '{}' for run '{}'", row.state, row.run_id))?,
            backend: row.backend
                .as_deref()
                .map(BackendKind::from_str)
                .transpose()
                .map_err(|_| anyhow!("Unknown backend for run '{}'", row.run_id))?,
            run_id: RunId::from(row.run_id),
            transaction_id: row.transaction_id.map(TransactionId::from),
            created_at: row.created_at,
        })
    }
}

impl TicketRow {
    /// Returns `false` if the run has a ticket already
    pub fn create(database_connection: &mut PgConnection, ticket: &EvaluationTicket) -> Result<bool> {
        diesel::insert_into(evaluation_tickets::table)
            .values(&NewTicket::from(ticket))
            .on_conflict_do_nothing()
            .execute(database_connection)
            .with_context(|| anyhow!("Inserting evaluation ticket for run '{}'", ticket.run_id))
            .map(|inserted| inserted == 1)
    }

    pub fn fetch(database_connection: &mut PgConnection, run: &RunId) -> Result<Option<EvaluationTicket>> {
        evaluation_tickets::table
            .find(run.as_str())
            .first::<TicketRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Loading evaluation ticket for run '{}'", run))?
            .map(EvaluationTicket::try_from)
            .transpose()
    }

    /// Only touches the row while it still holds `ticket`
    pub fn update(database_connection: &mut PgConnection, ticket: &EvaluationTicket) -> Result<()> {
        let row = evaluation_tickets::table
            .find(ticket.run_id.as_str())
            .filter(evaluation_tickets::created_at.eq(ticket.created_at));

        let updated = diesel::update(row)
            .set(&NewTicket::from(ticket))
            .execute(database_connection)
            .with_context(|| anyhow!("Updating evaluation ticket for run '{}'", ticket.run_id))?;

        if updated == 0 {
            return Err(anyhow!("No evaluation ticket for run {}", ticket.run_id))
        }
        Ok(())
    }

    /// Returns `false` if the run holds another ticket by now
    pub fn remove(database_connection: &mut PgConnection, ticket: &EvaluationTicket) -> Result<bool> {
        let row = evaluation_tickets::table
            .find(ticket.run_id.as_str())
            .filter(evaluation_tickets::created_at.eq(ticket.created_at));

        diesel::delete(row)
            .execute(database_connection)
            .with_context(|| anyhow!("Removing evaluation ticket for run '{}'", ticket.run_id))
            .map(|removed| removed == 1)
    }
}
