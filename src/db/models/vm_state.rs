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

use crate::model::HostName;
use crate::model::TeamId;
use crate::model::TransactionId;
use crate::schema::vm_states;
use crate::vm::VmRecord;
use crate::vm::VmState;

#[derive(Debug, Queryable)]
#[diesel(table_name = vm_states)]
pub struct VmStateRow {
    pub vm_id: String,
    pub host: String,
    pub state: String,
    pub transaction_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = vm_states)]
#[diesel(primary_key(vm_id))]
#[diesel(treat_none_as_null = true)]
struct NewVmState<'a> {
    pub vm_id: &'a str,
    pub host: &'a str,
    pub state: String,
    pub transaction_id: Option<&'a str>,
    pub updated_at: &'a DateTime<Utc>,
}

impl VmStateRow {
    pub fn fetch(database_connection: &mut PgConnection, vm: &TeamId) -> Result<Option<VmRecord>> {
        let row = vm_states::table
            .find(vm.as_str())
            .first::<VmStateRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Loading state of vm '{}'", vm))?;

        row.map(|row| {
            Ok(VmRecord {
                state: VmState::from_str(&row.state)
                    .map_err(|_| anyhow!("Unknown state '{}' of vm '{}'", row.state, row.vm_id))?,
                vm_id: TeamId::from(row.vm_id),
                host: HostName::from(row.host),
                transaction_id: row.transaction_id.map(TransactionId::from),
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    pub fn create_or_update(database_connection: &mut PgConnection, record: &VmRecord) -> Result<()> {
        let new_state = NewVmState {
            vm_id: record.vm_id.as_str(),
            host: record.host.as_str(),
            state: record.state.to_string(),
            transaction_id: record.transaction_id.as_ref().map(TransactionId::as_str),
            updated_at: &record.updated_at,
        };

        diesel::insert_into(vm_states::table)
            .values(&new_state)
            .on_conflict(vm_states::vm_id)
            .do_update()
            .set(&new_state)
            .execute(database_connection)
            .with_context(|| anyhow!("Storing state of vm '{}'", record.vm_id))
            .map(|_| ())
    }
}
