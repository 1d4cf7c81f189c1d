//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use chrono::DateTime;
use chrono::SubsecRound;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::dispatch::BackendKind;
use crate::dispatch::EvaluationState;
use crate::model::RunId;
use crate::model::TransactionId;

/// Marks an evaluation of `run_id` as in flight
///
/// At most one ticket may exist per run. The store refuses a second insert.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTicket {
    pub run_id: RunId,
    pub state: EvaluationState,
    pub backend: Option<BackendKind>,
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}

impl EvaluationTicket {
    /// Tickets of the same run are told apart by `created_at`, kept in microseconds like the
    /// database does
    pub fn requested(run_id: RunId, created_at: DateTime<Utc>) -> Self {
        EvaluationTicket {
            run_id,
            state: EvaluationState::Requested,
            backend: None,
            transaction_id: None,
            created_at: created_at.trunc_subsecs(6),
        }
    }

    /// Whether `other` is this very ticket, in whatever state
    pub fn is_same(&self, other: &EvaluationTicket) -> bool {
        self.run_id == other.run_id && self.created_at == other.created_at
    }
}
