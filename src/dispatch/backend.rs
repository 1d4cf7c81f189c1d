//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::BackendKind;
use crate::error::CoreError;
use crate::model::DatasetId;
use crate::model::Evaluator;
use crate::model::Run;
use crate::model::RunId;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::model::TransactionId;

/// Everything a backend needs to evaluate one run
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvaluationJob {
    pub task_id: TaskId,
    pub dataset_id: DatasetId,
    pub team_id: TeamId,

    /// The run to evaluate
    pub input_run: RunId,

    /// Id of the run the evaluation will produce
    pub evaluation_run: RunId,
    pub evaluator: Evaluator,
}

#[derive(parse_display::Display, Serialize, Clone, Copy, Debug, Eq, PartialEq)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// The backend is still working on the evaluation
    Running,
    Idle,
}

#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Hand the job to the backend, which answers with a transaction id right away
    async fn dispatch(&self, job: &EvaluationJob) -> Result<TransactionId, CoreError>;

    /// Whether the backend is still evaluating `run` with `evaluator`
    async fn poll(&self, evaluator: &Evaluator, run: &Run, force_refresh: bool) -> Result<BackendStatus, CoreError>;

    /// Cancel the evaluation of `run`
    async fn stop(&self, evaluator: &Evaluator, run: &Run) -> Result<(), CoreError>;
}
