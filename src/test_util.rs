//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Doubles for the collaborators behind the network

use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;

use crate::dispatch::GitCi;
use crate::dispatch::PipelineTrigger;
use crate::dispatch::RunningPipeline;
use crate::model::HostName;
use crate::model::RunId;
use crate::model::TeamId;
use crate::model::TransactionId;
use crate::vm::RpcRequest;
use crate::vm::RpcResponse;
use crate::vm::TransportError;
use crate::vm::VmRpc;

/// Answers every call with the same response
pub struct FakeVmRpc {
    answer: Mutex<Result<RpcResponse, TransportError>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<(HostName, RpcRequest)>>,
}

impl FakeVmRpc {
    pub fn new() -> Self {
        FakeVmRpc {
            answer: Mutex::new(Ok(RpcResponse::accepted("tx-0"))),
            delay: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, response: RpcResponse) {
        *self.answer.lock().unwrap() = Ok(response);
    }

    pub fn fail_with(&self, err: TransportError) {
        *self.answer.lock().unwrap() = Err(err);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<(HostName, RpcRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.requests.lock().unwrap().iter().map(|(_, r)| r.method()).collect()
    }
}

#[async_trait]
impl VmRpc for FakeVmRpc {
    async fn call(&self, host: &HostName, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        self.requests.lock().unwrap().push((host.clone(), request));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.answer.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct GitCiState {
    next_pipeline: i64,
    triggers: Vec<PipelineTrigger>,
    running: Vec<(i64, RunningPipeline)>,
    fail_trigger: bool,
    fail_listing: bool,
}

/// Pipelines keep running until they are stopped
#[derive(Default)]
pub struct FakeGitCi {
    state: Mutex<GitCiState>,
}

impl FakeGitCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_trigger(&self, fail: bool) {
        self.state.lock().unwrap().fail_trigger = fail;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn triggers(&self) -> Vec<PipelineTrigger> {
        self.state.lock().unwrap().triggers.clone()
    }
}

#[async_trait]
impl GitCi for FakeGitCi {
    async fn trigger(&self, trigger: &PipelineTrigger) -> Result<TransactionId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_trigger {
            return Err(anyhow!("pipeline trigger refused"))
        }

        state.next_pipeline += 1;
        let pipeline_id = state.next_pipeline;
        state.triggers.push(trigger.clone());
        state.running.push((trigger.repository_id, RunningPipeline {
            pipeline_id,
            team_id: Some(trigger.team_id.clone()),
            run_id: Some(trigger.run_id.clone()),
            input_run: Some(trigger.input_run.clone()),
        }));

        Ok(TransactionId::from(pipeline_id.to_string()))
    }

    async fn list_running(&self, repository_id: i64) -> Result<Vec<RunningPipeline>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(anyhow!("pipeline listing unavailable"))
        }

        Ok(state.running
            .iter()
            .filter(|(repo, _)| *repo == repository_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn stop(&self, repository_id: i64, team: &TeamId, run: &RunId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.running.len();
        state.running.retain(|(repo, p)| {
            !(*repo == repository_id
                && p.team_id.as_ref() == Some(team)
                && (p.input_run.as_ref() == Some(run) || p.run_id.as_ref() == Some(run)))
        });
        Ok(state.running.len() != before)
    }
}
