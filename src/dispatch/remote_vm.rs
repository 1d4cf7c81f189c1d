//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::dispatch::BackendKind;
use crate::dispatch::BackendStatus;
use crate::dispatch::EvaluationBackend;
use crate::dispatch::EvaluationJob;
use crate::error::CoreError;
use crate::model::Evaluator;
use crate::model::EvaluatorBackend;
use crate::model::HostName;
use crate::model::Run;
use crate::model::TeamId;
use crate::model::TransactionId;
use crate::vm::VmState;
use crate::vm::VmTracker;

/// Evaluates inside the virtual machine of the evaluator
pub struct RemoteVmBackend {
    tracker: Arc<VmTracker>,
}

impl RemoteVmBackend {
    pub fn new(tracker: Arc<VmTracker>) -> Self {
        RemoteVmBackend { tracker }
    }
}

fn vm_of(evaluator: &Evaluator) -> Result<(&HostName, &TeamId, &str), CoreError> {
    match &evaluator.backend {
        EvaluatorBackend::RemoteVm { host, vm_id, command } => Ok((host, vm_id, command.as_str())),
        EvaluatorBackend::GitCi { .. } => {
            Err(CoreError::MalformedRequest(format!("Evaluator {} does not run in a virtual machine", evaluator.id)))
        },
    }
}

#[async_trait]
impl EvaluationBackend for RemoteVmBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteVm
    }

    async fn dispatch(&self, job: &EvaluationJob) -> Result<TransactionId, CoreError> {
        let (host, vm, command) = vm_of(&job.evaluator)?;
        let input_run = format!("{}/{}", job.team_id, job.input_run);

        let transaction = self.tracker
            .run_eval(host, vm, &job.dataset_id, &job.evaluation_run, &input_run, command)
            .await?
            .ok_or_else(|| CoreError::BackendUnavailable(format!("{} accepted the evaluation without a transaction id", host)))?;

        info!("Evaluation of {} on {} accepted as {}", job.input_run, vm, transaction);
        Ok(transaction)
    }

    async fn poll(&self, evaluator: &Evaluator, _run: &Run, _force_refresh: bool) -> Result<BackendStatus, CoreError> {
        let (host, vm, _) = vm_of(evaluator)?;
        let record = self.tracker.info(host, vm).await?;

        if record.state == VmState::Executing {
            Ok(BackendStatus::Running)
        } else {
            Ok(BackendStatus::Idle)
        }
    }

    async fn stop(&self, evaluator: &Evaluator, _run: &Run) -> Result<(), CoreError> {
        let (host, vm, _) = vm_of(evaluator)?;
        self.tracker.abort(host, vm).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatasetId;
    use crate::model::EvaluatorId;
    use crate::model::RunId;
    use crate::model::TaskId;
    use crate::store::MemoryStore;
    use crate::test_util::FakeVmRpc;
    use crate::vm::RpcRequest;
    use crate::vm::RpcResponse;

    fn evaluator() -> Evaluator {
        Evaluator {
            id: EvaluatorId::from("e1"),
            backend: EvaluatorBackend::RemoteVm {
                host: HostName::from("h1"),
                vm_id: TeamId::from("master-vm"),
                command: String::from("eval.sh $inputRun"),
            },
        }
    }

    fn job() -> EvaluationJob {
        EvaluationJob {
            task_id: TaskId::from("task1"),
            dataset_id: DatasetId::from("d1"),
            team_id: TeamId::from("t1"),
            input_run: RunId::from("r7"),
            evaluation_run: RunId::from("2023-01-01-00-00-00"),
            evaluator: evaluator(),
        }
    }

    fn backend(rpc: Arc<FakeVmRpc>) -> RemoteVmBackend {
        RemoteVmBackend::new(Arc::new(VmTracker::new(Arc::new(MemoryStore::new()), rpc)))
    }

    #[tokio::test]
    async fn test_dispatch_sends_run_eval() {
        let rpc = Arc::new(FakeVmRpc::new());
        rpc.respond_with(RpcResponse::accepted("tx-9"));

        let tx = backend(rpc.clone()).dispatch(&job()).await.unwrap();
        assert_eq!(tx, TransactionId::from("tx-9"));

        let requests = rpc.requests();
        assert_eq!(requests.len(), 1);
        match &requests[0].1 {
            RpcRequest::RunEval { vm_id, dataset_id, input_run, .. } => {
                assert_eq!(vm_id, "master-vm");
                assert_eq!(dataset_id, "d1");
                assert_eq!(input_run, "t1/r7");
            },
            other => panic!("unexpected request {:?}", other),
        }
        assert_eq!(requests[0].0, HostName::from("h1"));
    }

    #[tokio::test]
    async fn test_busy_host() {
        let rpc = Arc::new(FakeVmRpc::new());
        rpc.respond_with(RpcResponse::with_status(9));

        let err = backend(rpc).dispatch(&job()).await.unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
        assert!(err.to_string().contains("busy"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let rpc = Arc::new(FakeVmRpc::new());
        rpc.fail_with(crate::vm::TransportError::Unavailable(HostName::from("h1")));

        assert!(backend(rpc.clone()).dispatch(&job()).await.is_err());
        assert_eq!(rpc.methods(), vec!["run_eval"]);
    }

    #[tokio::test]
    async fn test_poll_follows_vm_state() {
        let rpc = Arc::new(FakeVmRpc::new());
        let backend = backend(rpc.clone());
        let run = Run::builder()
            .id(RunId::from("r7"))
            .team_id(TeamId::from("t1"))
            .producer(crate::model::Producer::Upload(String::from("u1")))
            .dataset_id(DatasetId::from("d1"))
            .build();

        let mut info = RpcResponse::accepted("tx");
        info.state = Some(VmState::Executing);
        rpc.respond_with(info.clone());
        assert_eq!(backend.poll(&evaluator(), &run, false).await.unwrap(), BackendStatus::Running);

        info.state = Some(VmState::Running);
        rpc.respond_with(info);
        assert_eq!(backend.poll(&evaluator(), &run, false).await.unwrap(), BackendStatus::Idle);
    }
}
