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

use chrono::Utc;
use tracing::debug;
use tracing::info;

use crate::error::CoreError;
use crate::model::DatasetId;
use crate::model::HostName;
use crate::model::RunId;
use crate::model::TeamId;
use crate::model::TransactionId;
use crate::store::Store;
use crate::vm::status;
use crate::vm::RpcRequest;
use crate::vm::RpcResponse;
use crate::vm::VmCommand;
use crate::vm::VmRecord;
use crate::vm::VmRpc;
use crate::vm::VmState;

/// Keeps the last known state of every virtual machine
///
/// The state only changes in reaction to RPC responses, a VM stuck in a
/// transitional state stays there until the next `info`.
pub struct VmTracker {
    store: Arc<dyn Store>,
    rpc: Arc<dyn VmRpc>,
}

impl VmTracker {
    pub fn new(store: Arc<dyn Store>, rpc: Arc<dyn VmRpc>) -> Self {
        VmTracker { store, rpc }
    }

    pub fn state(&self, vm: &TeamId) -> Result<Option<VmRecord>, CoreError> {
        self.store.vm_record(vm).map_err(CoreError::from)
    }

    /// Ask the host for the state of the VM, which replaces whatever was recorded
    pub async fn info(&self, host: &HostName, vm: &TeamId) -> Result<VmRecord, CoreError> {
        let response = self.call(host, RpcRequest::Info { vm_id: vm.to_string() }).await?;

        let state = match response.status {
            status::VM_NOT_FOUND | status::ARCHIVED => VmState::Archived,
            _ => {
                status::interpret(&response)?;
                response.state.unwrap_or(VmState::Undefined)
            },
        };

        self.set_state(host, vm, state, None)
    }

    /// Send a lifecycle command, the VM enters the matching transitional state once the host accepts it
    pub async fn command(&self, host: &HostName, vm: &TeamId, command: VmCommand) -> Result<Option<TransactionId>, CoreError> {
        let vm_id = vm.to_string();
        let request = match command {
            VmCommand::Start => RpcRequest::Start { vm_id },
            VmCommand::Stop => RpcRequest::Stop { vm_id },
            VmCommand::Shutdown => RpcRequest::Shutdown { vm_id },
            VmCommand::Sandbox => RpcRequest::Sandbox { vm_id },
            VmCommand::Unsandbox => RpcRequest::Unsandbox { vm_id },
            VmCommand::Abort => RpcRequest::Abort { vm_id },
            VmCommand::Execute => {
                return Err(CoreError::MalformedRequest(String::from("execute needs a command, use VmTracker::execute")))
            },
        };

        self.send(host, vm, command, request).await
    }

    pub async fn execute(&self, host: &HostName, vm: &TeamId, command: &str, input_run: Option<&RunId>) -> Result<Option<TransactionId>, CoreError> {
        let request = RpcRequest::Execute {
            vm_id: vm.to_string(),
            command: String::from(command),
            input_run: input_run.map(RunId::to_string),
        };
        self.send(host, vm, VmCommand::Execute, request).await
    }

    pub async fn abort(&self, host: &HostName, vm: &TeamId) -> Result<Option<TransactionId>, CoreError> {
        self.command(host, vm, VmCommand::Abort).await
    }

    /// Start the evaluator inside `vm` on the output of `input_run`
    pub async fn run_eval(
        &self,
        host: &HostName,
        vm: &TeamId,
        dataset: &DatasetId,
        run: &RunId,
        input_run: &str,
        command: &str,
    ) -> Result<Option<TransactionId>, CoreError> {
        let request = RpcRequest::RunEval {
            vm_id: vm.to_string(),
            dataset_id: dataset.to_string(),
            run_id: run.to_string(),
            input_run: String::from(input_run),
            command: String::from(command),
        };
        self.send(host, vm, VmCommand::Execute, request).await
    }

    async fn send(&self, host: &HostName, vm: &TeamId, command: VmCommand, request: RpcRequest) -> Result<Option<TransactionId>, CoreError> {
        let response = self.call(host, request).await?;

        match status::interpret(&response) {
            Ok(transaction) => {
                match command.transitional_state() {
                    Some(state) => {
                        self.set_state(host, vm, state, transaction.clone())?;
                    },
                    None => debug!("{} on {} accepted, state unchanged", command, vm),
                }
                Ok(transaction)
            },

            Err(e @ CoreError::Archived(_)) => {
                self.set_state(host, vm, VmState::Archived, None)?;
                Err(e)
            },

            Err(e) => Err(e),
        }
    }

    async fn call(&self, host: &HostName, request: RpcRequest) -> Result<RpcResponse, CoreError> {
        debug!("Calling {} on {}", request.method(), host);
        self.rpc.call(host, request).await.map_err(status::transport_failure)
    }

    fn set_state(&self, host: &HostName, vm: &TeamId, state: VmState, transaction: Option<TransactionId>) -> Result<VmRecord, CoreError> {
        let mut record = self.store
            .vm_record(vm)?
            .unwrap_or_else(|| VmRecord::new(vm.clone(), host.clone()));

        if record.state != state {
            info!("VM {}: {} -> {}", vm, record.state, state);
        }

        record.host = host.clone();
        record.state = state;
        if transaction.is_some() {
            record.transaction_id = transaction;
        }
        record.updated_at = Utc::now();

        self.store.upsert_vm_record(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_util::FakeVmRpc;
    use crate::vm::TransportError;

    fn setup() -> (VmTracker, Arc<FakeVmRpc>, HostName, TeamId) {
        let store = Arc::new(MemoryStore::new());
        let rpc = Arc::new(FakeVmRpc::new());
        let tracker = VmTracker::new(store, rpc.clone());
        (tracker, rpc, HostName::from("h1"), TeamId::from("vm1"))
    }

    #[tokio::test]
    async fn test_start_enters_powering_on() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::accepted("tx-1"));

        let tx = tracker.command(&host, &vm, VmCommand::Start).await.unwrap();
        assert_eq!(tx, Some(TransactionId::from("tx-1")));

        let record = tracker.state(&vm).unwrap().unwrap();
        assert_eq!(record.state, VmState::PoweringOn);
        assert_eq!(record.transaction_id, Some(TransactionId::from("tx-1")));
        assert_eq!(rpc.methods(), vec!["start"]);
    }

    #[tokio::test]
    async fn test_transitional_state_is_kept_until_info() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::accepted("tx-1"));
        tracker.command(&host, &vm, VmCommand::Stop).await.unwrap();
        assert_eq!(tracker.state(&vm).unwrap().unwrap().state, VmState::PoweringOff);

        let mut info = RpcResponse::accepted("tx-2");
        info.state = Some(VmState::PoweredOff);
        rpc.respond_with(info);
        let record = tracker.info(&host, &vm).await.unwrap();
        assert_eq!(record.state, VmState::PoweredOff);
    }

    #[tokio::test]
    async fn test_info_reports_gone_vm_as_archived() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::with_status(status::VM_NOT_FOUND));
        let record = tracker.info(&host, &vm).await.unwrap();
        assert_eq!(record.state, VmState::Archived);
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_state() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::with_status(status::WRONG_STATE));

        let err = tracker.command(&host, &vm, VmCommand::Sandbox).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(tracker.state(&vm).unwrap(), None);
    }

    #[tokio::test]
    async fn test_archived_answer_archives_vm() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::with_status(status::ARCHIVED));

        let err = tracker.command(&host, &vm, VmCommand::Start).await.unwrap_err();
        assert!(matches!(err, CoreError::Archived(_)));
        assert_eq!(tracker.state(&vm).unwrap().unwrap().state, VmState::Archived);
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let (tracker, rpc, host, vm) = setup();
        rpc.fail_with(TransportError::Unavailable(host.clone()));

        let err = tracker.command(&host, &vm, VmCommand::Start).await.unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_abort_leaves_state() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::accepted("tx-0"));
        tracker.run_eval(&host, &vm, &DatasetId::from("d1"), &RunId::from("r2"), "t1/r1", "eval.sh").await.unwrap();

        rpc.respond_with(RpcResponse::accepted("tx-1"));
        tracker.abort(&host, &vm).await.unwrap();

        let record = tracker.state(&vm).unwrap().unwrap();
        assert_eq!(record.state, VmState::Executing);
        assert_eq!(record.transaction_id, Some(TransactionId::from("tx-0")));
        assert_eq!(rpc.methods(), vec!["run_eval", "abort"]);
    }

    #[tokio::test]
    async fn test_execute() {
        let (tracker, rpc, host, vm) = setup();
        rpc.respond_with(RpcResponse::accepted("tx-1"));
        tracker.execute(&host, &vm, "./run.sh", Some(&RunId::from("r1"))).await.unwrap();
        assert_eq!(tracker.state(&vm).unwrap().unwrap().state, VmState::Executing);
    }
}
