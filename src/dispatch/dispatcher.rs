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
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cache::memoize;
use crate::cache::Cache;
use crate::dispatch::BackendKind;
use crate::dispatch::BackendStatus;
use crate::dispatch::EvaluationBackend;
use crate::dispatch::EvaluationEvent;
use crate::dispatch::EvaluationJob;
use crate::dispatch::EvaluationState;
use crate::error::CoreError;
use crate::model::DatasetId;
use crate::model::EvaluationTicket;
use crate::model::Evaluator;
use crate::model::Producer;
use crate::model::Review;
use crate::model::Run;
use crate::model::RunId;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::model::TransactionId;
use crate::registry::Registry;
use crate::store::Store;

/// Starts evaluations and keeps at most one evaluation per run in flight
pub struct Dispatcher {
    registry: Arc<Registry>,
    cache: Arc<dyn Cache>,
    backends: Vec<Arc<dyn EvaluationBackend>>,
}

fn advance(ticket: &mut EvaluationTicket, event: EvaluationEvent) -> Result<(), CoreError> {
    let next = ticket.state.advance(event).map_err(anyhow::Error::from)?;
    info!("Evaluation of {}: {} -> {}", ticket.run_id, ticket.state, next);
    ticket.state = next;
    Ok(())
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, cache: Arc<dyn Cache>) -> Self {
        Dispatcher {
            registry,
            cache,
            backends: Vec::new(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn EvaluationBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    fn store(&self) -> &Arc<dyn Store> {
        self.registry.store()
    }

    fn backend(&self, kind: BackendKind) -> Result<&Arc<dyn EvaluationBackend>, CoreError> {
        self.backends
            .iter()
            .find(|b| b.kind() == kind)
            .ok_or_else(|| CoreError::BackendUnavailable(format!("no {} backend configured", kind)))
    }

    fn evaluator_of(&self, dataset: &DatasetId) -> Result<Evaluator, CoreError> {
        self.store()
            .evaluator_for_dataset(dataset)?
            .ok_or_else(|| CoreError::not_found("evaluator for dataset", dataset))
    }

    /// Start the evaluation of `run_id`
    ///
    /// Fails with a conflict while another evaluation of the run is in flight.
    pub async fn trigger_evaluation(&self, run_id: &RunId, dataset_id: &DatasetId, team_id: &TeamId) -> Result<TransactionId, CoreError> {
        let run = self.registry.get_run(run_id)?;
        if &run.dataset_id != dataset_id || &run.team_id != team_id {
            return Err(CoreError::MalformedRequest(format!("Run {} is no run of {} on {}", run_id, team_id, dataset_id)))
        }
        if run.is_evaluation() {
            return Err(CoreError::MalformedRequest(format!("{} is an evaluation and can not be evaluated", run_id)))
        }

        let dataset = self.store()
            .dataset(dataset_id)?
            .ok_or_else(|| CoreError::not_found("dataset", dataset_id))?;

        self.sweep(run_id)?;

        let mut ticket = EvaluationTicket::requested(run_id.clone(), Utc::now());
        if !self.store().insert_ticket(&ticket)? {
            debug!("Evaluation of {} is in flight already", run_id);
            return Err(CoreError::Conflict(String::from("evaluation already in progress")))
        }
        info!("Evaluation of {} requested", run_id);

        match self.dispatch(&mut ticket, &run, dataset.task_id).await {
            Ok(transaction) => Ok(transaction),
            Err(e) => {
                error!("Dispatching evaluation of {} failed: {}", run_id, e);
                self.release(&mut ticket);
                Err(e)
            },
        }
    }

    async fn dispatch(&self, ticket: &mut EvaluationTicket, run: &Run, task_id: TaskId) -> Result<TransactionId, CoreError> {
        advance(ticket, EvaluationEvent::Dispatch)?;
        self.store().update_ticket(ticket)?;

        let evaluator = self.evaluator_of(&run.dataset_id)?;
        let kind = if evaluator.is_git_runner() { BackendKind::GitCi } else { BackendKind::RemoteVm };
        let backend = self.backend(kind)?;

        let job = EvaluationJob {
            task_id,
            dataset_id: run.dataset_id.clone(),
            team_id: run.team_id.clone(),
            input_run: run.id.clone(),
            evaluation_run: RunId::from_timestamp(Utc::now()),
            evaluator,
        };

        let transaction = backend.dispatch(&job).await?;

        advance(ticket, EvaluationEvent::Accepted(kind))?;
        ticket.backend = Some(kind);
        ticket.transaction_id = Some(transaction.clone());
        self.store().update_ticket(ticket)?;

        Ok(transaction)
    }

    /// Mark the ticket as failed and drop it, so the evaluation can be requested again
    fn release(&self, ticket: &mut EvaluationTicket) {
        if advance(ticket, EvaluationEvent::Failed).is_ok() {
            if let Err(e) = self.store().update_ticket(ticket) {
                warn!("Could not mark evaluation of {} as failed: {:#}", ticket.run_id, e);
            }
        }

        if let Err(e) = self.store().remove_ticket(ticket) {
            warn!("Could not release evaluation ticket of {}: {:#}", ticket.run_id, e);
        }
    }

    /// An evaluation is over once its run and the review of that run exist
    pub fn is_closed(&self, ticket: &EvaluationTicket) -> Result<bool, CoreError> {
        if ticket.state.is_terminal() {
            return Ok(true)
        }

        for evaluation in self.store().runs_with_input(&ticket.run_id)? {
            if evaluation.is_evaluation()
                && evaluation.created_at >= ticket.created_at
                && self.store().review(&evaluation.id)?.is_some()
            {
                return Ok(true)
            }
        }

        Ok(false)
    }

    /// Drop the ticket of `run_id` if its evaluation is over
    ///
    /// Only the ticket judged closed is removed. If another caller replaced it meanwhile, the
    /// new ticket stays and the sweep reports `false`.
    fn sweep(&self, run_id: &RunId) -> Result<bool, CoreError> {
        match self.store().ticket(run_id)? {
            Some(ticket) if self.is_closed(&ticket)? => self.drop_closed(&ticket),
            _ => Ok(false),
        }
    }

    fn drop_closed(&self, ticket: &EvaluationTicket) -> Result<bool, CoreError> {
        let removed = self.store().remove_ticket(ticket)?;
        if removed {
            debug!("Evaluation of {} finished, dropped its ticket", ticket.run_id);
        } else {
            debug!("Ticket of {} was replaced meanwhile, keeping it", ticket.run_id);
        }
        Ok(removed)
    }

    /// Whether an evaluation of `run_id` is still running
    pub async fn poll(&self, run_id: &RunId, force_refresh: bool) -> Result<BackendStatus, CoreError> {
        if self.sweep(run_id)? {
            return Ok(BackendStatus::Idle)
        }

        let ticket = match self.store().ticket(run_id)? {
            Some(ticket) => ticket,
            None => return Ok(BackendStatus::Idle),
        };

        let kind = match ticket.backend {
            Some(kind) => kind,
            None => return Ok(BackendStatus::Running),
        };

        let run = self.registry.get_run(run_id)?;
        let evaluator = self.evaluator_of(&run.dataset_id)?;
        self.backend(kind)?.poll(&evaluator, &run, force_refresh).await
    }

    /// Record the evaluation `evaluation_run` of `run_id`, which closes the evaluation
    pub fn complete_evaluation(&self, run_id: &RunId, evaluation_run: RunId) -> Result<(Run, Review), CoreError> {
        let run = self.registry.get_run(run_id)?;
        let evaluator = self.evaluator_of(&run.dataset_id)?;

        let evaluation = Run::builder()
            .id(evaluation_run)
            .team_id(run.team_id.clone())
            .producer(Producer::Evaluation(evaluator.id))
            .dataset_id(run.dataset_id.clone())
            .input_run(Some(run.id.clone()))
            .build();

        let evaluation = self.registry.create_run(evaluation)?;
        let review = self.registry.auto_review(&evaluation)?;

        if let Some(mut ticket) = self.store().ticket(run_id)? {
            if ticket.state.is_evaluating() {
                advance(&mut ticket, EvaluationEvent::Finished)?;
                self.store().update_ticket(&ticket)?;
            }
            self.drop_closed(&ticket)?;
        }

        info!("Evaluation {} of {} completed", evaluation.id, run_id);
        Ok((evaluation, review))
    }

    /// Cancel the evaluation of `run_id` and release its ticket
    pub async fn stop(&self, run_id: &RunId) -> Result<(), CoreError> {
        let mut ticket = self.store()
            .ticket(run_id)?
            .ok_or_else(|| CoreError::not_found("evaluation", run_id))?;

        let kind = ticket.backend.ok_or_else(|| {
            CoreError::Conflict(format!("Evaluation of {} is being dispatched", run_id))
        })?;

        let run = self.registry.get_run(run_id)?;
        let evaluator = self.evaluator_of(&run.dataset_id)?;
        self.backend(kind)?.stop(&evaluator, &run).await?;

        info!("Evaluation of {} stopped", run_id);
        self.release(&mut ticket);
        Ok(())
    }

    /// All evaluators of the datasets of `task`
    pub async fn evaluators_for_task(&self, task: &TaskId, force_refresh: bool) -> Result<Vec<Evaluator>, CoreError> {
        let key = format!("evaluators-{}", task);
        let store = self.store().clone();
        let task = task.clone();
        memoize(self.cache.as_ref(), &key, force_refresh, async move { store.evaluators_for_task(&task) })
            .await
            .map_err(CoreError::from)
    }

    pub fn ticket(&self, run_id: &RunId) -> Result<Option<EvaluationTicket>, CoreError> {
        self.store().ticket(run_id).map_err(CoreError::from)
    }

    pub fn state(&self, run_id: &RunId) -> Result<Option<EvaluationState>, CoreError> {
        Ok(self.ticket(run_id)?.map(|t| t.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::MemoryCache;
    use crate::model::Dataset;
    use crate::model::EvaluatorBackend;
    use crate::model::EvaluatorId;
    use crate::model::HostName;
    use crate::model::OrganizerId;
    use crate::model::Task;
    use crate::store::MemoryStore;
    use crate::test_util::FakeGitCi;
    use crate::test_util::FakeVmRpc;
    use crate::vm::RpcResponse;
    use crate::vm::VmState;
    use crate::vm::VmTracker;

    struct Fixture {
        _root: tempfile::TempDir,
        store: Arc<MemoryStore>,
        rpc: Arc<FakeVmRpc>,
        dispatcher: Arc<Dispatcher>,
    }

    fn vm_evaluator() -> Evaluator {
        Evaluator {
            id: EvaluatorId::from("e1"),
            backend: EvaluatorBackend::RemoteVm {
                host: HostName::from("h1"),
                vm_id: TeamId::from("master-vm"),
                command: String::from("eval.sh"),
            },
        }
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.add_task(Task::builder().id(TaskId::from("task1")).organizer_id(OrganizerId::from("webis")).build());
        store.add_dataset(Dataset::builder().id(DatasetId::from("d1")).task_id(TaskId::from("task1")).build());
        store.add_dataset(Dataset::builder().id(DatasetId::from("d2")).task_id(TaskId::from("task1")).build());
        store.add_evaluator(DatasetId::from("d1"), vm_evaluator());

        let registry = Arc::new(Registry::new(store.clone(), root.path().to_path_buf(), false));
        registry.create_run(run("r7", "d1")).unwrap();
        registry.create_run(run("r8", "d2")).unwrap();

        let rpc = Arc::new(FakeVmRpc::new());
        rpc.respond_with(RpcResponse::accepted("tx-1"));

        let cache = Arc::new(MemoryCache::new(Duration::from_secs(300)));
        let tracker = Arc::new(VmTracker::new(store.clone(), rpc.clone()));
        let dispatcher = Dispatcher::new(registry, cache.clone())
            .with_backend(Arc::new(crate::dispatch::RemoteVmBackend::new(tracker)))
            .with_backend(Arc::new(crate::dispatch::GitCiBackend::new(Arc::new(FakeGitCi::new()), cache)));

        Fixture {
            _root: root,
            store,
            rpc,
            dispatcher: Arc::new(dispatcher),
        }
    }

    fn run(id: &str, dataset: &str) -> Run {
        Run::builder()
            .id(RunId::from(id))
            .team_id(TeamId::from("t1"))
            .producer(Producer::Software(String::from("s1")))
            .dataset_id(DatasetId::from(dataset))
            .build()
    }

    async fn trigger(f: &Fixture, run: &str) -> Result<TransactionId, CoreError> {
        f.dispatcher.trigger_evaluation(&RunId::from(run), &DatasetId::from("d1"), &TeamId::from("t1")).await
    }

    #[tokio::test]
    async fn test_open_ticket_conflicts_until_closed() {
        let f = fixture();

        assert_eq!(trigger(&f, "r7").await.unwrap(), TransactionId::from("tx-1"));
        assert_eq!(f.dispatcher.state(&RunId::from("r7")).unwrap(), Some(EvaluationState::RemoteVmEvaluating));

        let err = trigger(&f, "r7").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(err.to_string().contains("evaluation already in progress"));

        let (evaluation, _review) = f.dispatcher.complete_evaluation(&RunId::from("r7"), RunId::from("eval-1")).unwrap();
        assert_eq!(evaluation.input_run, Some(RunId::from("r7")));
        assert!(evaluation.is_evaluation());
        assert_eq!(f.dispatcher.ticket(&RunId::from("r7")).unwrap(), None);

        assert!(trigger(&f, "r7").await.is_ok());
    }

    #[tokio::test]
    async fn test_finished_evaluation_closes_ticket_implicitly() {
        let f = fixture();
        trigger(&f, "r7").await.unwrap();

        let evaluation = Run::builder()
            .id(RunId::from("eval-1"))
            .team_id(TeamId::from("t1"))
            .producer(Producer::Evaluation(EvaluatorId::from("e1")))
            .dataset_id(DatasetId::from("d1"))
            .input_run(Some(RunId::from("r7")))
            .build();
        let registry = &f.dispatcher.registry;
        let evaluation = registry.create_run(evaluation).unwrap();

        // the run alone does not close the evaluation, its review does
        assert!(matches!(trigger(&f, "r7").await, Err(CoreError::Conflict(_))));

        registry.auto_review(&evaluation).unwrap();
        assert!(trigger(&f, "r7").await.is_ok());
    }

    #[tokio::test]
    async fn test_late_sweep_keeps_the_new_ticket() {
        let f = fixture();
        let r7 = RunId::from("r7");
        trigger(&f, "r7").await.unwrap();

        let evaluation = Run::builder()
            .id(RunId::from("eval-1"))
            .team_id(TeamId::from("t1"))
            .producer(Producer::Evaluation(EvaluatorId::from("e1")))
            .dataset_id(DatasetId::from("d1"))
            .input_run(Some(r7.clone()))
            .build();
        let registry = &f.dispatcher.registry;
        let evaluation = registry.create_run(evaluation).unwrap();
        registry.auto_review(&evaluation).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // one caller judges the old ticket closed, then another one replaces it
        let stale = f.dispatcher.ticket(&r7).unwrap().unwrap();
        assert!(f.dispatcher.is_closed(&stale).unwrap());
        assert!(trigger(&f, "r7").await.is_ok());
        let fresh = f.dispatcher.ticket(&r7).unwrap().unwrap();
        assert!(!fresh.is_same(&stale));

        // the first caller resumes with its stale view
        assert!(!f.dispatcher.drop_closed(&stale).unwrap());
        assert_eq!(f.dispatcher.ticket(&r7).unwrap(), Some(fresh));
        assert!(matches!(trigger(&f, "r7").await, Err(CoreError::Conflict(_))));
        assert_eq!(f.rpc.methods(), vec!["run_eval", "run_eval"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_triggers() {
        let f = fixture();
        f.rpc.delay(Duration::from_millis(50));

        let handles = (0..2)
            .map(|_| {
                let dispatcher = f.dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.trigger_evaluation(&RunId::from("r7"), &DatasetId::from("d1"), &TeamId::from("t1")).await
                })
            })
            .collect::<Vec<_>>();

        let mut accepted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(CoreError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!((accepted, conflicts), (1, 1));
        assert_eq!(f.rpc.methods(), vec!["run_eval"]);
    }

    #[tokio::test]
    async fn test_failed_dispatch_releases_ticket() {
        let f = fixture();
        f.rpc.respond_with(RpcResponse::with_status(9));

        let err = trigger(&f, "r7").await.unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
        assert!(err.to_string().contains("busy"));
        assert_eq!(f.dispatcher.ticket(&RunId::from("r7")).unwrap(), None);

        f.rpc.respond_with(RpcResponse::accepted("tx-2"));
        assert_eq!(trigger(&f, "r7").await.unwrap(), TransactionId::from("tx-2"));
    }

    #[tokio::test]
    async fn test_archived_evaluator_vm() {
        let f = fixture();
        f.rpc.respond_with(RpcResponse::with_status(4));

        let err = trigger(&f, "r7").await.unwrap_err();
        assert_eq!(err.status(), crate::error::OutwardStatus::ClientError);
        assert!(err.to_string().to_lowercase().contains("archived"));
        assert_eq!(f.store.vm_record(&TeamId::from("master-vm")).unwrap().unwrap().state, VmState::Archived);
    }

    #[tokio::test]
    async fn test_dataset_without_evaluator() {
        let f = fixture();
        let err = f.dispatcher
            .trigger_evaluation(&RunId::from("r8"), &DatasetId::from("d2"), &TeamId::from("t1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(f.dispatcher.ticket(&RunId::from("r8")).unwrap(), None);
        assert!(f.rpc.methods().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_path() {
        let f = fixture();
        let err = f.dispatcher
            .trigger_evaluation(&RunId::from("r7"), &DatasetId::from("d1"), &TeamId::from("t2"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::MalformedRequest(_)));

        let err = trigger(&f, "r404").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_poll_and_stop() {
        let f = fixture();
        assert_eq!(f.dispatcher.poll(&RunId::from("r7"), false).await.unwrap(), BackendStatus::Idle);

        trigger(&f, "r7").await.unwrap();
        let mut info = RpcResponse::accepted("tx-1");
        info.state = Some(VmState::Executing);
        f.rpc.respond_with(info);
        assert_eq!(f.dispatcher.poll(&RunId::from("r7"), false).await.unwrap(), BackendStatus::Running);

        f.dispatcher.stop(&RunId::from("r7")).await.unwrap();
        assert_eq!(f.dispatcher.ticket(&RunId::from("r7")).unwrap(), None);
        assert_eq!(f.rpc.methods(), vec!["run_eval", "info", "abort"]);

        assert!(matches!(f.dispatcher.stop(&RunId::from("r7")).await, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_evaluators_for_task_are_cached() {
        let f = fixture();
        let task = TaskId::from("task1");
        assert_eq!(f.dispatcher.evaluators_for_task(&task, false).await.unwrap(), vec![vm_evaluator()]);

        let mut second = vm_evaluator();
        second.id = EvaluatorId::from("e2");
        f.store.add_evaluator(DatasetId::from("d2"), second);

        assert_eq!(f.dispatcher.evaluators_for_task(&task, false).await.unwrap().len(), 1);
        assert_eq!(f.dispatcher.evaluators_for_task(&task, true).await.unwrap().len(), 2);
    }
}
