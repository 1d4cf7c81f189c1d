//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::cache::memoize;
use crate::cache::Cache;
use crate::config::GitCiConfig;
use crate::dispatch::BackendKind;
use crate::dispatch::BackendStatus;
use crate::dispatch::EvaluationBackend;
use crate::dispatch::EvaluationJob;
use crate::error::CoreError;
use crate::model::DatasetId;
use crate::model::Evaluator;
use crate::model::EvaluatorBackend;
use crate::model::EvaluatorId;
use crate::model::Run;
use crate::model::RunId;
use crate::model::TaskId;
use crate::model::TeamId;
use crate::model::TransactionId;

const VAR_TASK: &str = "TIRA_TASK_ID";
const VAR_DATASET: &str = "TIRA_DATASET_ID";
const VAR_TEAM: &str = "TIRA_VM_ID";
const VAR_RUN: &str = "TIRA_RUN_ID";
const VAR_INPUT_RUN: &str = "TIRA_INPUT_RUN_ID";
const VAR_IMAGE: &str = "TIRA_IMAGE_TO_EXECUTE";
const VAR_COMMAND: &str = "TIRA_COMMAND_TO_EXECUTE";
const VAR_EVALUATOR: &str = "TIRA_EVALUATOR_ID";

/// Parameters of an evaluation pipeline
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PipelineTrigger {
    pub task_id: TaskId,
    pub dataset_id: DatasetId,
    pub team_id: TeamId,
    pub run_id: RunId,
    pub input_run: RunId,
    pub image: String,
    pub command: String,
    pub repository_id: i64,
    pub evaluator_id: EvaluatorId,
}

impl PipelineTrigger {
    fn variables(&self) -> Vec<(&'static str, String)> {
        vec![
            (VAR_TASK, self.task_id.to_string()),
            (VAR_DATASET, self.dataset_id.to_string()),
            (VAR_TEAM, self.team_id.to_string()),
            (VAR_RUN, self.run_id.to_string()),
            (VAR_INPUT_RUN, self.input_run.to_string()),
            (VAR_IMAGE, self.image.clone()),
            (VAR_COMMAND, self.command.clone()),
            (VAR_EVALUATOR, self.evaluator_id.to_string()),
        ]
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct RunningPipeline {
    pub pipeline_id: i64,
    pub team_id: Option<TeamId>,
    pub run_id: Option<RunId>,
    pub input_run: Option<RunId>,
}

impl RunningPipeline {
    fn evaluates(&self, team: &TeamId, run: &RunId) -> bool {
        self.team_id.as_ref() == Some(team)
            && (self.input_run.as_ref() == Some(run) || self.run_id.as_ref() == Some(run))
    }
}

/// The git hosting service running evaluation pipelines
#[async_trait]
pub trait GitCi: Send + Sync {
    /// Start a pipeline, returns the pipeline id
    async fn trigger(&self, trigger: &PipelineTrigger) -> Result<TransactionId>;

    async fn list_running(&self, repository_id: i64) -> Result<Vec<RunningPipeline>>;

    /// Cancel the pipelines evaluating `run` of `team`, returns whether there was any
    async fn stop(&self, repository_id: i64, team: &TeamId, run: &RunId) -> Result<bool>;
}

/// Client for the GitLab pipeline API
pub struct HttpGitCi {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    git_ref: String,
}

#[derive(Deserialize)]
struct PipelineDto {
    id: i64,
}

#[derive(Serialize, Deserialize)]
struct VariableDto {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct CreatePipelineDto<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    variables: Vec<VariableDto>,
}

impl HttpGitCi {
    pub fn new(config: &GitCiConfig) -> Result<Self> {
        Ok(HttpGitCi {
            client: reqwest::Client::builder().build().context("Building git CI client")?,
            base_url: config.base_url().clone(),
            token: config.token().clone(),
            git_ref: config.git_ref().clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| anyhow!("Building git CI URL for {}", path))
    }

    async fn variables(&self, repository_id: i64, pipeline_id: i64) -> Result<HashMap<String, String>> {
        let url = self.url(&format!("api/v4/projects/{}/pipelines/{}/variables", repository_id, pipeline_id))?;
        let vars = self.client
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<VariableDto>>()
            .await?;

        Ok(vars.into_iter().map(|v| (v.key, v.value)).collect())
    }
}

#[async_trait]
impl GitCi for HttpGitCi {
    async fn trigger(&self, trigger: &PipelineTrigger) -> Result<TransactionId> {
        let url = self.url(&format!("api/v4/projects/{}/pipeline", trigger.repository_id))?;
        let body = CreatePipelineDto {
            git_ref: &self.git_ref,
            variables: trigger.variables()
                .into_iter()
                .map(|(key, value)| VariableDto { key: String::from(key), value })
                .collect(),
        };

        let pipeline = self.client
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&body)
            .send()
            .await
            .context("Triggering pipeline")?
            .error_for_status()
            .context("Triggering pipeline")?
            .json::<PipelineDto>()
            .await
            .context("Reading triggered pipeline")?;

        Ok(TransactionId::from(pipeline.id.to_string()))
    }

    async fn list_running(&self, repository_id: i64) -> Result<Vec<RunningPipeline>> {
        let mut running = Vec::new();

        for scope in ["pending", "running"] {
            let url = self.url(&format!("api/v4/projects/{}/pipelines?scope={}", repository_id, scope))?;
            let pipelines = self.client
                .get(url)
                .header("PRIVATE-TOKEN", &self.token)
                .send()
                .await
                .with_context(|| anyhow!("Listing {} pipelines of {}", scope, repository_id))?
                .error_for_status()?
                .json::<Vec<PipelineDto>>()
                .await?;

            for pipeline in pipelines {
                let vars = self.variables(repository_id, pipeline.id).await?;
                running.push(RunningPipeline {
                    pipeline_id: pipeline.id,
                    team_id: vars.get(VAR_TEAM).map(|s| TeamId::from(s.as_str())),
                    run_id: vars.get(VAR_RUN).map(|s| RunId::from(s.as_str())),
                    input_run: vars.get(VAR_INPUT_RUN).map(|s| RunId::from(s.as_str())),
                });
            }
        }

        Ok(running)
    }

    async fn stop(&self, repository_id: i64, team: &TeamId, run: &RunId) -> Result<bool> {
        let mut stopped = false;
        for pipeline in self.list_running(repository_id).await? {
            if !pipeline.evaluates(team, run) {
                continue
            }

            let url = self.url(&format!("api/v4/projects/{}/pipelines/{}/cancel", repository_id, pipeline.pipeline_id))?;
            self.client
                .post(url)
                .header("PRIVATE-TOKEN", &self.token)
                .send()
                .await?
                .error_for_status()
                .with_context(|| anyhow!("Cancelling pipeline {}", pipeline.pipeline_id))?;
            stopped = true;
        }
        Ok(stopped)
    }
}

/// Evaluates in a pipeline of the evaluator's repository
pub struct GitCiBackend {
    client: Arc<dyn GitCi>,
    cache: Arc<dyn Cache>,
}

fn repository_of(evaluator: &Evaluator) -> Result<(&str, &str, i64), CoreError> {
    match &evaluator.backend {
        EvaluatorBackend::GitCi { image, command, repository_id } => Ok((image.as_str(), command.as_str(), *repository_id)),
        EvaluatorBackend::RemoteVm { .. } => {
            Err(CoreError::MalformedRequest(format!("Evaluator {} is not a git runner", evaluator.id)))
        },
    }
}

impl GitCiBackend {
    pub fn new(client: Arc<dyn GitCi>, cache: Arc<dyn Cache>) -> Self {
        GitCiBackend { client, cache }
    }

    pub async fn running_pipelines(&self, repository_id: i64, force_refresh: bool) -> Result<Vec<RunningPipeline>> {
        let key = format!("running-pipelines-{}", repository_id);
        memoize(self.cache.as_ref(), &key, force_refresh, self.client.list_running(repository_id)).await
    }
}

#[async_trait]
impl EvaluationBackend for GitCiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GitCi
    }

    async fn dispatch(&self, job: &EvaluationJob) -> Result<TransactionId, CoreError> {
        let (image, command, repository_id) = repository_of(&job.evaluator)?;
        let trigger = PipelineTrigger {
            task_id: job.task_id.clone(),
            dataset_id: job.dataset_id.clone(),
            team_id: job.team_id.clone(),
            run_id: job.evaluation_run.clone(),
            input_run: job.input_run.clone(),
            image: String::from(image),
            command: String::from(command),
            repository_id,
            evaluator_id: job.evaluator.id.clone(),
        };

        let transaction = self.client.trigger(&trigger).await.map_err(|e| {
            error!("Triggering evaluation of {} failed: {:#}", job.input_run, e);
            CoreError::BackendUnavailable(format!("could not start the evaluation pipeline ({})", e))
        })?;
        info!("Evaluation of {} runs as pipeline {}", job.input_run, transaction);

        if let Err(e) = self.running_pipelines(repository_id, true).await {
            warn!("Refreshing running pipelines of {} failed: {:#}", repository_id, e);
        }

        Ok(transaction)
    }

    async fn poll(&self, evaluator: &Evaluator, run: &Run, force_refresh: bool) -> Result<BackendStatus, CoreError> {
        let (_, _, repository_id) = repository_of(evaluator)?;
        let running = self.running_pipelines(repository_id, force_refresh)
            .await
            .map_err(|e| CoreError::BackendUnavailable(format!("could not list pipelines ({})", e)))?;

        let busy = running.iter().any(|p| p.evaluates(&run.team_id, &run.id));
        debug!("Evaluation of {} running: {}", run.id, busy);
        Ok(if busy { BackendStatus::Running } else { BackendStatus::Idle })
    }

    async fn stop(&self, evaluator: &Evaluator, run: &Run) -> Result<(), CoreError> {
        let (_, _, repository_id) = repository_of(evaluator)?;
        let stopped = self.client
            .stop(repository_id, &run.team_id, &run.id)
            .await
            .map_err(|e| CoreError::BackendUnavailable(format!("could not stop the pipeline ({})", e)))?;

        if !stopped {
            debug!("No pipeline evaluating {} to stop", run.id);
        }

        if let Err(e) = self.running_pipelines(repository_id, true).await {
            warn!("Refreshing running pipelines of {} failed: {:#}", repository_id, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::MemoryCache;
    use crate::model::Producer;
    use crate::test_util::FakeGitCi;

    fn evaluator() -> Evaluator {
        Evaluator {
            id: EvaluatorId::from("e1"),
            backend: EvaluatorBackend::GitCi {
                image: String::from("registry.example/eval:1"),
                command: String::from("/eval.sh"),
                repository_id: 42,
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

    fn run() -> Run {
        Run::builder()
            .id(RunId::from("r7"))
            .team_id(TeamId::from("t1"))
            .producer(Producer::DockerSoftware(String::from("ds1")))
            .dataset_id(DatasetId::from("d1"))
            .build()
    }

    fn backend(ci: Arc<FakeGitCi>) -> GitCiBackend {
        GitCiBackend::new(ci, Arc::new(MemoryCache::new(Duration::from_secs(300))))
    }

    #[tokio::test]
    async fn test_dispatch_triggers_pipeline() {
        let ci = Arc::new(FakeGitCi::new());
        let backend = backend(ci.clone());

        let tx = backend.dispatch(&job()).await.unwrap();
        assert_eq!(tx, TransactionId::from("1"));

        let triggers = ci.triggers();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].repository_id, 42);
        assert_eq!(triggers[0].input_run, RunId::from("r7"));
        assert_eq!(triggers[0].image, "registry.example/eval:1");
        assert_eq!(triggers[0].evaluator_id, EvaluatorId::from("e1"));

        assert_eq!(backend.poll(&evaluator(), &run(), false).await.unwrap(), BackendStatus::Running);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_dispatch() {
        let ci = Arc::new(FakeGitCi::new());
        ci.fail_listing(true);

        let tx = backend(ci).dispatch(&job()).await;
        assert!(tx.is_ok());
    }

    #[tokio::test]
    async fn test_failed_trigger() {
        let ci = Arc::new(FakeGitCi::new());
        ci.fail_trigger(true);

        let err = backend(ci).dispatch(&job()).await.unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_poll_uses_cache() {
        let ci = Arc::new(FakeGitCi::new());
        let backend = backend(ci.clone());

        assert_eq!(backend.poll(&evaluator(), &run(), false).await.unwrap(), BackendStatus::Idle);

        // triggered behind the back of the cache
        ci.trigger(&PipelineTrigger {
            task_id: TaskId::from("task1"),
            dataset_id: DatasetId::from("d1"),
            team_id: TeamId::from("t1"),
            run_id: RunId::from("e-new"),
            input_run: RunId::from("r7"),
            image: String::new(),
            command: String::new(),
            repository_id: 42,
            evaluator_id: EvaluatorId::from("e1"),
        }).await.unwrap();

        assert_eq!(backend.poll(&evaluator(), &run(), false).await.unwrap(), BackendStatus::Idle);
        assert_eq!(backend.poll(&evaluator(), &run(), true).await.unwrap(), BackendStatus::Running);
    }

    #[tokio::test]
    async fn test_stop() {
        let ci = Arc::new(FakeGitCi::new());
        let backend = backend(ci.clone());
        backend.dispatch(&job()).await.unwrap();

        backend.stop(&evaluator(), &run()).await.unwrap();
        assert_eq!(backend.poll(&evaluator(), &run(), false).await.unwrap(), BackendStatus::Idle);
    }

    #[test]
    fn test_pipeline_matching() {
        let p = RunningPipeline {
            pipeline_id: 1,
            team_id: Some(TeamId::from("t1")),
            run_id: Some(RunId::from("e1")),
            input_run: Some(RunId::from("r7")),
        };
        assert!(p.evaluates(&TeamId::from("t1"), &RunId::from("r7")));
        assert!(!p.evaluates(&TeamId::from("t2"), &RunId::from("r7")));
        assert!(!p.evaluates(&TeamId::from("t1"), &RunId::from("r8")));
    }
}
