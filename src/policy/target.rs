//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use typed_builder::TypedBuilder;

use crate::model::Dataset;
use crate::model::DatasetId;
use crate::model::Review;
use crate::model::Run;
use crate::model::RunId;
use crate::model::Task;
use crate::model::TaskId;
use crate::model::TeamId;

/// The resources named by a request path
#[derive(Clone, Debug, Default, Eq, PartialEq, TypedBuilder)]
pub struct Target {
    #[builder(default, setter(strip_option, into))]
    pub task: Option<TaskId>,

    #[builder(default, setter(strip_option, into))]
    pub dataset: Option<DatasetId>,

    /// The team (virtual machine) the request acts for
    #[builder(default, setter(strip_option, into))]
    pub team: Option<TeamId>,

    /// More than one run when runs are compared
    #[builder(default)]
    pub runs: Vec<RunId>,
}

/// An id together with what was found for it
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lookup<I, T> {
    pub id: I,
    pub found: Option<T>,
}

impl<I, T> Lookup<I, T> {
    pub fn new(id: I, found: Option<T>) -> Self {
        Lookup { id, found }
    }

    pub fn is_missing(&self) -> bool {
        self.found.is_none()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunState {
    pub id: RunId,

    /// `None` if the run does not exist or was deleted
    pub run: Option<Run>,
    pub review: Option<Review>,
    pub dataset: Option<Dataset>,

    /// The dataset is configured as public
    pub listed_public: bool,
}

/// Everything the policy looks at, fetched before the policy runs
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceState {
    /// The requested task, or the task implied by the dataset or the runs
    pub task: Option<Lookup<TaskId, Task>>,
    pub dataset: Option<Lookup<DatasetId, Dataset>>,
    pub team: Option<Lookup<TeamId, ()>>,
    pub runs: Vec<RunState>,

    /// Teams the caller acts for: the requested team, or all of the caller's teams
    pub candidate_teams: Vec<TeamId>,

    /// Those candidate teams which are registered for the task
    pub registered_teams: Vec<TeamId>,
}

impl ResourceState {
    /// The task, if task, dataset and runs all point to it
    pub fn consistent_task(&self) -> Option<&Task> {
        let task = self.task.as_ref()?.found.as_ref()?;

        let dataset = match self.dataset.as_ref() {
            Some(lookup) => {
                let dataset = lookup.found.as_ref()?;
                if dataset.task_id != task.id {
                    return None
                }
                Some(dataset)
            }
            None => None,
        };

        for state in self.runs.iter() {
            let run = state.run.as_ref()?;
            let run_dataset = state.dataset.as_ref()?;

            if run.dataset_id != run_dataset.id || run_dataset.task_id != task.id {
                return None
            }

            if dataset.map(|d| d.id != run.dataset_id).unwrap_or(false) {
                return None
            }
        }

        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrganizerId;
    use crate::model::Producer;

    fn task(id: &str) -> Task {
        Task::builder().id(TaskId::from(id)).organizer_id(OrganizerId::from("o1")).build()
    }

    fn dataset(id: &str, task: &str) -> Dataset {
        Dataset::builder().id(DatasetId::from(id)).task_id(TaskId::from(task)).build()
    }

    fn run_state(id: &str, ds: Dataset) -> RunState {
        let run = Run::builder()
            .id(RunId::from(id))
            .team_id(TeamId::from("t1"))
            .producer(Producer::Upload(String::from("u1")))
            .dataset_id(ds.id.clone())
            .build();
        RunState {
            id: RunId::from(id),
            run: Some(run),
            review: None,
            dataset: Some(ds),
            listed_public: false,
        }
    }

    #[test]
    fn test_consistent_path() {
        let state = ResourceState {
            task: Some(Lookup::new(TaskId::from("task1"), Some(task("task1")))),
            dataset: Some(Lookup::new(DatasetId::from("d1"), Some(dataset("d1", "task1")))),
            runs: vec![run_state("r1", dataset("d1", "task1"))],
            ..Default::default()
        };
        assert_eq!(state.consistent_task().map(|t| &t.id), Some(&TaskId::from("task1")));
    }

    #[test]
    fn test_dataset_of_other_task() {
        let state = ResourceState {
            task: Some(Lookup::new(TaskId::from("task1"), Some(task("task1")))),
            dataset: Some(Lookup::new(DatasetId::from("d2"), Some(dataset("d2", "task2")))),
            ..Default::default()
        };
        assert!(state.consistent_task().is_none());
    }

    #[test]
    fn test_run_of_other_dataset() {
        let state = ResourceState {
            task: Some(Lookup::new(TaskId::from("task1"), Some(task("task1")))),
            dataset: Some(Lookup::new(DatasetId::from("d1"), Some(dataset("d1", "task1")))),
            runs: vec![run_state("r1", dataset("d3", "task1"))],
            ..Default::default()
        };
        assert!(state.consistent_task().is_none());
    }

    #[test]
    fn test_missing_task() {
        let state = ResourceState {
            task: Some(Lookup::new(TaskId::from("task1"), None)),
            ..Default::default()
        };
        assert!(state.consistent_task().is_none());
    }
}
