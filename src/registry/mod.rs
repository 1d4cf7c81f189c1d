//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Runs and their reviews

use std::path::PathBuf;
use std::sync::Arc;

use getset::Getters;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::CoreError;
use crate::model::Review;
use crate::model::ReviewPatch;
use crate::model::Run;
use crate::model::RunId;
use crate::store::Store;

mod artifacts;
pub use artifacts::*;

mod deletion;
pub use deletion::*;

pub mod export;

mod visibility;
pub use visibility::*;

#[derive(Getters)]
pub struct Registry {
    #[getset(get = "pub")]
    store: Arc<dyn Store>,

    #[getset(get = "pub")]
    runs_root: PathBuf,

    legacy_export: bool,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>, runs_root: PathBuf, legacy_export: bool) -> Self {
        Registry { store, runs_root, legacy_export }
    }

    /// Deleted runs are not found
    pub fn get_run(&self, id: &RunId) -> Result<Run, CoreError> {
        self.store
            .run(id)?
            .filter(|r| !r.deleted)
            .ok_or_else(|| CoreError::not_found("run", id))
    }

    pub fn run_exists(&self, id: &RunId) -> Result<bool, CoreError> {
        self.store.run_exists(id).map_err(CoreError::from)
    }

    /// Register a new run
    ///
    /// An evaluation must name its input run, and that input run must not be an evaluation itself.
    pub fn create_run(&self, run: Run) -> Result<Run, CoreError> {
        if !self.store.dataset_exists(&run.dataset_id)? {
            return Err(CoreError::not_found("dataset", &run.dataset_id))
        }

        if run.is_evaluation() {
            let input_id = run.input_run.as_ref().ok_or_else(|| {
                CoreError::MalformedRequest(format!("Evaluation {} has no input run", run.id))
            })?;

            let input = self.get_run(input_id)?;
            if input.is_evaluation() {
                return Err(CoreError::MalformedRequest(format!("{} is an evaluation and can not be evaluated", input.id)))
            }
        }

        if !self.store.insert_run(&run)? {
            return Err(CoreError::Conflict(format!("Run {} exists already", run.id)))
        }

        info!("Created run {} of {} on {}", run.id, run.team_id, run.dataset_id);
        Ok(run)
    }

    /// Where the artifacts of a run live: `<runs_root>/<dataset>/<team>/<run>`
    pub fn run_path(&self, run: &Run) -> PathBuf {
        self.runs_root
            .join(run.dataset_id.to_string())
            .join(run.team_id.to_string())
            .join(run.id.to_string())
    }

    /// The review of the run, created from the artifacts on first access
    pub fn get_review(&self, id: &RunId) -> Result<Review, CoreError> {
        let run = self.get_run(id)?;
        self.auto_review(&run)
    }

    /// Return the persisted review, or derive one from the artifacts and persist it
    ///
    /// Once persisted, a review is never derived again.
    pub fn auto_review(&self, run: &Run) -> Result<Review, CoreError> {
        if let Some(review) = self.store.review(&run.id)? {
            return Ok(review)
        }

        let derived = derive_review(run.id.clone(), &self.run_path(run));
        debug!("Derived review for {}: {:?}", run.id, derived);
        self.store.insert_review_if_absent(&derived).map_err(CoreError::from)
    }

    /// Merge `patch` into the review of the run
    pub fn update_review(&self, id: &RunId, patch: &ReviewPatch) -> Result<Review, CoreError> {
        let run = self.get_run(id)?;
        self.auto_review(&run)?;

        let review = self.store
            .update_review(id, patch)?
            .ok_or_else(|| CoreError::not_found("review", id))?;
        info!("Updated review of {}", id);

        if self.legacy_export {
            if let Err(e) = export::write(&self.run_path(&run), &review) {
                warn!("Legacy export of review {} failed: {:#}", id, e);
            }
        }

        Ok(review)
    }

    pub fn export_review(&self, id: &RunId) -> Result<PathBuf, CoreError> {
        let run = self.get_run(id)?;
        let review = self.auto_review(&run)?;
        export::write(&self.run_path(&run), &review).map_err(CoreError::from)
    }

    /// Soft delete, refused for published or valid runs and for runs other runs build on
    pub fn delete_run(&self, id: &RunId) -> Result<(), CoreError> {
        let verdict = self.store.soft_delete_run(id)?;
        debug!("Deleting {}: {:?}", id, verdict);
        verdict.into_result(id)?;
        info!("Deleted run {}", id);
        Ok(())
    }
}
