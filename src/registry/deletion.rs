//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use serde::Serialize;

use crate::error::CoreError;
use crate::model::Review;
use crate::model::Run;
use crate::model::RunId;

/// Outcome of a deletion request
#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum DeleteVerdict {
    Deleted,
    NotFound,
    Published,
    ReviewedValid,
    InUse { dependents: Vec<RunId> },
}

impl DeleteVerdict {
    /// Decide whether `run` may be deleted
    ///
    /// `dependents` are the runs that use `run` as their input run.
    pub fn judge(run: Option<&Run>, review: Option<&Review>, dependents: &[Run]) -> DeleteVerdict {
        match run {
            None => return DeleteVerdict::NotFound,
            Some(r) if r.deleted => return DeleteVerdict::NotFound,
            Some(_) => {},
        }

        if let Some(review) = review {
            if review.published {
                return DeleteVerdict::Published
            }
            if review.no_errors {
                return DeleteVerdict::ReviewedValid
            }
        }

        let dependents = dependents.iter()
            .filter(|r| !r.deleted)
            .map(|r| r.id.clone())
            .collect::<Vec<_>>();

        if dependents.is_empty() {
            DeleteVerdict::Deleted
        } else {
            DeleteVerdict::InUse { dependents }
        }
    }

    pub fn into_result(self, run: &RunId) -> Result<(), CoreError> {
        match self {
            DeleteVerdict::Deleted => Ok(()),
            DeleteVerdict::NotFound => Err(CoreError::not_found("run", run)),
            DeleteVerdict::Published => {
                Err(CoreError::Conflict(format!("Run {} is published and can not be deleted", run)))
            },
            DeleteVerdict::ReviewedValid => {
                Err(CoreError::Conflict(format!("Run {} was reviewed as valid and can not be deleted", run)))
            },
            DeleteVerdict::InUse { dependents } => {
                let dependents = dependents.iter().map(RunId::to_string).collect::<Vec<_>>().join(", ");
                Err(CoreError::Conflict(format!("Run {} is the input of {} and can not be deleted", run, dependents)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DatasetId;
    use crate::model::EvaluatorId;
    use crate::model::Producer;
    use crate::model::TeamId;

    fn run(id: &str) -> Run {
        Run::builder()
            .id(RunId::from(id))
            .team_id(TeamId::from("t1"))
            .producer(Producer::Upload(String::from("u1")))
            .dataset_id(DatasetId::from("d1"))
            .build()
    }

    fn evaluation_of(id: &str, input: &str) -> Run {
        let mut r = run(id);
        r.producer = Producer::Evaluation(EvaluatorId::from("e1"));
        r.input_run = Some(RunId::from(input));
        r
    }

    #[test]
    fn test_unreviewed_run_may_be_deleted() {
        let r = run("r1");
        let review = Review::unreviewed(r.id.clone());
        assert_eq!(DeleteVerdict::judge(Some(&r), Some(&review), &[]), DeleteVerdict::Deleted);
        assert_eq!(DeleteVerdict::judge(Some(&r), None, &[]), DeleteVerdict::Deleted);
    }

    #[test]
    fn test_published_run_is_kept() {
        let r = run("r1");
        let mut review = Review::unreviewed(r.id.clone());
        review.published = true;
        let verdict = DeleteVerdict::judge(Some(&r), Some(&review), &[]);
        assert_eq!(verdict, DeleteVerdict::Published);
        assert!(matches!(verdict.into_result(&r.id), Err(CoreError::Conflict(_))));
    }

    #[test]
    fn test_valid_run_is_kept() {
        let r = run("r1");
        let mut review = Review::unreviewed(r.id.clone());
        review.no_errors = true;
        assert_eq!(DeleteVerdict::judge(Some(&r), Some(&review), &[]), DeleteVerdict::ReviewedValid);
    }

    #[test]
    fn test_input_run_is_kept() {
        let r = run("r1");
        let eval = evaluation_of("r2", "r1");
        assert_eq!(
            DeleteVerdict::judge(Some(&r), None, &[eval.clone()]),
            DeleteVerdict::InUse { dependents: vec![RunId::from("r2")] }
        );

        let mut deleted = eval;
        deleted.deleted = true;
        assert_eq!(DeleteVerdict::judge(Some(&r), None, &[deleted]), DeleteVerdict::Deleted);
    }

    #[test]
    fn test_deleted_run_is_not_found() {
        let mut r = run("r1");
        r.deleted = true;
        assert_eq!(DeleteVerdict::judge(Some(&r), None, &[]), DeleteVerdict::NotFound);
        assert_eq!(DeleteVerdict::judge(None, None, &[]), DeleteVerdict::NotFound);
    }
}
