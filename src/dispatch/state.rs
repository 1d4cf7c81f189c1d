//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use serde::Deserialize;
use serde::Serialize;
use thiserror::Error as ThisError;

/// Which kind of backend evaluates a run
#[derive(parse_display::Display, parse_display::FromStr, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    RemoteVm,
    GitCi,
}

/// Lifecycle of a single evaluation
///
/// ```text
/// Requested -> Dispatching -> RemoteVmEvaluating -> Completed
///                          \-> GitCiEvaluating    -/
///              (Dispatching and both evaluating states may go to Failed)
/// ```
#[derive(parse_display::Display, parse_display::FromStr, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvaluationState {
    Requested,
    Dispatching,
    RemoteVmEvaluating,
    GitCiEvaluating,
    Completed,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EvaluationEvent {
    Dispatch,
    Accepted(BackendKind),
    Finished,
    Failed,
}

#[derive(ThisError, Debug, Clone, Copy, Eq, PartialEq)]
#[error("Evaluation cannot go from {from} on {event:?}")]
pub struct TransitionError {
    pub from: EvaluationState,
    pub event: EvaluationEvent,
}

impl EvaluationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EvaluationState::Completed | EvaluationState::Failed)
    }

    pub fn is_evaluating(self) -> bool {
        matches!(self, EvaluationState::RemoteVmEvaluating | EvaluationState::GitCiEvaluating)
    }

    pub fn backend(self) -> Option<BackendKind> {
        match self {
            EvaluationState::RemoteVmEvaluating => Some(BackendKind::RemoteVm),
            EvaluationState::GitCiEvaluating => Some(BackendKind::GitCi),
            _ => None,
        }
    }

    pub fn advance(self, event: EvaluationEvent) -> Result<EvaluationState, TransitionError> {
        use EvaluationEvent as E;
        use EvaluationState as S;

        match (self, event) {
            (S::Requested, E::Dispatch) => Ok(S::Dispatching),
            (S::Dispatching, E::Accepted(BackendKind::RemoteVm)) => Ok(S::RemoteVmEvaluating),
            (S::Dispatching, E::Accepted(BackendKind::GitCi)) => Ok(S::GitCiEvaluating),
            (S::RemoteVmEvaluating, E::Finished) | (S::GitCiEvaluating, E::Finished) => Ok(S::Completed),
            (S::Dispatching, E::Failed) | (S::RemoteVmEvaluating, E::Failed) | (S::GitCiEvaluating, E::Failed) => {
                Ok(S::Failed)
            }
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}
