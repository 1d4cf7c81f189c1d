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
use thiserror::Error as ThisError;

/// How a result is presented to whoever asked for it
#[derive(parse_display::Display, Serialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[display(style = "kebab-case")]
pub enum OutwardStatus {
    Success,
    Redirect,
    ClientError,
    InfraError,
}

/// Every failure a caller of the core can observe
#[derive(ThisError, Debug)]
pub enum CoreError {
    #[error("{kind} '{id}' does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Please log in to access this resource")]
    RedirectRequired,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend unavailable: {0}. Please contact the organizers of the task")]
    BackendUnavailable(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Archived: {0}")]
    Archived(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn not_found<I: ToString>(kind: &'static str, id: I) -> Self {
        CoreError::NotFound { kind, id: id.to_string() }
    }

    pub fn status(&self) -> OutwardStatus {
        match self {
            CoreError::RedirectRequired => OutwardStatus::Redirect,
            CoreError::NotFound { .. }
            | CoreError::Forbidden(_)
            | CoreError::Conflict(_)
            | CoreError::MalformedRequest(_)
            | CoreError::Archived(_) => OutwardStatus::ClientError,
            CoreError::BackendUnavailable(_) | CoreError::Internal(_) => OutwardStatus::InfraError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(CoreError::not_found("run", "r1").status(), OutwardStatus::ClientError);
        assert_eq!(CoreError::RedirectRequired.status(), OutwardStatus::Redirect);
        assert_eq!(CoreError::BackendUnavailable(String::from("x")).status(), OutwardStatus::InfraError);
        assert_eq!(CoreError::Archived(String::from("x")).status(), OutwardStatus::ClientError);
    }

    #[test]
    fn test_not_found_message() {
        let e = CoreError::not_found("dataset", "d1");
        assert_eq!(e.to_string(), "dataset 'd1' does not exist");
    }

    #[test]
    fn test_outward_status_display() {
        assert_eq!(OutwardStatus::InfraError.to_string(), "infra-error");
    }
}
