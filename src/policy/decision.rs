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
use crate::error::OutwardStatus;

#[derive(parse_display::Display, Serialize, Clone, Copy, Debug, Eq, PartialEq)]
#[display(style = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DenialKind {
    NotFound,
    Restricted,
    MustRegister,
    Forbidden,
}

/// Outcome of an access check
#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum Decision {
    Permit,
    Deny { kind: DenialKind, reason: String },
    RedirectToLogin,
}

impl Decision {
    pub fn deny<R: Into<String>>(kind: DenialKind, reason: R) -> Self {
        Decision::Deny { kind, reason: reason.into() }
    }

    pub fn is_permit(&self) -> bool {
        matches!(self, Decision::Permit)
    }

    pub fn status(&self) -> OutwardStatus {
        match self {
            Decision::Permit => OutwardStatus::Success,
            Decision::Deny { .. } => OutwardStatus::ClientError,
            Decision::RedirectToLogin => OutwardStatus::Redirect,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Decision::Permit => "ok",
            Decision::Deny { reason, .. } => reason,
            Decision::RedirectToLogin => "Please log in to access this resource",
        }
    }

    /// Turn anything but `Permit` into the matching error
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Permit => Ok(()),
            Decision::RedirectToLogin => Err(CoreError::RedirectRequired),
            Decision::Deny { kind: DenialKind::NotFound, reason } => Err(CoreError::NotFound { kind: "resource", id: reason }),
            Decision::Deny { reason, .. } => Err(CoreError::Forbidden(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result() {
        assert!(Decision::Permit.into_result().is_ok());
        assert!(matches!(Decision::RedirectToLogin.into_result(), Err(CoreError::RedirectRequired)));
        assert!(matches!(
            Decision::deny(DenialKind::MustRegister, "register first").into_result(),
            Err(CoreError::Forbidden(m)) if m == "register first"
        ));
    }

    #[test]
    fn test_status_and_message() {
        let d = Decision::deny(DenialKind::Forbidden, "not yours");
        assert_eq!(d.status(), OutwardStatus::ClientError);
        assert_eq!(d.message(), "not yours");
        assert_eq!(Decision::RedirectToLogin.status(), OutwardStatus::Redirect);
    }
}
