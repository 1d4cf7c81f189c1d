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

use crate::model::EvaluatorId;
use crate::model::HostName;
use crate::model::TeamId;

/// How a dataset's runs are scored
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Evaluator {
    pub id: EvaluatorId,
    pub backend: EvaluatorBackend,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum EvaluatorBackend {
    /// The evaluator runs inside a virtual machine, driven over RPC
    RemoteVm {
        host: HostName,
        vm_id: TeamId,
        command: String,
    },

    /// The evaluator runs as a pipeline in a git repository
    GitCi {
        image: String,
        command: String,
        repository_id: i64,
    },
}

impl Evaluator {
    pub fn is_git_runner(&self) -> bool {
        matches!(self.backend, EvaluatorBackend::GitCi { .. })
    }
}
