//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::model::HostName;
use crate::model::TeamId;
use crate::model::TransactionId;

#[derive(parse_display::Display, parse_display::FromStr, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Undefined,
    Running,
    PoweredOff,
    Archived,

    PoweringOn,
    PoweringOff,
    Sandboxing,
    Unsandboxing,
    Executing,
}

impl VmState {
    /// Waiting for the host to finish a lifecycle call
    pub fn is_transitional(self) -> bool {
        matches!(self,
            VmState::PoweringOn
            | VmState::PoweringOff
            | VmState::Sandboxing
            | VmState::Unsandboxing
            | VmState::Executing)
    }
}

/// Lifecycle calls a VM host understands
#[derive(parse_display::Display, parse_display::FromStr, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VmCommand {
    Start,
    Stop,
    Shutdown,
    Sandbox,
    Unsandbox,
    Execute,
    Abort,
}

impl VmCommand {
    /// The state a VM is in while the host processes the command
    ///
    /// `Abort` cancels whatever is running and leaves the state to the next `info`.
    pub fn transitional_state(self) -> Option<VmState> {
        match self {
            VmCommand::Start => Some(VmState::PoweringOn),
            VmCommand::Stop | VmCommand::Shutdown => Some(VmState::PoweringOff),
            VmCommand::Sandbox => Some(VmState::Sandboxing),
            VmCommand::Unsandbox => Some(VmState::Unsandboxing),
            VmCommand::Execute => Some(VmState::Executing),
            VmCommand::Abort => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub vm_id: TeamId,
    pub host: HostName,
    pub state: VmState,

    /// Transaction of the last accepted call
    pub transaction_id: Option<TransactionId>,
    pub updated_at: DateTime<Utc>,
}

impl VmRecord {
    pub fn new(vm_id: TeamId, host: HostName) -> Self {
        VmRecord {
            vm_id,
            host,
            state: VmState::Undefined,
            transaction_id: None,
            updated_at: Utc::now(),
        }
    }
}
