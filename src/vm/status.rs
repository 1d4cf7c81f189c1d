//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Status codes of the VM host RPC service

use tracing::error;

use crate::error::CoreError;
use crate::model::TransactionId;
use crate::vm::RpcResponse;
use crate::vm::TransportError;

pub const ACCEPTED: i32 = 0;
pub const VM_NOT_FOUND: i32 = 2;
pub const WRONG_STATE: i32 = 3;
pub const ARCHIVED: i32 = 4;
pub const NOT_ACCESSIBLE: i32 = 5;
pub const INPUT_RUN_NOT_FOUND: i32 = 6;
pub const MALFORMED_OUTPUT: i32 = 7;
pub const MALFORMED_INPUT: i32 = 8;
pub const HOST_BUSY: i32 = 9;

/// Map a response to the accepted transaction or the matching error
pub fn interpret(response: &RpcResponse) -> Result<Option<TransactionId>, CoreError> {
    let err = match response.status {
        ACCEPTED => return Ok(response.transaction_id.as_deref().map(TransactionId::from)),
        VM_NOT_FOUND => CoreError::BackendUnavailable(String::from("VM not found on host")),
        WRONG_STATE => CoreError::Conflict(String::from("VM is in the wrong state for this operation")),
        ARCHIVED => CoreError::Archived(String::from("VM is archived")),
        NOT_ACCESSIBLE => CoreError::BackendUnavailable(String::from("VM is not accessible")),
        INPUT_RUN_NOT_FOUND => CoreError::MalformedRequest(String::from("input run not found")),
        MALFORMED_OUTPUT => CoreError::MalformedRequest(String::from("malformed run output, evaluation failed")),
        MALFORMED_INPUT => CoreError::MalformedRequest(String::from("malformed input")),
        HOST_BUSY => CoreError::BackendUnavailable(String::from("host busy, please retry later")),
        other => {
            let message = response.message.as_deref().unwrap_or("no message");
            CoreError::BackendUnavailable(format!("request rejected with status {}: {}", other, message))
        },
    };

    error!("RPC failed with status {}: {}", response.status, err);
    Err(err)
}

pub fn transport_failure(err: TransportError) -> CoreError {
    error!("RPC transport failure: {}", err);
    match err {
        TransportError::Unavailable(_) => CoreError::BackendUnavailable(String::from("host unavailable")),
        TransportError::InvalidArgument(_) => CoreError::Archived(String::from("VM archived or invalid")),
    }
}
