//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::trace;

use crate::config::VmRpcConfig;
use crate::model::HostName;
use crate::vm::VmState;

/// A call to the host of a virtual machine
#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RpcRequest {
    Info { vm_id: String },
    Start { vm_id: String },
    Stop { vm_id: String },
    Shutdown { vm_id: String },
    Sandbox { vm_id: String },
    Unsandbox { vm_id: String },
    Execute { vm_id: String, command: String, input_run: Option<String> },
    Abort { vm_id: String },
    RunEval {
        vm_id: String,
        dataset_id: String,
        run_id: String,
        input_run: String,
        command: String,
    },
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            RpcRequest::Info { .. } => "info",
            RpcRequest::Start { .. } => "start",
            RpcRequest::Stop { .. } => "stop",
            RpcRequest::Shutdown { .. } => "shutdown",
            RpcRequest::Sandbox { .. } => "sandbox",
            RpcRequest::Unsandbox { .. } => "unsandbox",
            RpcRequest::Execute { .. } => "execute",
            RpcRequest::Abort { .. } => "abort",
            RpcRequest::RunEval { .. } => "run_eval",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct RpcResponse {
    pub status: i32,

    #[serde(default)]
    pub transaction_id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// Only in answers to `info`
    #[serde(default)]
    pub state: Option<VmState>,
}

impl RpcResponse {
    pub fn accepted(transaction_id: &str) -> Self {
        RpcResponse {
            status: 0,
            transaction_id: Some(String::from(transaction_id)),
            ..Default::default()
        }
    }

    pub fn with_status(status: i32) -> Self {
        RpcResponse { status, ..Default::default() }
    }
}

/// The call did not produce a response
#[derive(ThisError, Debug, Clone, Eq, PartialEq)]
pub enum TransportError {
    #[error("host {0} unavailable")]
    Unavailable(HostName),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[async_trait]
pub trait VmRpc: Send + Sync {
    async fn call(&self, host: &HostName, request: RpcRequest) -> Result<RpcResponse, TransportError>;
}

/// JSON over HTTP, one endpoint per method: `http://<host>:<port>/<method>`
pub struct HttpVmRpc {
    client: reqwest::Client,
    port: u16,
}

impl HttpVmRpc {
    pub fn new(config: &VmRpcConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout() {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(HttpVmRpc {
            client: builder.build().context("Building RPC client")?,
            port: config.port(),
        })
    }
}

#[async_trait]
impl VmRpc for HttpVmRpc {
    async fn call(&self, host: &HostName, request: RpcRequest) -> Result<RpcResponse, TransportError> {
        let url = format!("http://{}:{}/{}", host, self.port, request.method());
        trace!("RPC {} -> {:?}", url, request);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    TransportError::InvalidArgument(e.to_string())
                } else {
                    TransportError::Unavailable(host.clone())
                }
            })?;

        if response.status().is_client_error() {
            return Err(TransportError::InvalidArgument(format!("{} answered {}", url, response.status())))
        }

        response
            .json::<RpcResponse>()
            .await
            .map_err(|_| TransportError::Unavailable(host.clone()))
    }
}
