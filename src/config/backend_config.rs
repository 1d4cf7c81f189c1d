//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use anyhow::anyhow;
use anyhow::Result;
use getset::CopyGetters;
use getset::Getters;
use serde::Deserialize;
use url::Url;

use crate::config::util::*;

/// How the hosts running virtual machines are reached
#[derive(Clone, Debug, Getters, CopyGetters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmRpcConfig {
    /// Port the RPC service listens on, on every host
    #[getset(get_copy = "pub")]
    port: u16,

    /// Timeout in seconds for a single RPC call
    #[getset(get_copy = "pub")]
    timeout: Option<u64>,
}

impl VmRpcConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("Port 0 is not a valid RPC port"))
        }
        Ok(())
    }
}

/// The git hosting instance running evaluation pipelines
#[derive(Clone, Getters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitCiConfig {
    #[getset(get = "pub")]
    base_url: Url,

    /// Token allowed to trigger and cancel pipelines
    #[getset(get = "pub")]
    token: String,

    /// The git ref pipelines are started on
    #[serde(default = "default_git_ref")]
    #[getset(get = "pub")]
    git_ref: String,
}

impl std::fmt::Debug for GitCiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "GitCiConfig({}, ref: {}, token: TOKEN)", self.base_url, self.git_ref)
    }
}

impl GitCiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.cannot_be_a_base() {
            return Err(anyhow!("Not a base URL: {}", self.base_url))
        }
        if self.token.is_empty() {
            return Err(anyhow!("Empty git CI token"))
        }
        Ok(())
    }
}
