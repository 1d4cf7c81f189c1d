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

use crate::config::util::*;

/// Selects how callers are identified
///
/// The provider is chosen once, when the configuration is loaded.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "provider")]
pub enum AuthenticationConfig {
    /// Identity and groups are injected as request headers by the SSO proxy
    #[serde(rename = "sso-headers")]
    SsoHeaders {
        #[serde(default = "default_user_header")]
        user_header: String,

        #[serde(default = "default_groups_header")]
        groups_header: String,
    },

    /// Every request is made by the same, configured caller. Only useful for development.
    #[serde(rename = "static")]
    Static {
        user: Option<String>,

        #[serde(default)]
        groups: Vec<String>,
    },
}
