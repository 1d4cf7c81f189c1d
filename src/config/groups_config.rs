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
use getset::Getters;
use serde::Deserialize;

use crate::config::util::*;

/// How memberships are encoded in the group names delivered by the SSO provider
#[derive(Clone, Debug, Getters, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupsConfig {
    /// Membership in any of these groups grants the admin role
    #[serde(default = "default_admin_markers")]
    #[getset(get = "pub")]
    admin_markers: Vec<String>,

    /// `<team_prefix><team>` grants membership in a team
    #[serde(default = "default_team_prefix")]
    #[getset(get = "pub")]
    team_prefix: String,

    /// `<organizer_prefix><organizer>` makes the caller part of an organizer
    #[serde(default = "default_organizer_prefix")]
    #[getset(get = "pub")]
    organizer_prefix: String,

    /// Identities with unrestricted access
    #[serde(default)]
    #[getset(get = "pub")]
    superusers: Vec<String>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        GroupsConfig {
            admin_markers: default_admin_markers(),
            team_prefix: default_team_prefix(),
            organizer_prefix: default_organizer_prefix(),
            superusers: Vec::new(),
        }
    }
}

impl GroupsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.admin_markers.is_empty() {
            return Err(anyhow!("No admin markers configured"))
        }

        if self.team_prefix.is_empty() || self.organizer_prefix.is_empty() {
            return Err(anyhow!("Group prefixes must not be empty"))
        }

        if self.team_prefix == self.organizer_prefix {
            return Err(anyhow!("Team prefix and organizer prefix must differ: {}", self.team_prefix))
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn with_superusers(superusers: Vec<String>) -> Self {
        GroupsConfig { superusers, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GroupsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_equal_prefixes_are_rejected() {
        let s = r#"
            team_prefix = "tira_"
            organizer_prefix = "tira_"
        "#;
        let c: GroupsConfig = toml::from_str(s).unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<GroupsConfig>("admin = true").is_err());
    }
}
