//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::config::GroupsConfig;
use crate::model::OrganizerId;
use crate::model::TeamId;
use crate::model::UserId;

lazy_static! {
    static ref VALID_ID: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// What a caller's groups say about them
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Membership {
    pub is_admin: bool,
    pub teams: Vec<TeamId>,
    pub organizer_ids: Vec<OrganizerId>,
}

/// Interprets group names according to the configured markers
#[derive(Clone, Debug)]
pub struct GroupDirectory {
    config: GroupsConfig,
}

impl GroupDirectory {
    pub fn new(config: GroupsConfig) -> Self {
        GroupDirectory { config }
    }

    pub fn is_superuser(&self, user: &UserId) -> bool {
        self.config.superusers().iter().any(|s| s == user.as_ref())
    }

    pub fn membership(&self, groups: &[String]) -> Membership {
        let is_admin = groups
            .iter()
            .any(|g| self.config.admin_markers().contains(g));

        let teams = self.ids_with_prefix(groups, self.config.team_prefix())
            .map(TeamId::from)
            .collect();

        let organizer_ids = self.ids_with_prefix(groups, self.config.organizer_prefix())
            .map(OrganizerId::from)
            .collect();

        Membership { is_admin, teams, organizer_ids }
    }

    fn ids_with_prefix<'a>(&self, groups: &'a [String], prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        groups.iter()
            .filter_map(move |g| g.strip_prefix(prefix))
            .filter(|id| {
                let valid = VALID_ID.is_match(id);
                if !valid {
                    trace!("Ignoring malformed group id: {:?}", id);
                }
                valid
            })
            .unique()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(gs: &[&str]) -> Vec<String> {
        gs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_membership_from_groups() {
        let dir = GroupDirectory::new(GroupsConfig::default());
        let m = dir.membership(&groups(&["tira_vm_t1", "tira_vm_t2", "tira_org_webis", "trust_level_1"]));

        assert!(!m.is_admin);
        assert_eq!(m.teams, vec![TeamId::from("t1"), TeamId::from("t2")]);
        assert_eq!(m.organizer_ids, vec![OrganizerId::from("webis")]);
    }

    #[test]
    fn test_admin_markers() {
        let dir = GroupDirectory::new(GroupsConfig::default());
        assert!(dir.membership(&groups(&["tira_reviewer"])).is_admin);
        assert!(dir.membership(&groups(&["admins"])).is_admin);
        assert!(!dir.membership(&groups(&["admin"])).is_admin);
    }

    #[test]
    fn test_malformed_and_duplicate_ids_are_dropped() {
        let dir = GroupDirectory::new(GroupsConfig::default());
        let m = dir.membership(&groups(&["tira_vm_", "tira_vm_a b", "tira_vm_t1", "tira_vm_t1"]));
        assert_eq!(m.teams, vec![TeamId::from("t1")]);
    }

    #[test]
    fn test_superusers() {
        let dir = GroupDirectory::new(GroupsConfig::with_superusers(vec![String::from("root")]));
        assert!(dir.is_superuser(&UserId::from("root")));
        assert!(!dir.is_superuser(&UserId::from("alice")));
    }
}
