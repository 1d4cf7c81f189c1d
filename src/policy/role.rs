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

use crate::model::OrganizerId;
use crate::model::TeamId;
use crate::model::UserId;

#[derive(parse_display::Display, parse_display::FromStr, Serialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tira,
    Admin,
    Participant,
    User,
    Forbidden,
    Guest,
}

impl Role {
    /// Position in `tira ⊇ admin ⊇ participant ⊇ user ⊇ guest`, `forbidden` is not part of the chain
    fn rank(self) -> Option<u8> {
        match self {
            Role::Tira => Some(4),
            Role::Admin => Some(3),
            Role::Participant => Some(2),
            Role::User => Some(1),
            Role::Guest => Some(0),
            Role::Forbidden => None,
        }
    }

    /// Whether this role may do everything `other` may do
    pub fn includes(self, other: Role) -> bool {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a >= b,
            _ => false,
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Tira | Role::Admin)
    }
}

/// Everything known about a caller that matters for the role
#[derive(Clone, Debug)]
pub struct RoleFacts<'a> {
    pub identity: Option<&'a UserId>,
    pub is_superuser: bool,
    pub is_admin: bool,
    pub teams: &'a [TeamId],
    pub organizer_ids: &'a [OrganizerId],
}

/// Compute the role of a caller for a resource
///
/// `resource_team` is the team the resource belongs to, `task_organizer` the organizer of the task
/// implied by the resource path.
pub fn resolve_role(facts: &RoleFacts<'_>, resource_team: Option<&TeamId>, task_organizer: Option<&OrganizerId>) -> Role {
    if facts.identity.is_none() {
        return Role::Guest
    }

    if facts.is_superuser {
        return Role::Tira
    }

    let organizes_task = task_organizer
        .map(|org| facts.organizer_ids.contains(org))
        .unwrap_or(false);

    if facts.is_admin || organizes_task {
        return Role::Admin
    }

    match resource_team {
        Some(team) if facts.teams.contains(team) => Role::Participant,
        Some(_) => Role::Forbidden,
        None => Role::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(identity: Option<&'a UserId>, teams: &'a [TeamId], orgs: &'a [OrganizerId]) -> RoleFacts<'a> {
        RoleFacts {
            identity,
            is_superuser: false,
            is_admin: false,
            teams,
            organizer_ids: orgs,
        }
    }

    #[test]
    fn test_anonymous_is_always_guest() {
        let teams = [TeamId::from("t1")];
        let orgs = [OrganizerId::from("o1")];
        let mut f = facts(None, &teams, &orgs);
        f.is_admin = true;
        f.is_superuser = true;

        for team in [None, Some(TeamId::from("t1")), Some(TeamId::from("t2"))] {
            assert_eq!(resolve_role(&f, team.as_ref(), Some(&OrganizerId::from("o1"))), Role::Guest);
        }
    }

    #[test]
    fn test_admin_marker() {
        let user = UserId::from("alice");
        let mut f = facts(Some(&user), &[], &[]);
        f.is_admin = true;
        assert_eq!(resolve_role(&f, Some(&TeamId::from("t1")), None), Role::Admin);
    }

    #[test]
    fn test_superuser_is_tira() {
        let user = UserId::from("root");
        let mut f = facts(Some(&user), &[], &[]);
        f.is_superuser = true;
        assert_eq!(resolve_role(&f, None, None), Role::Tira);
    }

    #[test]
    fn test_organizer_of_the_task_is_admin() {
        let user = UserId::from("alice");
        let orgs = [OrganizerId::from("webis")];
        let f = facts(Some(&user), &[], &orgs);

        assert_eq!(resolve_role(&f, Some(&TeamId::from("t1")), Some(&OrganizerId::from("webis"))), Role::Admin);
        assert_eq!(resolve_role(&f, Some(&TeamId::from("t1")), Some(&OrganizerId::from("other"))), Role::Forbidden);
    }

    #[test]
    fn test_team_membership() {
        let user = UserId::from("alice");
        let teams = [TeamId::from("t1")];
        let f = facts(Some(&user), &teams, &[]);

        assert_eq!(resolve_role(&f, Some(&TeamId::from("t1")), None), Role::Participant);
        assert_eq!(resolve_role(&f, Some(&TeamId::from("t2")), None), Role::Forbidden);
        assert_eq!(resolve_role(&f, None, None), Role::User);
    }

    #[test]
    fn test_role_chain() {
        assert!(Role::Tira.includes(Role::Admin));
        assert!(Role::Admin.includes(Role::Participant));
        assert!(Role::Participant.includes(Role::User));
        assert!(Role::User.includes(Role::Guest));
        assert!(!Role::Guest.includes(Role::User));
        assert!(!Role::Forbidden.includes(Role::Guest));
        assert!(!Role::Admin.includes(Role::Forbidden));
    }

    #[test]
    fn test_role_literals() {
        assert_eq!(Role::Participant.to_string(), "participant");
        assert_eq!("forbidden".parse::<Role>().unwrap(), Role::Forbidden);
        assert!("Admin".parse::<Role>().is_err());
    }
}
