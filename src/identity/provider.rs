//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;
use tracing::warn;

use crate::config::AuthenticationConfig;
use crate::config::GroupsConfig;
use crate::identity::GroupDirectory;
use crate::identity::Request;
use crate::model::OrganizerId;
use crate::model::TeamId;
use crate::model::UserId;
use crate::policy::Role;
use crate::policy::RoleFacts;
use crate::store::Store;

/// Answers "who is calling, and what may they do" for a request
pub trait AuthenticationProvider: Send + Sync {
    fn get_identity(&self, request: &Request) -> Option<UserId>;

    /// Teams the caller belongs to, creating the placeholder team if there is none
    fn get_teams(&self, request: &Request) -> Vec<TeamId>;

    fn get_organizer_ids(&self, request: &Request) -> Vec<OrganizerId>;

    fn get_role(&self, request: &Request, resource_team: Option<&TeamId>, task_organizer: Option<&OrganizerId>) -> Role;
}

/// Where the raw identity and group names of a caller come from
pub trait CallerSource: Send + Sync {
    fn user(&self, request: &Request) -> Option<String>;
    fn groups(&self, request: &Request) -> Vec<String>;
}

/// Identity and groups are set as headers by the SSO proxy in front of us
#[derive(Debug)]
pub struct SsoHeaders {
    user_header: String,
    groups_header: String,
}

impl CallerSource for SsoHeaders {
    fn user(&self, request: &Request) -> Option<String> {
        request.header(&self.user_header)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
    }

    fn groups(&self, request: &Request) -> Vec<String> {
        request.header(&self.groups_header)
            .map(|gs| {
                gs.split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Every request is made by the same caller
#[derive(Debug)]
pub struct StaticCaller {
    user: Option<String>,
    groups: Vec<String>,
}

impl CallerSource for StaticCaller {
    fn user(&self, _: &Request) -> Option<String> {
        self.user.clone()
    }

    fn groups(&self, _: &Request) -> Vec<String> {
        self.groups.clone()
    }
}

pub struct Authentication<S: CallerSource> {
    source: S,
    directory: GroupDirectory,
    store: Arc<dyn Store>,
}

impl<S: CallerSource> Authentication<S> {
    pub fn new(source: S, directory: GroupDirectory, store: Arc<dyn Store>) -> Self {
        Authentication { source, directory, store }
    }
}

impl<S: CallerSource> AuthenticationProvider for Authentication<S> {
    fn get_identity(&self, request: &Request) -> Option<UserId> {
        self.source.user(request).map(UserId::from)
    }

    fn get_teams(&self, request: &Request) -> Vec<TeamId> {
        let user = match self.get_identity(request) {
            Some(user) => user,
            None => return Vec::new(),
        };

        let from_groups = self.directory.membership(&self.source.groups(request)).teams;
        let owned = self.store.teams_of(&user).unwrap_or_else(|e| {
            warn!("Could not load teams of {}: {:#}", user, e);
            Vec::new()
        });

        let teams = from_groups.into_iter().chain(owned).unique().collect::<Vec<_>>();
        if !teams.is_empty() {
            return teams
        }

        let placeholder = TeamId::default_for(&user);
        debug!("{} owns no team, using placeholder {}", user, placeholder);
        if let Err(e) = self.store.upsert_team(&placeholder, &user) {
            warn!("Could not create placeholder team {}: {:#}", placeholder, e);
        }
        vec![placeholder]
    }

    fn get_organizer_ids(&self, request: &Request) -> Vec<OrganizerId> {
        if self.get_identity(request).is_none() {
            return Vec::new()
        }
        self.directory.membership(&self.source.groups(request)).organizer_ids
    }

    fn get_role(&self, request: &Request, resource_team: Option<&TeamId>, task_organizer: Option<&OrganizerId>) -> Role {
        let identity = self.get_identity(request);
        let membership = self.directory.membership(&self.source.groups(request));
        let teams = if identity.is_some() { self.get_teams(request) } else { Vec::new() };

        let facts = RoleFacts {
            identity: identity.as_ref(),
            is_superuser: identity.as_ref().map(|u| self.directory.is_superuser(u)).unwrap_or(false),
            is_admin: membership.is_admin,
            teams: &teams,
            organizer_ids: &membership.organizer_ids,
        };

        crate::policy::resolve_role(&facts, resource_team, task_organizer)
    }
}

/// Pick the provider named in the configuration
pub fn provider_from_config(
    config: &AuthenticationConfig,
    groups: &GroupsConfig,
    store: Arc<dyn Store>,
) -> Arc<dyn AuthenticationProvider> {
    let directory = GroupDirectory::new(groups.clone());
    match config {
        AuthenticationConfig::SsoHeaders { user_header, groups_header } => {
            let source = SsoHeaders {
                user_header: user_header.clone(),
                groups_header: groups_header.clone(),
            };
            Arc::new(Authentication::new(source, directory, store))
        }

        AuthenticationConfig::Static { user, groups } => {
            let source = StaticCaller {
                user: user.clone(),
                groups: groups.clone(),
            };
            Arc::new(Authentication::new(source, directory, store))
        }
    }
}
