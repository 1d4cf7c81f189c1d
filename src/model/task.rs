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
use typed_builder::TypedBuilder;

use crate::model::OrganizerId;
use crate::model::TaskId;
use crate::model::TeamId;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Task {
    pub id: TaskId,
    pub organizer_id: OrganizerId,

    /// Teams have to register before they may act on the task
    #[builder(default)]
    pub require_registration: bool,

    #[builder(default)]
    pub allowed_teams: Vec<TeamId>,

    /// Only teams from `allowed_teams` may act on the task
    #[builder(default)]
    pub restrict_to_allowed_teams: bool,
}

impl Task {
    pub fn admits_team(&self, team: &TeamId) -> bool {
        !self.restrict_to_allowed_teams || self.allowed_teams.contains(team)
    }
}
