//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


pub fn default_cache_ttl() -> String {
    String::from("5min")
}

pub fn default_admin_markers() -> Vec<String> {
    vec![String::from("admins"), String::from("tira_reviewer")]
}

pub fn default_team_prefix() -> String {
    String::from("tira_vm_")
}

pub fn default_organizer_prefix() -> String {
    String::from("tira_org_")
}

pub fn default_user_header() -> String {
    String::from("X-Disraptor-User")
}

pub fn default_groups_header() -> String {
    String::from("X-Disraptor-Groups")
}

pub fn default_git_ref() -> String {
    String::from("main")
}
