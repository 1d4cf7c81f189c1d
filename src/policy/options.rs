//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use typed_builder::TypedBuilder;

#[derive(parse_display::Display, parse_display::FromStr, Clone, Copy, Debug, Eq, PartialEq)]
#[display(style = "lowercase")]
pub enum Intent {
    View,
    Mutate,
}

/// Exceptions an endpoint grants on top of the plain role checks
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, TypedBuilder)]
pub struct AccessOptions {
    /// Only admins, no exceptions
    #[builder(default)]
    pub restricted: bool,

    /// Participants may act on their runs of non-confidential datasets even if unreviewed
    #[builder(default)]
    pub public_data_ok: bool,

    /// Owners may look at their own blinded runs
    #[builder(default)]
    pub private_run_ok: bool,

    /// Skip the registration requirement of the task
    #[builder(default)]
    pub not_registered_ok: bool,
}

impl AccessOptions {
    pub fn admin_only() -> Self {
        AccessOptions::builder().restricted(true).build()
    }

    /// Looking at a run: owners see their own runs, blinded or not
    pub fn view_run() -> Self {
        AccessOptions::builder().private_run_ok(true).build()
    }

    /// Triggering the evaluation of a run
    pub fn evaluate_run() -> Self {
        AccessOptions::builder().public_data_ok(true).build()
    }

    /// Looking at a task page, which is also how teams register
    pub fn view_task() -> Self {
        AccessOptions::builder().not_registered_ok(true).build()
    }

    /// Organizer pages of a task
    pub fn manage_task() -> Self {
        AccessOptions::builder().restricted(true).build()
    }
}
