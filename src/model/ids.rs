//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            parse_display::Display,
            Serialize,
            Deserialize,
            Clone,
            Debug,
            Hash,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
        )]
        #[serde(transparent)]
        #[display("{0}")]
        pub struct $name(String);

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(String::from(s))
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_ref()
            }
        }
    };
}

string_id!(
    /// An authenticated user, as delivered by the SSO provider
    UserId
);

string_id!(
    /// A team, which is also the id of the virtual machine the team owns
    TeamId
);

string_id!(
    /// An organizer (a group of people running one or more tasks)
    OrganizerId
);

string_id!(TaskId);
string_id!(DatasetId);
string_id!(EvaluatorId);
string_id!(RunId);

string_id!(
    /// Identifier handed out by a backend when it accepted a job
    TransactionId
);

string_id!(
    /// Host name of a machine running virtual machines
    HostName
);

impl RunId {
    /// Runs are named after the moment they were created
    pub fn from_timestamp(moment: DateTime<Utc>) -> RunId {
        RunId(moment.format("%Y-%m-%d-%H-%M-%S").to_string())
    }
}

impl TeamId {
    /// The placeholder team every identity gets if it owns none
    pub fn default_for(user: &UserId) -> TeamId {
        TeamId(format!("{}-default", user))
    }
}
