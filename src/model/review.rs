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

use crate::model::RunId;

/// The reviewer id used for reviews which were created automatically
pub const AUTO_REVIEWER: &str = "tira";

/// Quality and visibility verdict of a run
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub run_id: RunId,
    pub no_errors: bool,
    pub has_errors: bool,
    pub has_no_errors: bool,
    pub has_warnings: bool,
    pub missing_output: bool,
    pub invalid_output: bool,
    pub has_error_output: bool,
    pub other_errors: bool,
    pub comment: String,
    pub reviewer_id: String,
    pub review_date: Option<DateTime<Utc>>,
    pub published: bool,
    pub blinded: bool,
}

impl Review {
    /// A review nobody looked at yet: blinded, no verdict
    pub fn unreviewed(run_id: RunId) -> Review {
        Review {
            run_id,
            no_errors: false,
            has_errors: false,
            has_no_errors: false,
            has_warnings: false,
            missing_output: false,
            invalid_output: false,
            has_error_output: false,
            other_errors: false,
            comment: String::new(),
            reviewer_id: String::from(AUTO_REVIEWER),
            review_date: None,
            published: false,
            blinded: true,
        }
    }

    /// Merge a patch into this review, fields absent from the patch stay as they are
    pub fn apply(&mut self, patch: &ReviewPatch) {
        fn merge<T: Clone>(target: &mut T, new: &Option<T>) {
            if let Some(v) = new {
                *target = v.clone();
            }
        }

        merge(&mut self.no_errors, &patch.no_errors);
        merge(&mut self.has_errors, &patch.has_errors);
        merge(&mut self.has_no_errors, &patch.has_no_errors);
        merge(&mut self.has_warnings, &patch.has_warnings);
        merge(&mut self.missing_output, &patch.missing_output);
        merge(&mut self.invalid_output, &patch.invalid_output);
        merge(&mut self.has_error_output, &patch.has_error_output);
        merge(&mut self.other_errors, &patch.other_errors);
        merge(&mut self.comment, &patch.comment);
        merge(&mut self.reviewer_id, &patch.reviewer_id);
        if patch.review_date.is_some() {
            self.review_date = patch.review_date;
        }
        merge(&mut self.published, &patch.published);
        merge(&mut self.blinded, &patch.blinded);
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub no_errors: Option<bool>,
    pub has_errors: Option<bool>,
    pub has_no_errors: Option<bool>,
    pub has_warnings: Option<bool>,
    pub missing_output: Option<bool>,
    pub invalid_output: Option<bool>,
    pub has_error_output: Option<bool>,
    pub other_errors: Option<bool>,
    pub comment: Option<String>,
    pub reviewer_id: Option<String>,
    pub review_date: Option<DateTime<Utc>>,
    pub published: Option<bool>,
    pub blinded: Option<bool>,
}
