//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use crate::model::Dataset;
use crate::model::Review;
use crate::policy::AccessOptions;

/// Published (or publicly listed) runs are visible, unless their dataset is deprecated
pub fn is_publicly_visible(review: Option<&Review>, dataset: &Dataset, listed_public: bool) -> bool {
    let published = review.map(|r| r.published).unwrap_or(false);
    (published || listed_public) && !dataset.is_deprecated
}

/// Whether a run's details may be shown on the endpoint described by `options`
///
/// A run without review counts as blinded and unpublished.
pub fn is_run_visible(
    review: Option<&Review>,
    dataset: &Dataset,
    listed_public: bool,
    options: &AccessOptions,
) -> bool {
    let blinded = review.map(|r| r.blinded).unwrap_or(true);

    !blinded
        || is_publicly_visible(review, dataset, listed_public)
        || (options.public_data_ok && !dataset.is_confidential)
        || options.private_run_ok
}
