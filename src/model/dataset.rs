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

use crate::model::DatasetId;
use crate::model::TaskId;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Dataset {
    pub id: DatasetId,
    pub task_id: TaskId,

    #[builder(default)]
    pub is_confidential: bool,

    #[builder(default)]
    pub is_deprecated: bool,
}
