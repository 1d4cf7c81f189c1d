//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


mod ids;
pub use ids::*;

mod task;
pub use task::*;

mod dataset;
pub use dataset::*;

mod evaluator;
pub use evaluator::*;

mod run;
pub use run::*;

mod review;
pub use review::*;

mod ticket;
pub use ticket::*;
