//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Evaluation of runs on one of the evaluation backends

mod state;
pub use state::*;

mod backend;
pub use backend::*;

mod remote_vm;
pub use remote_vm::*;

mod git_ci;
pub use git_ci::*;

mod dispatcher;
pub use dispatcher::*;
