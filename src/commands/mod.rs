//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


mod authorize;
pub use authorize::authorize;

mod db;
pub use db::db;

mod evaluate;
pub use evaluate::evaluate;
pub use evaluate::evaluation;

mod review;
pub use review::review;

mod run;
pub use run::run;

mod services;
pub use services::Services;

mod vm;
pub use vm::vm;

mod util;
