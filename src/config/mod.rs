//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


mod not_validated;
pub use not_validated::*;

mod configuration;
pub use configuration::*;

mod authentication_config;
pub use authentication_config::*;

mod groups_config;
pub use groups_config::*;

mod backend_config;
pub use backend_config::*;

mod util;
