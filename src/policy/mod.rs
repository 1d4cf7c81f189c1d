//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Who may see or change what

mod role;
pub use role::*;

mod decision;
pub use decision::*;

mod options;
pub use options::*;

mod target;
pub use target::*;

mod pipeline;
pub use pipeline::*;

pub mod rules;

mod gatekeeper;
pub use gatekeeper::*;
