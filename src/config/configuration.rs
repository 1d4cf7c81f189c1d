//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::ops::Deref;
use std::time::Duration;

use getset::Getters;

use crate::config::NotValidatedConfiguration;

#[derive(Debug, Getters)]
pub struct Configuration {
    pub (in crate::config) inner: NotValidatedConfiguration,

    #[getset(get = "pub")]
    pub (in crate::config) cache_ttl: Duration,
}

impl Deref for Configuration {
    type Target = NotValidatedConfiguration;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
