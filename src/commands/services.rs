//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::sync::Arc;

use anyhow::Result;
use getset::Getters;
use tracing::debug;

use crate::cache::Cache;
use crate::cache::MemoryCache;
use crate::config::Configuration;
use crate::dispatch::Dispatcher;
use crate::dispatch::GitCiBackend;
use crate::dispatch::HttpGitCi;
use crate::dispatch::RemoteVmBackend;
use crate::identity::provider_from_config;
use crate::policy::Gatekeeper;
use crate::registry::Registry;
use crate::store::Store;
use crate::vm::HttpVmRpc;
use crate::vm::VmTracker;

/// Everything a subcommand handler may talk to, wired once at process start
#[derive(Getters)]
pub struct Services {
    #[getset(get = "pub")]
    gatekeeper: Gatekeeper,

    #[getset(get = "pub")]
    registry: Arc<Registry>,

    #[getset(get = "pub")]
    dispatcher: Dispatcher,

    #[getset(get = "pub")]
    tracker: Arc<VmTracker>,
}

impl Services {
    pub fn new(config: &Configuration, store: Arc<dyn Store>) -> Result<Self> {
        let auth = provider_from_config(config.authentication(), config.groups(), store.clone());
        debug!("Authentication: {:?}", config.authentication());

        let gatekeeper = Gatekeeper::new(auth, store.clone(), config.public_datasets().clone());
        let registry = Arc::new(Registry::new(store.clone(), config.runs_root().clone(), *config.legacy_export()));
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(*config.cache_ttl()));

        let rpc = Arc::new(HttpVmRpc::new(config.vm_rpc())?);
        let tracker = Arc::new(VmTracker::new(store, rpc));

        let mut dispatcher = Dispatcher::new(registry.clone(), cache.clone())
            .with_backend(Arc::new(RemoteVmBackend::new(tracker.clone())));

        if let Some(git_ci) = config.git_ci().as_ref() {
            debug!("Evaluating git based datasets through {:?}", git_ci);
            let client = Arc::new(HttpGitCi::new(git_ci)?);
            dispatcher = dispatcher.with_backend(Arc::new(GitCiBackend::new(client, cache)));
        }

        Ok(Services {
            gatekeeper,
            registry,
            dispatcher,
            tracker,
        })
    }
}
