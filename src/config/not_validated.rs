//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use getset::Getters;
use serde::Deserialize;

use crate::config::util::*;
use crate::config::AuthenticationConfig;
use crate::config::Configuration;
use crate::config::GitCiConfig;
use crate::config::GroupsConfig;
use crate::config::VmRpcConfig;
use crate::model::DatasetId;

#[derive(Debug, Getters, Deserialize)]
pub struct NotValidatedConfiguration {
    #[getset(get = "pub")]
    compatibility: semver::VersionReq,

    /// Directory which holds the run artifacts, laid out as `<dataset>/<team>/<run>`
    #[getset(get = "pub")]
    runs_root: PathBuf,

    /// How long derived data (evaluators of a task, running pipelines) may be served from cache
    #[serde(default = "default_cache_ttl")]
    cache_ttl: String,

    #[getset(get = "pub")]
    #[serde(rename = "database_host")]
    database_host: String,

    #[getset(get = "pub")]
    #[serde(rename = "database_port")]
    database_port: u16,

    #[getset(get = "pub")]
    #[serde(rename = "database_user")]
    database_user: String,

    #[getset(get = "pub")]
    #[serde(rename = "database_password")]
    database_password: String,

    #[getset(get = "pub")]
    #[serde(rename = "database_name")]
    database_name: String,

    #[getset(get = "pub")]
    #[serde(rename = "database_connection_timeout")]
    database_connection_timeout: Option<u16>,

    #[getset(get = "pub")]
    authentication: AuthenticationConfig,

    #[serde(default)]
    #[getset(get = "pub")]
    groups: GroupsConfig,

    /// Datasets whose runs everybody may look at, as if they were published
    #[serde(default)]
    #[getset(get = "pub")]
    public_datasets: Vec<DatasetId>,

    #[getset(get = "pub")]
    vm_rpc: VmRpcConfig,

    #[getset(get = "pub")]
    git_ci: Option<GitCiConfig>,

    /// Mirror reviews into the run directory after every change
    #[serde(default)]
    #[getset(get = "pub")]
    legacy_export: bool,
}

impl NotValidatedConfiguration {
    pub fn validate(self) -> Result<Configuration> {
        let crate_version = semver::Version::parse(env!("CARGO_PKG_VERSION"))
            .context("Parsing version of crate (CARGO_PKG_VERSION) into semver::Version object")?;

        if !self.compatibility.matches(&crate_version) {
            return Err(anyhow!("Configuration is not compatible to tira {}", crate_version))
        }

        if !self.runs_root.is_dir() {
            return Err(anyhow!("Not a directory: runs_root = {}", self.runs_root.display()))
        }

        let cache_ttl: Duration = humantime::parse_duration(&self.cache_ttl)
            .with_context(|| anyhow!("Parsing cache_ttl = '{}'", self.cache_ttl))?;

        self.groups.validate().context("Validating the 'groups' setting")?;
        self.vm_rpc.validate().context("Validating the 'vm_rpc' setting")?;
        if let Some(git_ci) = self.git_ci.as_ref() {
            git_ci.validate().context("Validating the 'git_ci' setting")?;
        }

        Ok(Configuration { inner: self, cache_ttl })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_toml(runs_root: &std::path::Path, extra: &str) -> String {
        format!(r#"
            compatibility = ">=0.1"
            runs_root = "{root}"
            database_host = "localhost"
            database_port = 5432
            database_user = "tira"
            database_password = "secret"
            database_name = "tira"

            [authentication]
            provider = "sso-headers"

            [vm_rpc]
            port = 50051
            {extra}
        "#, root = runs_root.display(), extra = extra)
    }

    #[test]
    fn test_minimal_configuration_validates() {
        let dir = tempfile::tempdir().unwrap();
        let nv: NotValidatedConfiguration = toml::from_str(&config_toml(dir.path(), "")).unwrap();
        let config = nv.validate().unwrap();

        assert_eq!(*config.cache_ttl(), Duration::from_secs(300));
        assert!(config.public_datasets().is_empty());
        assert!(config.git_ci().is_none());
        assert_eq!(config.groups().team_prefix(), "tira_vm_");
    }

    #[test]
    fn test_missing_runs_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let nv: NotValidatedConfiguration = toml::from_str(&config_toml(&missing, "")).unwrap();
        assert!(nv.validate().is_err());
    }

    #[test]
    fn test_unparsable_cache_ttl_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let toml = config_toml(dir.path(), "").replace("compatibility", "cache_ttl = \"soon\"\ncompatibility");
        let nv: NotValidatedConfiguration = toml::from_str(&toml).unwrap();
        assert!(nv.validate().is_err());
    }

    #[test]
    fn test_incompatible_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let toml = config_toml(dir.path(), "").replace(">=0.1", "<0.1");
        let nv: NotValidatedConfiguration = toml::from_str(&toml).unwrap();
        assert!(nv.validate().is_err());
    }
}
