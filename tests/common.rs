//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use std::path::Path;

const CONFIG: &str = include_str!("../config.toml");

/// Write a usable `config.toml` into `path`, with the runs directory inside `path` and
/// a database nobody listens on
pub fn setup_cwd<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let mut toml: toml::Value = toml::from_str(CONFIG)?;

    let runs_root = path.as_ref().join("runs");
    std::fs::create_dir(&runs_root)?;

    for (key, value) in [
        ("runs_root", toml::Value::String(runs_root.display().to_string())),
        ("database_host", toml::Value::String(String::from("127.0.0.1"))),
        ("database_port", toml::Value::Integer(1)),
        ("database_connection_timeout", toml::Value::Integer(1)),
    ] {
        let toml_key = toml
            .get_mut(key)
            .ok_or_else(|| format!("{} missing in configuration", key))?;
        *toml_key = value
    }

    std::fs::write(
        path.as_ref().join("config.toml"),
        toml::to_string_pretty(&toml)?,
    )?;

    Ok(())
}
