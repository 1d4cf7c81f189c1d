//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Helpers shared by the subcommand handlers

use std::io::Write;

use anyhow::anyhow;
use anyhow::Result;
use clap::ArgMatches;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::error;

use crate::error::CoreError;
use crate::error::OutwardStatus;
use crate::identity::Request;

/// Print the outcome as JSON on stdout
///
/// A failed outcome is printed as well and then returned, so the process exits unsuccessfully.
pub fn respond<T: Serialize>(outcome: Result<T, CoreError>) -> Result<()> {
    let document = envelope(&outcome)?;

    let out = std::io::stdout();
    let mut outlock = out.lock();
    writeln!(outlock, "{}", serde_json::to_string_pretty(&document)?)?;

    match outcome {
        Ok(_) => Ok(()),
        Err(e) => {
            if e.status() == OutwardStatus::InfraError {
                error!("{:#}", e);
            } else {
                debug!("Request refused: {:#}", e);
            }
            Err(anyhow!("{}: {:#}", e.status(), e))
        },
    }
}

fn envelope<T: Serialize>(outcome: &Result<T, CoreError>) -> Result<Value> {
    Ok(match outcome {
        Ok(result) => json!({
            "status": OutwardStatus::Success,
            "result": serde_json::to_value(result)?,
        }),
        Err(e) => json!({
            "status": e.status(),
            "error": format!("{:#}", e),
        }),
    })
}

/// The request described by the `--header` arguments
pub fn request_from(matches: &ArgMatches) -> Result<Request, CoreError> {
    matches
        .get_many::<String>("header")
        .unwrap_or_default()
        .try_fold(Request::new(), |request, header| -> Result<Request, CoreError> {
            let (name, value) = parse_header(header)?;
            Ok(request.with_header(name, value))
        })
}

fn parse_header(header: &str) -> Result<(&str, &str), CoreError> {
    header
        .split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CoreError::MalformedRequest(format!("Header '{}' is not of the form NAME=VALUE", header)))
}

pub fn required<I: From<String>>(matches: &ArgMatches, name: &str) -> Result<I> {
    optional(matches, name).ok_or_else(|| anyhow!("Missing argument: {}", name))
}

pub fn optional<I: From<String>>(matches: &ArgMatches, name: &str) -> Option<I> {
    matches.get_one::<String>(name).cloned().map(I::from)
}
