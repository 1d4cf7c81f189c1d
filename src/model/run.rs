//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use anyhow::anyhow;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::model::DatasetId;
use crate::model::EvaluatorId;
use crate::model::RunId;
use crate::model::TeamId;

/// What produced the output of a run
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum Producer {
    Software(String),
    DockerSoftware(String),
    Upload(String),

    /// The run is the evaluation of its `input_run`
    Evaluation(EvaluatorId),
}

impl Producer {
    pub fn kind(&self) -> &'static str {
        match self {
            Producer::Software(_) => "software",
            Producer::DockerSoftware(_) => "docker-software",
            Producer::Upload(_) => "upload",
            Producer::Evaluation(_) => "evaluation",
        }
    }

    pub fn reference(&self) -> &str {
        match self {
            Producer::Software(s) | Producer::DockerSoftware(s) | Producer::Upload(s) => s,
            Producer::Evaluation(e) => e.as_ref(),
        }
    }

    pub fn from_parts(kind: &str, reference: String) -> Result<Producer> {
        match kind {
            "software" => Ok(Producer::Software(reference)),
            "docker-software" => Ok(Producer::DockerSoftware(reference)),
            "upload" => Ok(Producer::Upload(reference)),
            "evaluation" => Ok(Producer::Evaluation(EvaluatorId::from(reference))),
            other => Err(anyhow!("Unknown run producer kind: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Run {
    pub id: RunId,
    pub team_id: TeamId,
    pub producer: Producer,
    pub dataset_id: DatasetId,

    /// For evaluations: the run that was evaluated
    #[builder(default)]
    pub input_run: Option<RunId>,

    #[builder(default)]
    pub deleted: bool,

    #[builder(default)]
    pub downloadable: bool,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl Run {
    pub fn is_evaluation(&self) -> bool {
        matches!(self.producer, Producer::Evaluation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_parts_roundtrip_for_every_kind() {
        let producers = [
            Producer::Software("s1".into()),
            Producer::DockerSoftware("d1".into()),
            Producer::Upload("u1".into()),
            Producer::Evaluation(EvaluatorId::from("e1")),
        ];

        for p in producers {
            let parsed = Producer::from_parts(p.kind(), p.reference().to_string()).unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn test_unknown_producer_kind() {
        assert!(Producer::from_parts("carrier-pigeon", String::from("x")).is_err());
    }
}
