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

use tracing::debug;
use walkdir::WalkDir;

use crate::model::Review;
use crate::model::RunId;

/// Description of the run, written when the run was produced
pub const RUN_DEFINITION: &str = "run.prototext";

/// Directory holding whatever the software produced
pub const OUTPUT_DIR: &str = "output";

pub const MISSING_DEFINITION_COMMENT: &str = "Internal Error: The run definition is missing. Please contact the organizers of the task.";
pub const NO_OUTPUT_COMMENT: &str = "No Output was produced";

/// The review a run gets before anybody looked at it, derived from its artifacts only
pub fn derive_review(run_id: RunId, run_dir: &Path) -> Review {
    let mut review = Review::unreviewed(run_id);

    if !run_dir.join(RUN_DEFINITION).is_file() {
        debug!("No run definition in {}", run_dir.display());
        review.has_errors = true;
        review.blinded = false;
        review.comment = String::from(MISSING_DEFINITION_COMMENT);
        return review
    }

    if !has_output(&run_dir.join(OUTPUT_DIR)) {
        debug!("No output in {}", run_dir.display());
        review.has_errors = true;
        review.missing_output = true;
        review.has_error_output = true;
        review.comment = String::from(NO_OUTPUT_COMMENT);
    }

    review
}

fn has_output(dir: &Path) -> bool {
    dir.is_dir() && WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_type().is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_definition() {
        let dir = tempfile::tempdir().unwrap();
        let review = derive_review(RunId::from("r1"), dir.path());

        assert!(review.has_errors);
        assert!(!review.blinded);
        assert!(!review.missing_output);
        assert_eq!(review.comment, MISSING_DEFINITION_COMMENT);
        assert_eq!(review.reviewer_id, "tira");
    }

    #[test]
    fn test_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RUN_DEFINITION), "softwareId: \"s1\"\n").unwrap();
        fs::create_dir(dir.path().join(OUTPUT_DIR)).unwrap();
        fs::create_dir(dir.path().join(OUTPUT_DIR).join("empty")).unwrap();

        let review = derive_review(RunId::from("r1"), dir.path());
        assert!(review.has_errors);
        assert!(review.missing_output);
        assert!(review.has_error_output);
        assert!(review.blinded);
        assert_eq!(review.comment, NO_OUTPUT_COMMENT);
    }

    #[test]
    fn test_complete_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RUN_DEFINITION), "softwareId: \"s1\"\n").unwrap();
        fs::create_dir_all(dir.path().join(OUTPUT_DIR).join("nested")).unwrap();
        fs::write(dir.path().join(OUTPUT_DIR).join("nested").join("run.txt"), "q0 Q0 doc 1 1.0 tag\n").unwrap();

        let review = derive_review(RunId::from("r1"), dir.path());
        assert_eq!(review, Review::unreviewed(RunId::from("r1")));
    }
}
