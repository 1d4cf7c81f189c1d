//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


//! Review files in the run directory, for tools which still read them

use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;

use crate::model::Review;

pub const LEGACY_REVIEW_FILE: &str = "run-review.prototext";

pub fn render(review: &Review) -> String {
    let mut out = String::new();
    let mut field = |key: &str, value: String| {
        let _ = writeln!(out, "{}: {}", key, value);
    };

    field("runId", quote(review.run_id.as_ref()));
    field("reviewerId", quote(&review.reviewer_id));
    if let Some(date) = review.review_date {
        field("reviewDate", quote(&date.to_rfc2822()));
    }
    field("noErrors", review.no_errors.to_string());
    field("missingOutput", review.missing_output.to_string());
    field("extraneousOutput", String::from("false"));
    field("invalidOutput", review.invalid_output.to_string());
    field("hasErrorOutput", review.has_error_output.to_string());
    field("otherErrors", review.other_errors.to_string());
    field("comment", quote(&review.comment));
    field("hasErrors", review.has_errors.to_string());
    field("hasWarnings", review.has_warnings.to_string());
    field("hasNoErrors", review.has_no_errors.to_string());
    field("published", review.published.to_string());
    field("blinded", review.blinded.to_string());

    out
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n"))
}

/// Write the review into `run_dir`, returns the path of the written file
pub fn write(run_dir: &Path, review: &Review) -> Result<PathBuf> {
    std::fs::create_dir_all(run_dir)
        .with_context(|| format!("Creating run directory {}", run_dir.display()))?;

    let path = run_dir.join(LEGACY_REVIEW_FILE);
    std::fs::write(&path, render(review))
        .with_context(|| format!("Writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunId;

    #[test]
    fn test_render() {
        let mut review = Review::unreviewed(RunId::from("2022-01-01-10-00-00"));
        review.comment = String::from("says \"hi\"");
        review.published = true;

        let text = render(&review);
        assert!(text.contains("runId: \"2022-01-01-10-00-00\"\n"));
        assert!(text.contains("comment: \"says \\\"hi\\\"\"\n"));
        assert!(text.contains("published: true\n"));
        assert!(text.contains("blinded: true\n"));
        assert!(!text.contains("reviewDate"));
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("d1").join("t1").join("r1");
        let path = write(&run_dir, &Review::unreviewed(RunId::from("r1"))).unwrap();

        assert_eq!(path, run_dir.join(LEGACY_REVIEW_FILE));
        assert!(std::fs::read_to_string(path).unwrap().contains("reviewerId: \"tira\""));
    }
}
