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
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::model::Review;
use crate::model::ReviewPatch;
use crate::model::RunId;
use crate::schema::reviews;

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = reviews)]
pub struct ReviewRow {
    pub run_id: String,
    pub no_errors: bool,
    pub has_errors: bool,
    pub has_no_errors: bool,
    pub has_warnings: bool,
    pub missing_output: bool,
    pub invalid_output: bool,
    pub has_error_output: bool,
    pub other_errors: bool,
    pub comment: String,
    pub reviewer_id: String,
    pub review_date: Option<DateTime<Utc>>,
    pub published: bool,
    pub blinded: bool,
}

/// Every column but the key, so that an update writes the whole review
#[derive(AsChangeset)]
#[diesel(table_name = reviews)]
#[diesel(treat_none_as_null = true)]
struct ReviewChangeset<'a> {
    pub no_errors: bool,
    pub has_errors: bool,
    pub has_no_errors: bool,
    pub has_warnings: bool,
    pub missing_output: bool,
    pub invalid_output: bool,
    pub has_error_output: bool,
    pub other_errors: bool,
    pub comment: &'a str,
    pub reviewer_id: &'a str,
    pub review_date: Option<&'a DateTime<Utc>>,
    pub published: bool,
    pub blinded: bool,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        ReviewRow {
            run_id: review.run_id.to_string(),
            no_errors: review.no_errors,
            has_errors: review.has_errors,
            has_no_errors: review.has_no_errors,
            has_warnings: review.has_warnings,
            missing_output: review.missing_output,
            invalid_output: review.invalid_output,
            has_error_output: review.has_error_output,
            other_errors: review.other_errors,
            comment: review.comment.clone(),
            reviewer_id: review.reviewer_id.clone(),
            review_date: review.review_date,
            published: review.published,
            blinded: review.blinded,
        }
    }
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            run_id: RunId::from(row.run_id),
            no_errors: row.no_errors,
            has_errors: row.has_errors,
            has_no_errors: row.has_no_errors,
            has_warnings: row.has_warnings,
            missing_output: row.missing_output,
            invalid_output: row.invalid_output,
            has_error_output: row.has_error_output,
            other_errors: row.other_errors,
            comment: row.comment,
            reviewer_id: row.reviewer_id,
            review_date: row.review_date,
            published: row.published,
            blinded: row.blinded,
        }
    }
}

impl ReviewRow {
    pub fn fetch(database_connection: &mut PgConnection, run: &RunId) -> Result<Option<Review>> {
        reviews::table
            .find(run.as_str())
            .first::<ReviewRow>(database_connection)
            .optional()
            .with_context(|| anyhow!("Loading review of run '{}'", run))
            .map(|row| row.map(Review::from))
    }

    /// Insert `review` unless the run has one, then return whatever is persisted
    pub fn create_or_fetch(database_connection: &mut PgConnection, review: &Review) -> Result<Review> {
        database_connection.transaction::<_, anyhow::Error, _>(|conn| {
            diesel::insert_into(reviews::table)
                .values(&ReviewRow::from(review))
                .on_conflict_do_nothing()
                .execute(conn)
                .with_context(|| anyhow!("Inserting review of run '{}'", review.run_id))?;

            Self::fetch(conn, &review.run_id)?
                .ok_or_else(|| anyhow!("Review of run '{}' vanished after insert", review.run_id))
        })
    }

    pub fn update(database_connection: &mut PgConnection, run: &RunId, patch: &ReviewPatch) -> Result<Option<Review>> {
        database_connection.transaction::<_, anyhow::Error, _>(|conn| {
            let current = reviews::table
                .find(run.as_str())
                .for_update()
                .get_result::<ReviewRow>(conn)
                .optional()
                .with_context(|| anyhow!("Locking review of run '{}'", run))?;

            let mut review = match current {
                Some(row) => Review::from(row),
                None => return Ok(None),
            };
            review.apply(patch);

            let changes = ReviewChangeset {
                no_errors: review.no_errors,
                has_errors: review.has_errors,
                has_no_errors: review.has_no_errors,
                has_warnings: review.has_warnings,
                missing_output: review.missing_output,
                invalid_output: review.invalid_output,
                has_error_output: review.has_error_output,
                other_errors: review.other_errors,
                comment: &review.comment,
                reviewer_id: &review.reviewer_id,
                review_date: review.review_date.as_ref(),
                published: review.published,
                blinded: review.blinded,
            };

            diesel::update(reviews::table.find(run.as_str()))
                .set(&changes)
                .execute(conn)
                .with_context(|| anyhow!("Updating review of run '{}'", run))?;

            Ok(Some(review))
        })
    }
}
