//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


diesel::table! {
    datasets (id) {
        id -> Varchar,
        task_id -> Varchar,
        is_confidential -> Bool,
        is_deprecated -> Bool,
    }
}

diesel::table! {
    evaluation_tickets (run_id) {
        run_id -> Varchar,
        state -> Varchar,
        backend -> Nullable<Varchar>,
        transaction_id -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    evaluators (id) {
        id -> Varchar,
        dataset_id -> Varchar,
        is_git_runner -> Bool,
        host -> Nullable<Varchar>,
        vm_id -> Nullable<Varchar>,
        command -> Text,
        image -> Nullable<Varchar>,
        repository_id -> Nullable<Int8>,
    }
}

diesel::table! {
    reviews (run_id) {
        run_id -> Varchar,
        no_errors -> Bool,
        has_errors -> Bool,
        has_no_errors -> Bool,
        has_warnings -> Bool,
        missing_output -> Bool,
        invalid_output -> Bool,
        has_error_output -> Bool,
        other_errors -> Bool,
        comment -> Text,
        reviewer_id -> Varchar,
        review_date -> Nullable<Timestamptz>,
        published -> Bool,
        blinded -> Bool,
    }
}

diesel::table! {
    runs (id) {
        id -> Varchar,
        team_id -> Varchar,
        producer_kind -> Varchar,
        producer_ref -> Varchar,
        dataset_id -> Varchar,
        input_run -> Nullable<Varchar>,
        deleted -> Bool,
        downloadable -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    task_allowed_teams (task_id, team_id) {
        task_id -> Varchar,
        team_id -> Varchar,
    }
}

diesel::table! {
    task_registrations (task_id, team_id) {
        task_id -> Varchar,
        team_id -> Varchar,
        registered_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Varchar,
        organizer_id -> Varchar,
        require_registration -> Bool,
        restrict_to_allowed_teams -> Bool,
    }
}

diesel::table! {
    teams (id) {
        id -> Varchar,
        owner -> Nullable<Varchar>,
    }
}

diesel::table! {
    vm_states (vm_id) {
        vm_id -> Varchar,
        host -> Varchar,
        state -> Varchar,
        transaction_id -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(datasets -> tasks (task_id));
diesel::joinable!(evaluators -> datasets (dataset_id));
diesel::joinable!(reviews -> runs (run_id));
diesel::joinable!(runs -> datasets (dataset_id));
diesel::joinable!(task_allowed_teams -> tasks (task_id));
diesel::joinable!(task_registrations -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(
    datasets,
    evaluation_tickets,
    evaluators,
    reviews,
    runs,
    task_allowed_teams,
    task_registrations,
    tasks,
    teams,
    vm_states,
);
