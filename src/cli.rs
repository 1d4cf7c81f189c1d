//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//


use clap::crate_authors;
use clap::crate_version;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

pub const VM_COMMANDS: &[&str] = &["start", "stop", "shutdown", "sandbox", "unsandbox", "abort"];

pub fn cli() -> Command {
    Command::new("tira")
        .author(crate_authors!())
        .version(crate_version!())
        .about("Access policy and evaluation dispatch for shared-task run submissions")
        .after_help(r#"
The following environment variables can be passed to tira:

    RUST_LOG - to enable logging, for exact usage see the tracing-subscriber documentation
    TIRA_*   - to override settings from the configuration file, e.g. TIRA_DATABASE_HOST
"#)
        .subcommand_required(true)
        .arg_required_else_help(true)

        .arg(Arg::new("config")
            .required(false)
            .long("config")
            .short('c')
            .global(true)
            .value_name("FILE")
            .help("Read the configuration from this file instead of the default locations")
        )

        .arg(Arg::new("database_host")
            .required(false)
            .long("db-url")
            .value_name("HOST")
            .help("Override the database host")
            .long_help("Override the database host set via configuration. Can also be overridden via environment variable 'TIRA_DATABASE_HOST', but this setting has precedence.")
        )
        .arg(Arg::new("database_port")
            .required(false)
            .long("db-port")
            .value_name("PORT")
            .help("Override the database port")
        )
        .arg(Arg::new("database_user")
            .required(false)
            .long("db-user")
            .value_name("USER")
            .help("Override the database user")
        )
        .arg(Arg::new("database_password")
            .required(false)
            .long("db-password")
            .value_name("PASSWORD")
            .help("Override the database password")
        )
        .arg(Arg::new("database_name")
            .required(false)
            .long("db-name")
            .value_name("NAME")
            .help("Override the database name")
        )
        .arg(Arg::new("database_connection_timeout")
            .required(false)
            .long("db-timeout")
            .value_name("TIMEOUT")
            .help("Override the database connection timeout, in seconds")
        )

        .subcommand(Command::new("db")
            .about("Database administration")
            .subcommand_required(true)
            .subcommand(Command::new("setup")
                .about("Run the pending schema migrations")
            )
        )

        .subcommand(Command::new("authorize")
            .about("Print the policy decision for a request")
            .long_about(r#"
Runs the access policy for a synthetic request and prints the decision.

The caller is described by the headers the SSO proxy would set, for example
    --header X-Disraptor-User=alice --header X-Disraptor-Groups=tira_vm_team1
"#)
            .arg(arg_task())
            .arg(arg_dataset())
            .arg(arg_team())
            .arg(Arg::new("run")
                .required(false)
                .long("run")
                .action(ArgAction::Append)
                .value_name("RUN")
                .help("Run the request is about, repeat to compare runs")
            )
            .arg(Arg::new("intent")
                .required(false)
                .long("intent")
                .value_name("INTENT")
                .value_parser(["view", "mutate"])
                .default_value("view")
                .help("Whether the request only looks at the resources")
            )
            .arg(flag("restricted", "Only admins may pass"))
            .arg(flag("public-data-ok", "Participants may use their unreviewed runs on public datasets"))
            .arg(flag("private-run-ok", "Owners may look at their blinded runs"))
            .arg(flag("not-registered-ok", "Skip the registration requirement"))
            .arg(arg_header())
        )

        .subcommand(Command::new("evaluate")
            .about("Trigger the evaluation of a run")
            .arg(arg_run())
            .arg(arg_dataset().required(true))
            .arg(arg_team().required(true))
            .arg(arg_header())
        )

        .subcommand(Command::new("evaluation")
            .about("Follow evaluations that were triggered before")
            .subcommand_required(true)
            .subcommand(Command::new("poll")
                .about("Ask the backend whether the evaluation of a run is still running")
                .arg(arg_run())
                .arg(flag("force", "Do not use cached backend data"))
            )
            .subcommand(Command::new("complete")
                .about("Record the run an evaluation produced")
                .arg(arg_run())
                .arg(Arg::new("evaluation_run")
                    .required(true)
                    .long("evaluation-run")
                    .value_name("RUN")
                    .help("The run the evaluator created")
                )
            )
            .subcommand(Command::new("stop")
                .about("Abort the evaluation of a run")
                .arg(arg_run())
            )
            .subcommand(Command::new("evaluators")
                .about("List the evaluators of a task")
                .arg(arg_task().required(true))
                .arg(flag("force", "Do not use cached data"))
            )
        )

        .subcommand(Command::new("review")
            .about("Look at and change reviews")
            .subcommand_required(true)
            .subcommand(Command::new("show")
                .about("Print the review of a run")
                .arg(arg_run())
            )
            .subcommand(Command::new("auto")
                .about("Create the automatic review of a run, if there is none")
                .arg(arg_run())
            )
            .subcommand(Command::new("update")
                .about("Change single fields of a review")
                .arg(arg_run())
                .arg(bool_arg("no-errors"))
                .arg(bool_arg("has-errors"))
                .arg(bool_arg("has-no-errors"))
                .arg(bool_arg("has-warnings"))
                .arg(bool_arg("missing-output"))
                .arg(bool_arg("invalid-output"))
                .arg(bool_arg("has-error-output"))
                .arg(bool_arg("other-errors"))
                .arg(bool_arg("published"))
                .arg(bool_arg("blinded"))
                .arg(Arg::new("comment")
                    .required(false)
                    .long("comment")
                    .value_name("TEXT")
                )
                .arg(Arg::new("reviewer")
                    .required(false)
                    .long("reviewer")
                    .value_name("REVIEWER")
                )
            )
            .subcommand(Command::new("export")
                .about("Write the review into the run directory, in the legacy format")
                .arg(arg_run())
            )
        )

        .subcommand(Command::new("run")
            .about("Manage runs")
            .subcommand_required(true)
            .subcommand(Command::new("delete")
                .about("Delete a run, unless it is published, reviewed as valid or used by other runs")
                .arg(arg_run())
            )
        )

        .subcommand(Command::new("vm")
            .about("Drive virtual machines")
            .subcommand_required(true)
            .subcommand(vm_command("info", "Ask the host for the state of a VM"))
            .subcommands(VM_COMMANDS.iter().map(|name| vm_command(*name, "Send a lifecycle command to a VM")))
            .subcommand(vm_command("execute", "Run a command inside a VM")
                .arg(Arg::new("command")
                    .required(true)
                    .long("command")
                    .value_name("COMMAND")
                )
                .arg(Arg::new("input_run")
                    .required(false)
                    .long("input-run")
                    .value_name("RUN")
                )
            )
        )
}

fn arg_run() -> Arg {
    Arg::new("run")
        .required(true)
        .long("run")
        .value_name("RUN")
        .help("The run id")
}

fn arg_task() -> Arg {
    Arg::new("task")
        .required(false)
        .long("task")
        .value_name("TASK")
}

fn arg_dataset() -> Arg {
    Arg::new("dataset")
        .required(false)
        .long("dataset")
        .value_name("DATASET")
}

fn arg_team() -> Arg {
    Arg::new("team")
        .required(false)
        .long("team")
        .value_name("TEAM")
        .help("The team (and VM) the request acts for")
}

fn arg_header() -> Arg {
    Arg::new("header")
        .required(false)
        .long("header")
        .short('H')
        .action(ArgAction::Append)
        .value_name("KEY=VALUE")
        .help("Request header, as set by the SSO proxy")
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(false)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn bool_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(false)
        .long(name)
        .value_name("BOOL")
        .value_parser(clap::value_parser!(bool))
}

fn vm_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new("vm")
            .required(true)
            .long("vm")
            .value_name("VM")
            .help("The VM, named like the team owning it")
        )
        .arg(Arg::new("host")
            .required(false)
            .long("host")
            .value_name("HOST")
            .help("Host running the VM, defaults to the host the VM was last seen on")
        )
}
