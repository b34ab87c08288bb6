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
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

use crate::config::LIST_FORMATS;
use crate::status::Status;
use crate::variant::JobKind;
use crate::variant::PackageBuilderKind;

pub fn cli() -> Command {
    Command::new("smokestack")
        .author(crate_authors!())
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")"))
        .about("Track smoke tests, job groups and jobs, and serve them over HTTP")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help(indoc::indoc!(
            r#"
            The configuration is read from 'config.toml' in the current directory (see --config),
            every value can be overridden with a SMOKESTACK_<KEY> environment variable.
        "#
        ))
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .default_value("config")
                .help("Configuration file, the extension may be omitted"),
        )
        .arg(
            Arg::new("database_host")
                .long("database-host")
                .global(true)
                .value_name("HOST")
                .help("Overwrite the database host set via configuration"),
        )
        .arg(
            Arg::new("database_port")
                .long("database-port")
                .global(true)
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .help("Overwrite the database port set via configuration"),
        )
        .arg(
            Arg::new("database_user")
                .long("database-user")
                .global(true)
                .value_name("USER")
                .help("Overwrite the database user set via configuration"),
        )
        .arg(
            Arg::new("database_password")
                .long("database-password")
                .global(true)
                .value_name("PASSWORD")
                .help("Overwrite the database password set via configuration"),
        )
        .arg(
            Arg::new("database_name")
                .long("database-name")
                .global(true)
                .value_name("NAME")
                .help("Overwrite the database name set via configuration"),
        )
        .arg(
            Arg::new("database_connection_timeout")
                .long("database-connection-timeout")
                .global(true)
                .value_name("SECONDS")
                .value_parser(value_parser!(u16))
                .help("Overwrite the database connection timeout set via configuration"),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the job resource over HTTP")
                .arg(
                    Arg::new("listen")
                        .long("listen")
                        .value_name("ADDR")
                        .value_parser(value_parser!(std::net::SocketAddr))
                        .help("Address to listen on, instead of 'listen_address' from the configuration"),
                ),
        )
        .subcommand(
            Command::new("jobs")
                .about("Inspect and manipulate jobs")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .about("List all jobs, most recent first")
                        .arg(list_format_arg())
                        .arg(
                            Arg::new("table_only")
                                .long("table-only")
                                .action(ArgAction::SetTrue)
                                .help("Print only the table, without title"),
                        )
                        .arg(
                            Arg::new("no_related")
                                .long("no-related")
                                .action(ArgAction::SetTrue)
                                .help("Do not include config template and smoke test of each job"),
                        ),
                )
                .subcommand(
                    Command::new("show")
                        .about("Show a single job, including its output")
                        .arg(id_arg("Id of the job"))
                        .arg(wire_format_arg()),
                )
                .subcommand(
                    Command::new("create")
                        .about("Create a pending job")
                        .arg(
                            Arg::new("job_group")
                                .long("job-group")
                                .required(true)
                                .value_name("ID")
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(
                            Arg::new("config_template")
                                .long("config-template")
                                .required(true)
                                .value_name("ID")
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_name("TYPE")
                                .value_parser(value_parser!(JobKind))
                                .help("Job type, JobVPC if not given"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a job, printing it one last time")
                        .arg(id_arg("Id of the job"))
                        .arg(wire_format_arg()),
                )
                .subcommand(status_subcommand("job")),
        )
        .subcommand(
            Command::new("smoke-tests")
                .about("Inspect and manipulate smoke tests")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create").about("Create a pending smoke test").arg(
                        Arg::new("description")
                            .long("description")
                            .value_name("TEXT"),
                    ),
                )
                .subcommand(Command::new("list").about("List all smoke tests").arg(list_format_arg()))
                .subcommand(
                    Command::new("show")
                        .about("Show a smoke test with its config templates, package builders and job groups")
                        .arg(id_arg("Id of the smoke test")),
                )
                .subcommand(status_subcommand("smoke test"))
                .subcommand(
                    Command::new("attach")
                        .about("Attach a config template to a smoke test")
                        .arg(id_arg("Id of the smoke test"))
                        .arg(
                            Arg::new("template_id")
                                .required(true)
                                .index(2)
                                .value_name("TEMPLATE_ID")
                                .value_parser(value_parser!(i32)),
                        ),
                ),
        )
        .subcommand(
            Command::new("config-templates")
                .about("Inspect and create config templates")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Create a config template")
                        .arg(Arg::new("name").long("name").required(true).value_name("NAME"))
                        .arg(
                            Arg::new("description")
                                .long("description")
                                .required(true)
                                .value_name("TEXT"),
                        )
                        .arg(
                            Arg::new("cookbook_url")
                                .long("cookbook-url")
                                .required(true)
                                .value_name("URL"),
                        )
                        .arg(
                            Arg::new("nodes_spec")
                                .long("nodes-spec")
                                .required(true)
                                .value_name("FILE")
                                .value_parser(value_parser!(std::path::PathBuf))
                                .help("JSON file describing the nodes"),
                        )
                        .arg(
                            Arg::new("server_group_spec")
                                .long("server-group-spec")
                                .required(true)
                                .value_name("FILE")
                                .value_parser(value_parser!(std::path::PathBuf))
                                .help("JSON file describing the server group"),
                        )
                        .arg(
                            Arg::new("job_type")
                                .long("job-type")
                                .value_name("TYPE")
                                .value_parser(value_parser!(JobKind)),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List config templates")
                        .arg(list_format_arg())
                        .arg(
                            Arg::new("smoke_test")
                                .long("smoke-test")
                                .value_name("ID")
                                .value_parser(value_parser!(i32))
                                .help("Only the templates attached to this smoke test"),
                        ),
                ),
        )
        .subcommand(
            Command::new("job-groups")
                .about("Inspect and manipulate job groups")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Create a pending job group")
                        .arg(smoke_test_arg()),
                )
                .subcommand(
                    Command::new("list")
                        .about("List the job groups of a smoke test")
                        .arg(smoke_test_arg())
                        .arg(list_format_arg()),
                )
                .subcommand(status_subcommand("job group")),
        )
        .subcommand(
            Command::new("package-builders")
                .about("Inspect and create package builders")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Create a package builder for a smoke test")
                        .arg(smoke_test_arg())
                        .arg(Arg::new("url").long("url").required(true).value_name("URL"))
                        .arg(Arg::new("branch").long("branch").value_name("BRANCH"))
                        .arg(
                            Arg::new("no_merge_trunk")
                                .long("no-merge-trunk")
                                .action(ArgAction::SetTrue)
                                .help("Build the branch as it is, without merging trunk first"),
                        )
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_name("TYPE")
                                .value_parser(value_parser!(PackageBuilderKind)),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List the package builders of a smoke test")
                        .arg(smoke_test_arg())
                        .arg(list_format_arg()),
                ),
        )
        .subcommand(
            Command::new("users")
                .about("Manage the users which may change jobs over HTTP")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a user, the password is asked for interactively")
                        .arg(
                            Arg::new("username")
                                .required(true)
                                .index(1)
                                .value_name("USERNAME"),
                        )
                        .arg(
                            Arg::new("first_name")
                                .long("first-name")
                                .required(true)
                                .value_name("NAME"),
                        )
                        .arg(
                            Arg::new("last_name")
                                .long("last-name")
                                .required(true)
                                .value_name("NAME"),
                        )
                        .arg(
                            Arg::new("admin")
                                .long("admin")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
}

fn id_arg(help: &'static str) -> Arg {
    Arg::new("id")
        .required(true)
        .index(1)
        .value_name("ID")
        .value_parser(value_parser!(i32))
        .help(help)
}

fn smoke_test_arg() -> Arg {
    Arg::new("smoke_test")
        .long("smoke-test")
        .required(true)
        .value_name("ID")
        .value_parser(value_parser!(i32))
}

/// Output format of listings, the configured `list_format` if not given
fn list_format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .value_parser(LIST_FORMATS)
}

fn wire_format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .default_value("native")
        .value_parser(["native", "json", "xml"])
}

fn status_subcommand(what: &'static str) -> Command {
    Command::new("status")
        .about(format!("Move a {} to another status", what))
        .arg(id_arg("Id"))
        .arg(
            Arg::new("status")
                .required(true)
                .index(2)
                .value_name("STATUS")
                .value_parser(value_parser!(Status)),
        )
}
