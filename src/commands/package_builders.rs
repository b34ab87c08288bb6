//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Implementation of the 'package-builders' subcommand

use anyhow::anyhow;
use anyhow::Result;
use clap::ArgMatches;
use tracing::info;

use crate::api::JobRepository;
use crate::commands::util::print_listing;
use crate::commands::util::print_text;
use crate::commands::util::ListFormat;
use crate::config::Configuration;
use crate::db::models::NewPackageBuilder;
use crate::variant::PackageBuilderKind;

pub fn package_builders(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("create", matches)) => create(repository, matches),
        Some(("list", matches)) => list(repository, config, matches),
        Some((other, _)) => Err(anyhow!("Unknown subcommand: {}", other)),
        None => Err(anyhow!("No subcommand")),
    }
}

fn smoke_test_id(matches: &ArgMatches) -> Result<i32> {
    matches
        .get_one::<i32>("smoke_test")
        .copied()
        .ok_or_else(|| anyhow!("No smoke test given"))
}

fn create(repository: JobRepository, matches: &ArgMatches) -> Result<()> {
    let url = matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("No URL given"))?;

    let new = NewPackageBuilder::builder()
        .kind(matches.get_one::<PackageBuilderKind>("type").copied().unwrap_or_default())
        .url(url.as_str())
        .branch(matches.get_one::<String>("branch").cloned())
        .merge_trunk(!matches.get_flag("no_merge_trunk"))
        .smoke_test_id(smoke_test_id(matches)?)
        .build()
        .validate()?;

    let builder = repository.store().create_package_builder(new)?;
    info!("Created {} {} for smoke test {}", builder.kind, builder.id, builder.smoke_test_id);
    print_text(&format!("{} ({})", builder.id, builder.kind))
}

fn list(repository: JobRepository, config: &Configuration, matches: &ArgMatches) -> Result<()> {
    let format = ListFormat::from_matches(matches, config)?;
    let builders = repository.store().package_builders_of(smoke_test_id(matches)?)?;

    print_listing(
        format,
        "package builders",
        ("package_builders", "package_builder"),
        &["Id", "Type", "Url", "Branch", "Merge Trunk", "Revision"],
        &builders,
        |b| {
            vec![
                b.id.to_string(),
                b.kind.to_string(),
                b.url.clone(),
                b.branch.clone().unwrap_or_default(),
                String::from(if b.merge_trunk { "yes" } else { "no" }),
                b.revision_hash.clone(),
            ]
        },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cli::cli;
    use crate::db::models::NewSmokeTest;
    use crate::db::MemoryStore;
    use crate::db::Store;

    fn run_create(repository: JobRepository, args: &[&str]) -> Result<()> {
        let mut argv = vec!["smokestack", "package-builders", "create"];
        argv.extend_from_slice(args);
        let m = cli().try_get_matches_from(argv).unwrap();
        let (_, sub) = m.subcommand().unwrap();
        let (_, create_matches) = sub.subcommand().unwrap();
        create(repository, create_matches)
    }

    #[test]
    fn test_create() {
        let store = Arc::new(MemoryStore::default());
        store.create_smoke_test(NewSmokeTest::default()).unwrap();

        run_create(
            JobRepository::new(store.clone()),
            &[
                "--smoke-test",
                "1",
                "--url",
                "https://github.com/openstack/glance.git",
                "--branch",
                "stable",
                "--no-merge-trunk",
                "--type",
                "GlancePackageBuilder",
            ],
        )
        .unwrap();

        let builders = store.package_builders_of(1).unwrap();
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].kind, PackageBuilderKind::Glance);
        assert_eq!(builders[0].branch.as_deref(), Some("stable"));
        assert!(!builders[0].merge_trunk);
    }

    #[test]
    fn test_create_for_missing_smoke_test_fails() {
        let store = Arc::new(MemoryStore::default());
        assert!(run_create(
            JobRepository::new(store.clone()),
            &["--smoke-test", "3", "--url", "https://github.com/openstack/nova.git"],
        )
        .is_err());
    }
}
