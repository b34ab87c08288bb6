//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Utility module for subcommand implementation helpers

use std::fmt::Display;
use std::io::Write;

use anyhow::anyhow;
use anyhow::Error;
use anyhow::Result;
use ascii_table::Align;
use ascii_table::AsciiTable;
use clap::ArgMatches;
use colored::ColoredString;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::config::Configuration;
use crate::format::render_records;
use crate::format::Format;
use crate::status::Status;

/// How a listing subcommand prints its records
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListFormat {
    Table,
    Csv,
    Wire(Format),
}

impl ListFormat {
    /// The `--format` argument, or the configured `list_format`
    pub fn from_matches(matches: &ArgMatches, config: &Configuration) -> Result<ListFormat> {
        let name = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or_else(|| config.list_format().as_str());

        match name {
            "table" => Ok(ListFormat::Table),
            "csv" => Ok(ListFormat::Csv),
            "json" => Ok(ListFormat::Wire(Format::Json)),
            "xml" => Ok(ListFormat::Wire(Format::Xml)),
            other => Err(anyhow!("Unknown list format: {}", other)),
        }
    }
}

/// The `--format` argument of the single-record subcommands
pub fn wire_format(matches: &ArgMatches) -> Result<Format> {
    matches
        .get_one::<String>("format")
        .map(|s| s.parse::<Format>())
        .transpose()
        .map_err(Error::from)
        .map(Option::unwrap_or_default)
}

pub fn colored_status(status: Status) -> ColoredString {
    match status {
        Status::Pending => status.as_str().yellow(),
        Status::Running => status.as_str().blue(),
        Status::Succeeded => status.as_str().green(),
        Status::Failed => status.as_str().red(),
        Status::Cancelled => status.as_str().dimmed(),
    }
}

/// Print a listing in the requested format
///
/// `root` and `item` name the XML elements, `what` is used in the log message for an empty
/// listing.
pub fn print_listing<T, D>(
    format: ListFormat,
    what: &str,
    (root, item): (&str, &str),
    header: &[&str],
    records: &[T],
    row: impl Fn(&T) -> Vec<D>,
) -> Result<()>
where
    T: Serialize,
    D: Display,
{
    let csv = match format {
        ListFormat::Table => false,
        ListFormat::Csv => true,
        ListFormat::Wire(wire) => {
            let rendered = render_records(wire, root, item, records)?.unwrap_or_default();
            return writeln!(std::io::stdout().lock(), "{}", rendered).map_err(Error::from);
        }
    };

    if records.is_empty() {
        info!("No {} in database", what);
        return Ok(());
    }

    display_data(header, records.iter().map(row).collect(), csv)
}

/// Display the passed data as nice ascii table,
/// or, if stdout is a pipe, print it nicely parseable
///
/// If `csv` is `true`, convert the data to CSV (with a header line) and print that instead.
pub fn display_data<D: Display>(header: &[&str], data: Vec<Vec<D>>, csv: bool) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    if csv {
        let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
        wtr.write_record(header)?;
        for record in data.into_iter() {
            let r: Vec<String> = record.into_iter().map(|e| e.to_string()).collect();
            wtr.write_record(&r)?;
        }

        let out = std::io::stdout();
        let mut lock = out.lock();

        wtr.into_inner()
            .map_err(Error::from)
            .and_then(|t| String::from_utf8(t).map_err(Error::from))
            .and_then(|text| write!(lock, "{text}").map_err(Error::from))
    } else if atty::is(atty::Stream::Stdout) {
        let mut ascii_table = AsciiTable::default();
        ascii_table.set_max_width(
            terminal_size::terminal_size()
                .map(|tpl| tpl.0 .0 as usize) // an ugly interface indeed!
                .unwrap_or(80),
        );

        for (i, name) in header.iter().enumerate() {
            ascii_table.column(i).set_header(*name).set_align(Align::Left);
        }

        ascii_table.print(data);
        Ok(())
    } else {
        let out = std::io::stdout();
        let mut lock = out.lock();
        for list in data {
            writeln!(lock, "{}", list.iter().map(|d| d.to_string()).join(" "))?;
        }
        Ok(())
    }
}

pub fn print_text(text: &str) -> Result<()> {
    let out = std::io::stdout();
    let mut lock = out.lock();
    if text.ends_with('\n') {
        write!(lock, "{}", text).map_err(Error::from)
    } else {
        writeln!(lock, "{}", text).map_err(Error::from)
    }
}
