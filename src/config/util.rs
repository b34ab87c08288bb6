//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Default values for the configuration

/// Formats the listing subcommands can print
pub const LIST_FORMATS: [&str; 4] = ["table", "csv", "json", "xml"];

pub fn default_database_port() -> u16 {
    5432
}

pub fn default_listen_address() -> String {
    String::from("127.0.0.1:3000")
}

pub fn default_list_format() -> String {
    String::from("table")
}
