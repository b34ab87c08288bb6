//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! The lifecycle of smoke tests, job groups and jobs
//!
//! All three share one status vocabulary:
//!
//! ```text
//! Pending --> Running --> Succeeded
//!    |           |------> Failed
//!    |           '------> Cancelled
//!    '------------------> Cancelled
//! ```
//!
//! Succeeded, Failed and Cancelled are terminal.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(
    parse_display::Display,
    diesel::AsExpression,
    diesel::FromSqlRow,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    Eq,
    PartialEq,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(try_from = "String", into = "String")]
pub enum Status {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("Unknown status: '{0}'")]
pub struct UnknownStatus(String);

#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("{from} is a terminal status, cannot transition to {to}")]
    TerminalStateViolation { from: Status, to: Status },
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::Running,
        Status::Succeeded,
        Status::Failed,
        Status::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Running => "Running",
            Status::Succeeded => "Succeeded",
            Status::Failed => "Failed",
            Status::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Succeeded | Status::Failed | Status::Cancelled)
    }

    /// Check whether `self -> next` is a legal transition, returning `next` if so
    pub fn transition(self, next: Status) -> Result<Status, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::TerminalStateViolation { from: self, to: next });
        }

        match (self, next) {
            (Status::Pending, Status::Running)
            | (Status::Running, Status::Succeeded)
            | (Status::Running, Status::Failed)
            | (Status::Pending, Status::Cancelled)
            | (Status::Running, Status::Cancelled) => Ok(next),
            (from, to) => Err(TransitionError::InvalidTransition { from, to }),
        }
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl From<Status> for String {
    fn from(status: Status) -> String {
        status.as_str().to_string()
    }
}

impl TryFrom<String> for Status {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The entity kinds which carry a [`Status`]
#[derive(parse_display::Display, Serialize, Deserialize, Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKind {
    #[display("smoke test")]
    SmokeTest,

    #[display("job group")]
    JobGroup,

    #[display("job")]
    Job,
}

impl TrackedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackedKind::SmokeTest => "smoke_test",
            TrackedKind::JobGroup => "job_group",
            TrackedKind::Job => "job",
        }
    }
}

/// An entity whose status is governed by the transition rules above
pub trait Tracked {
    const KIND: TrackedKind;

    fn status(&self) -> Status;

    fn set_status(&mut self, status: Status, updated_at: NaiveDateTime);

    /// Move to `next`, stamping `updated_at`. Leaves the entity untouched on error.
    fn advance(&mut self, next: Status, updated_at: NaiveDateTime) -> Result<Status, TransitionError> {
        let next = self.status().transition(next)?;
        self.set_status(next, updated_at);
        Ok(next)
    }
}
