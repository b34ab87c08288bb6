//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error as ThisError;

use crate::status::TrackedKind;
use crate::status::TransitionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(parse_display::Display, Serialize, Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[display("smoke test")]
    SmokeTest,

    #[display("config template")]
    ConfigTemplate,

    #[display("package builder")]
    PackageBuilder,

    #[display("job group")]
    JobGroup,

    #[display("job")]
    Job,

    #[display("user")]
    User,
}

impl From<TrackedKind> for EntityKind {
    fn from(kind: TrackedKind) -> Self {
        match kind {
            TrackedKind::SmokeTest => EntityKind::SmokeTest,
            TrackedKind::JobGroup => EntityKind::JobGroup,
            TrackedKind::Job => EntityKind::Job,
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("No {kind} with id {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Not authorized: {0}")]
    AuthorizationDenied(String),

    #[error("Database error")]
    Database(#[from] diesel::result::Error),

    #[error("Database connection pool error")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found<I: ToString>(kind: EntityKind, id: I) -> Self {
        Error::NotFound { kind, id: id.to_string() }
    }

    /// Short machine readable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::ValidationFailed(_) => "validation_failed",
            Error::Transition(TransitionError::InvalidTransition { .. }) => "invalid_transition",
            Error::Transition(TransitionError::TerminalStateViolation { .. }) => "terminal_state_violation",
            Error::AuthorizationDenied(_) => "authorization_denied",
            Error::Database(_) | Error::Pool(_) | Error::Other(_) => "internal",
        }
    }
}

/// Field name to the list of messages about that field
#[derive(Serialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// "field message" for every message, ordered by field
    pub fn full_messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{} {}", field, m)))
            .collect()
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut e = ValidationErrors::default();
        assert!(e.clone().into_result().is_ok());

        e.add("job_group_id", "can't be blank");
        e.add("config_template_id", "must reference an existing config template");
        e.add("job_group_id", "must be a number");

        assert_eq!(e.get("job_group_id").unwrap().len(), 2);
        assert_eq!(
            e.full_messages(),
            vec![
                "config_template_id must reference an existing config template",
                "job_group_id can't be blank",
                "job_group_id must be a number",
            ]
        );
        assert!(matches!(e.into_result(), Err(Error::ValidationFailed(_))));
    }

    #[test]
    fn test_kind_names() {
        let e = Error::not_found(EntityKind::Job, 3);
        assert_eq!(e.kind(), "not_found");
        assert_eq!(e.to_string(), "No job with id 3");

        let e = Error::from(Status::Failed.transition(Status::Running).unwrap_err());
        assert_eq!(e.kind(), "terminal_state_violation");
    }
}
