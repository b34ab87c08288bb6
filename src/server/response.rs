//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! Format negotiation and the mapping of results onto HTTP responses

use axum::http::header;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use tracing::error;

use crate::error::Error;
use crate::format::render_error;
use crate::format::Format;

/// Query parameters every route understands
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
    pub table_only: Option<String>,
    pub include_related: Option<String>,
}

fn flag(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"),
    }
}

impl FormatQuery {
    /// Set by its mere presence, whatever the value
    pub fn table_only(&self) -> bool {
        self.table_only.is_some()
    }

    pub fn include_related(&self) -> bool {
        flag(self.include_related.as_deref(), true)
    }
}

fn not_acceptable(message: String) -> Response {
    (StatusCode::NOT_ACCEPTABLE, message).into_response()
}

/// Pick the response format: path extension, then `format` parameter, then `Accept` header
pub fn negotiate(extension: Option<Format>, query: &FormatQuery, headers: &HeaderMap) -> Result<Format, Response> {
    if let Some(format) = extension {
        return Ok(format);
    }

    if let Some(requested) = query.format.as_deref() {
        return requested.parse().map_err(|e| not_acceptable(format!("{}", e)));
    }

    Ok(headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(Format::from_accept)
        .unwrap_or_default())
}

/// Split `12.json` into `12` and the negotiated format
pub fn segment_format<'a>(
    segment: &'a str,
    query: &FormatQuery,
    headers: &HeaderMap,
) -> Result<(&'a str, Format), Response> {
    let (stem, extension) = Format::split_extension(segment).map_err(|e| not_acceptable(e.to_string()))?;
    negotiate(extension, query, headers).map(|format| (stem, format))
}

pub fn body(status: StatusCode, format: Format, content: String) -> Response {
    (status, [(header::CONTENT_TYPE, format.content_type())], content).into_response()
}

pub fn ok(format: Format, content: String) -> Response {
    body(StatusCode::OK, format, content)
}

pub fn created(format: Format, location: String, content: String) -> Response {
    (
        StatusCode::CREATED,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::LOCATION, location),
        ],
        content,
    )
        .into_response()
}

pub fn status_of(error: &Error) -> StatusCode {
    match error {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Transition(_) => StatusCode::CONFLICT,
        Error::AuthorizationDenied(_) => StatusCode::UNAUTHORIZED,
        Error::Database(_) | Error::Pool(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn failure(format: Format, error: Error) -> Response {
    let status = status_of(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:?}", error);
    }

    let content = render_error(format, &error).unwrap_or_else(|_| error.to_string());
    let mut response = body(status, format, content);
    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            header::HeaderValue::from_static("Basic realm=\"smokestack\""),
        );
    }
    response
}
