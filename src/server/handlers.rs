//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;

use crate::db::models::JobFields;
use crate::db::models::JobOutput;
use crate::error::EntityKind;
use crate::error::Error;
use crate::error::Result;
use crate::error::ValidationErrors;
use crate::format::render_job;
use crate::format::render_job_list;
use crate::format::render_status_change;
use crate::format::Format;
use crate::format::StatusChange;
use crate::server::body;
use crate::server::body::BodyFormat;
use crate::server::body::StatusRequest;
use crate::server::response::created;
use crate::server::response::failure;
use crate::server::response::negotiate;
use crate::server::response::ok;
use crate::server::response::segment_format;
use crate::server::response::FormatQuery;
use crate::server::AppState;
use crate::status::Status;
use crate::status::TrackedKind;

/// Run a store operation off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Other(anyhow::Error::from(e)))?
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn parse_id(kind: EntityKind, stem: &str) -> Result<i32> {
    stem.parse::<i32>().map_err(|_| Error::not_found(kind, stem))
}

/// Format of the collection routes, `/jobs.json` and `/jobs.xml` name theirs in the path
fn collection_format(uri: &Uri, query: &FormatQuery, headers: &HeaderMap) -> std::result::Result<Format, Response> {
    let segment = uri.path().rsplit('/').next().unwrap_or_default();
    segment_format(segment, query, headers).map(|(_, format)| format)
}

pub async fn list_jobs(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Response {
    let format = match collection_format(&uri, &query, &headers) {
        Ok(_) if query.table_only() => Format::Native,
        Ok(format) => format,
        Err(response) => return response,
    };

    let repository = state.repository.clone();
    let include_related = query.include_related();
    let rendered = blocking(move || repository.list_jobs(include_related))
        .await
        .and_then(|listings| render_job_list(format, &listings, query.table_only()));

    match rendered {
        Ok(content) => ok(format, content),
        Err(e) => failure(format, e),
    }
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Response {
    let (stem, format) = match segment_format(&segment, &query, &headers) {
        Ok(negotiated) => negotiated,
        Err(response) => return response,
    };

    let rendered = match parse_id(EntityKind::Job, stem) {
        Ok(id) => {
            let repository = state.repository.clone();
            blocking(move || repository.get_job(id))
                .await
                .and_then(|job| render_job(format, &job))
        }
        Err(e) => Err(e),
    };

    match rendered {
        Ok(content) => ok(format, content),
        Err(e) => failure(format, e),
    }
}

pub async fn create_job(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    let format = match collection_format(&uri, &query, &headers) {
        Ok(format) => format,
        Err(response) => return response,
    };
    let body_format = match BodyFormat::from_headers(&headers) {
        Ok(body_format) => body_format,
        Err(response) => return response,
    };

    let credentials = authorization(&headers);
    let job = blocking(move || {
        let who = state.authorizer.authorize(credentials.as_deref())?;
        let fields = body::parse::<JobFields>(body_format, "job", Some("job"), &content)?;
        state.repository.create_job(&who, fields)
    })
    .await;

    match job {
        Ok(job) => {
            let location = format!("/jobs/{}", job.id);
            match format {
                Format::Native => Redirect::to(&location).into_response(),
                _ => match render_job(format, &job) {
                    Ok(rendered) => created(format, location, rendered),
                    Err(e) => failure(format, e),
                },
            }
        }
        Err(e) => failure(format, e),
    }
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    let (stem, format) = match segment_format(&segment, &query, &headers) {
        Ok(negotiated) => negotiated,
        Err(response) => return response,
    };
    let body_format = match BodyFormat::from_headers(&headers) {
        Ok(body_format) => body_format,
        Err(response) => return response,
    };

    let credentials = authorization(&headers);
    let id = parse_id(EntityKind::Job, stem);
    let rendered = blocking(move || {
        let who = state.authorizer.authorize(credentials.as_deref())?;
        let output = body::parse::<JobOutput>(body_format, "job", Some("job"), &content)?;
        state.repository.update_job(&who, id?, output)
    })
    .await
    .and_then(|job| render_job(format, &job));

    match rendered {
        Ok(content) => ok(format, content),
        Err(e) => failure(format, e),
    }
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
) -> Response {
    let (stem, format) = match segment_format(&segment, &query, &headers) {
        Ok(negotiated) => negotiated,
        Err(response) => return response,
    };

    let credentials = authorization(&headers);
    let id = parse_id(EntityKind::Job, stem);
    let snapshot = blocking(move || {
        let who = state.authorizer.authorize(credentials.as_deref())?;
        state.repository.delete_job(&who, id?)
    })
    .await;

    match snapshot {
        Ok(_) if format == Format::Native => Redirect::to("/jobs").into_response(),
        Ok(snapshot) => ok(format, snapshot.render(format)),
        Err(e) => failure(format, e),
    }
}

async fn set_status(
    kind: TrackedKind,
    state: AppState,
    segment: String,
    query: FormatQuery,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    let format = match negotiate(None, &query, &headers) {
        Ok(format) => format,
        Err(response) => return response,
    };
    let body_format = match BodyFormat::from_headers(&headers) {
        Ok(body_format) => body_format,
        Err(response) => return response,
    };

    let credentials = authorization(&headers);
    let id = parse_id(kind.into(), &segment);
    let change = blocking(move || {
        let who = state.authorizer.authorize(credentials.as_deref())?;
        let id = id?;
        let request = body::parse::<StatusRequest>(body_format, "status", None, &content)?;
        let next = request.status.parse::<Status>().map_err(|e| {
            let mut errors = ValidationErrors::default();
            errors.add("status", e.to_string());
            Error::ValidationFailed(errors)
        })?;

        let status = state.repository.transition(&who, kind, id, next)?;
        Ok(StatusChange::new(kind, id, status))
    })
    .await
    .and_then(|change| render_status_change(format, &change));

    match change {
        Ok(content) => ok(format, content),
        Err(e) => failure(format, e),
    }
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    set_status(TrackedKind::Job, state, segment, query, headers, content).await
}

pub async fn job_group_status(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    set_status(TrackedKind::JobGroup, state, segment, query, headers, content).await
}

pub async fn smoke_test_status(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<FormatQuery>,
    headers: HeaderMap,
    content: Bytes,
) -> Response {
    set_status(TrackedKind::SmokeTest, state, segment, query, headers, content).await
}
