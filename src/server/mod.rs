//
// Copyright (c) 2020-2022 science+computing ag and other contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

//! HTTP surface of the job resource

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use axum::routing::get;
use axum::routing::put;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::error;
use tracing::info;

use crate::api::JobRepository;
use crate::auth::Authorizer;

mod body;
mod handlers;
mod response;

#[derive(Clone)]
pub struct AppState {
    pub repository: JobRepository,
    pub authorizer: Arc<dyn Authorizer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(handlers::list_jobs).post(handlers::create_job))
        .route("/jobs.json", get(handlers::list_jobs).post(handlers::create_job))
        .route("/jobs.xml", get(handlers::list_jobs).post(handlers::create_job))
        .route(
            "/jobs/{id}",
            get(handlers::get_job)
                .put(handlers::update_job)
                .delete(handlers::delete_job),
        )
        .route("/jobs/{id}/status", put(handlers::job_status))
        .route("/job_groups/{id}/status", put(handlers::job_group_status))
        .route("/smoke_tests/{id}/status", put(handlers::smoke_test_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding to {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Running HTTP server")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await
        }
    }
}
