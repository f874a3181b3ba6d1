// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use axum::Router;
use axum::routing::get;
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run_server_task(config: Arc<ConfigDocument>) {
	let task_result = run_server(config).await;
	if let Err(error) = task_result {
		tracing::error!(source = ?error, "Liveness server failed to run");
	}
}

async fn run_server(config: Arc<ConfigDocument>) -> miette::Result<()> {
	let app = Router::new().route("/", get(liveness));

	let listener = TcpListener::bind(("0.0.0.0", config.health_port))
		.await
		.into_diagnostic()?;
	tracing::info!(port = config.health_port, "Liveness endpoint listening");
	axum::serve(listener, app).await.into_diagnostic()?;

	Ok(())
}

async fn liveness() -> &'static str {
	"Gatehouse is running"
}
