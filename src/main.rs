// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use gatehouse::{config, discord, health};
use std::sync::Arc;

#[tokio::main]
async fn main() -> miette::Result<()> {
	tracing_subscriber::fmt::init();

	let config = config::parse_config("config.kdl").await?;
	let config = Arc::new(config);

	let http_client = discord::set_up_client(&config);

	tokio::spawn(health::run_server_task(Arc::clone(&config)));

	discord::run_bot(config, http_client).await
}
