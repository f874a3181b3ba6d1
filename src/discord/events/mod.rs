// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use twilight_http::client::Client;
use twilight_model::gateway::payload::incoming::MemberAdd;

mod welcome;

pub async fn route_member_add(
	member_add: &MemberAdd,
	config: &ConfigDocument,
	http_client: &Client,
) -> miette::Result<()> {
	welcome::handle_member_join(member_add, config, http_client).await
}
