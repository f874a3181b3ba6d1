// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::tickets::OpenTickets;
use crate::discord::utils::responses::ephemeral_response;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, sleep};
use twilight_http::client::Client;
use twilight_model::channel::Channel;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, UserMarker};
use type_map::concurrent::TypeMap;

/// How long the close acknowledgment stays visible before the channel disappears.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(2);

pub async fn handle_close(
	interaction: &InteractionCreate,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let interaction_client = http_client.interaction(application_id);
	let Some(channel) = interaction.channel.as_ref() else {
		bail!("Close button used outside of a channel");
	};

	// Only channels under a category can be tickets.
	if channel.parent_id.is_none() {
		let response = ephemeral_response("This button can only be used inside a ticket channel.");
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	// The map may have no entry for this channel, such as for a ticket that survived a restart;
	// the channel is still closed either way.
	let opener = {
		let mut state = bot_state.write().await;
		state
			.get_mut::<OpenTickets>()
			.and_then(|tickets| tickets.remove_by_channel(channel.id))
	};

	if let Some(opener) = opener {
		notify_opener(opener, channel, http_client).await;
	}

	let response = ephemeral_response("✅ Closing this ticket...");
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	sleep(CLOSE_GRACE_PERIOD).await;
	if let Err(error) = http_client.delete_channel(channel.id).await {
		tracing::warn!(source = ?error, "Failed to delete a closed ticket channel");
	}

	Ok(())
}

/// Tells the opener their ticket was closed. Best-effort: the user may have DMs disabled, and a
/// failed notice must not block closing the ticket.
async fn notify_opener(opener: Id<UserMarker>, channel: &Channel, http_client: &Client) {
	let notify_result = send_close_notice(opener, channel, http_client).await;
	if let Err(error) = notify_result {
		tracing::debug!(source = ?error, "Could not notify a ticket opener of closure");
	}
}

async fn send_close_notice(opener: Id<UserMarker>, channel: &Channel, http_client: &Client) -> miette::Result<()> {
	let dm_channel = http_client
		.create_private_channel(opener)
		.await
		.into_diagnostic()?
		.model()
		.await
		.into_diagnostic()?;
	let channel_name = channel.name.as_deref().unwrap_or("ticket");
	http_client
		.create_message(dm_channel.id)
		.content(&format!("✅ Your ticket (**{}**) has been closed.", channel_name))
		.await
		.into_diagnostic()?;
	Ok(())
}
