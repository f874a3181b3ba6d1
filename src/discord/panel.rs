// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::categories::ensure_categories;
use super::interactions::TICKET_MENU_ID;
use super::state::tickets::TicketKind;
use crate::config::ConfigDocument;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_http::client::Client;
use twilight_model::channel::message::EmojiReactionType;
use twilight_model::channel::message::component::{
	ActionRow, Component, SelectMenu, SelectMenuOption, SelectMenuType,
};
use twilight_model::gateway::payload::incoming::Ready;
use twilight_util::builder::embed::EmbedBuilder;
use type_map::concurrent::TypeMap;

const PANEL_TITLE: &str = "🎫 Open a Ticket";
const PANEL_COLOR: u32 = 0x0099ff;

/// Runs guild setup when the gateway reports ready: category provisioning and the ticket panel.
/// Setup failures abort this step only; the bot keeps running without a usable panel.
pub async fn handle_ready(
	ready: &Ready,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	bot_state: Arc<RwLock<TypeMap>>,
) {
	let setup_result = set_up_guild(ready, config, http_client, bot_state).await;
	if let Err(error) = setup_result {
		tracing::error!(source = ?error, "Failed to set up the ticket panel");
	}
}

async fn set_up_guild(
	ready: &Ready,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let Some(guild) = ready.guilds.first() else {
		bail!("The bot must be in a guild to manage tickets");
	};

	ensure_categories(guild.id, http_client, &bot_state).await?;
	publish_panel(ready, config, http_client).await?;

	Ok(())
}

async fn publish_panel(
	ready: &Ready,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
) -> miette::Result<()> {
	let panel_channel = config.get_panel_channel();

	// Replace any panel left over from a previous run so the channel doesn't accumulate them.
	let recent_messages = http_client
		.channel_messages(panel_channel)
		.limit(10)
		.await
		.into_diagnostic()?
		.models()
		.await
		.into_diagnostic()?;
	let old_panel = recent_messages.iter().find(|message| {
		message.author.id == ready.user.id
			&& message
				.embeds
				.first()
				.is_some_and(|embed| embed.title.as_deref() == Some(PANEL_TITLE))
	});
	if let Some(old_panel) = old_panel {
		let delete_result = http_client.delete_message(panel_channel, old_panel.id).await;
		if let Err(error) = delete_result {
			tracing::warn!(source = ?error, "Could not delete the previous ticket panel");
		}
	}

	let embed = EmbedBuilder::new()
		.title(PANEL_TITLE)
		.description("Please select the type of ticket you'd like to open:")
		.color(PANEL_COLOR)
		.validate()
		.into_diagnostic()?
		.build();

	let menu_options: Vec<SelectMenuOption> = TicketKind::all_kinds()
		.into_iter()
		.map(|kind| SelectMenuOption {
			default: false,
			description: Some(kind.menu_description().to_string()),
			emoji: Some(EmojiReactionType::Unicode {
				name: kind.menu_emoji().to_string(),
			}),
			label: kind.menu_label().to_string(),
			value: kind.as_id().to_string(),
		})
		.collect();
	let menu = SelectMenu {
		channel_types: None,
		custom_id: String::from(TICKET_MENU_ID),
		default_values: None,
		disabled: false,
		kind: SelectMenuType::Text,
		max_values: None,
		min_values: None,
		options: Some(menu_options),
		placeholder: Some(String::from("Choose a ticket type...")),
	};
	let menu_row = Component::ActionRow(ActionRow {
		components: vec![Component::SelectMenu(menu)],
	});

	http_client
		.create_message(panel_channel)
		.embeds(&[embed])
		.components(&[menu_row])
		.await
		.into_diagnostic()?;

	tracing::info!("Ticket panel published");
	Ok(())
}
