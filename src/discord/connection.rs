// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::events::route_member_add;
use super::interactions::{route_component, route_modal};
use super::panel::handle_ready;
use crate::config::ConfigDocument;
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_cache_inmemory::{DefaultInMemoryCache, ResourceType};
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use type_map::concurrent::TypeMap;

pub fn set_up_client(config: &ConfigDocument) -> Arc<Client> {
	Arc::new(Client::new(config.discord_token.clone()))
}

pub async fn run_bot(config: Arc<ConfigDocument>, http_client: Arc<Client>) -> miette::Result<()> {
	let intents = Intents::GUILDS | Intents::GUILD_MEMBERS;

	let mut shard = Shard::new(ShardId::ONE, config.discord_token.clone(), intents);

	let cache = DefaultInMemoryCache::builder()
		.resource_types(ResourceType::all())
		.build();

	let application_id = {
		let application_response = http_client.current_user_application().await.into_diagnostic()?;
		application_response.model().await.into_diagnostic()?.id
	};

	let bot_state = Arc::new(RwLock::new(TypeMap::new()));

	while let Some(event) = shard.next_event(EventTypeFlags::all()).await {
		let event = match event {
			Ok(event) => event,
			Err(error) => {
				tracing::warn!(source = ?error, "error receiving event");
				continue;
			}
		};
		cache.update(&event);

		tokio::spawn(handle_event(
			event,
			Arc::clone(&config),
			Arc::clone(&http_client),
			application_id,
			Arc::clone(&bot_state),
		));
	}

	Ok(())
}

async fn handle_event(
	event: Event,
	config: Arc<ConfigDocument>,
	http_client: Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) {
	let event_result = handle_event_route(event, config, http_client, application_id, bot_state).await;
	if let Err(error) = event_result {
		tracing::error!(source = ?error, "An error occurred handling a gateway event");
	}
}

async fn handle_event_route(
	event: Event,
	config: Arc<ConfigDocument>,
	http_client: Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	tracing::debug!("Incoming gateway message: {:?}", event);
	match event {
		Event::InteractionCreate(interaction) => match &interaction.data {
			Some(InteractionData::MessageComponent(interaction_data)) => {
				route_component(
					&interaction,
					interaction_data,
					&config,
					&http_client,
					application_id,
					bot_state,
				)
				.await?
			}
			Some(InteractionData::ModalSubmit(modal_data)) => {
				route_modal(
					&interaction,
					modal_data,
					&config,
					&http_client,
					application_id,
					bot_state,
				)
				.await?
			}
			_ => (),
		},
		Event::MemberAdd(member_add) => route_member_add(&member_add, &config, &http_client).await?,
		Event::Ready(ready) => {
			tracing::info!("Discord gateway is ready");
			handle_ready(&ready, &config, &http_client, bot_state).await;
		}
		_ => (),
	}
	Ok(())
}
