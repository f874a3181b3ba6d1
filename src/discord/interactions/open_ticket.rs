// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{APPLICATION_MODAL_ID, CLOSE_BUTTON_ID};
use crate::config::ConfigDocument;
use crate::discord::categories::resolve_category;
use crate::discord::state::tickets::{OpenTickets, TicketKind};
use crate::discord::utils::channel_name::ticket_channel_name;
use crate::discord::utils::responses::ephemeral_response;
use crate::discord::utils::timestamp::timestamp_from_id;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::channel::ChannelType;
use twilight_model::channel::message::component::{
	ActionRow, Button, ButtonStyle, Component, TextInput, TextInputStyle,
};
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, GuildMarker, InteractionMarker, UserMarker};
use twilight_model::user::User;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::embed::EmbedBuilder;
use type_map::concurrent::TypeMap;

const TICKET_COLOR: u32 = 0x2ecc71;
const DUPLICATE_TICKET_MESSAGE: &str = "You already have an open ticket!";
const CREATE_FAILED_MESSAGE: &str = "Failed to create your ticket channel. Please try again later.";

pub const APPLICATION_QUESTIONS: [&str; 5] = [
	"Why do you want to join the staff team?",
	"How old are you?",
	"What times are you usually available?",
	"Do you have any moderation experience?",
	"Anything else we should know about you?",
];

const APPLICATION_FOLLOW_UP: &str =
	"Thanks for applying! A staff member will review your answers and follow up here with the next steps of the assessment.";

pub async fn handle_open(
	interaction: &InteractionCreate,
	kind: TicketKind,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let Some(interaction_member) = &interaction.member else {
		bail!("Interaction isn't from a user");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};

	let interaction_client = http_client.interaction(application_id);

	if kind.requires_application() {
		// Duplicate check up front so nobody fills out a form for a ticket that would be rejected
		// anyway. The authoritative check happens again at reservation time.
		let has_ticket = {
			let state = bot_state.read().await;
			state
				.get::<OpenTickets>()
				.is_some_and(|tickets| tickets.has_ticket(interaction_user.id))
		};
		if has_ticket {
			let response = ephemeral_response(DUPLICATE_TICKET_MESSAGE);
			interaction_client
				.create_response(interaction.id, &interaction.token, &response)
				.await
				.into_diagnostic()?;
			return Ok(());
		}

		let response = application_modal();
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	let opening_message = format!(
		"Hello {}, a staff member will assist you shortly.\n**Type:** {}",
		interaction_user.id.mention(),
		kind
	);
	create_ticket_channel(
		interaction,
		interaction_user,
		kind,
		&opening_message,
		None,
		config,
		http_client,
		application_id,
		bot_state,
	)
	.await
}

pub async fn handle_application_modal(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let Some(interaction_member) = &interaction.member else {
		bail!("Modal submitted outside of a guild member context");
	};
	let Some(interaction_user) = &interaction_member.user else {
		bail!("Interaction member is not a user");
	};

	let mut answers: Vec<(usize, String)> = Vec::new();
	for row in modal_data.components.iter() {
		for component in row.components.iter() {
			if let Some(index) = component.custom_id.strip_prefix("answer/") {
				let index: usize = index.parse().into_diagnostic()?;
				answers.push((index, component.value.clone().unwrap_or_default()));
			}
		}
	}
	answers.sort_by_key(|(index, _)| *index);

	let body = application_body(interaction_user.id, &answers)?;

	create_ticket_channel(
		interaction,
		interaction_user,
		TicketKind::JoinStaff,
		&body,
		Some(APPLICATION_FOLLOW_UP),
		config,
		http_client,
		application_id,
		bot_state,
	)
	.await
}

/// Renders a staff application into the opening message for its ticket channel: the applicant's
/// mention followed by each question with the submitted answer, in question order.
fn application_body(applicant: Id<UserMarker>, answers: &[(usize, String)]) -> miette::Result<String> {
	let mut body = format!("{} has applied to join the staff team.", applicant.mention());
	for (index, answer) in answers {
		let Some(question) = APPLICATION_QUESTIONS.get(*index) else {
			bail!("Staff application answer references an unknown question: {}", index);
		};
		body = format!("{}\n\n**{}**\n{}", body, question, answer);
	}
	Ok(body)
}

/// Provisions a ticket channel for the user and records it as their open ticket. Every failure
/// path releases the user's reservation and answers the interaction with an ephemeral message, so
/// a failed attempt leaves no partial state behind.
async fn create_ticket_channel(
	interaction: &InteractionCreate,
	user: &User,
	kind: TicketKind,
	opening_message: &str,
	follow_up: Option<&str>,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let Some(guild_id) = interaction.guild_id else {
		bail!("Ticket interaction used outside of a guild");
	};
	let interaction_client = http_client.interaction(application_id);

	// Reserve the user's slot before anything awaits; otherwise two near-simultaneous requests
	// from the same user could both pass the duplicate check.
	let reserved = {
		let mut state = bot_state.write().await;
		let open_tickets = state.entry::<OpenTickets>().or_insert_with(OpenTickets::default);
		open_tickets.reserve(user.id)
	};
	if !reserved {
		let response = ephemeral_response(DUPLICATE_TICKET_MESSAGE);
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	let category = match resolve_category(kind, guild_id, http_client, &bot_state).await {
		Ok(Some(category)) => category,
		Ok(None) => {
			release_reservation(&bot_state, user.id).await;
			let response = ephemeral_response(format!(
				"The {} ticket category is unavailable right now. Please try again later.",
				kind
			));
			interaction_client
				.create_response(interaction.id, &interaction.token, &response)
				.await
				.into_diagnostic()?;
			return Ok(());
		}
		Err(error) => {
			release_reservation(&bot_state, user.id).await;
			tracing::error!(source = ?error, "Failed to resolve a ticket category");
			let response = ephemeral_response(CREATE_FAILED_MESSAGE);
			interaction_client
				.create_response(interaction.id, &interaction.token, &response)
				.await
				.into_diagnostic()?;
			return Ok(());
		}
	};

	let channel_name = ticket_channel_name(kind, &user.name);
	let permission_overwrites: Vec<twilight_model::channel::permission_overwrite::PermissionOverwrite> =
		ticket_permission_overwrites(guild_id, user.id, kind, config)
			.into_iter()
			.map(|overwrite| twilight_model::channel::permission_overwrite::PermissionOverwrite {
				allow: overwrite.allow.unwrap_or(Permissions::empty()),
				deny: overwrite.deny.unwrap_or(Permissions::empty()),
				id: overwrite.id,
				kind: twilight_model::channel::permission_overwrite::PermissionOverwriteType::from(
					overwrite.kind as u8,
				),
			})
			.collect();

	let created = http_client
		.create_guild_channel(guild_id, &channel_name)
		.kind(ChannelType::GuildText)
		.parent_id(category)
		.permission_overwrites(&permission_overwrites)
		.await;
	let channel = match created {
		Ok(response) => match response.model().await {
			Ok(channel) => channel,
			Err(error) => {
				release_reservation(&bot_state, user.id).await;
				tracing::error!(source = ?error, "Failed to read the created ticket channel");
				let response = ephemeral_response(CREATE_FAILED_MESSAGE);
				interaction_client
					.create_response(interaction.id, &interaction.token, &response)
					.await
					.into_diagnostic()?;
				return Ok(());
			}
		},
		Err(error) => {
			release_reservation(&bot_state, user.id).await;
			tracing::error!(source = ?error, "Failed to create a ticket channel");
			let response = ephemeral_response(CREATE_FAILED_MESSAGE);
			interaction_client
				.create_response(interaction.id, &interaction.token, &response)
				.await
				.into_diagnostic()?;
			return Ok(());
		}
	};

	let opening_result = post_opening_message(channel.id, user, opening_message, interaction.id, http_client).await;
	if let Err(error) = opening_result {
		tracing::error!(source = ?error, "Failed to post the opening message in a new ticket channel");
		// Don't leave a channel around that isn't tracked as anyone's ticket.
		if let Err(error) = http_client.delete_channel(channel.id).await {
			tracing::warn!(source = ?error, "Failed to delete the unusable ticket channel");
		}
		release_reservation(&bot_state, user.id).await;
		let response = ephemeral_response(CREATE_FAILED_MESSAGE);
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	if let Some(follow_up) = follow_up {
		let follow_up_result = http_client.create_message(channel.id).content(follow_up).await;
		if let Err(error) = follow_up_result {
			tracing::warn!(source = ?error, "Failed to send the follow-up message in a new ticket channel");
		}
	}

	{
		let mut state = bot_state.write().await;
		let Some(open_tickets) = state.get_mut::<OpenTickets>() else {
			bail!("Open ticket tracking disappeared while creating a ticket");
		};
		open_tickets.complete(user.id, channel.id);
	}

	let response = ephemeral_response(format!("✅ Your ticket has been created: {}", channel.id.mention()));
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	Ok(())
}

async fn release_reservation(bot_state: &Arc<RwLock<TypeMap>>, user: Id<UserMarker>) {
	let mut state = bot_state.write().await;
	if let Some(open_tickets) = state.get_mut::<OpenTickets>() {
		open_tickets.release(user);
	}
}

async fn post_opening_message(
	channel: Id<ChannelMarker>,
	user: &User,
	message: &str,
	interaction_id: Id<InteractionMarker>,
	http_client: &Client,
) -> miette::Result<()> {
	let opened_at = timestamp_from_id(interaction_id).into_diagnostic()?;
	let embed = EmbedBuilder::new()
		.title(format!("📬 Ticket opened by {}", user.name))
		.description(message)
		.color(TICKET_COLOR)
		.timestamp(opened_at)
		.validate()
		.into_diagnostic()?
		.build();

	let close_button = Button {
		custom_id: Some(String::from(CLOSE_BUTTON_ID)),
		disabled: false,
		emoji: None,
		label: Some(String::from("Close Ticket")),
		style: ButtonStyle::Danger,
		url: None,
		sku_id: None,
	};
	let close_row = Component::ActionRow(ActionRow {
		components: vec![Component::Button(close_button)],
	});

	http_client
		.create_message(channel)
		.embeds(&[embed])
		.components(&[close_row])
		.await
		.into_diagnostic()?;

	Ok(())
}

/// The visibility grants for a new ticket channel: hidden from everyone, visible to the opener,
/// the kind's staff role, and the owner role.
fn ticket_permission_overwrites(
	guild_id: Id<GuildMarker>,
	user: Id<UserMarker>,
	kind: TicketKind,
	config: &ConfigDocument,
) -> Vec<PermissionOverwrite> {
	let participant_permissions = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
	let everyone_role = guild_id.cast();
	let allowed_role = kind.allowed_role(config);
	let owner_role = config.get_owner_role();

	let mut overwrites = vec![
		PermissionOverwrite {
			allow: None,
			deny: Some(Permissions::VIEW_CHANNEL),
			id: everyone_role,
			kind: PermissionOverwriteType::Role,
		},
		PermissionOverwrite {
			allow: Some(participant_permissions),
			deny: None,
			id: user.cast(),
			kind: PermissionOverwriteType::Member,
		},
		PermissionOverwrite {
			allow: Some(participant_permissions),
			deny: None,
			id: allowed_role.cast(),
			kind: PermissionOverwriteType::Role,
		},
	];
	// The owner role sees every ticket; skip the duplicate grant when it's also the staffing role.
	if owner_role != allowed_role {
		overwrites.push(PermissionOverwrite {
			allow: Some(participant_permissions),
			deny: None,
			id: owner_role.cast(),
			kind: PermissionOverwriteType::Role,
		});
	}
	overwrites
}

fn application_modal() -> InteractionResponse {
	let inputs: Vec<Component> = APPLICATION_QUESTIONS
		.iter()
		.enumerate()
		.map(|(index, question)| {
			let input = TextInput {
				custom_id: format!("answer/{}", index),
				label: question.to_string(),
				max_length: None,
				min_length: None,
				placeholder: None,
				required: Some(true),
				style: TextInputStyle::Paragraph,
				value: None,
			};
			Component::ActionRow(ActionRow {
				components: vec![Component::TextInput(input)],
			})
		})
		.collect();

	let response_data = InteractionResponseDataBuilder::new()
		.custom_id(APPLICATION_MODAL_ID)
		.title("Staff Application")
		.components(inputs)
		.build();
	InteractionResponse {
		kind: InteractionResponseType::Modal,
		data: Some(response_data),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::WelcomeConfig;

	fn test_config() -> ConfigDocument {
		ConfigDocument {
			discord_token: String::new(),
			panel_channel: 1,
			support_role: 200,
			owner_role: 300,
			welcome: WelcomeConfig { role: 4, channel: 5 },
			health_port: 8080,
		}
	}

	#[test]
	fn support_ticket_grants_opener_support_and_owner() {
		let config = test_config();
		let guild_id = Id::new(50);
		let overwrites = ticket_permission_overwrites(guild_id, Id::new(7), TicketKind::Support, &config);

		assert_eq!(overwrites.len(), 4);

		let everyone = &overwrites[0];
		assert_eq!(everyone.id, guild_id.cast());
		assert_eq!(everyone.deny, Some(Permissions::VIEW_CHANNEL));
		assert_eq!(everyone.allow, None);

		let opener = &overwrites[1];
		assert_eq!(opener.id, Id::new(7));
		assert_eq!(opener.kind, PermissionOverwriteType::Member);
		assert_eq!(
			opener.allow,
			Some(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES)
		);

		let role_ids: Vec<u64> = overwrites[2..].iter().map(|overwrite| overwrite.id.get()).collect();
		assert_eq!(role_ids, vec![200, 300]);
	}

	#[test]
	fn owner_role_grant_is_not_duplicated_for_contact_owner() {
		let config = test_config();
		let overwrites = ticket_permission_overwrites(Id::new(50), Id::new(7), TicketKind::ContactOwner, &config);

		assert_eq!(overwrites.len(), 3);
		let owner_grants = overwrites
			.iter()
			.filter(|overwrite| overwrite.id.get() == config.owner_role)
			.count();
		assert_eq!(owner_grants, 1);
	}

	#[test]
	fn application_body_renders_every_answer_verbatim() {
		let answers: Vec<(usize, String)> = APPLICATION_QUESTIONS
			.iter()
			.enumerate()
			.map(|(index, _)| (index, format!("answer number {}", index)))
			.collect();

		let body = application_body(Id::new(7), &answers).expect("all questions are known");

		let applicant: Id<UserMarker> = Id::new(7);
		assert!(body.starts_with(&format!("{} has applied to join the staff team.", applicant.mention())));
		for (index, question) in APPLICATION_QUESTIONS.iter().enumerate() {
			let section = format!("**{}**\nanswer number {}", question, index);
			assert!(body.contains(&section), "missing section for question {}: {}", index, body);
		}
	}

	#[test]
	fn application_answers_keep_question_order() {
		let mut answers = vec![(1, String::from("second")), (0, String::from("first"))];
		answers.sort_by_key(|(index, _)| *index);
		let body = application_body(Id::new(7), &answers).expect("all questions are known");

		let first_at = body.find("first").expect("first answer is present");
		let second_at = body.find("second").expect("second answer is present");
		assert!(first_at < second_at);
	}

	#[test]
	fn unknown_question_indices_are_rejected() {
		let answers = vec![(APPLICATION_QUESTIONS.len(), String::from("out of range"))];
		assert!(application_body(Id::new(7), &answers).is_err());
	}

	#[test]
	fn application_modal_asks_every_question() {
		let modal = application_modal();
		let data = modal.data.expect("modal carries response data");
		assert_eq!(data.custom_id.as_deref(), Some(APPLICATION_MODAL_ID));
		assert_eq!(
			data.components.map(|components| components.len()),
			Some(APPLICATION_QUESTIONS.len())
		);
	}
}
