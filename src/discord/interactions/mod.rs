// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::state::tickets::TicketKind;
use crate::config::ConfigDocument;
use miette::bail;
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_http::client::Client;
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use type_map::concurrent::TypeMap;

mod close_ticket;
mod open_ticket;

pub const TICKET_MENU_ID: &str = "ticket_panel/menu";
pub const CLOSE_BUTTON_ID: &str = "ticket/close";
pub const APPLICATION_MODAL_ID: &str = "ticket/application";
const OPEN_BUTTON_PREFIX: &str = "open_ticket/";

/// A component interaction the bot handles, parsed from its custom ID. Custom IDs that don't parse
/// belong to components the bot didn't publish and are ignored by the router.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComponentAction {
	PanelMenu,
	OpenButton(TicketKind),
	CloseButton,
}

impl ComponentAction {
	pub fn parse(custom_id: &str) -> Option<Self> {
		if custom_id == TICKET_MENU_ID {
			return Some(Self::PanelMenu);
		}
		if custom_id == CLOSE_BUTTON_ID {
			return Some(Self::CloseButton);
		}
		if let Some(kind_id) = custom_id.strip_prefix(OPEN_BUTTON_PREFIX) {
			return TicketKind::from_id(kind_id).map(Self::OpenButton);
		}
		None
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModalAction {
	StaffApplication,
}

impl ModalAction {
	pub fn parse(custom_id: &str) -> Option<Self> {
		(custom_id == APPLICATION_MODAL_ID).then_some(Self::StaffApplication)
	}
}

pub async fn route_component(
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let Some(action) = ComponentAction::parse(&interaction_data.custom_id) else {
		return Ok(());
	};

	match action {
		ComponentAction::PanelMenu => {
			let Some(selected) = interaction_data.values.first() else {
				bail!("Ticket menu interaction carried no selection");
			};
			let Some(kind) = TicketKind::from_id(selected) else {
				bail!("Unknown ticket type selected from the panel menu: {}", selected);
			};
			open_ticket::handle_open(interaction, kind, config, http_client, application_id, bot_state).await
		}
		ComponentAction::OpenButton(kind) => {
			open_ticket::handle_open(interaction, kind, config, http_client, application_id, bot_state).await
		}
		ComponentAction::CloseButton => {
			close_ticket::handle_close(interaction, http_client, application_id, bot_state).await
		}
	}
}

pub async fn route_modal(
	interaction: &InteractionCreate,
	modal_data: &ModalInteractionData,
	config: &Arc<ConfigDocument>,
	http_client: &Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	match ModalAction::parse(&modal_data.custom_id) {
		Some(ModalAction::StaffApplication) => {
			open_ticket::handle_application_modal(
				interaction,
				modal_data,
				config,
				http_client,
				application_id,
				bot_state,
			)
			.await
		}
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn menu_tag_routes_to_the_panel_menu() {
		assert_eq!(ComponentAction::parse("ticket_panel/menu"), Some(ComponentAction::PanelMenu));
	}

	#[test]
	fn close_tag_routes_to_the_close_button() {
		assert_eq!(ComponentAction::parse("ticket/close"), Some(ComponentAction::CloseButton));
	}

	#[test]
	fn open_buttons_carry_their_ticket_kind() {
		assert_eq!(
			ComponentAction::parse("open_ticket/support"),
			Some(ComponentAction::OpenButton(TicketKind::Support))
		);
		assert_eq!(
			ComponentAction::parse("open_ticket/contact_owner"),
			Some(ComponentAction::OpenButton(TicketKind::ContactOwner))
		);
		assert_eq!(ComponentAction::parse("open_ticket/bogus"), None);
	}

	#[test]
	fn unknown_component_tags_are_not_routed() {
		assert_eq!(ComponentAction::parse(""), None);
		assert_eq!(ComponentAction::parse("ticket/"), None);
		assert_eq!(ComponentAction::parse("something/else"), None);
	}

	#[test]
	fn only_the_application_modal_tag_is_routed() {
		assert_eq!(
			ModalAction::parse("ticket/application"),
			Some(ModalAction::StaffApplication)
		);
		assert_eq!(ModalAction::parse("ticket/close"), None);
		assert_eq!(ModalAction::parse(""), None);
	}
}
