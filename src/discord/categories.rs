// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::state::categories::CategoryRegistry;
use super::state::tickets::TicketKind;
use miette::IntoDiagnostic;
use std::sync::Arc;
use tokio::sync::RwLock;
use twilight_http::client::Client;
use twilight_model::channel::ChannelType;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};
use type_map::concurrent::TypeMap;

/// Makes sure every ticket kind has its category channel in the guild, creating missing ones, and
/// records the resulting IDs in the registry. Idempotent: an existing category (matched by name,
/// case-insensitively) is never duplicated. A creation failure for one category is logged and
/// skipped so the remaining categories still get provisioned; the failed kind's registry entry is
/// cleared and callers see it as unavailable.
pub async fn ensure_categories(
	guild_id: Id<GuildMarker>,
	http_client: &Client,
	bot_state: &Arc<RwLock<TypeMap>>,
) -> miette::Result<()> {
	let channels = http_client
		.guild_channels(guild_id)
		.await
		.into_diagnostic()?
		.models()
		.await
		.into_diagnostic()?;

	let mut provisioned: Vec<(TicketKind, Option<Id<ChannelMarker>>)> = Vec::new();
	for kind in TicketKind::all_kinds() {
		let name = kind.category_name();
		let existing = channels
			.iter()
			.find(|channel| is_category_named(channel.kind, channel.name.as_deref(), name));
		match existing {
			Some(channel) => provisioned.push((kind, Some(channel.id))),
			None => {
				let created = http_client
					.create_guild_channel(guild_id, name)
					.kind(ChannelType::GuildCategory)
					.await;
				match created {
					Ok(response) => match response.model().await {
						Ok(channel) => {
							tracing::info!(category = name, "Created ticket category");
							provisioned.push((kind, Some(channel.id)));
						}
						Err(error) => {
							tracing::error!(source = ?error, category = name, "Could not read created ticket category");
							provisioned.push((kind, None));
						}
					},
					Err(error) => {
						tracing::error!(source = ?error, category = name, "Could not create ticket category");
						provisioned.push((kind, None));
					}
				}
			}
		}
	}

	let mut state = bot_state.write().await;
	let registry = state.entry::<CategoryRegistry>().or_insert_with(CategoryRegistry::default);
	apply_provisioned(registry, provisioned);

	Ok(())
}

/// Applies one provisioning pass to the registry. Each kind's result stands on its own: a kind
/// that failed this pass has its entry cleared (it may be stale) without disturbing the others.
fn apply_provisioned(registry: &mut CategoryRegistry, provisioned: Vec<(TicketKind, Option<Id<ChannelMarker>>)>) {
	for (kind, category) in provisioned {
		match category {
			Some(category) => registry.record(kind, category),
			None => registry.remove(kind),
		}
	}
}

/// Resolves the category channel for a ticket kind. The registry entry is re-checked against live
/// guild data every time; if the category was deleted out-of-band (or never provisioned), the
/// provisioner runs once more before giving up. `None` means the category is unavailable.
pub async fn resolve_category(
	kind: TicketKind,
	guild_id: Id<GuildMarker>,
	http_client: &Client,
	bot_state: &Arc<RwLock<TypeMap>>,
) -> miette::Result<Option<Id<ChannelMarker>>> {
	let hint = {
		let state = bot_state.read().await;
		state.get::<CategoryRegistry>().and_then(|registry| registry.get(kind))
	};

	if let Some(category_id) = hint {
		let channels = http_client
			.guild_channels(guild_id)
			.await
			.into_diagnostic()?
			.models()
			.await
			.into_diagnostic()?;
		let still_exists = channels
			.iter()
			.any(|channel| channel.id == category_id && channel.kind == ChannelType::GuildCategory);
		if still_exists {
			return Ok(Some(category_id));
		}
	}

	ensure_categories(guild_id, http_client, bot_state).await?;

	let state = bot_state.read().await;
	Ok(state.get::<CategoryRegistry>().and_then(|registry| registry.get(kind)))
}

fn is_category_named(channel_kind: ChannelType, channel_name: Option<&str>, name: &str) -> bool {
	channel_kind == ChannelType::GuildCategory
		&& channel_name.is_some_and(|channel_name| channel_name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn category_names_match_case_insensitively() {
		assert!(is_category_named(
			ChannelType::GuildCategory,
			Some("Support Tickets"),
			"Support Tickets"
		));
		assert!(is_category_named(
			ChannelType::GuildCategory,
			Some("SUPPORT TICKETS"),
			"Support Tickets"
		));
		assert!(is_category_named(
			ChannelType::GuildCategory,
			Some("support tickets"),
			"Support Tickets"
		));
	}

	#[test]
	fn non_categories_never_match() {
		assert!(!is_category_named(
			ChannelType::GuildText,
			Some("Support Tickets"),
			"Support Tickets"
		));
		assert!(!is_category_named(ChannelType::GuildCategory, None, "Support Tickets"));
		assert!(!is_category_named(
			ChannelType::GuildCategory,
			Some("Join Team Tickets"),
			"Support Tickets"
		));
	}

	#[test]
	fn one_failed_kind_does_not_discard_the_others() {
		let mut registry = CategoryRegistry::default();
		apply_provisioned(
			&mut registry,
			vec![
				(TicketKind::JoinTeam, Some(Id::new(10))),
				(TicketKind::Support, None),
				(TicketKind::ContactOwner, Some(Id::new(30))),
				(TicketKind::JoinStaff, Some(Id::new(40))),
			],
		);

		assert_eq!(registry.get(TicketKind::JoinTeam), Some(Id::new(10)));
		assert_eq!(registry.get(TicketKind::Support), None);
		assert_eq!(registry.get(TicketKind::ContactOwner), Some(Id::new(30)));
		assert_eq!(registry.get(TicketKind::JoinStaff), Some(Id::new(40)));
	}

	#[test]
	fn failed_kinds_clear_their_stale_entries() {
		let mut registry = CategoryRegistry::default();
		registry.record(TicketKind::Support, Id::new(20));

		apply_provisioned(
			&mut registry,
			vec![
				(TicketKind::JoinTeam, Some(Id::new(10))),
				(TicketKind::Support, None),
			],
		);

		assert_eq!(registry.get(TicketKind::Support), None);
		assert_eq!(registry.get(TicketKind::JoinTeam), Some(Id::new(10)));
	}
}
