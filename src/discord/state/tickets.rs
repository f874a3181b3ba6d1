// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use std::collections::HashMap;
use std::fmt;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker, UserMarker};

/// The purposes for which a ticket can be opened. Each kind binds a category, a staff role, and
/// whether an application form must be filled out before the ticket channel is created.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TicketKind {
	JoinTeam,
	Support,
	ContactOwner,
	JoinStaff,
}

impl TicketKind {
	pub fn from_id(id: &str) -> Option<Self> {
		match id {
			"join_team" => Some(Self::JoinTeam),
			"support" => Some(Self::Support),
			"contact_owner" => Some(Self::ContactOwner),
			"join_staff" => Some(Self::JoinStaff),
			_ => None,
		}
	}

	/// The wire ID used in component custom IDs, select menu values, and channel name tags.
	pub fn as_id(&self) -> &'static str {
		match self {
			Self::JoinTeam => "join_team",
			Self::Support => "support",
			Self::ContactOwner => "contact_owner",
			Self::JoinStaff => "join_staff",
		}
	}

	pub fn all_kinds() -> Vec<Self> {
		vec![Self::JoinTeam, Self::Support, Self::ContactOwner, Self::JoinStaff]
	}

	/// The display name of the category under which this kind's ticket channels are grouped.
	pub fn category_name(&self) -> &'static str {
		match self {
			Self::JoinTeam => "Join Team Tickets",
			Self::Support => "Support Tickets",
			Self::ContactOwner => "Contact Owner Tickets",
			Self::JoinStaff => "Staff Application Tickets",
		}
	}

	pub fn menu_label(&self) -> &'static str {
		match self {
			Self::JoinTeam => "Join Team",
			Self::Support => "Support",
			Self::ContactOwner => "Contact Owner",
			Self::JoinStaff => "Join Staff",
		}
	}

	pub fn menu_description(&self) -> &'static str {
		match self {
			Self::JoinTeam => "Apply to join the team.",
			Self::Support => "Get help with something.",
			Self::ContactOwner => "Speak directly to management.",
			Self::JoinStaff => "Apply for a staff position.",
		}
	}

	pub fn menu_emoji(&self) -> &'static str {
		match self {
			Self::JoinTeam => "👥",
			Self::Support => "🛠️",
			Self::ContactOwner => "👑",
			Self::JoinStaff => "📝",
		}
	}

	/// The role that staffs tickets of this kind. The owner role is additionally granted access to
	/// every ticket channel regardless of kind.
	pub fn allowed_role(&self, config: &ConfigDocument) -> Id<RoleMarker> {
		match self {
			Self::ContactOwner => config.get_owner_role(),
			_ => config.get_support_role(),
		}
	}

	/// Whether opening a ticket of this kind requires filling out an application form first.
	pub fn requires_application(&self) -> bool {
		matches!(self, Self::JoinStaff)
	}
}

impl fmt::Display for TicketKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.menu_label())
	}
}

#[derive(Debug)]
pub enum TicketEntry {
	/// Slot held while channel creation is in flight; no channel exists for it yet.
	Pending,
	Open { channel: Id<ChannelMarker> },
}

/// Tracks which users have a ticket. Invariant: at most one entry per user, pending or open.
/// Only the ticket handlers write to this map.
#[derive(Debug, Default)]
pub struct OpenTickets {
	entries: HashMap<Id<UserMarker>, TicketEntry>,
}

impl OpenTickets {
	/// Reserves the user's ticket slot ahead of channel creation. Returns false if the user
	/// already has a pending or open ticket; in that case nothing is changed.
	pub fn reserve(&mut self, user: Id<UserMarker>) -> bool {
		if self.entries.contains_key(&user) {
			return false;
		}
		self.entries.insert(user, TicketEntry::Pending);
		true
	}

	/// Replaces the user's reservation with the channel that was created for it.
	pub fn complete(&mut self, user: Id<UserMarker>, channel: Id<ChannelMarker>) {
		self.entries.insert(user, TicketEntry::Open { channel });
	}

	/// Gives up the user's slot, making them eligible to open a new ticket.
	pub fn release(&mut self, user: Id<UserMarker>) {
		self.entries.remove(&user);
	}

	pub fn has_ticket(&self, user: Id<UserMarker>) -> bool {
		self.entries.contains_key(&user)
	}

	/// Removes the entry whose open channel matches and returns its opener. By the one-entry-per-user
	/// invariant, at most one entry can match. Pending reservations have no channel and never match.
	pub fn remove_by_channel(&mut self, channel: Id<ChannelMarker>) -> Option<Id<UserMarker>> {
		let opener = self.entries.iter().find_map(|(user, entry)| match entry {
			TicketEntry::Open {
				channel: entry_channel,
			} if *entry_channel == channel => Some(*user),
			_ => None,
		});
		if let Some(opener) = opener {
			self.entries.remove(&opener);
		}
		opener
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn user(id: u64) -> Id<UserMarker> {
		Id::new(id)
	}

	fn channel(id: u64) -> Id<ChannelMarker> {
		Id::new(id)
	}

	#[test]
	fn second_reservation_is_rejected() {
		let mut tickets = OpenTickets::default();
		assert!(tickets.reserve(user(1)));
		assert!(!tickets.reserve(user(1)));
	}

	#[test]
	fn open_ticket_blocks_new_reservation() {
		let mut tickets = OpenTickets::default();
		assert!(tickets.reserve(user(1)));
		tickets.complete(user(1), channel(10));
		assert!(!tickets.reserve(user(1)));
	}

	#[test]
	fn released_reservation_frees_the_slot() {
		let mut tickets = OpenTickets::default();
		assert!(tickets.reserve(user(1)));
		tickets.release(user(1));
		assert!(tickets.reserve(user(1)));
	}

	#[test]
	fn reservations_are_per_user() {
		let mut tickets = OpenTickets::default();
		assert!(tickets.reserve(user(1)));
		assert!(tickets.reserve(user(2)));
	}

	#[test]
	fn remove_by_channel_returns_the_opener() {
		let mut tickets = OpenTickets::default();
		tickets.reserve(user(1));
		tickets.complete(user(1), channel(10));
		tickets.reserve(user(2));
		tickets.complete(user(2), channel(20));

		assert_eq!(tickets.remove_by_channel(channel(10)), Some(user(1)));
		assert!(!tickets.has_ticket(user(1)));
		assert!(tickets.has_ticket(user(2)));
	}

	#[test]
	fn remove_by_channel_ignores_unknown_channels() {
		let mut tickets = OpenTickets::default();
		tickets.reserve(user(1));
		tickets.complete(user(1), channel(10));

		assert_eq!(tickets.remove_by_channel(channel(99)), None);
		assert!(tickets.has_ticket(user(1)));
	}

	#[test]
	fn pending_reservations_are_invisible_to_channel_lookup() {
		let mut tickets = OpenTickets::default();
		tickets.reserve(user(1));

		assert_eq!(tickets.remove_by_channel(channel(10)), None);
		assert!(tickets.has_ticket(user(1)));
	}

	#[test]
	fn kind_ids_round_trip() {
		for kind in TicketKind::all_kinds() {
			assert_eq!(TicketKind::from_id(kind.as_id()), Some(kind));
		}
		assert_eq!(TicketKind::from_id("unknown"), None);
	}

	#[test]
	fn only_staff_applications_require_a_form() {
		for kind in TicketKind::all_kinds() {
			assert_eq!(kind.requires_application(), kind == TicketKind::JoinStaff);
		}
	}

	#[test]
	fn contact_owner_tickets_go_to_the_owner_role() {
		let config = test_config();
		assert_eq!(
			TicketKind::ContactOwner.allowed_role(&config),
			config.get_owner_role()
		);
		assert_eq!(TicketKind::Support.allowed_role(&config), config.get_support_role());
		assert_eq!(TicketKind::JoinTeam.allowed_role(&config), config.get_support_role());
		assert_eq!(TicketKind::JoinStaff.allowed_role(&config), config.get_support_role());
	}

	fn test_config() -> ConfigDocument {
		ConfigDocument {
			discord_token: String::new(),
			panel_channel: 1,
			support_role: 2,
			owner_role: 3,
			welcome: crate::config::WelcomeConfig { role: 4, channel: 5 },
			health_port: 8080,
		}
	}
}
