// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::state::tickets::TicketKind;

/// Derives the name for a new ticket channel from the opener's username. Two users whose names
/// sanitize to the same string collide; the open-ticket map, not the channel name, is what tracks
/// who a ticket belongs to.
pub fn ticket_channel_name(kind: TicketKind, username: &str) -> String {
	format!("{}-{}", kind.as_id(), sanitize_username(username))
}

fn sanitize_username(username: &str) -> String {
	username
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() {
				c.to_ascii_lowercase()
			} else {
				'-'
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn names_are_lowercased_and_tagged() {
		assert_eq!(ticket_channel_name(TicketKind::Support, "Alice"), "support-alice");
		assert_eq!(
			ticket_channel_name(TicketKind::JoinTeam, "BobTheBuilder"),
			"join_team-bobthebuilder"
		);
	}

	#[test]
	fn non_alphanumeric_characters_become_separators() {
		assert_eq!(ticket_channel_name(TicketKind::Support, "Mr. Robot"), "support-mr--robot");
		assert_eq!(
			ticket_channel_name(TicketKind::ContactOwner, "user_123"),
			"contact_owner-user-123"
		);
	}

	#[test]
	fn non_ascii_characters_are_replaced_per_character() {
		assert_eq!(ticket_channel_name(TicketKind::Support, "Ωmega"), "support--mega");
	}
}
