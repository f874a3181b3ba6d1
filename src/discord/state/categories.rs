// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::tickets::TicketKind;
use std::collections::HashMap;
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

/// Maps each ticket kind to its category channel. This is a hint, not a source of truth: an
/// administrator can delete a category at any time, so entries are re-validated against live
/// guild data before being trusted. Only the category provisioner writes to this map.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
	categories: HashMap<TicketKind, Id<ChannelMarker>>,
}

impl CategoryRegistry {
	pub fn record(&mut self, kind: TicketKind, category: Id<ChannelMarker>) {
		self.categories.insert(kind, category);
	}

	pub fn remove(&mut self, kind: TicketKind) {
		self.categories.remove(&kind);
	}

	pub fn get(&self, kind: TicketKind) -> Option<Id<ChannelMarker>> {
		self.categories.get(&kind).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn repeated_records_keep_one_entry_per_kind() {
		let mut registry = CategoryRegistry::default();
		registry.record(TicketKind::Support, Id::new(10));
		registry.record(TicketKind::Support, Id::new(10));
		registry.record(TicketKind::Support, Id::new(10));
		assert_eq!(registry.get(TicketKind::Support), Some(Id::new(10)));
	}

	#[test]
	fn re_record_replaces_a_stale_entry() {
		let mut registry = CategoryRegistry::default();
		registry.record(TicketKind::ContactOwner, Id::new(10));
		registry.record(TicketKind::ContactOwner, Id::new(20));
		assert_eq!(registry.get(TicketKind::ContactOwner), Some(Id::new(20)));
	}

	#[test]
	fn missing_kinds_have_no_entry() {
		let mut registry = CategoryRegistry::default();
		registry.record(TicketKind::Support, Id::new(10));
		assert_eq!(registry.get(TicketKind::JoinTeam), None);
		registry.remove(TicketKind::Support);
		assert_eq!(registry.get(TicketKind::Support), None);
	}
}
