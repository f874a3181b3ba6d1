// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use knus::Decode;
use miette::{IntoDiagnostic, Result, bail};
use tokio::fs::read_to_string;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, RoleMarker};

pub async fn parse_config(config_path: &str) -> Result<ConfigDocument> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	let config: ConfigDocument = knus::parse(config_path, &config_file_contents)?;
	config.validate()?;
	Ok(config)
}

#[derive(Debug, Decode)]
pub struct ConfigDocument {
	/// The bot account's token.
	#[knus(child, unwrap(argument))]
	pub discord_token: String,
	/// The ID of the channel in which the "open a ticket" panel is published.
	#[knus(child, unwrap(argument))]
	pub panel_channel: u64,
	/// The ID of the role staffing most ticket categories.
	#[knus(child, unwrap(argument))]
	pub support_role: u64,
	/// The ID of the escalation role. Members of this role can see every ticket.
	#[knus(child, unwrap(argument))]
	pub owner_role: u64,
	#[knus(child)]
	pub welcome: WelcomeConfig,
	/// The port on which the liveness endpoint listens.
	#[knus(child, unwrap(argument))]
	pub health_port: u16,
}

impl ConfigDocument {
	/// Checks that every configured snowflake is usable. Discord IDs are never zero, and the ID
	/// accessors require nonzero values, so a zeroed entry is caught here at startup instead.
	pub fn validate(&self) -> Result<()> {
		let ids = [
			("panel-channel", self.panel_channel),
			("support-role", self.support_role),
			("owner-role", self.owner_role),
			("welcome role", self.welcome.role),
			("welcome channel", self.welcome.channel),
		];
		for (name, id) in ids {
			if id == 0 {
				bail!("The configured {} ID must be a valid Discord snowflake, not 0", name);
			}
		}
		Ok(())
	}

	pub fn get_panel_channel(&self) -> Id<ChannelMarker> {
		Id::new(self.panel_channel)
	}

	pub fn get_support_role(&self) -> Id<RoleMarker> {
		Id::new(self.support_role)
	}

	pub fn get_owner_role(&self) -> Id<RoleMarker> {
		Id::new(self.owner_role)
	}
}

/// Settings for greeting new members.
#[derive(Debug, Decode)]
pub struct WelcomeConfig {
	/// The ID of the role assigned to every joining member.
	#[knus(child, unwrap(argument))]
	pub role: u64,
	/// The ID of the channel in which the greeting is posted.
	#[knus(child, unwrap(argument))]
	pub channel: u64,
}

impl WelcomeConfig {
	pub fn get_role(&self) -> Id<RoleMarker> {
		Id::new(self.role)
	}

	pub fn get_channel(&self) -> Id<ChannelMarker> {
		Id::new(self.channel)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn valid_config() -> ConfigDocument {
		ConfigDocument {
			discord_token: String::from("token"),
			panel_channel: 1,
			support_role: 2,
			owner_role: 3,
			welcome: WelcomeConfig { role: 4, channel: 5 },
			health_port: 8080,
		}
	}

	#[test]
	fn nonzero_ids_pass_validation() {
		assert!(valid_config().validate().is_ok());
	}

	#[test]
	fn zero_ids_fail_validation() {
		let mut config = valid_config();
		config.owner_role = 0;
		let error = config.validate().expect_err("a zero ID is not a snowflake");
		assert!(error.to_string().contains("owner-role"));

		let mut config = valid_config();
		config.welcome.channel = 0;
		assert!(config.validate().is_err());
	}
}
