// © 2025 the Gatehouse Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::ConfigDocument;
use miette::IntoDiagnostic;
use twilight_http::client::Client;
use twilight_mention::fmt::Mention;
use twilight_model::gateway::payload::incoming::MemberAdd;
use twilight_model::user::User;
use twilight_util::builder::embed::{EmbedBuilder, ImageSource};

const WELCOME_COLOR: u32 = 0x00ff00;

pub async fn handle_member_join(
	member_add: &MemberAdd,
	config: &ConfigDocument,
	http_client: &Client,
) -> miette::Result<()> {
	let user = &member_add.member.user;

	// Role assignment and the greeting are independent; a failed grant shouldn't silence the greeting.
	let role_result = http_client
		.add_guild_member_role(member_add.guild_id, user.id, config.welcome.get_role())
		.await;
	if let Err(error) = role_result {
		tracing::error!(source = ?error, "Failed to assign the welcome role");
	}

	let embed = EmbedBuilder::new()
		.title("🎉 Welcome to the Server!")
		.description(format!(
			"Welcome {} to the server!\nWe're glad to have you here.",
			user.id.mention()
		))
		.color(WELCOME_COLOR)
		.thumbnail(ImageSource::url(avatar_url(user)).into_diagnostic()?)
		.validate()
		.into_diagnostic()?
		.build();

	http_client
		.create_message(config.welcome.get_channel())
		.embeds(&[embed])
		.await
		.into_diagnostic()?;

	Ok(())
}

fn avatar_url(user: &User) -> String {
	match &user.avatar {
		Some(avatar) => format!("https://cdn.discordapp.com/avatars/{}/{}.png", user.id, avatar),
		None => {
			let index = (user.id.get() >> 22) % 6;
			format!("https://cdn.discordapp.com/embed/avatars/{}.png", index)
		}
	}
}
