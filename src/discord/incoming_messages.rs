// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::components::{message_components, message_content};
use super::connection::BotState;
use crate::model::Requester;
use miette::IntoDiagnostic;
use twilight_http::client::Client;
use twilight_model::channel::message::{AllowedMentions, Message};

/// Feeds text typed in a direct message to the requester's intake.
pub async fn handle_message(message: &Message, http_client: &Client, bot_state: &BotState) -> miette::Result<()> {
	if message.author.bot || message.guild_id.is_some() {
		return Ok(());
	}

	let requester = Requester {
		user_id: message.author.id.get(),
		username: Some(message.author.name.clone()),
	};
	let session = bot_state.sessions.session(message.author.id.get()).await;
	let mut session = session.lock().await;
	let replies = bot_state
		.engine
		.handle_text(&mut session, requester, &message.content)
		.await;

	for reply in replies.iter() {
		let view = reply.view();
		let content = message_content(view);
		let components = message_components(view);
		http_client
			.create_message(message.channel_id)
			.content(&content)
			.components(&components)
			.allowed_mentions(Some(&AllowedMentions::default()))
			.await
			.into_diagnostic()?;
	}
	Ok(())
}
