// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::discord::components::response_data;
use crate::discord::connection::BotState;
use crate::discord::interactions::send_followups;
use crate::model::Requester;
use miette::{IntoDiagnostic, bail};
use twilight_http::client::Client;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::InteractionContextType;
use twilight_model::channel::message::MessageFlags;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use twilight_util::builder::InteractionResponseDataBuilder;
use twilight_util::builder::command::CommandBuilder;

pub fn command_definition() -> Command {
	CommandBuilder::new("start", "Report a new road incident", CommandType::ChatInput)
		.contexts([InteractionContextType::BotDm])
		.build()
}

pub async fn handle_command(
	interaction: &InteractionCreate,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	bot_state: &BotState,
) -> miette::Result<()> {
	let interaction_client = http_client.interaction(application_id);
	let Some(user) = interaction.author() else {
		bail!("Start command used by a non-user");
	};

	if interaction.guild_id.is_some() {
		let response = InteractionResponseDataBuilder::new()
			.content("Incidents are reported in a direct message with me.")
			.flags(MessageFlags::EPHEMERAL)
			.build();
		let response = InteractionResponse {
			kind: InteractionResponseType::ChannelMessageWithSource,
			data: Some(response),
		};
		interaction_client
			.create_response(interaction.id, &interaction.token, &response)
			.await
			.into_diagnostic()?;
		return Ok(());
	}

	let requester = Requester {
		user_id: user.id.get(),
		username: Some(user.name.clone()),
	};
	let session = bot_state.sessions.session(user.id.get()).await;
	let mut session = session.lock().await;
	let replies = bot_state.engine.start(&mut session, requester);

	let Some((first, rest)) = replies.split_first() else {
		bail!("Starting an intake produced no message");
	};
	let response = InteractionResponse {
		kind: InteractionResponseType::ChannelMessageWithSource,
		data: Some(response_data(first.view())),
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;
	send_followups(&interaction_client, &interaction.token, rest).await
}
