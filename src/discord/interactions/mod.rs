// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::components::{message_components, message_content};
use super::connection::BotState;
use crate::intake::{Action, Reply, View};
use miette::{IntoDiagnostic, bail};
use twilight_http::client::{Client, InteractionClient};
use twilight_model::application::interaction::message_component::MessageComponentInteractionData;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::gateway::payload::incoming::InteractionCreate;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

pub async fn route_interaction(
	interaction: &InteractionCreate,
	interaction_data: &MessageComponentInteractionData,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	bot_state: &BotState,
) -> miette::Result<()> {
	let Some(action) = Action::parse(&interaction_data.custom_id) else {
		bail!("Unknown component interaction: {}", interaction_data.custom_id);
	};
	let Some(user_id) = interaction.author_id() else {
		bail!("Component used by a non-user");
	};

	// Tracker calls can outlast the initial response window.
	let interaction_client = http_client.interaction(application_id);
	let response = InteractionResponse {
		kind: InteractionResponseType::DeferredUpdateMessage,
		data: None,
	};
	interaction_client
		.create_response(interaction.id, &interaction.token, &response)
		.await
		.into_diagnostic()?;

	let session = bot_state.sessions.session(user_id.get()).await;
	let result = {
		let mut session = session.lock().await;
		tracing::debug!(user = %user_id, action = %interaction_data.custom_id, "Handling an intake action");
		let replies = bot_state.engine.handle_action(&mut session, action).await;
		send_replies(&interaction_client, &interaction.token, &replies).await
	};
	drop(session);

	if bot_state.sessions.end_if_closed(user_id.get()).await {
		tracing::debug!(user = %user_id, "Dropped the session of a closed ticket");
	}
	result
}

async fn send_replies(interaction_client: &InteractionClient<'_>, token: &str, replies: &[Reply]) -> miette::Result<()> {
	for reply in replies {
		match reply {
			Reply::Edit(view) => edit_original(interaction_client, token, view).await?,
			Reply::Send(view) => send_followup(interaction_client, token, view).await?,
		}
	}
	Ok(())
}

async fn edit_original(interaction_client: &InteractionClient<'_>, token: &str, view: &View) -> miette::Result<()> {
	let content = message_content(view);
	let components = message_components(view);
	interaction_client
		.update_response(token)
		.content(Some(content.as_str()))
		.components(Some(components.as_slice()))
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?;
	Ok(())
}

async fn send_followup(interaction_client: &InteractionClient<'_>, token: &str, view: &View) -> miette::Result<()> {
	let content = message_content(view);
	let components = message_components(view);
	interaction_client
		.create_followup(token)
		.content(&content)
		.components(&components)
		.allowed_mentions(Some(&AllowedMentions::default()))
		.await
		.into_diagnostic()?;
	Ok(())
}

/// Posts every remaining reply as a new message after the interaction has been answered.
pub async fn send_followups(
	interaction_client: &InteractionClient<'_>,
	token: &str,
	replies: &[Reply],
) -> miette::Result<()> {
	for reply in replies {
		send_followup(interaction_client, token, reply.view()).await?;
	}
	Ok(())
}
