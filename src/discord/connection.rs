// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::commands::{command_definitions, route_command};
use super::incoming_messages::handle_message;
use super::interactions::route_interaction;
use super::platform::DiscordPlatform;
use crate::config::{ConfigData, ProvisioningConfig};
use crate::intake::{Channels, Engine, EngineSettings, SessionStore};
use crate::provisioning::GroupProvisioner;
use crate::provisioning::chat_factory::{ChatFactoryCapabilities, ChatFactoryClient};
use crate::provisioning::discord::DiscordProvisioner;
use crate::tracker::jira::JiraClient;
use miette::{IntoDiagnostic, bail};
use std::sync::Arc;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt};
use twilight_http::client::Client;
use twilight_model::application::interaction::InteractionData;
use twilight_model::gateway::event::Event;
use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;

/// Everything an event handler needs besides the HTTP client.
pub struct BotState {
	pub engine: Engine,
	pub sessions: SessionStore,
}

pub fn set_up_client(config: &ConfigData) -> Arc<Client> {
	Arc::new(Client::new(config.discord.bot_token.clone()))
}

pub fn set_up_engine(config: &ConfigData, http_client: &Arc<Client>) -> miette::Result<Engine> {
	let credentials = config.tracker.credentials();
	if credentials.is_none() {
		tracing::warn!("Tracker credentials aren't configured; tickets can't be filed");
	}
	let tracker = JiraClient::new(credentials).into_diagnostic()?;

	let provisioner: Option<Arc<dyn GroupProvisioner>> = match &config.provisioning {
		Some(ProvisioningConfig::Discord { guild, category }) => {
			let Some(guild) = Id::new_checked(*guild) else {
				bail!("The provisioning guild ID is invalid");
			};
			let category = category.and_then(Id::new_checked);
			Some(Arc::new(DiscordProvisioner::new(Arc::clone(http_client), guild, category)))
		}
		Some(ProvisioningConfig::ChatFactory {
			url,
			bot_username,
			send_bot_username,
		}) => {
			let capabilities = ChatFactoryCapabilities {
				send_bot_username: *send_bot_username,
			};
			let client = ChatFactoryClient::new(url.clone(), bot_username.clone(), capabilities).into_diagnostic()?;
			Some(Arc::new(client))
		}
		None => {
			tracing::info!("No chat provisioning is configured; assistance chats won't be created");
			None
		}
	};

	let settings = EngineSettings {
		channels: Channels {
			alert: config.notifications.alert_channel,
			dispatch: config.notifications.dispatch_channel,
		},
		no_skip: config.intake.no_skip.iter().copied().collect(),
		issue_template: config.tracker.issue_template(),
		annotate_assistance: config.tracker.annotate_assistance,
	};
	let platform = Arc::new(DiscordPlatform::new(Arc::clone(http_client)));
	Ok(Engine::new(Arc::new(tracker), provisioner, platform, settings))
}

pub async fn run_bot(config: Arc<ConfigData>, http_client: Arc<Client>) -> miette::Result<()> {
	let intents = Intents::DIRECT_MESSAGES | Intents::MESSAGE_CONTENT;

	let mut shard = Shard::new(ShardId::ONE, config.discord.bot_token.clone(), intents);

	let application_id = {
		let application_response = http_client.current_user_application().await.into_diagnostic()?;
		application_response.model().await.into_diagnostic()?.id
	};

	{
		let interaction_client = http_client.interaction(application_id);
		let commands = command_definitions();
		interaction_client
			.set_global_commands(&commands)
			.await
			.into_diagnostic()?;
	}

	let bot_state = Arc::new(BotState {
		engine: set_up_engine(&config, &http_client)?,
		sessions: SessionStore::default(),
	});

	while let Some(event) = shard.next_event(EventTypeFlags::all()).await {
		let event = match event {
			Ok(event) => event,
			Err(error) => {
				tracing::warn!(source = ?error, "error receiving event");
				continue;
			}
		};

		tokio::spawn(handle_event(
			event,
			Arc::clone(&http_client),
			application_id,
			Arc::clone(&bot_state),
		));
	}

	Ok(())
}

async fn handle_event(
	event: Event,
	http_client: Arc<Client>,
	application_id: Id<ApplicationMarker>,
	bot_state: Arc<BotState>,
) {
	let event_result = handle_event_route(event, &http_client, application_id, &bot_state).await;
	if let Err(error) = event_result {
		tracing::error!(source = ?error, "An error occurred handling a gateway event");
	}
}

async fn handle_event_route(
	event: Event,
	http_client: &Client,
	application_id: Id<ApplicationMarker>,
	bot_state: &BotState,
) -> miette::Result<()> {
	tracing::debug!("Incoming gateway message: {:?}", event);
	match event {
		Event::InteractionCreate(interaction) => match &interaction.data {
			Some(InteractionData::ApplicationCommand(command_data)) => {
				route_command(&interaction, command_data, http_client, application_id, bot_state).await?;
			}
			Some(InteractionData::MessageComponent(interaction_data)) => {
				route_interaction(&interaction, interaction_data, http_client, application_id, bot_state).await?;
			}
			_ => (),
		},
		Event::MessageCreate(message) => handle_message(&message, http_client, bot_state).await?,
		Event::Ready(_) => {
			tracing::info!("Discord gateway is ready");
		}
		_ => (),
	}
	Ok(())
}
