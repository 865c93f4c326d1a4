// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::components::{message_components, message_content};
use crate::intake::{ChatPlatform, PlatformError, View};
use crate::model::ChatId;
use crate::provisioning::discord::channel_name_from_title;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::channel::message::AllowedMentions;
use twilight_model::guild::Permissions;
use twilight_model::http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::id::Id;
use twilight_model::id::marker::ChannelMarker;

/// Runs the engine's chat operations against Discord channels.
pub struct DiscordPlatform {
	http_client: Arc<Client>,
}

impl DiscordPlatform {
	pub fn new(http_client: Arc<Client>) -> Self {
		Self { http_client }
	}
}

pub fn channel_id(chat: ChatId) -> Result<Id<ChannelMarker>, PlatformError> {
	u64::try_from(chat.0)
		.ok()
		.and_then(Id::new_checked)
		.ok_or_else(|| PlatformError::message(format!("{} isn't a Discord channel ID", chat)))
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
	async fn send(&self, chat: ChatId, view: &View) -> Result<(), PlatformError> {
		let channel_id = channel_id(chat)?;
		let content = message_content(view);
		let components = message_components(view);
		self.http_client
			.create_message(channel_id)
			.content(&content)
			.components(&components)
			.allowed_mentions(Some(&AllowedMentions::default()))
			.await
			.map_err(PlatformError::new)?;
		Ok(())
	}

	async fn create_invite_link(&self, chat: ChatId) -> Result<String, PlatformError> {
		let channel_id = channel_id(chat)?;
		let response = self
			.http_client
			.create_invite(channel_id)
			.max_age(0)
			.await
			.map_err(PlatformError::new)?;
		let invite = response.model().await.map_err(PlatformError::new)?;
		Ok(format!("https://discord.gg/{}", invite.code))
	}

	async fn rename_chat(&self, chat: ChatId, title: &str) -> Result<(), PlatformError> {
		let channel_id = channel_id(chat)?;
		let name = channel_name_from_title(title);
		self.http_client
			.update_channel(channel_id)
			.name(&name)
			.topic(title)
			.await
			.map_err(PlatformError::new)?;
		Ok(())
	}

	async fn lock_chat(&self, chat: ChatId) -> Result<(), PlatformError> {
		let channel_id = channel_id(chat)?;
		let channel = self
			.http_client
			.channel(channel_id)
			.await
			.map_err(PlatformError::new)?
			.model()
			.await
			.map_err(PlatformError::new)?;
		let Some(guild_id) = channel.guild_id else {
			return Err(PlatformError::message("Only server channels can be locked"));
		};

		// The @everyone role shares the guild's ID.
		let overwrite = PermissionOverwrite {
			allow: None,
			deny: Some(Permissions::SEND_MESSAGES | Permissions::SEND_MESSAGES_IN_THREADS),
			id: guild_id.cast(),
			kind: PermissionOverwriteType::Role,
		};
		self.http_client
			.update_channel_permission(channel_id, &overwrite)
			.await
			.map_err(PlatformError::new)?;
		Ok(())
	}
}
