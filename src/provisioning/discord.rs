// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{GroupProvisioner, ProvisionedGroup, ProvisioningError};
use crate::model::ChatId;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_http::client::Client;
use twilight_model::channel::ChannelType;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};

const CHANNEL_NAME_LIMIT: usize = 100;

/// Creates assistance chats as text channels in a guild the bot manages.
pub struct DiscordProvisioner {
	http: Arc<Client>,
	guild: Id<GuildMarker>,
	category: Option<Id<ChannelMarker>>,
}

impl DiscordProvisioner {
	pub fn new(http: Arc<Client>, guild: Id<GuildMarker>, category: Option<Id<ChannelMarker>>) -> Self {
		Self { http, guild, category }
	}
}

/// Text channel names are lowercase, with words joined by hyphens.
pub fn channel_name_from_title(title: &str) -> String {
	let mut name = String::new();
	for word in title.split(|c: char| !c.is_alphanumeric() && c != '_') {
		if word.is_empty() {
			continue;
		}
		if !name.is_empty() {
			name.push('-');
		}
		name.extend(word.chars().flat_map(char::to_lowercase));
	}
	let name: String = name.chars().take(CHANNEL_NAME_LIMIT).collect();
	if name.is_empty() {
		String::from("assistance")
	} else {
		name
	}
}

#[async_trait]
impl GroupProvisioner for DiscordProvisioner {
	async fn create_group(&self, title: &str) -> Result<ProvisionedGroup, ProvisioningError> {
		let name = channel_name_from_title(title);
		let mut request = self
			.http
			.create_guild_channel(self.guild, &name)
			.kind(ChannelType::GuildText)
			.topic(title);
		if let Some(category) = self.category {
			request = request.parent_id(category);
		}
		let response = request.await.map_err(ProvisioningError::new)?;
		let channel = response.model().await.map_err(ProvisioningError::new)?;
		let chat_id = i64::try_from(channel.id.get()).map_err(ProvisioningError::new)?;
		tracing::info!(channel = %channel.id, guild = %self.guild, "Created an assistance channel");
		Ok(ProvisionedGroup {
			chat: Some(ChatId(chat_id)),
			invite_link: None,
		})
	}
}
