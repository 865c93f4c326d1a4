// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{GroupProvisioner, ProvisionedGroup, ProvisioningError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BODY_LIMIT: usize = 300;

/// What the chat factory in front of us understands.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChatFactoryCapabilities {
	/// Whether to ask the factory to add our bot to the chat it creates.
	pub send_bot_username: bool,
}

#[derive(Serialize)]
struct CreateChatRequest<'a> {
	title: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	bot_username: Option<&'a str>,
}

/// Client for an HTTP service that creates group chats on request.
pub struct ChatFactoryClient {
	http: Client,
	url: String,
	bot_username: Option<String>,
	capabilities: ChatFactoryCapabilities,
}

impl ChatFactoryClient {
	pub fn new(
		url: String,
		bot_username: Option<String>,
		capabilities: ChatFactoryCapabilities,
	) -> Result<Self, ProvisioningError> {
		let http = Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(TIMEOUT)
			.build()
			.map_err(ProvisioningError::new)?;
		let bot_username = bot_username
			.map(|name| name.trim().trim_start_matches('@').to_string())
			.filter(|name| !name.is_empty())
			.map(|name| format!("@{}", name));
		Ok(Self {
			http,
			url,
			bot_username,
			capabilities,
		})
	}

	fn request_bot_username(&self) -> Option<&str> {
		if self.capabilities.send_bot_username {
			self.bot_username.as_deref()
		} else {
			None
		}
	}
}

#[async_trait]
impl GroupProvisioner for ChatFactoryClient {
	async fn create_group(&self, title: &str) -> Result<ProvisionedGroup, ProvisioningError> {
		let request = CreateChatRequest {
			title,
			bot_username: self.request_bot_username(),
		};
		tracing::debug!(url = %self.url, title, "Requesting a group chat");
		let response = self
			.http
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.map_err(ProvisioningError::new)?;
		let status = response.status();
		let body = response.text().await.map_err(ProvisioningError::new)?;
		if !status.is_success() {
			let body: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
			return Err(ProvisioningError::message(format!(
				"The chat factory answered HTTP {}: {}",
				status.as_u16(),
				body
			)));
		}

		// Some factories answer with a bare ID or link rather than JSON.
		let response = serde_json::from_str::<Value>(&body).unwrap_or_else(|_| Value::String(body.trim().to_string()));
		Ok(ProvisionedGroup::from_response(&response))
	}
}
