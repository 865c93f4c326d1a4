// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::ChatId;
use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use std::error::Error;
use std::fmt;

pub mod chat_factory;
pub mod discord;

const CHAT_ID_KEYS: [&str; 4] = ["chat_id", "chatId", "chatid", "id"];
const NESTED_KEYS: [&str; 3] = ["chat", "result", "data"];

/// What a provisioning service hands back for a new group chat. Either part may be missing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProvisionedGroup {
	pub chat: Option<ChatId>,
	pub invite_link: Option<String>,
}

impl ProvisionedGroup {
	/// Reads a provisioning response.
	///
	/// A number or numeric string is the chat ID and a string starting with `http` is an invite link. Objects are
	/// searched for an ID under the usual key names first, then inside their `chat`, `result`, and `data`
	/// members.
	pub fn from_response(response: &Value) -> Self {
		let invite_link = match response {
			Value::String(text) if text.trim().starts_with("http") => Some(text.trim().to_string()),
			Value::Object(data) => data
				.get("invite_link")
				.and_then(Value::as_str)
				.filter(|link| link.starts_with("http"))
				.map(String::from),
			_ => None,
		};
		Self {
			chat: chat_id_from(response).map(ChatId),
			invite_link,
		}
	}
}

fn chat_id_from(node: &Value) -> Option<i64> {
	match node {
		Value::Number(number) => number.as_i64(),
		Value::String(text) => chat_id_from_text(text.trim()),
		Value::Object(data) => {
			for key in CHAT_ID_KEYS {
				if let Some(chat_id) = data.get(key).and_then(chat_id_from) {
					return Some(chat_id);
				}
			}
			NESTED_KEYS
				.iter()
				.filter_map(|key| data.get(*key))
				.find_map(chat_id_from)
		}
		_ => None,
	}
}

fn chat_id_from_text(text: &str) -> Option<i64> {
	let digits = text.strip_prefix('-').unwrap_or(text);
	if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
		return None;
	}
	text.parse().ok()
}

#[derive(Debug, Diagnostic)]
pub struct ProvisioningError(pub Box<dyn Error + Send + Sync>);

impl ProvisioningError {
	pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
		Self(Box::new(error))
	}

	pub fn message(message: impl Into<String>) -> Self {
		Self(message.into().into())
	}
}

impl fmt::Display for ProvisioningError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl Error for ProvisioningError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.source()
	}
}

/// A service that can create a group chat for a ticket's assistance conversation.
#[async_trait]
pub trait GroupProvisioner: Send + Sync {
	async fn create_group(&self, title: &str) -> Result<ProvisionedGroup, ProvisioningError>;
}
