// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::view::View;
use crate::model::ChatId;
use async_trait::async_trait;
use miette::Diagnostic;
use std::error::Error;
use std::fmt;

/// A failed call to the messaging platform. Callers log these and carry on.
#[derive(Debug, Diagnostic)]
pub struct PlatformError(pub Box<dyn Error + Send + Sync>);

impl fmt::Display for PlatformError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl Error for PlatformError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.source()
	}
}

impl PlatformError {
	pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
		Self(Box::new(error))
	}

	pub fn message(message: impl Into<String>) -> Self {
		Self(message.into().into())
	}
}

/// Chat operations the engine performs outside the requester's own conversation.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
	async fn send(&self, chat: ChatId, view: &View) -> Result<(), PlatformError>;

	async fn create_invite_link(&self, chat: ChatId) -> Result<String, PlatformError>;

	async fn rename_chat(&self, chat: ChatId, title: &str) -> Result<(), PlatformError>;

	/// Stops regular members from posting in the chat.
	async fn lock_chat(&self, chat: ChatId) -> Result<(), PlatformError>;
}
