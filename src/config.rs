// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{ChatId, FieldKey};
use crate::tracker::fields::{IssueTemplate, IssueType};
use crate::tracker::jira::JiraCredentials;
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use miette::{IntoDiagnostic, Result, bail, ensure};
use tokio::fs::read_to_string;

pub async fn parse_config(config_path: &str) -> Result<ConfigData> {
	let config_file_contents = read_to_string(config_path).await.into_diagnostic()?;
	parse_config_str(&config_file_contents)
}

pub fn parse_config_str(contents: &str) -> Result<ConfigData> {
	let document: KdlDocument = contents.parse()?;

	let Some(discord) = section(&document, "discord") else {
		bail!("The config is missing the `discord` section");
	};
	let Some(bot_token) = string_arg(discord, "bot_token")? else {
		bail!("The `discord` section is missing `bot_token`");
	};
	ensure!(!bot_token.trim().is_empty(), "The Discord bot token is empty");
	let discord = DiscordConfig { bot_token };

	let tracker = match section(&document, "tracker") {
		Some(tracker) => TrackerConfig {
			base_url: string_arg(tracker, "base_url")?,
			email: string_arg(tracker, "email")?,
			api_token: string_arg(tracker, "api_token")?,
			project_key: string_arg(tracker, "project_key")?.unwrap_or_default(),
			issue_type_id: string_arg(tracker, "issue_type_id")?,
			issue_type_name: string_arg(tracker, "issue_type_name")?,
			labels: match tracker.get("labels") {
				Some(node) => Some(string_args(node, "labels")?),
				None => None,
			},
			annotate_assistance: bool_arg(tracker, "annotate_assistance")?.unwrap_or(false),
		},
		None => TrackerConfig::default(),
	};

	let notifications = match section(&document, "notifications") {
		Some(notifications) => NotificationsConfig {
			alert_channel: chat_arg(notifications, "alert_channel")?,
			dispatch_channel: chat_arg(notifications, "dispatch_channel")?,
		},
		None => NotificationsConfig::default(),
	};

	let provisioning = match section(&document, "provisioning") {
		Some(provisioning) => parse_provisioning(provisioning)?,
		None => None,
	};

	let mut intake = IntakeConfig::default();
	if let Some(intake_section) = section(&document, "intake") {
		if let Some(node) = intake_section.get("no_skip") {
			for code in string_args(node, "no_skip")? {
				let Some(field) = FieldKey::from_code(&code) else {
					bail!("`no_skip` names an unknown field: {}", code);
				};
				intake.no_skip.push(field);
			}
		}
	}

	Ok(ConfigData {
		discord,
		tracker,
		notifications,
		provisioning,
		intake,
	})
}

fn parse_provisioning(provisioning: &KdlDocument) -> Result<Option<ProvisioningConfig>> {
	let mut nodes = provisioning.nodes().iter();
	let Some(node) = nodes.next() else {
		return Ok(None);
	};
	ensure!(
		nodes.next().is_none(),
		"Only one provisioning method can be configured"
	);

	match node.name().value() {
		"discord" => {
			let Some(guild) = property(node, "guild") else {
				bail!("Discord provisioning needs a `guild`");
			};
			let guild = snowflake(guild, "guild")?;
			let category = match property(node, "category") {
				Some(category) => Some(snowflake(category, "category")?),
				None => None,
			};
			Ok(Some(ProvisioningConfig::Discord { guild, category }))
		}
		"chat_factory" => {
			let Some(url) = property(node, "url").and_then(KdlValue::as_string) else {
				bail!("Chat factory provisioning needs a `url`");
			};
			let bot_username = match property(node, "bot_username") {
				Some(value) => match value.as_string() {
					Some(name) => Some(name.to_string()),
					None => bail!("`bot_username` must be a string"),
				},
				None => None,
			};
			let send_bot_username = match property(node, "send_bot_username") {
				Some(value) => match value.as_bool() {
					Some(send) => send,
					None => bail!("`send_bot_username` must be #true or #false"),
				},
				None => false,
			};
			Ok(Some(ProvisioningConfig::ChatFactory {
				url: url.to_string(),
				bot_username,
				send_bot_username,
			}))
		}
		other => bail!("Unknown provisioning method: {}", other),
	}
}

fn section<'a>(document: &'a KdlDocument, name: &str) -> Option<&'a KdlDocument> {
	document.get(name).and_then(KdlNode::children)
}

fn arguments(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
	node.entries()
		.iter()
		.filter(|entry| entry.name().is_none())
		.map(KdlEntry::value)
}

fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
	node.entries()
		.iter()
		.find(|entry| entry.name().is_some_and(|name| name.value() == key))
		.map(KdlEntry::value)
}

fn first_arg<'a>(section: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
	section.get(name).and_then(|node| arguments(node).next())
}

fn string_arg(section: &KdlDocument, name: &str) -> Result<Option<String>> {
	match first_arg(section, name) {
		Some(value) => match value.as_string() {
			Some(value) => Ok(Some(value.to_string())),
			None => bail!("`{}` must be a string", name),
		},
		None => Ok(None),
	}
}

fn string_args(node: &KdlNode, name: &str) -> Result<Vec<String>> {
	let mut values = Vec::new();
	for value in arguments(node) {
		let Some(value) = value.as_string() else {
			bail!("Every value of `{}` must be a string", name);
		};
		values.push(value.to_string());
	}
	Ok(values)
}

fn bool_arg(section: &KdlDocument, name: &str) -> Result<Option<bool>> {
	match first_arg(section, name) {
		Some(value) => match value.as_bool() {
			Some(value) => Ok(Some(value)),
			None => bail!("`{}` must be #true or #false", name),
		},
		None => Ok(None),
	}
}

fn chat_arg(section: &KdlDocument, name: &str) -> Result<Option<ChatId>> {
	match first_arg(section, name) {
		Some(value) => {
			let Some(id) = value.as_integer().and_then(|id| i64::try_from(id).ok()) else {
				bail!("`{}` must be a channel ID", name);
			};
			Ok(Some(ChatId(id)))
		}
		None => Ok(None),
	}
}

fn snowflake(value: &KdlValue, name: &str) -> Result<u64> {
	match value.as_integer().and_then(|id| u64::try_from(id).ok()) {
		Some(id) if id > 0 => Ok(id),
		_ => bail!("`{}` must be a Discord ID", name),
	}
}

#[derive(Debug)]
pub struct ConfigData {
	pub discord: DiscordConfig,
	pub tracker: TrackerConfig,
	pub notifications: NotificationsConfig,
	pub provisioning: Option<ProvisioningConfig>,
	pub intake: IntakeConfig,
}

#[derive(Debug)]
pub struct DiscordConfig {
	pub bot_token: String,
}

#[derive(Debug, Default)]
pub struct TrackerConfig {
	pub base_url: Option<String>,
	pub email: Option<String>,
	pub api_token: Option<String>,
	pub project_key: String,
	pub issue_type_id: Option<String>,
	pub issue_type_name: Option<String>,
	pub labels: Option<Vec<String>>,
	pub annotate_assistance: bool,
}

impl TrackerConfig {
	/// The API credentials, if all of them are configured.
	pub fn credentials(&self) -> Option<JiraCredentials> {
		match (&self.base_url, &self.email, &self.api_token) {
			(Some(base_url), Some(email), Some(api_token)) => Some(JiraCredentials {
				base_url: base_url.clone(),
				email: email.clone(),
				api_token: api_token.clone(),
			}),
			_ => None,
		}
	}

	pub fn issue_template(&self) -> IssueTemplate {
		let mut template = IssueTemplate {
			project_key: self.project_key.clone(),
			..IssueTemplate::default()
		};
		if let Some(id) = self.issue_type_id.as_ref().filter(|id| !id.is_empty()) {
			template.issue_type = IssueType::Id(id.clone());
		} else if let Some(name) = self.issue_type_name.as_ref().filter(|name| !name.is_empty()) {
			template.issue_type = IssueType::Name(name.clone());
		}
		if let Some(labels) = &self.labels {
			template.labels = labels.clone();
		}
		template
	}
}

#[derive(Debug, Default)]
pub struct NotificationsConfig {
	pub alert_channel: Option<ChatId>,
	pub dispatch_channel: Option<ChatId>,
}

#[derive(Debug, Eq, PartialEq)]
pub enum ProvisioningConfig {
	/// Create a text channel in a guild, optionally under a category.
	Discord { guild: u64, category: Option<u64> },
	/// Ask an HTTP chat factory for a group chat.
	ChatFactory {
		url: String,
		bot_username: Option<String>,
		send_bot_username: bool,
	},
}

#[derive(Debug, Default)]
pub struct IntakeConfig {
	pub no_skip: Vec<FieldKey>,
}
