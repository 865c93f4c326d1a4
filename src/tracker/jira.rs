// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{IssueFields, TrackerError, TrackerGateway, Transition};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const ISSUE_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const ISSUE_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSITION_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TRANSITION_TIMEOUT: Duration = Duration::from_secs(20);

const REMOTE_BODY_LIMIT: usize = 1500;
const MALFORMED_BODY_LIMIT: usize = 300;

#[derive(Clone, Debug)]
pub struct JiraCredentials {
	pub base_url: String,
	pub email: String,
	pub api_token: String,
}

/// Jira Cloud REST v3 client authenticating with an account email and API token.
pub struct JiraClient {
	credentials: Option<JiraCredentials>,
	issue_http: Client,
	transition_http: Client,
}

#[derive(Deserialize)]
struct CreatedIssue {
	key: String,
}

#[derive(Deserialize)]
struct TransitionList {
	#[serde(default)]
	transitions: Vec<RawTransition>,
}

#[derive(Deserialize)]
struct RawTransition {
	id: String,
	#[serde(default)]
	name: String,
	#[serde(default)]
	to: Option<RawStatus>,
}

#[derive(Deserialize)]
struct RawStatus {
	#[serde(default)]
	name: String,
}

impl From<RawTransition> for Transition {
	fn from(raw: RawTransition) -> Self {
		Self {
			id: raw.id,
			name: raw.name,
			target_status: raw.to.map(|status| status.name).unwrap_or_default(),
		}
	}
}

fn truncate(text: &str, limit: usize) -> String {
	text.chars().take(limit).collect()
}

/// Turns an error response into a readable list: Jira's global and per-field messages when the body has them,
/// otherwise the start of the raw body.
fn remote_error(status: StatusCode, body: &str) -> TrackerError {
	let body = body.trim();
	let mut messages = Vec::new();
	match serde_json::from_str::<Value>(body) {
		Ok(Value::Object(data)) => {
			if let Some(Value::Array(error_messages)) = data.get("errorMessages") {
				for message in error_messages {
					match message {
						Value::String(message) => messages.push(message.clone()),
						other => messages.push(other.to_string()),
					}
				}
			}
			if let Some(Value::Object(field_errors)) = data.get("errors") {
				for (field, message) in field_errors {
					match message {
						Value::String(message) => messages.push(format!("{}: {}", field, message)),
						other => messages.push(format!("{}: {}", field, other)),
					}
				}
			}
		}
		_ => {
			if !body.is_empty() {
				messages.push(truncate(body, REMOTE_BODY_LIMIT));
			}
		}
	}
	TrackerError::Remote {
		status: status.as_u16(),
		messages,
	}
}

fn network_error(error: reqwest::Error) -> TrackerError {
	TrackerError::Network(Box::new(error))
}

async fn read_body(response: Response) -> Result<(StatusCode, String), TrackerError> {
	let status = response.status();
	let body = response.text().await.map_err(network_error)?;
	Ok((status, body))
}

impl JiraClient {
	pub fn new(credentials: Option<JiraCredentials>) -> Result<Self, TrackerError> {
		let credentials = credentials.map(|credentials| JiraCredentials {
			base_url: credentials.base_url.trim_end_matches('/').to_string(),
			..credentials
		});
		let issue_http = Client::builder()
			.connect_timeout(ISSUE_CONNECT_TIMEOUT)
			.timeout(ISSUE_TIMEOUT)
			.build()
			.map_err(network_error)?;
		let transition_http = Client::builder()
			.connect_timeout(TRANSITION_CONNECT_TIMEOUT)
			.timeout(TRANSITION_TIMEOUT)
			.build()
			.map_err(network_error)?;
		Ok(Self {
			credentials,
			issue_http,
			transition_http,
		})
	}

	fn credentials(&self) -> Result<&JiraCredentials, TrackerError> {
		match &self.credentials {
			Some(credentials)
				if !credentials.base_url.is_empty()
					&& !credentials.email.is_empty()
					&& !credentials.api_token.is_empty() =>
			{
				Ok(credentials)
			}
			_ => Err(TrackerError::NotConfigured),
		}
	}

	fn request(
		&self,
		http: &Client,
		method: reqwest::Method,
		path: &str,
	) -> Result<RequestBuilder, TrackerError> {
		let credentials = self.credentials()?;
		let url = format!("{}{}", credentials.base_url, path);
		tracing::debug!(%method, %url, "Sending a tracker request");
		Ok(http
			.request(method, url)
			.basic_auth(&credentials.email, Some(&credentials.api_token)))
	}
}

#[async_trait]
impl TrackerGateway for JiraClient {
	async fn create(&self, fields: IssueFields) -> Result<String, TrackerError> {
		let response = self
			.request(&self.issue_http, reqwest::Method::POST, "/rest/api/3/issue")?
			.json(&json!({ "fields": fields }))
			.send()
			.await
			.map_err(network_error)?;
		let (status, body) = read_body(response).await?;
		if status != StatusCode::CREATED {
			return Err(remote_error(status, &body));
		}
		match serde_json::from_str::<CreatedIssue>(&body) {
			Ok(created) => Ok(created.key),
			Err(_) => Err(TrackerError::MalformedResponse {
				status: status.as_u16(),
				body: truncate(&body, MALFORMED_BODY_LIMIT),
			}),
		}
	}

	async fn patch_fields(&self, key: &str, fields: IssueFields) -> Result<(), TrackerError> {
		let path = format!("/rest/api/3/issue/{}", key);
		let response = self
			.request(&self.issue_http, reqwest::Method::PUT, &path)?
			.json(&json!({ "fields": fields }))
			.send()
			.await
			.map_err(network_error)?;
		let (status, body) = read_body(response).await?;
		match status {
			StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
			_ => Err(remote_error(status, &body)),
		}
	}

	async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError> {
		let path = format!("/rest/api/3/issue/{}/transitions", key);
		let response = self
			.request(&self.transition_http, reqwest::Method::GET, &path)?
			.send()
			.await
			.map_err(network_error)?;
		let (status, body) = read_body(response).await?;
		if status != StatusCode::OK {
			return Err(remote_error(status, &body));
		}
		match serde_json::from_str::<TransitionList>(&body) {
			Ok(list) => Ok(list.transitions.into_iter().map(Transition::from).collect()),
			Err(_) => Err(TrackerError::MalformedResponse {
				status: status.as_u16(),
				body: truncate(&body, MALFORMED_BODY_LIMIT),
			}),
		}
	}

	async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
		let path = format!("/rest/api/3/issue/{}/transitions", key);
		let response = self
			.request(&self.transition_http, reqwest::Method::POST, &path)?
			.json(&json!({ "transition": { "id": transition_id } }))
			.send()
			.await
			.map_err(network_error)?;
		let (status, body) = read_body(response).await?;
		match status {
			StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
			_ => Err(remote_error(status, &body)),
		}
	}
}
