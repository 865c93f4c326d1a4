// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

pub mod fields;
pub mod jira;

/// Field values of a tracker issue, keyed by the tracker's field names.
pub type IssueFields = Map<String, Value>;

/// Transition and status names that mean an issue is finished.
pub const DONE_LABELS: [&str; 8] = [
	"Done",
	"Closed",
	"Resolve",
	"Resolved",
	"Закрыто",
	"Закрыть",
	"Готово",
	"Выполнено",
];

/// A workflow transition an issue can take right now.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transition {
	pub id: String,
	pub name: String,
	pub target_status: String,
}

#[derive(Debug, Diagnostic)]
pub enum TrackerError {
	/// The tracker's address or credentials are missing from the configuration.
	NotConfigured,
	/// The tracker couldn't be reached, or didn't answer in time.
	Network(Box<dyn Error + Send + Sync>),
	/// The tracker answered with an error status.
	Remote { status: u16, messages: Vec<String> },
	/// The tracker reported success, but the body couldn't be read.
	MalformedResponse { status: u16, body: String },
	/// The issue has no transitions at all, so it can't be closed.
	NoTransitions,
}

impl fmt::Display for TrackerError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotConfigured => write!(
				f,
				"The tracker isn't configured (base URL, email, and API token are required)."
			),
			Self::Network(error) => write!(f, "Network error: {}", error),
			Self::Remote { status, messages } => {
				write!(f, "HTTP {}", status)?;
				for message in messages {
					write!(f, "\n  - {}", message)?;
				}
				Ok(())
			}
			Self::MalformedResponse { status, body } => {
				write!(f, "HTTP {}, but the response couldn't be read: {}", status, body)
			}
			Self::NoTransitions => write!(f, "There are no transitions available to close the issue."),
		}
	}
}

impl Error for TrackerError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Network(error) => Some(error.as_ref()),
			_ => None,
		}
	}
}

/// Operations on the issue tracker the intake files tickets with.
#[async_trait]
pub trait TrackerGateway: Send + Sync {
	/// Creates an issue and returns its key.
	async fn create(&self, fields: IssueFields) -> Result<String, TrackerError>;

	async fn patch_fields(&self, key: &str, fields: IssueFields) -> Result<(), TrackerError>;

	async fn list_transitions(&self, key: &str) -> Result<Vec<Transition>, TrackerError>;

	async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError>;
}

/// Picks the transition that closes an issue.
///
/// The first transition whose name or target status is a "done" label wins. Failing that, the last listed
/// transition is used.
pub fn select_close_transition(transitions: &[Transition]) -> Option<&Transition> {
	transitions
		.iter()
		.find(|transition| {
			DONE_LABELS.contains(&transition.name.trim()) || DONE_LABELS.contains(&transition.target_status.trim())
		})
		.or_else(|| transitions.last())
}

/// Moves an issue to its closing state, returning the transition that was applied.
pub async fn close_issue(tracker: &dyn TrackerGateway, key: &str) -> Result<Transition, TrackerError> {
	let transitions = tracker.list_transitions(key).await?;
	let Some(transition) = select_close_transition(&transitions) else {
		return Err(TrackerError::NoTransitions);
	};
	tracker.apply_transition(key, &transition.id).await?;
	Ok(transition.clone())
}
