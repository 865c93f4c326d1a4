// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::action::Action;

/// What pressing a button does.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ButtonTarget {
	/// Sends the action back to the engine.
	Action(Action),
	/// Opens a link.
	Link(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Button {
	pub label: String,
	pub target: ButtonTarget,
}

impl Button {
	pub fn action(label: impl Into<String>, action: Action) -> Self {
		Self {
			label: label.into(),
			target: ButtonTarget::Action(action),
		}
	}

	pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			target: ButtonTarget::Link(url.into()),
		}
	}
}

/// A transport-neutral message: markdown text plus rows of buttons.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct View {
	pub text: String,
	pub rows: Vec<Vec<Button>>,
}

impl View {
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			rows: Vec::new(),
		}
	}

	pub fn with_rows(mut self, rows: Vec<Vec<Button>>) -> Self {
		self.rows = rows;
		self
	}
}

#[cfg(test)]
impl View {
	pub fn buttons(&self) -> impl Iterator<Item = &Button> {
		self.rows.iter().flatten()
	}

	/// Finds the action behind the first button with the given label.
	pub fn action_for(&self, label: &str) -> Option<&Action> {
		self.buttons().find_map(|button| match &button.target {
			ButtonTarget::Action(action) if button.label == label => Some(action),
			_ => None,
		})
	}

	pub fn has_action(&self, action: &Action) -> bool {
		self.buttons()
			.any(|button| matches!(&button.target, ButtonTarget::Action(target) if target == action))
	}
}

/// How the transport should deliver a view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reply {
	/// Replace the message the user just interacted with.
	Edit(View),
	/// Post a new message in the conversation.
	Send(View),
}

impl Reply {
	pub fn view(&self) -> &View {
		match self {
			Self::Edit(view) | Self::Send(view) => view,
		}
	}
}

/// Whether a response to the current input edits in place or is sent anew.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Delivery {
	Edit,
	Send,
}

impl Delivery {
	pub(crate) fn reply(self, view: View) -> Reply {
		match self {
			Self::Edit => Reply::Edit(view),
			Self::Send => Reply::Send(view),
		}
	}
}
