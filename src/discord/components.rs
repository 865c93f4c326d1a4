// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::intake::{ButtonTarget, View};
use twilight_model::channel::message::AllowedMentions;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::http::interaction::InteractionResponseData;
use twilight_util::builder::InteractionResponseDataBuilder;

const MESSAGE_LENGTH_LIMIT: usize = 2000;
const BUTTON_LABEL_LIMIT: usize = 80;
const BUTTONS_PER_ROW: usize = 5;
const ROWS_PER_MESSAGE: usize = 5;

/// The view's text, cut to fit in a single message.
pub fn message_content(view: &View) -> String {
	if view.text.chars().count() <= MESSAGE_LENGTH_LIMIT {
		return view.text.clone();
	}
	let mut content: String = view.text.chars().take(MESSAGE_LENGTH_LIMIT - 1).collect();
	content.push('…');
	content
}

fn button(button: &crate::intake::Button) -> Component {
	let label: String = button.label.chars().take(BUTTON_LABEL_LIMIT).collect();
	let button = match &button.target {
		ButtonTarget::Action(action) => Button {
			custom_id: Some(action.custom_id()),
			disabled: false,
			emoji: None,
			label: Some(label),
			style: ButtonStyle::Primary,
			url: None,
			sku_id: None,
		},
		ButtonTarget::Link(url) => Button {
			custom_id: None,
			disabled: false,
			emoji: None,
			label: Some(label),
			style: ButtonStyle::Link,
			url: Some(url.clone()),
			sku_id: None,
		},
	};
	Component::Button(button)
}

/// Lays out the view's buttons as action rows. Rows too long for Discord wrap onto the next row.
pub fn message_components(view: &View) -> Vec<Component> {
	let mut rows = Vec::new();
	for row in view.rows.iter().filter(|row| !row.is_empty()) {
		for chunk in row.chunks(BUTTONS_PER_ROW) {
			rows.push(Component::ActionRow(ActionRow {
				components: chunk.iter().map(button).collect(),
			}));
		}
	}
	if rows.len() > ROWS_PER_MESSAGE {
		tracing::warn!(rows = rows.len(), "Dropping buttons that don't fit in one message");
		rows.truncate(ROWS_PER_MESSAGE);
	}
	rows
}

/// A view as the data of an interaction response.
pub fn response_data(view: &View) -> InteractionResponseData {
	InteractionResponseDataBuilder::new()
		.content(message_content(view))
		.components(message_components(view))
		.allowed_mentions(AllowedMentions::default())
		.build()
}
