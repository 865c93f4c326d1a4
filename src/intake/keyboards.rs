// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::action::{Action, CUSTOM_SOURCE_CODE};
use super::render::field_label;
use super::view::Button;
use crate::model::{
	Brand, ChoiceValue, CollisionType, FieldKey, IncidentType, KnownSource, Ticket, VehicleClass, YesNo,
	YesNoUnknown,
};

const EDIT_LIST_ROW_WIDTH: usize = 5;

fn options_of<T: ChoiceValue>() -> Vec<(&'static str, &'static str)> {
	T::OPTIONS.iter().map(|option| (option.code(), option.label())).collect()
}

/// The `(code, label)` pairs offered for an enumerated field.
pub fn choice_options(field: FieldKey) -> Vec<(&'static str, &'static str)> {
	match field {
		FieldKey::IncidentType => options_of::<IncidentType>(),
		FieldKey::IncidentSource => {
			let mut options = options_of::<KnownSource>();
			options.push((CUSTOM_SOURCE_CODE, "Other"));
			options
		}
		FieldKey::CollisionType => options_of::<CollisionType>(),
		FieldKey::Brand => options_of::<Brand>(),
		FieldKey::ObstacleOnRoad => options_of::<YesNoUnknown>(),
		FieldKey::NeedsCollisionFormalization
		| FieldKey::NeedsDiagnosis
		| FieldKey::NeedsRepair
		| FieldKey::NeedsEvacuation
		| FieldKey::CalledEmergency => options_of::<YesNo>(),
		_ => Vec::new(),
	}
}

fn nav_row(field: FieldKey, show_skip: bool) -> Vec<Button> {
	let mut row = Vec::new();
	if show_skip {
		row.push(Button::action("Skip", Action::Skip(field)));
	}
	row.push(Button::action("⬅ Back", Action::Back(field)));
	row
}

/// Options for an enumerated field, followed by skip and back. The first question has neither.
pub fn choice_keyboard(field: FieldKey, show_skip: bool) -> Vec<Vec<Button>> {
	let options = choice_options(field)
		.into_iter()
		.map(|(code, label)| Button::action(label, Action::Set(field, code.to_string())))
		.collect();
	let mut rows = vec![options];
	if field != FieldKey::IncidentType {
		rows.push(nav_row(field, show_skip));
	}
	rows
}

/// Skip and back for fields answered by typing.
pub fn nav_keyboard(field: FieldKey, show_skip: bool) -> Vec<Vec<Button>> {
	vec![nav_row(field, show_skip)]
}

pub fn counter_keyboard(show_skip: bool) -> Vec<Vec<Button>> {
	let mut rows: Vec<Vec<Button>> = VehicleClass::ALL
		.into_iter()
		.map(|class| {
			vec![
				Button::action(format!("− {}", class.label()), Action::DecrementVehicles(class)),
				Button::action(format!("+ {}", class.label()), Action::IncrementVehicles(class)),
			]
		})
		.collect();
	let mut last_row = vec![Button::action("Done", Action::VehiclesDone)];
	last_row.extend(nav_row(FieldKey::VehicleCounts, show_skip));
	rows.push(last_row);
	rows
}

pub fn summary_keyboard() -> Vec<Vec<Button>> {
	vec![vec![
		Button::action("✏️ Edit", Action::OpenEditList),
		Button::action("✅ File the ticket", Action::CreateIssue),
	]]
}

/// Every active primary field, so any of them can be changed from the summary.
pub fn edit_list_keyboard(fields: &[FieldKey]) -> Vec<Vec<Button>> {
	let mut rows: Vec<Vec<Button>> = fields
		.chunks(EDIT_LIST_ROW_WIDTH)
		.map(|chunk| {
			chunk
				.iter()
				.map(|field| Button::action(field_label(*field), Action::EditField(*field)))
				.collect()
		})
		.collect();
	rows.push(vec![Button::action("⬅ Back to the summary", Action::CancelEdit)]);
	rows
}

pub fn after_creation_keyboard(ticket: &Ticket) -> Vec<Vec<Button>> {
	vec![vec![
		Button::action("🛠 Call roadside assistance", Action::EnterAssistance(ticket.id.clone())),
		Button::action("Close the ticket", Action::CloseIssue(ticket.id.clone())),
	]]
}

pub fn close_keyboard(ticket: &Ticket) -> Vec<Vec<Button>> {
	vec![vec![Button::action("Close the ticket", Action::CloseIssue(ticket.id.clone()))]]
}

/// Close, plus the dispatcher and chat buttons when there's an assistance chat to point to.
pub fn after_assistance_keyboard(
	ticket: &Ticket,
	invite_link: Option<&str>,
	dispatcher_alerted: bool,
) -> Vec<Vec<Button>> {
	let mut row = vec![Button::action("Close the ticket", Action::CloseIssue(ticket.id.clone()))];
	if ticket.assistance_chat.is_some() && !dispatcher_alerted {
		row.push(Button::action(
			"📞 Call the dispatcher",
			Action::AlertDispatcher(ticket.id.clone()),
		));
	}
	if let Some(link) = invite_link {
		row.push(Button::link("Open the chat", link));
	}
	vec![row]
}

pub fn open_chat_keyboard(invite_link: &str) -> Vec<Vec<Button>> {
	vec![vec![Button::link("Open the chat", invite_link)]]
}
