// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::validation::{format_primary_plate, format_trailer_plate};
use crate::model::{ChoiceValue, FieldKey, Ticket, VehicleClass, VehicleCounts, YesNo};
use serde_json::{Value, json};

/// Placeholder shown for any field without a value.
pub const EMPTY: &str = "—";

pub const NEED_ISSUE_FIRST: &str = "⚠️ The tracker issue hasn't been created yet.";
pub const ISSUE_CLOSED: &str = "✅ The ticket and its tracker issue are closed";
pub const DISPATCHER_PROMPT: &str = "If the dispatcher needs to step in, press the button below";
pub const DISPATCHER_NEEDED: &str = "Dispatcher intervention required";
pub const DISPATCHER_ALERTED: &str = "The request was sent to the dispatcher.";
pub const DISPATCH_NOT_CONFIGURED: &str = "No dispatcher channel is set up.";
pub const NO_ASSISTANCE_CHAT: &str = "There's no assistance chat for this ticket yet.";
pub const ASSISTANCE_NEEDED: &str = "Your help is needed";
pub const SKIP_NOT_ALLOWED: &str = "This question can't be skipped.";
pub const PICK_FIELD_TO_EDIT: &str = "Pick the field to change:";
pub const SESSION_EXPIRED: &str = "This report is no longer active. Send any message or use /start to begin a new one.";
pub const ISSUE_NOT_CREATED: &str = "⚠️ Couldn't create the tracker issue.";
pub const ISSUE_NOT_CLOSED: &str = "⚠️ Couldn't close the tracker issue.";
pub const DISPATCHER_NOT_REACHED: &str = "⚠️ Couldn't reach the dispatcher.";

/// How summary blocks are written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Style {
	/// Discord markdown: bold values, user text escaped.
	Markdown,
	/// Unformatted text, used for the tracker issue description.
	Plain,
}

/// Escapes characters Discord treats as markdown so user text shows up literally.
///
/// Besides inline formatting this covers masked links, headings, and a `-` opening a line (list items and subtext).
pub fn escape_markdown(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	let mut line_start = true;
	for c in text.chars() {
		let special = matches!(
			c,
			'\\' | '*' | '_' | '~' | '`' | '|' | '>' | '[' | ']' | '(' | ')' | '#'
		);
		if special || (line_start && c == '-') {
			escaped.push('\\');
		}
		escaped.push(c);
		if c == '\n' {
			line_start = true;
		} else if !c.is_whitespace() {
			line_start = false;
		}
	}
	escaped
}

pub fn field_label(field: FieldKey) -> &'static str {
	match field {
		FieldKey::IncidentType => "Incident type",
		FieldKey::IncidentSource => "Reported through",
		FieldKey::CollisionType => "Accident type",
		FieldKey::Brand => "Vehicle type",
		FieldKey::PrimaryPlate => "Vehicle plate",
		FieldKey::TrailerPlate => "Trailer plate",
		FieldKey::VehicleCounts => "Vehicles involved",
		FieldKey::Location => "Location",
		FieldKey::DamageDescription => "Damage",
		FieldKey::Symptoms => "Symptoms",
		FieldKey::ProblemDescription => "Problem description",
		FieldKey::ObstacleOnRoad => "Vehicle obstructs traffic",
		FieldKey::Notes => "Notes",
		FieldKey::NeedsCollisionFormalization => "Accident paperwork needed",
		FieldKey::NeedsDiagnosis => "Inspection or diagnosis needed",
		FieldKey::NeedsRepair => "Repair needed",
		FieldKey::NeedsEvacuation => "Tow needed",
		FieldKey::CalledEmergency => "Emergency services were called",
	}
}

/// The question asked when the cursor reaches a field.
pub fn question(field: FieldKey, custom_source_input: bool) -> &'static str {
	match field {
		FieldKey::IncidentType => "Pick the incident type:",
		FieldKey::IncidentSource if custom_source_input => "Type in where the incident was reported from:",
		FieldKey::IncidentSource => "How did you learn about the incident?",
		FieldKey::CollisionType => "Pick the accident type:",
		FieldKey::Brand => "Pick the vehicle type:",
		FieldKey::PrimaryPlate => "Enter the vehicle plate\n(1 letter + 3 digits + 2 letters + 2 or 3 region digits)",
		FieldKey::TrailerPlate => "Enter the trailer plate\n(2 letters + 4 digits + 2 or 3 region digits)",
		FieldKey::VehicleCounts => "Types and number of vehicles involved:",
		FieldKey::Location => "Where is the vehicle? (coordinates or landmarks)",
		FieldKey::DamageDescription => "Describe the damage to the vehicle or trailer",
		FieldKey::Symptoms => "Describe the symptoms of the fault:",
		FieldKey::ProblemDescription => "Describe the problem in detail",
		FieldKey::ObstacleOnRoad => "Is the vehicle obstructing traffic?",
		FieldKey::Notes => "Any special remarks or notes",
		FieldKey::NeedsCollisionFormalization => "Does the accident need paperwork?",
		FieldKey::NeedsDiagnosis => "Is an inspection or diagnosis needed?",
		FieldKey::NeedsRepair => "Is a repair needed?",
		FieldKey::NeedsEvacuation => "Is a tow needed?",
		FieldKey::CalledEmergency => "Were emergency services called?",
	}
}

fn line(style: Style, label: &str, value: Option<&str>) -> String {
	let value = value.filter(|value| !value.is_empty());
	match (style, value) {
		(Style::Markdown, Some(value)) => format!("{}: **{}**", label, escape_markdown(value)),
		(Style::Markdown, None) => format!("{}: **{}**", label, EMPTY),
		(Style::Plain, value) => format!("{}: {}", label, value.unwrap_or(EMPTY)),
	}
}

fn choice_label<T: ChoiceValue>(value: Option<T>) -> Option<&'static str> {
	value.map(|value| value.label())
}

/// The vehicles involved as a compact tally, such as `Car×2, Bus×1`.
pub fn vehicle_tally(counts: &VehicleCounts) -> String {
	let parts: Vec<String> = counts
		.iter()
		.filter(|(_, count)| *count > 0)
		.map(|(class, count)| format!("{}×{}", class.label(), count))
		.collect();
	if parts.is_empty() {
		EMPTY.to_string()
	} else {
		parts.join(", ")
	}
}

/// One line per field that matters for the ticket's classification.
pub fn primary_block(ticket: &Ticket, style: Style) -> String {
	let collision = ticket.is_collision();
	let mut lines = Vec::new();

	lines.push(line(
		style,
		field_label(FieldKey::IncidentType),
		choice_label(ticket.incident_type),
	));
	lines.push(line(
		style,
		field_label(FieldKey::IncidentSource),
		ticket.incident_source.as_ref().map(|source| source.display_value()),
	));
	let time_label = if collision {
		"Accident date and time"
	} else {
		"Incident time"
	};
	lines.push(line(style, time_label, Some(ticket.incident_time.as_str())));
	if collision {
		lines.push(line(
			style,
			field_label(FieldKey::CollisionType),
			choice_label(ticket.collision_type),
		));
	}
	lines.push(line(style, field_label(FieldKey::Brand), choice_label(ticket.brand)));
	let primary_plate = ticket.primary_plate.as_deref().map(format_primary_plate);
	lines.push(line(
		style,
		field_label(FieldKey::PrimaryPlate),
		primary_plate.as_deref(),
	));
	if ticket.requires_trailer_plate() {
		let trailer_plate = ticket.trailer_plate.as_deref().map(format_trailer_plate);
		lines.push(line(
			style,
			field_label(FieldKey::TrailerPlate),
			trailer_plate.as_deref(),
		));
	}
	lines.push(line(style, field_label(FieldKey::Location), ticket.location.as_deref()));
	if collision {
		let tally = vehicle_tally(&ticket.vehicle_counts);
		lines.push(line(style, field_label(FieldKey::VehicleCounts), Some(tally.as_str())));
		lines.push(line(
			style,
			field_label(FieldKey::DamageDescription),
			ticket.damage_description.as_deref(),
		));
	}
	lines.push(line(
		style,
		field_label(FieldKey::ObstacleOnRoad),
		choice_label(ticket.obstacle_on_road),
	));
	if !collision {
		lines.push(line(style, field_label(FieldKey::Symptoms), ticket.symptoms.as_deref()));
	}
	lines.push(line(
		style,
		field_label(FieldKey::ProblemDescription),
		ticket.problem_description.as_deref(),
	));
	lines.push(line(style, field_label(FieldKey::Notes), ticket.notes.as_deref()));

	lines.join("\n")
}

/// The assistance answers under their own heading.
pub fn secondary_block(ticket: &Ticket, style: Style) -> String {
	let heading = match style {
		Style::Markdown => "**Assistance details:**",
		Style::Plain => "Assistance details:",
	};
	let flags: Vec<(FieldKey, Option<YesNo>)> = if ticket.is_collision() {
		vec![
			(FieldKey::NeedsCollisionFormalization, ticket.needs_collision_formalization),
			(FieldKey::NeedsDiagnosis, ticket.needs_diagnosis),
			(FieldKey::NeedsRepair, ticket.needs_repair),
			(FieldKey::NeedsEvacuation, ticket.needs_evacuation),
			(FieldKey::CalledEmergency, ticket.called_emergency),
		]
	} else {
		vec![
			(FieldKey::NeedsDiagnosis, ticket.needs_diagnosis),
			(FieldKey::NeedsRepair, ticket.needs_repair),
			(FieldKey::NeedsEvacuation, ticket.needs_evacuation),
		]
	};

	let mut lines = vec![heading.to_string()];
	for (field, value) in flags {
		lines.push(line(style, field_label(field), choice_label(value)));
	}
	lines.join("\n")
}

pub fn combined_summary(ticket: &Ticket, style: Style) -> String {
	format!("{}\n\n{}", primary_block(ticket, style), secondary_block(ticket, style))
}

/// One-line title for the tracker issue: `[type] brand — plate`.
pub fn tracker_summary(ticket: &Ticket) -> String {
	let incident_type = choice_label(ticket.incident_type).unwrap_or("-");
	let brand = choice_label(ticket.brand).unwrap_or("-");
	let mut summary = format!("[{}] {}", incident_type, brand);
	if let Some(plate) = &ticket.primary_plate {
		summary.push_str(" — ");
		summary.push_str(&format_primary_plate(plate));
	}
	summary
}

/// Builds an Atlassian Document Format document with one paragraph per line of text.
pub fn adf_document(text: &str) -> Option<Value> {
	if text.is_empty() {
		return None;
	}
	let paragraphs: Vec<Value> = text
		.lines()
		.map(|line| {
			if line.is_empty() {
				json!({ "type": "paragraph", "content": [] })
			} else {
				json!({ "type": "paragraph", "content": [{ "type": "text", "text": line }] })
			}
		})
		.collect();
	Some(json!({ "type": "doc", "version": 1, "content": paragraphs }))
}

pub fn preview_text(ticket: &Ticket) -> String {
	format!(
		"***Check the ticket before filing it***\n\n{}",
		primary_block(ticket, Style::Markdown)
	)
}

pub fn ticket_header(ticket: &Ticket) -> String {
	format!(
		"**Ticket #{}**\nTracker issue: **{}**",
		ticket.id,
		ticket.tracker_key.as_deref().map_or_else(|| EMPTY.to_string(), escape_markdown)
	)
}

pub fn after_creation_text(ticket: &Ticket) -> String {
	format!(
		"{}\n\n{}",
		ticket_header(ticket),
		primary_block(ticket, Style::Markdown)
	)
}

pub fn after_assistance_text(ticket: &Ticket) -> String {
	format!(
		"{}\n\n{}",
		ticket_header(ticket),
		combined_summary(ticket, Style::Markdown)
	)
}

/// Notice for the dispatch channel when a ticket is filed.
pub fn delay_notice(ticket: &Ticket) -> String {
	format!(
		"**⚠️ The vehicle may be delayed en route ⚠️**\n\n*Problem description*\n{}\n\n{}",
		ticket_header(ticket),
		primary_block(ticket, Style::Markdown)
	)
}

/// Notice for the dispatch channel when the assistance workflow completes.
pub fn assistance_notice(ticket: &Ticket) -> String {
	format!(
		"**Roadside assistance was called**\n{}\n\n{}",
		ticket_header(ticket),
		secondary_block(ticket, Style::Markdown)
	)
}

pub fn counter_prompt(counts: &VehicleCounts) -> String {
	let tallies: Vec<String> = VehicleClass::ALL
		.into_iter()
		.map(|class| format!("{}: **{}**", class.label(), counts.get(class)))
		.collect();
	format!(
		"{}\n\n*Use the +/− buttons, then press Done*\n\n{}",
		question(FieldKey::VehicleCounts, false),
		tallies.join("\n")
	)
}

/// Name given to the provisioned assistance chat.
pub fn assistance_chat_title(ticket: &Ticket) -> String {
	format!(
		"[Ticket #{}] | [{}] | {}",
		ticket.id,
		choice_label(ticket.brand).unwrap_or(EMPTY),
		ticket.incident_time
	)
}

/// Title requested from the group provisioner.
pub fn assistance_subject(ticket: &Ticket) -> String {
	format!("Ticket #{} — assistance", ticket.id)
}

/// Prefixes an error with the failed operation, escaping the externally sourced part.
pub fn error_text(context: &str, error: &dyn std::fmt::Display) -> String {
	format!("{}\n\n{}", context, escape_markdown(&error.to_string()))
}

pub fn diagnostics_text(channel_id: u64, channel_kind: &str, user_id: u64, guild_id: Option<u64>) -> String {
	let guild = guild_id.map_or_else(|| EMPTY.to_string(), |id| id.to_string());
	format!(
		"Channel ID: `{}`\nChannel type: `{}`\nUser ID: `{}`\nServer ID: `{}`",
		channel_id, channel_kind, user_id, guild
	)
}
