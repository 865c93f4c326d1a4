// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::IssueFields;
use crate::intake::render::{self, Style};
use crate::model::Ticket;
use serde_json::{Value, json};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IssueType {
	Id(String),
	Name(String),
}

/// The parts of a new issue that come from configuration rather than from the ticket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssueTemplate {
	pub project_key: String,
	pub issue_type: IssueType,
	pub labels: Vec<String>,
}

impl Default for IssueTemplate {
	fn default() -> Self {
		Self {
			project_key: String::new(),
			issue_type: IssueType::Name(String::from("Task")),
			labels: vec![String::from("roadwarden"), String::from("auto-ticket")],
		}
	}
}

/// Everything the tracker needs to file a new issue for the ticket.
pub fn create_fields(template: &IssueTemplate, ticket: &Ticket) -> IssueFields {
	let mut fields = IssueFields::new();
	fields.insert(String::from("project"), json!({ "key": template.project_key }));
	fields.insert(String::from("summary"), Value::String(render::tracker_summary(ticket)));
	fields.insert(String::from("labels"), json!(template.labels));
	if let Some(description) = render::adf_document(&render::primary_block(ticket, Style::Plain)) {
		fields.insert(String::from("description"), description);
	}
	let issue_type = match &template.issue_type {
		IssueType::Id(id) => json!({ "id": id }),
		IssueType::Name(name) => json!({ "name": name }),
	};
	fields.insert(String::from("issuetype"), issue_type);
	fields
}

/// Rewrites the issue description to include the assistance answers.
pub fn assistance_description(ticket: &Ticket) -> IssueFields {
	let mut fields = IssueFields::new();
	if let Some(description) = render::adf_document(&render::combined_summary(ticket, Style::Plain)) {
		fields.insert(String::from("description"), description);
	}
	fields
}
