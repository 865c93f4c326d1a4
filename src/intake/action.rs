// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{FieldKey, VehicleClass};

/// Choice code that switches the incident source question over to typed input.
pub const CUSTOM_SOURCE_CODE: &str = "OTHER";

/// An in-conversation action, carried in a button's custom ID as `/`-separated parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
	Back(FieldKey),
	Skip(FieldKey),
	Set(FieldKey, String),
	IncrementVehicles(VehicleClass),
	DecrementVehicles(VehicleClass),
	VehiclesDone,
	OpenEditList,
	EditField(FieldKey),
	CancelEdit,
	CreateIssue,
	EnterAssistance(String),
	CloseIssue(String),
	AlertDispatcher(String),
}

impl Action {
	pub fn parse(custom_id: &str) -> Option<Self> {
		let parts: Vec<&str> = custom_id.splitn(3, '/').collect();
		let action = match parts.as_slice() {
			["nav", "back", field] => Self::Back(FieldKey::from_code(field)?),
			["nav", "skip", field] => Self::Skip(FieldKey::from_code(field)?),
			["set", field, value] => Self::Set(FieldKey::from_code(field)?, value.to_string()),
			["veh", "plus", class] => Self::IncrementVehicles(VehicleClass::from_code(class)?),
			["veh", "minus", class] => Self::DecrementVehicles(VehicleClass::from_code(class)?),
			["veh", "done"] => Self::VehiclesDone,
			["summary", "edit"] => Self::OpenEditList,
			["summary", "create"] => Self::CreateIssue,
			["edit", "field", field] => Self::EditField(FieldKey::from_code(field)?),
			["edit", "cancel"] => Self::CancelEdit,
			["act", "assist", ticket_id] => Self::EnterAssistance(ticket_id.to_string()),
			["act", "close", ticket_id] => Self::CloseIssue(ticket_id.to_string()),
			["dispatch", ticket_id] => Self::AlertDispatcher(ticket_id.to_string()),
			_ => return None,
		};
		Some(action)
	}

	pub fn custom_id(&self) -> String {
		match self {
			Self::Back(field) => format!("nav/back/{}", field),
			Self::Skip(field) => format!("nav/skip/{}", field),
			Self::Set(field, value) => format!("set/{}/{}", field, value),
			Self::IncrementVehicles(class) => format!("veh/plus/{}", class.code()),
			Self::DecrementVehicles(class) => format!("veh/minus/{}", class.code()),
			Self::VehiclesDone => String::from("veh/done"),
			Self::OpenEditList => String::from("summary/edit"),
			Self::CreateIssue => String::from("summary/create"),
			Self::EditField(field) => format!("edit/field/{}", field),
			Self::CancelEdit => String::from("edit/cancel"),
			Self::EnterAssistance(ticket_id) => format!("act/assist/{}", ticket_id),
			Self::CloseIssue(ticket_id) => format!("act/close/{}", ticket_id),
			Self::AlertDispatcher(ticket_id) => format!("dispatch/{}", ticket_id),
		}
	}

	/// The ticket a post-creation action was issued for.
	pub fn ticket_id(&self) -> Option<&str> {
		match self {
			Self::EnterAssistance(ticket_id) | Self::CloseIssue(ticket_id) | Self::AlertDispatcher(ticket_id) => {
				Some(ticket_id)
			}
			_ => None,
		}
	}
}
