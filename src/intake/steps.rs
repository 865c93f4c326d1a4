// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{FieldKey, Ticket};

/// Which question sequence a draft is walking through.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
	/// The main intake that produces the tracker issue.
	Primary,
	/// The assistance questions, available once the tracker issue exists.
	Secondary,
}

/// How the answer to a field is entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
	Choice,
	Plate,
	TrailerPlate,
	Counter,
	Text,
}

impl FieldKey {
	pub fn input_kind(&self) -> InputKind {
		match self {
			Self::PrimaryPlate => InputKind::Plate,
			Self::TrailerPlate => InputKind::TrailerPlate,
			Self::VehicleCounts => InputKind::Counter,
			Self::Location | Self::DamageDescription | Self::Symptoms | Self::ProblemDescription | Self::Notes => {
				InputKind::Text
			}
			Self::IncidentType
			| Self::IncidentSource
			| Self::CollisionType
			| Self::Brand
			| Self::ObstacleOnRoad
			| Self::NeedsCollisionFormalization
			| Self::NeedsDiagnosis
			| Self::NeedsRepair
			| Self::NeedsEvacuation
			| Self::CalledEmergency => InputKind::Choice,
		}
	}

	/// Whether the user types the answer rather than picking it from buttons.
	pub fn accepts_typed_input(&self) -> bool {
		matches!(
			self.input_kind(),
			InputKind::Plate | InputKind::TrailerPlate | InputKind::Text
		)
	}
}

const COLLISION_STEPS: [FieldKey; 11] = [
	FieldKey::IncidentType,
	FieldKey::IncidentSource,
	FieldKey::CollisionType,
	FieldKey::Brand,
	FieldKey::PrimaryPlate,
	FieldKey::VehicleCounts,
	FieldKey::Location,
	FieldKey::DamageDescription,
	FieldKey::ProblemDescription,
	FieldKey::ObstacleOnRoad,
	FieldKey::Notes,
];

const BREAKDOWN_STEPS: [FieldKey; 9] = [
	FieldKey::IncidentType,
	FieldKey::IncidentSource,
	FieldKey::Brand,
	FieldKey::PrimaryPlate,
	FieldKey::Location,
	FieldKey::Symptoms,
	FieldKey::ProblemDescription,
	FieldKey::ObstacleOnRoad,
	FieldKey::Notes,
];

const COLLISION_ASSISTANCE_STEPS: [FieldKey; 5] = [
	FieldKey::NeedsCollisionFormalization,
	FieldKey::NeedsDiagnosis,
	FieldKey::NeedsRepair,
	FieldKey::NeedsEvacuation,
	FieldKey::CalledEmergency,
];

const BREAKDOWN_ASSISTANCE_STEPS: [FieldKey; 3] =
	[FieldKey::NeedsDiagnosis, FieldKey::NeedsRepair, FieldKey::NeedsEvacuation];

/// Computes the ordered list of fields still relevant for the ticket in the given mode.
///
/// Tickets without a classification yet follow the breakdown sequence.
pub fn steps_for(ticket: &Ticket, mode: Mode) -> Vec<FieldKey> {
	match mode {
		Mode::Primary => primary_steps(ticket),
		Mode::Secondary => {
			if ticket.is_collision() {
				COLLISION_ASSISTANCE_STEPS.to_vec()
			} else {
				BREAKDOWN_ASSISTANCE_STEPS.to_vec()
			}
		}
	}
}

fn primary_steps(ticket: &Ticket) -> Vec<FieldKey> {
	let mut steps = if ticket.is_collision() {
		COLLISION_STEPS.to_vec()
	} else {
		BREAKDOWN_STEPS.to_vec()
	};
	if ticket.requires_trailer_plate() {
		let insert_at = steps
			.iter()
			.position(|field| *field == FieldKey::PrimaryPlate)
			.map_or(steps.len(), |index| index + 1);
		steps.insert(insert_at, FieldKey::TrailerPlate);
	}
	steps
}

/// Keeps a cursor inside `[0, step_count - 1]`.
pub fn clamp_cursor(cursor: usize, step_count: usize) -> usize {
	cursor.min(step_count.saturating_sub(1))
}
