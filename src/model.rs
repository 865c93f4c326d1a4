// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use std::fmt;

/// An enumerated answer that can be offered as a row of buttons.
///
/// Codes are what travels inside button custom IDs; labels are what the user sees.
pub trait ChoiceValue: Copy + Sized + 'static {
	const OPTIONS: &'static [Self];

	fn code(&self) -> &'static str;

	fn label(&self) -> &'static str;

	fn from_code(code: &str) -> Option<Self> {
		Self::OPTIONS.iter().copied().find(|option| option.code() == code)
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IncidentType {
	Collision,
	Breakdown,
}

impl ChoiceValue for IncidentType {
	const OPTIONS: &'static [Self] = &[Self::Collision, Self::Breakdown];

	fn code(&self) -> &'static str {
		match self {
			Self::Collision => "COLLISION",
			Self::Breakdown => "BREAKDOWN",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::Collision => "Road accident",
			Self::Breakdown => "Breakdown",
		}
	}
}

/// The fixed ways an operator can learn about an incident.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KnownSource {
	DriverCall,
	TeleopsRequest,
	ExternalCall,
}

impl ChoiceValue for KnownSource {
	const OPTIONS: &'static [Self] = &[Self::DriverCall, Self::TeleopsRequest, Self::ExternalCall];

	fn code(&self) -> &'static str {
		match self {
			Self::DriverCall => "DRIVER_CALL",
			Self::TeleopsRequest => "TELEOPS_REQUEST",
			Self::ExternalCall => "EXTERNAL_CALL",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::DriverCall => "Call from the driver",
			Self::TeleopsRequest => "Teleops request",
			Self::ExternalCall => "Call to the external number",
		}
	}
}

/// Where the incident was reported from. Anything outside the fixed list is typed in by the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IncidentSource {
	Known(KnownSource),
	Custom(String),
}

impl IncidentSource {
	pub fn display_value(&self) -> &str {
		match self {
			Self::Known(source) => source.label(),
			Self::Custom(text) => text,
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CollisionType {
	Collision,
	Rollover,
	Runover,
}

impl ChoiceValue for CollisionType {
	const OPTIONS: &'static [Self] = &[Self::Collision, Self::Rollover, Self::Runover];

	fn code(&self) -> &'static str {
		match self {
			Self::Collision => "COLLISION",
			Self::Rollover => "ROLLOVER",
			Self::Runover => "RUNOVER",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::Collision => "Collision",
			Self::Rollover => "Rollover",
			Self::Runover => "Run-over",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Brand {
	KiaCeed,
	Sitrak,
}

impl Brand {
	/// Tractor units tow a trailer, which carries its own plate.
	pub fn requires_trailer_plate(&self) -> bool {
		matches!(self, Self::Sitrak)
	}

	/// Whether the digit block of the primary plate may be four digits long instead of exactly three.
	pub fn allows_four_digit_plate(&self) -> bool {
		!matches!(self, Self::KiaCeed)
	}
}

impl ChoiceValue for Brand {
	const OPTIONS: &'static [Self] = &[Self::KiaCeed, Self::Sitrak];

	fn code(&self) -> &'static str {
		match self {
			Self::KiaCeed => "KIA_CEED",
			Self::Sitrak => "SITRAK",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::KiaCeed => "Kia Ceed",
			Self::Sitrak => "Sitrak",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum YesNo {
	Yes,
	No,
}

impl ChoiceValue for YesNo {
	const OPTIONS: &'static [Self] = &[Self::Yes, Self::No];

	fn code(&self) -> &'static str {
		match self {
			Self::Yes => "YES",
			Self::No => "NO",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::Yes => "Yes",
			Self::No => "No",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum YesNoUnknown {
	Yes,
	No,
	Unknown,
}

impl ChoiceValue for YesNoUnknown {
	const OPTIONS: &'static [Self] = &[Self::Yes, Self::No, Self::Unknown];

	fn code(&self) -> &'static str {
		match self {
			Self::Yes => "YES",
			Self::No => "NO",
			Self::Unknown => "UNKNOWN",
		}
	}

	fn label(&self) -> &'static str {
		match self {
			Self::Yes => "Yes",
			Self::No => "No",
			Self::Unknown => "Unknown",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VehicleClass {
	Light,
	Bus,
	Truck,
	Moto,
}

impl VehicleClass {
	pub const ALL: [Self; 4] = [Self::Light, Self::Bus, Self::Truck, Self::Moto];

	fn index(&self) -> usize {
		match self {
			Self::Light => 0,
			Self::Bus => 1,
			Self::Truck => 2,
			Self::Moto => 3,
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			Self::Light => "light",
			Self::Bus => "bus",
			Self::Truck => "truck",
			Self::Moto => "moto",
		}
	}

	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|class| class.code() == code)
	}

	pub fn label(&self) -> &'static str {
		match self {
			Self::Light => "Car",
			Self::Bus => "Bus",
			Self::Truck => "Truck",
			Self::Moto => "Motorcycle",
		}
	}
}

/// Number of vehicles of each class involved in a collision.
///
/// Every class always has a count, so the mapping is total; "empty" means every count is zero.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VehicleCounts {
	counts: [u32; 4],
}

impl VehicleCounts {
	pub fn get(&self, class: VehicleClass) -> u32 {
		self.counts[class.index()]
	}

	pub fn increment(&mut self, class: VehicleClass) {
		let count = &mut self.counts[class.index()];
		*count = count.saturating_add(1);
	}

	pub fn decrement(&mut self, class: VehicleClass) {
		let count = &mut self.counts[class.index()];
		*count = count.saturating_sub(1);
	}

	pub fn clear(&mut self) {
		self.counts = [0; 4];
	}

	pub fn is_empty(&self) -> bool {
		self.counts.iter().all(|count| *count == 0)
	}

	pub fn iter(&self) -> impl Iterator<Item = (VehicleClass, u32)> + '_ {
		VehicleClass::ALL.into_iter().map(|class| (class, self.get(class)))
	}
}

/// Identifies a chat or channel on the messaging platform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// The person filing the report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Requester {
	pub user_id: u64,
	pub username: Option<String>,
}

/// Every question the intake can ask, in both the primary and the assistance workflows.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldKey {
	IncidentType,
	IncidentSource,
	CollisionType,
	Brand,
	PrimaryPlate,
	TrailerPlate,
	VehicleCounts,
	Location,
	DamageDescription,
	Symptoms,
	ProblemDescription,
	ObstacleOnRoad,
	Notes,
	NeedsCollisionFormalization,
	NeedsDiagnosis,
	NeedsRepair,
	NeedsEvacuation,
	CalledEmergency,
}

impl FieldKey {
	pub const ALL: [Self; 18] = [
		Self::IncidentType,
		Self::IncidentSource,
		Self::CollisionType,
		Self::Brand,
		Self::PrimaryPlate,
		Self::TrailerPlate,
		Self::VehicleCounts,
		Self::Location,
		Self::DamageDescription,
		Self::Symptoms,
		Self::ProblemDescription,
		Self::ObstacleOnRoad,
		Self::Notes,
		Self::NeedsCollisionFormalization,
		Self::NeedsDiagnosis,
		Self::NeedsRepair,
		Self::NeedsEvacuation,
		Self::CalledEmergency,
	];

	pub fn code(&self) -> &'static str {
		match self {
			Self::IncidentType => "incident_type",
			Self::IncidentSource => "incident_source",
			Self::CollisionType => "collision_type",
			Self::Brand => "brand",
			Self::PrimaryPlate => "primary_plate",
			Self::TrailerPlate => "trailer_plate",
			Self::VehicleCounts => "vehicle_counts",
			Self::Location => "location",
			Self::DamageDescription => "damage_description",
			Self::Symptoms => "symptoms",
			Self::ProblemDescription => "problem_description",
			Self::ObstacleOnRoad => "obstacle_on_road",
			Self::Notes => "notes",
			Self::NeedsCollisionFormalization => "needs_formalization",
			Self::NeedsDiagnosis => "needs_diagnosis",
			Self::NeedsRepair => "needs_repair",
			Self::NeedsEvacuation => "needs_evacuation",
			Self::CalledEmergency => "called_emergency",
		}
	}

	pub fn from_code(code: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|field| field.code() == code)
	}
}

impl fmt::Display for FieldKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

/// The structured incident record assembled during intake.
#[derive(Clone, Debug)]
pub struct Ticket {
	pub id: String,
	pub requester: Requester,
	pub created_at: DateTime<Utc>,
	/// Local wall-clock time the report was started, as shown to operators.
	pub incident_time: String,
	pub incident_type: Option<IncidentType>,
	pub incident_source: Option<IncidentSource>,
	pub collision_type: Option<CollisionType>,
	pub brand: Option<Brand>,
	/// Compact canonical form; see [crate::intake::validation::normalize_primary_plate].
	pub primary_plate: Option<String>,
	pub trailer_plate: Option<String>,
	pub vehicle_counts: VehicleCounts,
	pub location: Option<String>,
	pub damage_description: Option<String>,
	pub symptoms: Option<String>,
	pub problem_description: Option<String>,
	pub obstacle_on_road: Option<YesNoUnknown>,
	pub notes: Option<String>,
	/// Key of the issue in the tracker. Set once, when the issue is created.
	pub tracker_key: Option<String>,
	pub needs_collision_formalization: Option<YesNo>,
	pub needs_diagnosis: Option<YesNo>,
	pub needs_repair: Option<YesNo>,
	pub needs_evacuation: Option<YesNo>,
	pub called_emergency: Option<YesNo>,
	/// Chat provisioned for the assistance workflow.
	pub assistance_chat: Option<ChatId>,
}

impl Ticket {
	pub fn new(id: String, requester: Requester, created_at: DateTime<Utc>, incident_time: String) -> Self {
		Self {
			id,
			requester,
			created_at,
			incident_time,
			incident_type: None,
			incident_source: None,
			collision_type: None,
			brand: None,
			primary_plate: None,
			trailer_plate: None,
			vehicle_counts: VehicleCounts::default(),
			location: None,
			damage_description: None,
			symptoms: None,
			problem_description: None,
			obstacle_on_road: None,
			notes: None,
			tracker_key: None,
			needs_collision_formalization: None,
			needs_diagnosis: None,
			needs_repair: None,
			needs_evacuation: None,
			called_emergency: None,
			assistance_chat: None,
		}
	}

	pub fn is_collision(&self) -> bool {
		self.incident_type == Some(IncidentType::Collision)
	}

	pub fn requires_trailer_plate(&self) -> bool {
		self.brand.is_some_and(|brand| brand.requires_trailer_plate())
	}

	/// Resets a field to its neutral value.
	pub fn clear(&mut self, field: FieldKey) {
		match field {
			FieldKey::IncidentType => self.incident_type = None,
			FieldKey::IncidentSource => self.incident_source = None,
			FieldKey::CollisionType => self.collision_type = None,
			FieldKey::Brand => self.brand = None,
			FieldKey::PrimaryPlate => self.primary_plate = None,
			FieldKey::TrailerPlate => self.trailer_plate = None,
			FieldKey::VehicleCounts => self.vehicle_counts.clear(),
			FieldKey::Location => self.location = None,
			FieldKey::DamageDescription => self.damage_description = None,
			FieldKey::Symptoms => self.symptoms = None,
			FieldKey::ProblemDescription => self.problem_description = None,
			FieldKey::ObstacleOnRoad => self.obstacle_on_road = None,
			FieldKey::Notes => self.notes = None,
			FieldKey::NeedsCollisionFormalization => self.needs_collision_formalization = None,
			FieldKey::NeedsDiagnosis => self.needs_diagnosis = None,
			FieldKey::NeedsRepair => self.needs_repair = None,
			FieldKey::NeedsEvacuation => self.needs_evacuation = None,
			FieldKey::CalledEmergency => self.called_emergency = None,
		}
	}

	/// Mutable access to a free-text field. Returns `None` for fields that aren't free text.
	pub fn text_field_mut(&mut self, field: FieldKey) -> Option<&mut Option<String>> {
		match field {
			FieldKey::Location => Some(&mut self.location),
			FieldKey::DamageDescription => Some(&mut self.damage_description),
			FieldKey::Symptoms => Some(&mut self.symptoms),
			FieldKey::ProblemDescription => Some(&mut self.problem_description),
			FieldKey::Notes => Some(&mut self.notes),
			_ => None,
		}
	}

	/// Mutable access to one of the yes/no assistance flags.
	pub fn flag_field_mut(&mut self, field: FieldKey) -> Option<&mut Option<YesNo>> {
		match field {
			FieldKey::NeedsCollisionFormalization => Some(&mut self.needs_collision_formalization),
			FieldKey::NeedsDiagnosis => Some(&mut self.needs_diagnosis),
			FieldKey::NeedsRepair => Some(&mut self.needs_repair),
			FieldKey::NeedsEvacuation => Some(&mut self.needs_evacuation),
			FieldKey::CalledEmergency => Some(&mut self.called_emergency),
			_ => None,
		}
	}
}
