// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::{
	Brand, ChoiceValue, CollisionType, FieldKey, IncidentSource, IncidentType, KnownSource, Ticket, YesNo,
	YesNoUnknown,
};
use miette::Diagnostic;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::sync::LazyLock;

/// Letters allowed in plate series: the Cyrillic letters that have a Latin look-alike.
const SERIES_LETTERS: &str = "АВЕКМНОРСТУХ";

static PLATE_THREE_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(
		"^([{0}])([0-9]{{3}})([{0}]{{2}})([0-9]{{2,3}})$",
		SERIES_LETTERS
	))
	.expect("plate pattern is valid")
});

static PLATE_THREE_OR_FOUR_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(
		"^([{0}])([0-9]{{3,4}})([{0}]{{2}})([0-9]{{2,3}})$",
		SERIES_LETTERS
	))
	.expect("plate pattern is valid")
});

static TRAILER_PLATE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!("^([{0}]{{2}})([0-9]{{4}})([0-9]{{2,3}})$", SERIES_LETTERS))
		.expect("trailer plate pattern is valid")
});

/// A rejected answer. The message is shown to the user as-is.
#[derive(Debug, Diagnostic, Eq, PartialEq)]
pub enum ValidationError {
	InvalidPrimaryPlate,
	InvalidTrailerPlate,
	EmptyText,
	UnknownChoice { field: FieldKey, code: String },
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidPrimaryPlate => write!(f, "❌ Invalid vehicle plate format ❌"),
			Self::InvalidTrailerPlate => write!(f, "❌ Invalid trailer plate format ❌"),
			Self::EmptyText => write!(f, "❌ Empty input ❌"),
			Self::UnknownChoice { field, code } => write!(f, "Unknown value {} for {}", code, field),
		}
	}
}

impl Error for ValidationError {}

fn latin_to_cyrillic(letter: char) -> char {
	match letter {
		'A' => 'А',
		'B' => 'В',
		'E' => 'Е',
		'K' => 'К',
		'M' => 'М',
		'H' => 'Н',
		'O' => 'О',
		'P' => 'Р',
		'C' => 'С',
		'T' => 'Т',
		'Y' => 'У',
		'X' => 'Х',
		other => other,
	}
}

/// Drops separators, uppercases, and maps Latin look-alikes onto the Cyrillic series letters.
fn compact_plate(input: &str) -> String {
	input
		.chars()
		.filter(|c| c.is_alphanumeric())
		.flat_map(char::to_uppercase)
		.map(latin_to_cyrillic)
		.collect()
}

fn primary_plate_pattern(brand: Option<Brand>) -> &'static Regex {
	match brand {
		Some(brand) if !brand.allows_four_digit_plate() => &PLATE_THREE_DIGITS,
		_ => &PLATE_THREE_OR_FOUR_DIGITS,
	}
}

/// Validates a vehicle plate against the pattern for the brand and returns its compact canonical form.
pub fn normalize_primary_plate(input: &str, brand: Option<Brand>) -> Option<String> {
	let compact = compact_plate(input);
	if primary_plate_pattern(brand).is_match(&compact) {
		Some(compact)
	} else {
		None
	}
}

/// Whether an already-normalized plate is still valid for the given brand.
pub fn primary_plate_valid_for(compact: &str, brand: Option<Brand>) -> bool {
	primary_plate_pattern(brand).is_match(compact)
}

/// Validates a trailer plate and returns its compact canonical form.
pub fn normalize_trailer_plate(input: &str) -> Option<String> {
	let compact = compact_plate(input);
	if TRAILER_PLATE.is_match(&compact) {
		Some(compact)
	} else {
		None
	}
}

/// Formats a compact vehicle plate for display, putting the region code after a space.
pub fn format_primary_plate(compact: &str) -> String {
	match PLATE_THREE_OR_FOUR_DIGITS.captures(compact) {
		Some(captures) => format!("{}{}{} {}", &captures[1], &captures[2], &captures[3], &captures[4]),
		None => compact.to_string(),
	}
}

/// Formats a compact trailer plate for display.
pub fn format_trailer_plate(compact: &str) -> String {
	match TRAILER_PLATE.captures(compact) {
		Some(captures) => format!("{}{} {}", &captures[1], &captures[2], &captures[3]),
		None => compact.to_string(),
	}
}

/// Trims free text, rejecting input that's empty or only whitespace.
pub fn normalize_free_text(input: &str) -> Result<String, ValidationError> {
	let text = input.trim();
	if text.is_empty() {
		Err(ValidationError::EmptyText)
	} else {
		Ok(text.to_string())
	}
}

fn parse_choice<T: ChoiceValue>(field: FieldKey, code: &str) -> Result<T, ValidationError> {
	T::from_code(code).ok_or_else(|| ValidationError::UnknownChoice {
		field,
		code: code.to_string(),
	})
}

/// Stores an enumerated answer picked from a button.
pub fn apply_choice(ticket: &mut Ticket, field: FieldKey, code: &str) -> Result<(), ValidationError> {
	match field {
		FieldKey::IncidentType => ticket.incident_type = Some(parse_choice::<IncidentType>(field, code)?),
		FieldKey::IncidentSource => {
			let source = parse_choice::<KnownSource>(field, code)?;
			ticket.incident_source = Some(IncidentSource::Known(source));
		}
		FieldKey::CollisionType => ticket.collision_type = Some(parse_choice::<CollisionType>(field, code)?),
		FieldKey::Brand => ticket.brand = Some(parse_choice::<Brand>(field, code)?),
		FieldKey::ObstacleOnRoad => ticket.obstacle_on_road = Some(parse_choice::<YesNoUnknown>(field, code)?),
		_ => {
			let value = parse_choice::<YesNo>(field, code)?;
			match ticket.flag_field_mut(field) {
				Some(flag) => *flag = Some(value),
				None => {
					return Err(ValidationError::UnknownChoice {
						field,
						code: code.to_string(),
					});
				}
			}
		}
	}
	Ok(())
}
