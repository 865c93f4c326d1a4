// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::steps::{Mode, clamp_cursor, steps_for};
use crate::model::{FieldKey, Ticket};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Where in the conversation a draft currently is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
	/// Asking the field under the cursor (in either mode).
	Collecting,
	/// Showing the primary summary with the edit/create buttons.
	Preview,
	/// The tracker issue exists; waiting for the assistance workflow or closing.
	Filed,
	/// The tracker issue was closed. Nothing else happens with this draft.
	Closed,
}

/// One session's in-progress ticket plus its navigation state.
#[derive(Clone, Debug)]
pub struct Draft {
	pub ticket: Ticket,
	pub cursor: usize,
	pub mode: Mode,
	pub phase: Phase,
	/// Set while a single field is patched from the summary.
	pub editing: bool,
	/// Set while the incident source is being typed in instead of picked.
	pub custom_source_input: bool,
	/// A field the cursor was forced onto because a new answer made it required. It can't be skipped.
	pub forced_field: Option<FieldKey>,
	pub assistance_invite: Option<String>,
	pub dispatcher_alerted: bool,
}

impl Draft {
	pub fn new(ticket: Ticket) -> Self {
		Self {
			ticket,
			cursor: 0,
			mode: Mode::Primary,
			phase: Phase::Collecting,
			editing: false,
			custom_source_input: false,
			forced_field: None,
			assistance_invite: None,
			dispatcher_alerted: false,
		}
	}

	/// The active field list, recomputed from the current ticket state.
	pub fn steps(&self) -> Vec<FieldKey> {
		steps_for(&self.ticket, self.mode)
	}

	/// The field under the cursor. The cursor is clamped first if the step list shrank.
	pub fn current_field(&mut self) -> FieldKey {
		let steps = self.steps();
		self.cursor = clamp_cursor(self.cursor, steps.len());
		steps[self.cursor]
	}

	pub fn is_last_step(&self) -> bool {
		self.cursor + 1 >= self.steps().len()
	}

	pub fn advance(&mut self) {
		self.set_cursor(self.cursor + 1);
	}

	pub fn retreat(&mut self) {
		self.set_cursor(self.cursor.saturating_sub(1));
	}

	pub fn set_cursor(&mut self, cursor: usize) {
		self.cursor = clamp_cursor(cursor, self.steps().len());
	}

	/// Moves the cursor onto a field if it's part of the active list. Returns whether it was.
	pub fn jump_to(&mut self, field: FieldKey) -> bool {
		match self.steps().iter().position(|step| *step == field) {
			Some(index) => {
				self.cursor = index;
				true
			}
			None => false,
		}
	}
}

/// The state of one private conversation.
#[derive(Debug, Default)]
pub struct Session {
	pub draft: Option<Draft>,
}

impl Session {
	pub fn is_closed(&self) -> bool {
		self.draft.as_ref().is_some_and(|draft| draft.phase == Phase::Closed)
	}
}

/// Sessions keyed by session identifier, owned by whatever hosts the conversation.
///
/// Each session sits behind its own lock so one user action is processed completely before the next one for the
/// same session starts, while other sessions carry on independently.
#[derive(Debug, Default)]
pub struct SessionStore {
	sessions: RwLock<HashMap<u64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
	pub async fn session(&self, session_id: u64) -> Arc<Mutex<Session>> {
		{
			let sessions = self.sessions.read().await;
			if let Some(session) = sessions.get(&session_id) {
				return Arc::clone(session);
			}
		}
		let mut sessions = self.sessions.write().await;
		Arc::clone(sessions.entry(session_id).or_default())
	}

	/// Forgets a session whose ticket was closed. Returns whether it was removed.
	///
	/// A session another task still holds is kept.
	pub async fn end_if_closed(&self, session_id: u64) -> bool {
		let mut sessions = self.sessions.write().await;
		let Some(session) = sessions.get(&session_id) else {
			return false;
		};
		// Handing out a new reference needs the map lock, which is held here.
		if Arc::strong_count(session) != 1 {
			return false;
		}
		let closed = session.try_lock().is_ok_and(|session| session.is_closed());
		if closed {
			sessions.remove(&session_id);
		}
		closed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Brand, IncidentType, Requester};
	use chrono::Utc;

	fn draft() -> Draft {
		let requester = Requester {
			user_id: 7,
			username: None,
		};
		Draft::new(Ticket::new(
			String::from("abc"),
			requester,
			Utc::now(),
			String::from("01.01.2025 10:00"),
		))
	}

	#[test]
	fn cursor_clamps_when_steps_shrink() {
		let mut draft = draft();
		draft.ticket.incident_type = Some(IncidentType::Collision);
		draft.ticket.brand = Some(Brand::Sitrak);
		draft.set_cursor(11);
		assert_eq!(draft.current_field(), FieldKey::Notes);

		draft.ticket.incident_type = Some(IncidentType::Breakdown);
		draft.ticket.brand = Some(Brand::KiaCeed);
		assert_eq!(draft.current_field(), FieldKey::Notes);
		assert_eq!(draft.cursor, 8);
		assert!(draft.is_last_step());
	}

	#[test]
	fn navigation_stays_in_bounds() {
		let mut draft = draft();
		draft.retreat();
		assert_eq!(draft.cursor, 0);
		for _ in 0..20 {
			draft.advance();
		}
		assert_eq!(draft.current_field(), FieldKey::Notes);
		assert!(!draft.jump_to(FieldKey::TrailerPlate));
		assert!(draft.jump_to(FieldKey::Brand));
		assert_eq!(draft.current_field(), FieldKey::Brand);
	}

	#[tokio::test]
	async fn store_hands_out_the_same_session() {
		let store = SessionStore::default();
		{
			let session = store.session(1).await;
			session.lock().await.draft = Some(draft());
		}
		assert!(store.session(1).await.lock().await.draft.is_some());
		assert!(store.session(2).await.lock().await.draft.is_none());
	}

	#[tokio::test]
	async fn closed_sessions_are_dropped() {
		let store = SessionStore::default();
		store.session(1).await.lock().await.draft = Some(draft());
		assert!(!store.end_if_closed(1).await);
		assert!(store.session(1).await.lock().await.draft.is_some());

		let session = store.session(1).await;
		if let Some(draft) = session.lock().await.draft.as_mut() {
			draft.phase = Phase::Closed;
		}
		assert!(!store.end_if_closed(1).await);
		drop(session);

		assert!(store.end_if_closed(1).await);
		assert!(store.session(1).await.lock().await.draft.is_none());
		assert!(!store.end_if_closed(3).await);
	}
}
