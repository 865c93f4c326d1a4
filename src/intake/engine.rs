// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::action::{Action, CUSTOM_SOURCE_CODE};
use super::draft::{Draft, Phase, Session};
use super::keyboards;
use super::platform::ChatPlatform;
use super::render;
use super::steps::{InputKind, Mode};
use super::validation::{self, ValidationError};
use super::view::{Delivery, Reply, View};
use crate::model::{Brand, ChatId, ChoiceValue, FieldKey, IncidentSource, Requester, Ticket, VehicleCounts};
use crate::provisioning::{GroupProvisioner, ProvisionedGroup};
use crate::tracker::fields::{IssueTemplate, assistance_description, create_fields};
use crate::tracker::{TrackerGateway, close_issue};
use chrono::{Local, Utc};
use cuid2::CuidConstructor;
use std::collections::HashSet;
use std::sync::Arc;

/// Channels the engine notifies outside the requester's conversation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Channels {
	/// Gets a message with the chat link whenever assistance is requested.
	pub alert: Option<ChatId>,
	/// Gets the delay notice, the assistance summary, and dispatcher calls.
	pub dispatch: Option<ChatId>,
}

#[derive(Clone, Debug)]
pub struct EngineSettings {
	pub channels: Channels,
	/// Fields that may never be skipped.
	pub no_skip: HashSet<FieldKey>,
	pub issue_template: IssueTemplate,
	/// Whether the tracker issue description is rewritten with the assistance summary.
	pub annotate_assistance: bool,
}

/// Drives intake conversations. Every method takes the session it works on and returns the replies to show.
pub struct Engine {
	tracker: Arc<dyn TrackerGateway>,
	provisioner: Option<Arc<dyn GroupProvisioner>>,
	platform: Arc<dyn ChatPlatform>,
	settings: EngineSettings,
}

impl Engine {
	pub fn new(
		tracker: Arc<dyn TrackerGateway>,
		provisioner: Option<Arc<dyn GroupProvisioner>>,
		platform: Arc<dyn ChatPlatform>,
		settings: EngineSettings,
	) -> Self {
		Self {
			tracker,
			provisioner,
			platform,
			settings,
		}
	}

	/// Discards whatever the session held and starts a new report.
	pub fn start(&self, session: &mut Session, requester: Requester) -> Vec<Reply> {
		let id = CuidConstructor::new().with_length(8).create_id();
		let incident_time = Local::now().format("%d.%m.%Y %H:%M").to_string();
		let ticket = Ticket::new(id, requester, Utc::now(), incident_time);
		tracing::info!(ticket = %ticket.id, user = ticket.requester.user_id, "Starting a new intake");

		let mut draft = Draft::new(ticket);
		let view = self.prompt(&mut draft);
		session.draft = Some(draft);
		vec![Reply::Send(view)]
	}

	/// Handles a typed message. Text only counts as an answer while a typed field is awaited.
	pub async fn handle_text(&self, session: &mut Session, requester: Requester, text: &str) -> Vec<Reply> {
		let needs_start = match &session.draft {
			Some(draft) => draft.phase == Phase::Closed,
			None => true,
		};
		if needs_start {
			return self.start(session, requester);
		}
		let Some(draft) = session.draft.as_mut() else {
			return Vec::new();
		};
		if draft.phase != Phase::Collecting {
			return Vec::new();
		}

		let field = draft.current_field();
		let result = if field == FieldKey::IncidentSource && draft.custom_source_input {
			validation::normalize_free_text(text).map(|source| {
				draft.ticket.incident_source = Some(IncidentSource::Custom(source));
				draft.custom_source_input = false;
			})
		} else {
			match field.input_kind() {
				InputKind::Plate => match validation::normalize_primary_plate(text, draft.ticket.brand) {
					Some(plate) => {
						draft.ticket.primary_plate = Some(plate);
						Ok(())
					}
					None => Err(ValidationError::InvalidPrimaryPlate),
				},
				InputKind::TrailerPlate => match validation::normalize_trailer_plate(text) {
					Some(plate) => {
						draft.ticket.trailer_plate = Some(plate);
						Ok(())
					}
					None => Err(ValidationError::InvalidTrailerPlate),
				},
				InputKind::Text => validation::normalize_free_text(text).map(|value| {
					if let Some(slot) = draft.ticket.text_field_mut(field) {
						*slot = Some(value);
					}
				}),
				InputKind::Choice | InputKind::Counter => return Vec::new(),
			}
		};

		if let Err(error) = result {
			tracing::debug!(ticket = %draft.ticket.id, field = %field, "Rejected input: {}", error);
			let show_skip = self.skip_allowed(draft, field);
			let view = View::text(error.to_string()).with_rows(keyboards::nav_keyboard(field, show_skip));
			return vec![Reply::Send(view)];
		}

		if field == FieldKey::PrimaryPlate && draft.editing {
			if let Some(view) = self.force_trailer_plate(draft) {
				return vec![Reply::Send(view)];
			}
		}
		self.after_set(draft, Delivery::Send).await
	}

	/// Handles a button press.
	pub async fn handle_action(&self, session: &mut Session, action: Action) -> Vec<Reply> {
		let Some(draft) = session.draft.as_mut() else {
			return vec![Reply::Send(View::text(render::SESSION_EXPIRED))];
		};
		if draft.phase == Phase::Closed {
			tracing::debug!(ticket = %draft.ticket.id, "Ignoring an action for a closed ticket");
			return Vec::new();
		}
		if let Some(ticket_id) = action.ticket_id() {
			if ticket_id != draft.ticket.id {
				tracing::debug!(ticket = %draft.ticket.id, other = ticket_id, "Ignoring an action for another ticket");
				return Vec::new();
			}
		}

		match action {
			Action::Back(field) => self.back(draft, field),
			Action::Skip(field) => self.skip(draft, field).await,
			Action::Set(field, code) => self.set_choice(draft, field, &code).await,
			Action::IncrementVehicles(class) => self.adjust_vehicles(draft, |counts| counts.increment(class)),
			Action::DecrementVehicles(class) => self.adjust_vehicles(draft, |counts| counts.decrement(class)),
			Action::VehiclesDone => {
				if !self.is_awaiting(draft, FieldKey::VehicleCounts) {
					return Vec::new();
				}
				self.after_set(draft, Delivery::Edit).await
			}
			Action::OpenEditList => self.open_edit_list(draft),
			Action::EditField(field) => self.edit_field(draft, field),
			Action::CancelEdit => {
				if draft.phase != Phase::Preview {
					return Vec::new();
				}
				vec![Reply::Edit(self.preview(draft))]
			}
			Action::CreateIssue => self.create_issue(draft).await,
			Action::EnterAssistance(_) => self.enter_assistance(draft),
			Action::CloseIssue(_) => self.close(draft).await,
			Action::AlertDispatcher(_) => self.alert_dispatcher(draft).await,
		}
	}

	fn skip_allowed(&self, draft: &Draft, field: FieldKey) -> bool {
		!self.settings.no_skip.contains(&field) && draft.forced_field != Some(field)
	}

	/// Whether the draft is collecting and the cursor sits on the given field.
	///
	/// Buttons from older messages name fields the conversation has moved past; those are dropped.
	fn is_awaiting(&self, draft: &mut Draft, field: FieldKey) -> bool {
		draft.phase == Phase::Collecting && draft.current_field() == field
	}

	/// Asks the question for the field under the cursor.
	fn prompt(&self, draft: &mut Draft) -> View {
		let field = draft.current_field();
		draft.phase = Phase::Collecting;
		if draft.forced_field != Some(field) {
			draft.forced_field = None;
		}
		let show_skip = self.skip_allowed(draft, field);
		let custom_source = field == FieldKey::IncidentSource && draft.custom_source_input;

		match field.input_kind() {
			InputKind::Counter => View::text(render::counter_prompt(&draft.ticket.vehicle_counts))
				.with_rows(keyboards::counter_keyboard(show_skip)),
			InputKind::Choice if !custom_source => {
				View::text(render::question(field, false)).with_rows(keyboards::choice_keyboard(field, show_skip))
			}
			_ => View::text(render::question(field, custom_source)).with_rows(keyboards::nav_keyboard(field, show_skip)),
		}
	}

	fn preview(&self, draft: &mut Draft) -> View {
		draft.phase = Phase::Preview;
		draft.mode = Mode::Primary;
		draft.editing = false;
		draft.custom_source_input = false;
		draft.forced_field = None;
		View::text(render::preview_text(&draft.ticket)).with_rows(keyboards::summary_keyboard())
	}

	fn after_creation_view(&self, draft: &mut Draft) -> View {
		draft.phase = Phase::Filed;
		draft.mode = Mode::Primary;
		draft.cursor = 0;
		draft.editing = false;
		View::text(render::after_creation_text(&draft.ticket))
			.with_rows(keyboards::after_creation_keyboard(&draft.ticket))
	}

	fn after_assistance_view(&self, draft: &Draft) -> View {
		let mut text = render::after_assistance_text(&draft.ticket);
		let can_call_dispatcher = draft.ticket.assistance_chat.is_some() && !draft.dispatcher_alerted;
		if can_call_dispatcher {
			text.push_str("\n\n");
			text.push_str(render::DISPATCHER_PROMPT);
		}
		View::text(text).with_rows(keyboards::after_assistance_keyboard(
			&draft.ticket,
			draft.assistance_invite.as_deref(),
			draft.dispatcher_alerted,
		))
	}

	/// Decides where to go once the field under the cursor has a new value.
	async fn after_set(&self, draft: &mut Draft, delivery: Delivery) -> Vec<Reply> {
		if draft.editing && draft.mode == Mode::Primary {
			return vec![delivery.reply(self.preview(draft))];
		}
		if !draft.is_last_step() {
			draft.advance();
			return vec![delivery.reply(self.prompt(draft))];
		}
		match draft.mode {
			Mode::Primary => vec![delivery.reply(self.preview(draft))],
			Mode::Secondary => self.complete_assistance(draft, delivery).await,
		}
	}

	/// Sends the cursor to an unset trailer plate, without the option to skip it.
	fn force_trailer_plate(&self, draft: &mut Draft) -> Option<View> {
		let ticket = &draft.ticket;
		if draft.mode != Mode::Primary || !ticket.requires_trailer_plate() || ticket.trailer_plate.is_some() {
			return None;
		}
		if !draft.jump_to(FieldKey::TrailerPlate) {
			return None;
		}
		draft.forced_field = Some(FieldKey::TrailerPlate);
		Some(self.prompt(draft))
	}

	/// Stores a new brand and drops plate data the brand no longer accepts.
	///
	/// Returns the prompt to show when the cursor had to jump to a plate field.
	fn change_brand(&self, draft: &mut Draft, brand: Option<Brand>) -> Option<View> {
		let previous = draft.ticket.brand;
		draft.ticket.brand = brand;

		let mut plate_cleared = false;
		if previous != brand {
			if let Some(plate) = &draft.ticket.primary_plate {
				if !validation::primary_plate_valid_for(plate, brand) {
					tracing::debug!(ticket = %draft.ticket.id, "Clearing a vehicle plate the new brand doesn't accept");
					draft.ticket.primary_plate = None;
					plate_cleared = true;
				}
			}
			if !draft.ticket.requires_trailer_plate() {
				draft.ticket.trailer_plate = None;
			}
		}

		if plate_cleared && draft.jump_to(FieldKey::PrimaryPlate) {
			return Some(self.prompt(draft));
		}
		let newly_required = brand.is_some_and(|brand| brand.requires_trailer_plate())
			&& !previous.is_some_and(|brand| brand.requires_trailer_plate());
		if draft.editing || (newly_required && draft.ticket.primary_plate.is_some()) {
			return self.force_trailer_plate(draft);
		}
		None
	}

	fn back(&self, draft: &mut Draft, field: FieldKey) -> Vec<Reply> {
		if !self.is_awaiting(draft, field) {
			return Vec::new();
		}
		if draft.editing {
			return vec![Reply::Edit(self.preview(draft))];
		}
		if field == FieldKey::IncidentSource {
			draft.custom_source_input = false;
		}
		if draft.mode == Mode::Secondary && draft.cursor == 0 {
			return vec![Reply::Edit(self.after_creation_view(draft))];
		}
		draft.retreat();
		vec![Reply::Edit(self.prompt(draft))]
	}

	async fn skip(&self, draft: &mut Draft, field: FieldKey) -> Vec<Reply> {
		if !self.is_awaiting(draft, field) {
			return Vec::new();
		}
		if !self.skip_allowed(draft, field) {
			let mut view = self.prompt(draft);
			view.text = format!("{}\n\n{}", render::SKIP_NOT_ALLOWED, view.text);
			return vec![Reply::Edit(view)];
		}

		if field == FieldKey::Brand {
			if let Some(view) = self.change_brand(draft, None) {
				return vec![Reply::Edit(view)];
			}
		} else {
			draft.ticket.clear(field);
		}
		if field == FieldKey::IncidentSource {
			draft.custom_source_input = false;
		}
		self.after_set(draft, Delivery::Edit).await
	}

	async fn set_choice(&self, draft: &mut Draft, field: FieldKey, code: &str) -> Vec<Reply> {
		if !self.is_awaiting(draft, field) || field.input_kind() != InputKind::Choice {
			return Vec::new();
		}
		if field == FieldKey::IncidentSource {
			if code == CUSTOM_SOURCE_CODE {
				draft.custom_source_input = true;
				return vec![Reply::Edit(self.prompt(draft))];
			}
			draft.custom_source_input = false;
		}

		if field == FieldKey::Brand {
			let Some(brand) = Brand::from_code(code) else {
				return Vec::new();
			};
			if let Some(view) = self.change_brand(draft, Some(brand)) {
				return vec![Reply::Edit(view)];
			}
		} else if let Err(error) = validation::apply_choice(&mut draft.ticket, field, code) {
			tracing::debug!(source = ?error, "Ignoring an unknown choice");
			return Vec::new();
		}
		self.after_set(draft, Delivery::Edit).await
	}

	fn adjust_vehicles(&self, draft: &mut Draft, adjust: impl FnOnce(&mut VehicleCounts)) -> Vec<Reply> {
		if !self.is_awaiting(draft, FieldKey::VehicleCounts) {
			return Vec::new();
		}
		adjust(&mut draft.ticket.vehicle_counts);
		vec![Reply::Edit(self.prompt(draft))]
	}

	fn open_edit_list(&self, draft: &mut Draft) -> Vec<Reply> {
		if draft.phase != Phase::Preview {
			return Vec::new();
		}
		let view =
			View::text(render::PICK_FIELD_TO_EDIT).with_rows(keyboards::edit_list_keyboard(&draft.steps()));
		vec![Reply::Edit(view)]
	}

	fn edit_field(&self, draft: &mut Draft, field: FieldKey) -> Vec<Reply> {
		if draft.phase != Phase::Preview || !draft.jump_to(field) {
			return Vec::new();
		}
		draft.editing = true;
		vec![Reply::Edit(self.prompt(draft))]
	}

	async fn create_issue(&self, draft: &mut Draft) -> Vec<Reply> {
		if draft.ticket.tracker_key.is_some() {
			if draft.phase != Phase::Filed {
				return Vec::new();
			}
			return vec![Reply::Edit(self.after_creation_view(draft))];
		}
		if draft.phase != Phase::Preview {
			return Vec::new();
		}

		let fields = create_fields(&self.settings.issue_template, &draft.ticket);
		match self.tracker.create(fields).await {
			Ok(key) => {
				tracing::info!(ticket = %draft.ticket.id, issue = %key, "Created a tracker issue");
				draft.ticket.tracker_key = Some(key);
				let view = self.after_creation_view(draft);
				let notice = View::text(render::delay_notice(&draft.ticket));
				self.notify(self.settings.channels.dispatch, &notice, "delay notice").await;
				vec![Reply::Edit(view)]
			}
			Err(error) => {
				tracing::warn!(ticket = %draft.ticket.id, source = ?error, "Failed to create a tracker issue");
				let view = View::text(render::error_text(render::ISSUE_NOT_CREATED, &error))
					.with_rows(keyboards::summary_keyboard());
				vec![Reply::Edit(view)]
			}
		}
	}

	fn enter_assistance(&self, draft: &mut Draft) -> Vec<Reply> {
		if draft.ticket.tracker_key.is_none() {
			return vec![Reply::Send(View::text(render::NEED_ISSUE_FIRST))];
		}
		if draft.phase != Phase::Filed {
			return Vec::new();
		}
		draft.mode = Mode::Secondary;
		draft.cursor = 0;
		draft.editing = false;
		vec![Reply::Edit(self.prompt(draft))]
	}

	async fn close(&self, draft: &mut Draft) -> Vec<Reply> {
		let Some(key) = draft.ticket.tracker_key.clone() else {
			return vec![Reply::Send(View::text(render::NEED_ISSUE_FIRST))];
		};
		match close_issue(self.tracker.as_ref(), &key).await {
			Ok(transition) => {
				tracing::info!(ticket = %draft.ticket.id, issue = %key, transition = %transition.name, "Closed a tracker issue");
				if let Some(chat) = draft.ticket.assistance_chat {
					if let Err(error) = self.platform.lock_chat(chat).await {
						tracing::warn!(chat = %chat, source = ?error, "Failed to lock the assistance chat");
					}
				}
				draft.phase = Phase::Closed;
				vec![Reply::Edit(View::text(render::ISSUE_CLOSED))]
			}
			Err(error) => {
				tracing::warn!(ticket = %draft.ticket.id, issue = %key, source = ?error, "Failed to close a tracker issue");
				let view = View::text(render::error_text(render::ISSUE_NOT_CLOSED, &error))
					.with_rows(keyboards::close_keyboard(&draft.ticket));
				vec![Reply::Edit(view)]
			}
		}
	}

	async fn alert_dispatcher(&self, draft: &mut Draft) -> Vec<Reply> {
		let Some(dispatch) = self.settings.channels.dispatch else {
			return vec![Reply::Send(View::text(render::DISPATCH_NOT_CONFIGURED))];
		};
		let Some(chat) = draft.ticket.assistance_chat else {
			return vec![Reply::Send(View::text(render::NO_ASSISTANCE_CHAT))];
		};

		let invite_link = match self.platform.create_invite_link(chat).await {
			Ok(link) => link,
			Err(error) => {
				tracing::warn!(chat = %chat, source = ?error, "Failed to create an invite for the dispatcher");
				let view = View::text(render::error_text(render::DISPATCHER_NOT_REACHED, &error));
				return vec![Reply::Send(view)];
			}
		};
		let alert = View::text(render::DISPATCHER_NEEDED).with_rows(keyboards::open_chat_keyboard(&invite_link));
		if let Err(error) = self.platform.send(dispatch, &alert).await {
			tracing::warn!(chat = %dispatch, source = ?error, "Failed to alert the dispatcher");
			let view = View::text(render::error_text(render::DISPATCHER_NOT_REACHED, &error));
			return vec![Reply::Send(view)];
		}

		draft.dispatcher_alerted = true;
		vec![
			Reply::Edit(self.after_assistance_view(draft)),
			Reply::Send(View::text(render::DISPATCHER_ALERTED)),
		]
	}

	/// Finishes the assistance questions: sets up the chat, tells everyone who needs to know, and shows the result.
	///
	/// Nothing here past the precondition can fail the workflow; each outside call is logged when it fails.
	async fn complete_assistance(&self, draft: &mut Draft, delivery: Delivery) -> Vec<Reply> {
		let Some(key) = draft.ticket.tracker_key.clone() else {
			return vec![Reply::Send(View::text(render::NEED_ISSUE_FIRST))];
		};
		draft.mode = Mode::Primary;
		draft.cursor = 0;
		draft.phase = Phase::Filed;
		draft.dispatcher_alerted = false;

		let subject = render::assistance_subject(&draft.ticket);
		let group = match &self.provisioner {
			Some(provisioner) => match provisioner.create_group(&subject).await {
				Ok(group) => group,
				Err(error) => {
					tracing::warn!(ticket = %draft.ticket.id, source = ?error, "Failed to create the assistance chat");
					ProvisionedGroup::default()
				}
			},
			None => ProvisionedGroup::default(),
		};
		if group.chat.is_none() {
			tracing::warn!(ticket = %draft.ticket.id, "No assistance chat was created");
		}

		let mut invite_link = group.invite_link.clone();
		if let Some(chat) = group.chat {
			draft.ticket.assistance_chat = Some(chat);
			let title = render::assistance_chat_title(&draft.ticket);
			let summary = View::text(render::after_assistance_text(&draft.ticket));
			let (invite, rename, post) = tokio::join!(
				self.platform.create_invite_link(chat),
				self.platform.rename_chat(chat, &title),
				self.platform.send(chat, &summary),
			);
			match invite {
				Ok(link) => invite_link = Some(link),
				Err(error) => tracing::warn!(chat = %chat, source = ?error, "Failed to create an invite link"),
			}
			if let Err(error) = rename {
				tracing::warn!(chat = %chat, source = ?error, "Failed to rename the assistance chat");
			}
			if let Err(error) = post {
				tracing::warn!(chat = %chat, source = ?error, "Failed to post the summary to the assistance chat");
			}
		}
		draft.assistance_invite = invite_link.clone();

		let mut alert = View::text(render::ASSISTANCE_NEEDED);
		if let Some(link) = &invite_link {
			alert = alert.with_rows(keyboards::open_chat_keyboard(link));
		}
		self.notify(self.settings.channels.alert, &alert, "assistance alert").await;
		let notice = View::text(render::assistance_notice(&draft.ticket));
		self.notify(self.settings.channels.dispatch, &notice, "assistance notice").await;

		if self.settings.annotate_assistance {
			let fields = assistance_description(&draft.ticket);
			if let Err(error) = self.tracker.patch_fields(&key, fields).await {
				tracing::warn!(issue = %key, source = ?error, "Failed to update the tracker issue description");
			}
		}

		tracing::info!(ticket = %draft.ticket.id, chat = ?draft.ticket.assistance_chat, "Completed the assistance workflow");
		vec![delivery.reply(self.after_assistance_view(draft))]
	}

	async fn notify(&self, channel: Option<ChatId>, view: &View, what: &str) {
		let Some(channel) = channel else {
			return;
		};
		if let Err(error) = self.platform.send(channel, view).await {
			tracing::warn!(chat = %channel, source = ?error, "Failed to post the {}", what);
		}
	}
}
