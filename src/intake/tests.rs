// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::action::{Action, CUSTOM_SOURCE_CODE};
use super::draft::{Draft, Phase, Session};
use super::engine::{Channels, Engine, EngineSettings};
use super::platform::{ChatPlatform, PlatformError};
use super::render;
use super::steps::Mode;
use super::view::{ButtonTarget, Reply, View};
use crate::model::{Brand, ChatId, FieldKey, IncidentSource, IncidentType, Requester, Ticket, VehicleClass};
use crate::provisioning::{GroupProvisioner, ProvisionedGroup, ProvisioningError};
use crate::tracker::fields::IssueTemplate;
use crate::tracker::{IssueFields, TrackerError, TrackerGateway, Transition};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const ALERT_CHANNEL: ChatId = ChatId(1);
const DISPATCH_CHANNEL: ChatId = ChatId(2);
const ASSISTANCE_CHAT: ChatId = ChatId(-100500);

#[derive(Default)]
struct FakeTracker {
	fail_create: bool,
	transitions: Vec<Transition>,
	created: Mutex<Vec<IssueFields>>,
	patched: Mutex<Vec<String>>,
	applied: Mutex<Vec<String>>,
}

#[async_trait]
impl TrackerGateway for FakeTracker {
	async fn create(&self, fields: IssueFields) -> Result<String, TrackerError> {
		if self.fail_create {
			return Err(TrackerError::Remote {
				status: 400,
				messages: vec![String::from("project: project is required")],
			});
		}
		let mut created = self.created.lock().unwrap();
		created.push(fields);
		Ok(format!("OPS-{}", created.len()))
	}

	async fn patch_fields(&self, key: &str, _fields: IssueFields) -> Result<(), TrackerError> {
		self.patched.lock().unwrap().push(key.to_string());
		Ok(())
	}

	async fn list_transitions(&self, _key: &str) -> Result<Vec<Transition>, TrackerError> {
		Ok(self.transitions.clone())
	}

	async fn apply_transition(&self, _key: &str, transition_id: &str) -> Result<(), TrackerError> {
		self.applied.lock().unwrap().push(transition_id.to_string());
		Ok(())
	}
}

struct FakeProvisioner {
	group: ProvisionedGroup,
	titles: Mutex<Vec<String>>,
}

#[async_trait]
impl GroupProvisioner for FakeProvisioner {
	async fn create_group(&self, title: &str) -> Result<ProvisionedGroup, ProvisioningError> {
		self.titles.lock().unwrap().push(title.to_string());
		Ok(self.group.clone())
	}
}

#[derive(Default)]
struct FakePlatform {
	sent: Mutex<Vec<(ChatId, View)>>,
	renamed: Mutex<Vec<(ChatId, String)>>,
	locked: Mutex<Vec<ChatId>>,
	fail_invites: bool,
}

impl FakePlatform {
	fn sent_to(&self, chat: ChatId) -> Vec<View> {
		self.sent
			.lock()
			.unwrap()
			.iter()
			.filter(|(target, _)| *target == chat)
			.map(|(_, view)| view.clone())
			.collect()
	}
}

#[async_trait]
impl ChatPlatform for FakePlatform {
	async fn send(&self, chat: ChatId, view: &View) -> Result<(), PlatformError> {
		self.sent.lock().unwrap().push((chat, view.clone()));
		Ok(())
	}

	async fn create_invite_link(&self, chat: ChatId) -> Result<String, PlatformError> {
		if self.fail_invites {
			return Err(PlatformError::message("Missing Permissions"));
		}
		Ok(format!("https://discord.gg/{}", chat.0.unsigned_abs()))
	}

	async fn rename_chat(&self, chat: ChatId, title: &str) -> Result<(), PlatformError> {
		self.renamed.lock().unwrap().push((chat, title.to_string()));
		Ok(())
	}

	async fn lock_chat(&self, chat: ChatId) -> Result<(), PlatformError> {
		self.locked.lock().unwrap().push(chat);
		Ok(())
	}
}

struct Harness {
	engine: Engine,
	tracker: Arc<FakeTracker>,
	platform: Arc<FakePlatform>,
	session: Session,
}

fn requester() -> Requester {
	Requester {
		user_id: 7,
		username: Some(String::from("driver")),
	}
}

fn settings() -> EngineSettings {
	EngineSettings {
		channels: Channels {
			alert: Some(ALERT_CHANNEL),
			dispatch: Some(DISPATCH_CHANNEL),
		},
		no_skip: HashSet::new(),
		issue_template: IssueTemplate {
			project_key: String::from("OPS"),
			..IssueTemplate::default()
		},
		annotate_assistance: true,
	}
}

fn done_transitions() -> Vec<Transition> {
	vec![
		Transition {
			id: String::from("11"),
			name: String::from("Start progress"),
			target_status: String::from("In Progress"),
		},
		Transition {
			id: String::from("31"),
			name: String::from("Finish"),
			target_status: String::from("Done"),
		},
	]
}

impl Harness {
	fn new(tracker: FakeTracker, group: Option<ProvisionedGroup>, platform: FakePlatform, settings: EngineSettings) -> Self {
		let tracker = Arc::new(tracker);
		let platform = Arc::new(platform);
		let provisioner: Option<Arc<dyn GroupProvisioner>> = group.map(|group| {
			Arc::new(FakeProvisioner {
				group,
				titles: Mutex::new(Vec::new()),
			}) as Arc<dyn GroupProvisioner>
		});
		let engine = Engine::new(tracker.clone(), provisioner, platform.clone(), settings);
		Self {
			engine,
			tracker,
			platform,
			session: Session::default(),
		}
	}

	fn basic() -> Self {
		Self::new(
			FakeTracker {
				transitions: done_transitions(),
				..FakeTracker::default()
			},
			None,
			FakePlatform::default(),
			settings(),
		)
	}

	fn draft(&self) -> &Draft {
		self.session.draft.as_ref().unwrap()
	}

	fn draft_mut(&mut self) -> &mut Draft {
		self.session.draft.as_mut().unwrap()
	}

	fn ticket_id(&self) -> String {
		self.draft().ticket.id.clone()
	}

	fn current_field(&mut self) -> FieldKey {
		self.draft_mut().current_field()
	}

	/// Puts a prepared ticket into the session, with the cursor on the given field.
	fn load(&mut self, ticket: Ticket, phase: Phase, field: Option<FieldKey>) {
		let mut draft = Draft::new(ticket);
		draft.phase = phase;
		if let Some(field) = field {
			assert!(draft.jump_to(field));
		}
		self.session.draft = Some(draft);
	}

	async fn press(&mut self, action: Action) -> Vec<Reply> {
		self.engine.handle_action(&mut self.session, action).await
	}

	async fn type_text(&mut self, text: &str) -> Vec<Reply> {
		self.engine.handle_text(&mut self.session, requester(), text).await
	}
}

fn last_view(replies: &[Reply]) -> &View {
	replies.last().expect("a reply").view()
}

fn has_link(view: &View) -> bool {
	view.buttons().any(|button| matches!(button.target, ButtonTarget::Link(_)))
}

fn breakdown_ticket(brand: Brand, plate: &str) -> Ticket {
	let mut ticket = Ticket::new(
		String::from("tk000001"),
		requester(),
		Utc::now(),
		String::from("01.02.2025 09:15"),
	);
	ticket.incident_type = Some(IncidentType::Breakdown);
	ticket.brand = Some(brand);
	ticket.primary_plate = Some(plate.to_string());
	ticket.location = Some(String::from("Ring road, km 12"));
	ticket
}

fn filed_ticket() -> Ticket {
	let mut ticket = breakdown_ticket(Brand::KiaCeed, "А123ВС77");
	ticket.tracker_key = Some(String::from("OPS-7"));
	ticket
}

#[tokio::test]
async fn breakdown_report_is_filed() {
	let mut harness = Harness::basic();
	let replies = harness.engine.start(&mut harness.session, requester());
	assert!(matches!(replies.as_slice(), [Reply::Send(_)]));
	assert_eq!(harness.current_field(), FieldKey::IncidentType);

	harness.press(Action::Set(FieldKey::IncidentType, String::from("BREAKDOWN"))).await;
	harness.press(Action::Set(FieldKey::IncidentSource, String::from("DRIVER_CALL"))).await;
	let replies = harness.press(Action::Set(FieldKey::Brand, String::from("KIA_CEED"))).await;
	assert!(last_view(&replies).text.starts_with(render::question(FieldKey::PrimaryPlate, false)));

	let replies = harness.type_text("a 123 bc 77").await;
	assert!(matches!(replies.as_slice(), [Reply::Send(_)]));
	assert_eq!(harness.draft().ticket.primary_plate.as_deref(), Some("А123ВС77"));
	assert_eq!(harness.current_field(), FieldKey::Location);

	harness.type_text("  Ring road, km 12 ").await;
	harness.press(Action::Skip(FieldKey::Symptoms)).await;
	harness.type_text("Engine stalled").await;
	harness.press(Action::Set(FieldKey::ObstacleOnRoad, String::from("NO"))).await;
	let replies = harness.press(Action::Skip(FieldKey::Notes)).await;
	assert_eq!(harness.draft().phase, Phase::Preview);
	let preview = last_view(&replies);
	assert!(preview.text.contains("Location: **Ring road, km 12**"));
	assert!(preview.text.contains("Vehicle plate: **А123ВС 77**"));
	assert!(preview.has_action(&Action::CreateIssue));

	let replies = harness.press(Action::CreateIssue).await;
	let id = harness.ticket_id();
	let view = last_view(&replies);
	assert_eq!(harness.draft().ticket.tracker_key.as_deref(), Some("OPS-1"));
	assert_eq!(harness.draft().phase, Phase::Filed);
	assert!(view.text.contains("Tracker issue: **OPS-1**"));
	assert!(view.has_action(&Action::EnterAssistance(id.clone())));
	assert!(view.has_action(&Action::CloseIssue(id)));

	let created = harness.tracker.created.lock().unwrap();
	assert_eq!(created.len(), 1);
	assert_eq!(created[0]["summary"], "[Breakdown] Kia Ceed — А123ВС 77");
	drop(created);

	let notices = harness.platform.sent_to(DISPATCH_CHANNEL);
	assert_eq!(notices.len(), 1);
	assert!(notices[0].text.contains("may be delayed"));
}

#[tokio::test]
async fn issue_is_created_once() {
	let mut harness = Harness::basic();
	harness.load(breakdown_ticket(Brand::KiaCeed, "А123ВС77"), Phase::Preview, None);

	harness.press(Action::CreateIssue).await;
	let replies = harness.press(Action::CreateIssue).await;
	assert_eq!(harness.tracker.created.lock().unwrap().len(), 1);
	assert!(last_view(&replies).text.contains("OPS-1"));
	assert_eq!(harness.platform.sent_to(DISPATCH_CHANNEL).len(), 1);
}

#[tokio::test]
async fn failed_creation_keeps_the_summary() {
	let mut harness = Harness::new(
		FakeTracker {
			fail_create: true,
			..FakeTracker::default()
		},
		None,
		FakePlatform::default(),
		settings(),
	);
	harness.load(breakdown_ticket(Brand::KiaCeed, "А123ВС77"), Phase::Preview, None);

	let replies = harness.press(Action::CreateIssue).await;
	let view = last_view(&replies);
	assert!(view.text.starts_with(render::ISSUE_NOT_CREATED));
	assert!(view.text.contains("HTTP 400"));
	assert!(view.has_action(&Action::CreateIssue));
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert!(harness.draft().ticket.tracker_key.is_none());
	assert!(harness.platform.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn skip_clears_and_stale_skip_is_ignored() {
	let mut harness = Harness::basic();
	harness.load(breakdown_ticket(Brand::KiaCeed, "А123ВС77"), Phase::Collecting, Some(FieldKey::Location));

	let replies = harness.press(Action::Skip(FieldKey::Location)).await;
	assert_eq!(replies.len(), 1);
	assert!(harness.draft().ticket.location.is_none());
	assert_eq!(harness.current_field(), FieldKey::Symptoms);

	let replies = harness.press(Action::Skip(FieldKey::Location)).await;
	assert!(replies.is_empty());
	assert_eq!(harness.current_field(), FieldKey::Symptoms);
}

#[tokio::test]
async fn configured_fields_cannot_be_skipped() {
	let mut settings = settings();
	settings.no_skip.insert(FieldKey::IncidentSource);
	let mut harness = Harness::new(FakeTracker::default(), None, FakePlatform::default(), settings);
	harness.engine.start(&mut harness.session, requester());
	let replies = harness.press(Action::Set(FieldKey::IncidentType, String::from("COLLISION"))).await;
	assert!(!last_view(&replies).has_action(&Action::Skip(FieldKey::IncidentSource)));

	let replies = harness.press(Action::Skip(FieldKey::IncidentSource)).await;
	assert!(last_view(&replies).text.starts_with(render::SKIP_NOT_ALLOWED));
	assert_eq!(harness.current_field(), FieldKey::IncidentSource);
}

#[tokio::test]
async fn vehicle_counter() {
	let mut harness = Harness::basic();
	let mut ticket = breakdown_ticket(Brand::KiaCeed, "А123ВС77");
	ticket.incident_type = Some(IncidentType::Collision);
	harness.load(ticket, Phase::Collecting, Some(FieldKey::VehicleCounts));

	harness.press(Action::IncrementVehicles(VehicleClass::Light)).await;
	harness.press(Action::IncrementVehicles(VehicleClass::Light)).await;
	harness.press(Action::DecrementVehicles(VehicleClass::Bus)).await;
	let replies = harness.press(Action::IncrementVehicles(VehicleClass::Bus)).await;
	let view = last_view(&replies);
	assert!(view.text.contains("Car: **2**"));
	assert!(view.text.contains("Bus: **1**"));
	assert!(view.text.contains("Truck: **0**"));
	assert_eq!(harness.current_field(), FieldKey::VehicleCounts);

	harness.press(Action::VehiclesDone).await;
	assert_eq!(harness.current_field(), FieldKey::Location);
	assert_eq!(render::vehicle_tally(&harness.draft().ticket.vehicle_counts), "Car×2, Bus×1");

	let replies = harness.press(Action::IncrementVehicles(VehicleClass::Truck)).await;
	assert!(replies.is_empty());
	assert_eq!(harness.draft().ticket.vehicle_counts.get(VehicleClass::Truck), 0);
}

#[tokio::test]
async fn counter_stays_open_while_editing() {
	let mut harness = Harness::basic();
	let mut ticket = breakdown_ticket(Brand::KiaCeed, "А123ВС77");
	ticket.incident_type = Some(IncidentType::Collision);
	ticket.vehicle_counts.increment(VehicleClass::Light);
	harness.load(ticket, Phase::Preview, None);

	harness.press(Action::EditField(FieldKey::VehicleCounts)).await;
	assert!(harness.draft().editing);
	let replies = harness.press(Action::IncrementVehicles(VehicleClass::Bus)).await;
	assert!(last_view(&replies).text.contains("Bus: **1**"));
	assert_eq!(harness.draft().phase, Phase::Collecting);
	assert_eq!(harness.current_field(), FieldKey::VehicleCounts);

	let replies = harness.press(Action::VehiclesDone).await;
	assert!(last_view(&replies).has_action(&Action::CreateIssue));
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert!(!harness.draft().editing);
	assert_eq!(render::vehicle_tally(&harness.draft().ticket.vehicle_counts), "Car×1, Bus×1");

	harness.press(Action::EditField(FieldKey::Location)).await;
	harness.type_text("Bypass, km 3").await;
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert!(!harness.draft().editing);
}

#[tokio::test]
async fn skipping_twice_keeps_the_neutral_value() {
	let mut harness = Harness::basic();
	let mut ticket = breakdown_ticket(Brand::KiaCeed, "А123ВС77");
	ticket.incident_type = Some(IncidentType::Collision);
	ticket.vehicle_counts.increment(VehicleClass::Truck);
	harness.load(ticket, Phase::Collecting, Some(FieldKey::VehicleCounts));

	for _ in 0..2 {
		harness.press(Action::Skip(FieldKey::VehicleCounts)).await;
		assert!(harness.draft().ticket.vehicle_counts.is_empty());
		assert_eq!(harness.current_field(), FieldKey::Location);
		harness.press(Action::Back(FieldKey::Location)).await;
		assert_eq!(harness.current_field(), FieldKey::VehicleCounts);
	}

	harness.press(Action::IncrementVehicles(VehicleClass::Light)).await;
	harness.press(Action::VehiclesDone).await;
	for _ in 0..2 {
		harness.press(Action::Skip(FieldKey::Location)).await;
		assert!(harness.draft().ticket.location.is_none());
		assert_eq!(harness.current_field(), FieldKey::DamageDescription);
		harness.press(Action::Back(FieldKey::DamageDescription)).await;
	}
	assert_eq!(harness.current_field(), FieldKey::Location);
}

#[tokio::test]
async fn custom_incident_source() {
	let mut harness = Harness::basic();
	harness.engine.start(&mut harness.session, requester());
	harness.press(Action::Set(FieldKey::IncidentType, String::from("BREAKDOWN"))).await;

	let replies = harness
		.press(Action::Set(FieldKey::IncidentSource, String::from(CUSTOM_SOURCE_CODE)))
		.await;
	assert!(last_view(&replies).text.starts_with(render::question(FieldKey::IncidentSource, true)));
	assert_eq!(harness.current_field(), FieldKey::IncidentSource);

	let replies = harness.type_text("   ").await;
	assert!(last_view(&replies).text.contains("Empty input"));
	assert!(harness.draft().ticket.incident_source.is_none());

	harness.type_text("Tow truck crew").await;
	assert_eq!(
		harness.draft().ticket.incident_source,
		Some(IncidentSource::Custom(String::from("Tow truck crew")))
	);
	assert!(!harness.draft().custom_source_input);
	assert_eq!(harness.current_field(), FieldKey::Brand);
}

#[tokio::test]
async fn invalid_plate_is_rejected_in_place() {
	let mut harness = Harness::basic();
	let mut ticket = breakdown_ticket(Brand::KiaCeed, "А123ВС77");
	ticket.primary_plate = None;
	harness.load(ticket, Phase::Collecting, Some(FieldKey::PrimaryPlate));

	let replies = harness.type_text("А1234ВС77").await;
	assert!(last_view(&replies).text.contains("Invalid vehicle plate format"));
	assert!(harness.draft().ticket.primary_plate.is_none());
	assert_eq!(harness.current_field(), FieldKey::PrimaryPlate);
}

#[tokio::test]
async fn text_is_ignored_while_buttons_are_expected() {
	let mut harness = Harness::basic();
	harness.engine.start(&mut harness.session, requester());
	let replies = harness.type_text("hello").await;
	assert!(replies.is_empty());
	assert_eq!(harness.current_field(), FieldKey::IncidentType);
}

#[tokio::test]
async fn brand_change_drops_the_trailer_plate() {
	let mut harness = Harness::basic();
	let mut ticket = breakdown_ticket(Brand::Sitrak, "А123ВС77");
	ticket.trailer_plate = Some(String::from("АВ123477"));
	harness.load(ticket, Phase::Preview, None);
	assert!(render::preview_text(&harness.draft().ticket).contains(render::field_label(FieldKey::TrailerPlate)));

	harness.press(Action::EditField(FieldKey::Brand)).await;
	let replies = harness.press(Action::Set(FieldKey::Brand, String::from("KIA_CEED"))).await;
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert!(harness.draft().ticket.trailer_plate.is_none());
	assert_eq!(harness.draft().ticket.primary_plate.as_deref(), Some("А123ВС77"));
	assert!(!last_view(&replies).text.contains(render::field_label(FieldKey::TrailerPlate)));

	harness.press(Action::CreateIssue).await;
	let created = harness.tracker.created.lock().unwrap();
	let description = created[0]["description"].to_string();
	assert!(!description.contains(render::field_label(FieldKey::TrailerPlate)));
}

#[tokio::test]
async fn brand_change_clears_a_plate_it_rejects() {
	let mut harness = Harness::basic();
	harness.load(breakdown_ticket(Brand::Sitrak, "А1234ВС77"), Phase::Preview, None);
	harness.draft_mut().ticket.trailer_plate = Some(String::from("АВ123477"));

	harness.press(Action::EditField(FieldKey::Brand)).await;
	let replies = harness.press(Action::Set(FieldKey::Brand, String::from("KIA_CEED"))).await;
	assert!(harness.draft().ticket.primary_plate.is_none());
	assert_eq!(harness.current_field(), FieldKey::PrimaryPlate);
	assert!(last_view(&replies).text.starts_with(render::question(FieldKey::PrimaryPlate, false)));

	harness.type_text("В456ОР199").await;
	assert_eq!(harness.draft().phase, Phase::Preview);
}

#[tokio::test]
async fn new_trailer_requirement_forces_the_trailer_plate() {
	let mut harness = Harness::basic();
	harness.load(breakdown_ticket(Brand::KiaCeed, "А123ВС77"), Phase::Preview, None);

	harness.press(Action::EditField(FieldKey::Brand)).await;
	let replies = harness.press(Action::Set(FieldKey::Brand, String::from("SITRAK"))).await;
	let view = last_view(&replies);
	assert_eq!(harness.current_field(), FieldKey::TrailerPlate);
	assert!(view.has_action(&Action::Back(FieldKey::TrailerPlate)));
	assert!(!view.has_action(&Action::Skip(FieldKey::TrailerPlate)));

	let replies = harness.press(Action::Skip(FieldKey::TrailerPlate)).await;
	assert!(last_view(&replies).text.starts_with(render::SKIP_NOT_ALLOWED));

	let replies = harness.type_text("ab 1234 77").await;
	assert_eq!(harness.draft().ticket.trailer_plate.as_deref(), Some("АВ123477"));
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert!(last_view(&replies).text.contains("Trailer plate: **АВ1234 77**"));
}

#[tokio::test]
async fn assistance_needs_a_tracker_issue() {
	let mut harness = Harness::basic();
	harness.load(breakdown_ticket(Brand::KiaCeed, "А123ВС77"), Phase::Preview, None);
	let id = harness.ticket_id();

	let replies = harness.press(Action::EnterAssistance(id)).await;
	assert_eq!(replies, vec![Reply::Send(View::text(render::NEED_ISSUE_FIRST))]);
	assert_eq!(harness.draft().phase, Phase::Preview);
	assert_eq!(harness.draft().mode, Mode::Primary);
}

#[tokio::test]
async fn actions_for_other_tickets_are_ignored() {
	let mut harness = Harness::basic();
	harness.load(filed_ticket(), Phase::Filed, None);

	let replies = harness.press(Action::CloseIssue(String::from("someone-else"))).await;
	assert!(replies.is_empty());
	assert!(harness.tracker.applied.lock().unwrap().is_empty());
	assert_eq!(harness.draft().phase, Phase::Filed);
}

#[tokio::test]
async fn close_without_transitions_changes_nothing() {
	let mut harness = Harness::new(FakeTracker::default(), None, FakePlatform::default(), settings());
	harness.load(filed_ticket(), Phase::Filed, None);
	let id = harness.ticket_id();

	let replies = harness.press(Action::CloseIssue(id.clone())).await;
	let view = last_view(&replies);
	assert!(view.text.starts_with(render::ISSUE_NOT_CLOSED));
	assert!(view.has_action(&Action::CloseIssue(id)));
	assert_eq!(harness.draft().phase, Phase::Filed);
	assert!(harness.tracker.applied.lock().unwrap().is_empty());
}

#[tokio::test]
async fn closing_locks_the_assistance_chat() {
	let mut harness = Harness::basic();
	let mut ticket = filed_ticket();
	ticket.assistance_chat = Some(ASSISTANCE_CHAT);
	harness.load(ticket, Phase::Filed, None);
	let id = harness.ticket_id();

	let replies = harness.press(Action::CloseIssue(id.clone())).await;
	assert_eq!(last_view(&replies).text, render::ISSUE_CLOSED);
	assert_eq!(harness.draft().phase, Phase::Closed);
	assert_eq!(*harness.tracker.applied.lock().unwrap(), vec![String::from("31")]);
	assert_eq!(*harness.platform.locked.lock().unwrap(), vec![ASSISTANCE_CHAT]);

	assert!(harness.press(Action::CloseIssue(id)).await.is_empty());

	let replies = harness.type_text("another one").await;
	assert!(matches!(replies.as_slice(), [Reply::Send(_)]));
	assert_eq!(harness.draft().phase, Phase::Collecting);
	assert_ne!(harness.ticket_id(), "tk000001");
}

async fn answer_assistance(harness: &mut Harness) -> Vec<Reply> {
	let id = harness.ticket_id();
	let replies = harness.press(Action::EnterAssistance(id)).await;
	assert!(last_view(&replies).text.starts_with(render::question(FieldKey::NeedsDiagnosis, false)));
	assert_eq!(harness.draft().mode, Mode::Secondary);

	harness.press(Action::Set(FieldKey::NeedsDiagnosis, String::from("YES"))).await;
	harness.press(Action::Set(FieldKey::NeedsRepair, String::from("NO"))).await;
	harness.press(Action::Set(FieldKey::NeedsEvacuation, String::from("YES"))).await
}

#[tokio::test]
async fn assistance_with_a_provisioned_chat() {
	let group = ProvisionedGroup {
		chat: Some(ASSISTANCE_CHAT),
		invite_link: None,
	};
	let mut harness = Harness::new(
		FakeTracker::default(),
		Some(group),
		FakePlatform::default(),
		settings(),
	);
	harness.load(filed_ticket(), Phase::Filed, None);
	let id = harness.ticket_id();

	let replies = answer_assistance(&mut harness).await;
	let view = last_view(&replies);
	assert_eq!(harness.draft().phase, Phase::Filed);
	assert_eq!(harness.draft().mode, Mode::Primary);
	assert_eq!(harness.draft().ticket.assistance_chat, Some(ASSISTANCE_CHAT));
	assert!(view.text.contains("Tow needed: **Yes**"));
	assert!(view.text.contains(render::DISPATCHER_PROMPT));
	assert!(view.has_action(&Action::AlertDispatcher(id.clone())));
	assert!(view.has_action(&Action::CloseIssue(id)));
	assert!(has_link(view));

	let renamed = harness.platform.renamed.lock().unwrap().clone();
	assert_eq!(
		renamed,
		vec![(ASSISTANCE_CHAT, String::from("[Ticket #tk000001] | [Kia Ceed] | 01.02.2025 09:15"))]
	);
	assert_eq!(harness.platform.sent_to(ASSISTANCE_CHAT).len(), 1);
	let alerts = harness.platform.sent_to(ALERT_CHANNEL);
	assert_eq!(alerts.len(), 1);
	assert_eq!(alerts[0].text, render::ASSISTANCE_NEEDED);
	assert!(has_link(&alerts[0]));
	assert!(harness.platform.sent_to(DISPATCH_CHANNEL)[0].text.contains("Roadside assistance was called"));
	assert_eq!(*harness.tracker.patched.lock().unwrap(), vec![String::from("OPS-7")]);
}

#[tokio::test]
async fn assistance_without_a_chat_still_completes() {
	let mut harness = Harness::basic();
	harness.load(filed_ticket(), Phase::Filed, None);
	let id = harness.ticket_id();

	let replies = answer_assistance(&mut harness).await;
	let view = last_view(&replies);
	assert_eq!(harness.draft().phase, Phase::Filed);
	assert!(harness.draft().ticket.assistance_chat.is_none());
	assert!(!view.text.contains(render::DISPATCHER_PROMPT));
	assert!(!view.has_action(&Action::AlertDispatcher(id.clone())));
	assert!(view.has_action(&Action::CloseIssue(id.clone())));
	assert!(!has_link(view));

	let alerts = harness.platform.sent_to(ALERT_CHANNEL);
	assert_eq!(alerts.len(), 1);
	assert!(alerts[0].rows.is_empty());

	let replies = harness.press(Action::AlertDispatcher(id)).await;
	assert_eq!(replies, vec![Reply::Send(View::text(render::NO_ASSISTANCE_CHAT))]);
}

#[tokio::test]
async fn provisioner_link_is_used_when_invites_fail() {
	let group = ProvisionedGroup {
		chat: Some(ASSISTANCE_CHAT),
		invite_link: Some(String::from("https://t.me/+provisioned")),
	};
	let platform = FakePlatform {
		fail_invites: true,
		..FakePlatform::default()
	};
	let mut harness = Harness::new(FakeTracker::default(), Some(group), platform, settings());
	harness.load(filed_ticket(), Phase::Filed, None);

	answer_assistance(&mut harness).await;
	assert_eq!(harness.draft().assistance_invite.as_deref(), Some("https://t.me/+provisioned"));
}

#[tokio::test]
async fn dispatcher_is_alerted_once() {
	let group = ProvisionedGroup {
		chat: Some(ASSISTANCE_CHAT),
		invite_link: None,
	};
	let mut harness = Harness::new(FakeTracker::default(), Some(group), FakePlatform::default(), settings());
	harness.load(filed_ticket(), Phase::Filed, None);
	let id = harness.ticket_id();
	answer_assistance(&mut harness).await;

	let replies = harness.press(Action::AlertDispatcher(id.clone())).await;
	assert_eq!(replies.len(), 2);
	assert!(matches!(&replies[0], Reply::Edit(view) if !view.has_action(&Action::AlertDispatcher(id.clone()))));
	assert_eq!(replies[1], Reply::Send(View::text(render::DISPATCHER_ALERTED)));
	assert!(harness.draft().dispatcher_alerted);

	let dispatch = harness.platform.sent_to(DISPATCH_CHANNEL);
	let alert = dispatch.last().unwrap();
	assert_eq!(alert.text, render::DISPATCHER_NEEDED);
	assert!(has_link(alert));
}

#[tokio::test]
async fn back_from_first_assistance_question() {
	let mut harness = Harness::basic();
	harness.load(filed_ticket(), Phase::Filed, None);
	let id = harness.ticket_id();
	harness.press(Action::EnterAssistance(id.clone())).await;

	let replies = harness.press(Action::Back(FieldKey::NeedsDiagnosis)).await;
	assert!(last_view(&replies).has_action(&Action::EnterAssistance(id)));
	assert_eq!(harness.draft().phase, Phase::Filed);
	assert_eq!(harness.draft().mode, Mode::Primary);
}

#[tokio::test]
async fn actions_without_a_session() {
	let mut harness = Harness::basic();
	let replies = harness.press(Action::CreateIssue).await;
	assert_eq!(replies, vec![Reply::Send(View::text(render::SESSION_EXPIRED))]);
}
