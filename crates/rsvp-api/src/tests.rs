//! Router tests against an in-memory SQLite store and in-memory collaborators.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  body::Body,
  http::{HeaderName, Request, StatusCode, header},
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{Duration, TimeZone, Utc};
use rand_core::OsRng;
use rsvp_core::{
  event::Event,
  provider::{DispatchError, IdentityProvider, NotificationChannel, OutgoingEmail, Profile},
  store::UserStore,
};
use rsvp_store_sqlite::SqliteStore;
use rsvp_ticket::{
  IssuerConfig,
  payload,
  qr::{self, Detection},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

// ─── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Directory {
  profiles: HashMap<String, Profile>,
}

impl IdentityProvider for Directory {
  type Error = Infallible;

  async fn get_profile(&self, identity_key: &str) -> Result<Option<Profile>, Infallible> {
    Ok(self.profiles.get(identity_key).cloned())
  }
}

#[derive(Default)]
struct Outbox {
  sent: Mutex<Vec<OutgoingEmail>>,
  down: AtomicBool,
}

impl NotificationChannel for Outbox {
  async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
    if self.down.load(Ordering::SeqCst) {
      return Err(DispatchError::Rejected("mailbox unavailable".into()));
    }
    self.sent.lock().unwrap().push(email.clone());
    Ok(())
  }
}

struct TestBackend;

impl Backend for TestBackend {
  type Store = SqliteStore;
  type Identity = Directory;
  type Mailer = Outbox;
}

// ─── Harness ──────────────────────────────────────────────────────────────────

struct Harness {
  state:  AppState<TestBackend>,
  store:  Arc<SqliteStore>,
  outbox: Arc<Outbox>,
  event:  Event,
}

fn profile(first: &str, last: &str, email: &str) -> Profile {
  Profile {
    emails: vec![email.to_string()],
    first_name: Some(first.to_string()),
    last_name: Some(last.to_string()),
    ..Profile::default()
  }
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let start = Utc.with_ymd_and_hms(2024, 3, 15, 19, 30, 0).unwrap();
  let event = Event {
    event_id:        Uuid::new_v4(),
    title:           "Launch Party".into(),
    description:     "Drinks and demos".into(),
    location:        "Hall A".into(),
    start_date_time: start,
    end_date_time:   start + Duration::hours(3),
    is_free:         true,
    price:           None,
    url:             None,
  };
  store.put_event(&event).await.unwrap();

  let mut directory = Directory::default();
  directory.profiles.insert("ext_ada".into(), profile("Ada", "Lovelace", "ada@example.com"));
  directory.profiles.insert("ext_alan".into(), profile("Alan", "Turing", "alan@example.com"));

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();

  let outbox = Arc::new(Outbox::default());
  let state = AppState::<TestBackend>::new(
    Arc::clone(&store),
    Arc::new(directory),
    Arc::clone(&outbox),
    ApiConfig {
      auth:            AuthConfig { username: "door".into(), password_hash: hash },
      identity_header: HeaderName::from_static("x-identity"),
      issuer:          IssuerConfig::default(),
    },
  );

  Harness { state, store, outbox, event }
}

enum Caller<'a> {
  Anonymous,
  Attendee(&'a str),
  Organizer,
  Intruder,
}

async fn send(h: &Harness, method: &str, uri: &str, caller: Caller<'_>, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  builder = match caller {
    Caller::Anonymous => builder,
    Caller::Attendee(id) => builder.header("x-identity", id),
    Caller::Organizer => builder.header(header::AUTHORIZATION, basic("door", "secret")),
    Caller::Intruder => builder.header(header::AUTHORIZATION, basic("door", "guess")),
  };
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  router(h.state.clone()).oneshot(req).await.unwrap()
}

fn basic(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn bytes(resp: Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn json_body(resp: Response) -> Value { serde_json::from_slice(&bytes(resp).await).unwrap() }

async fn checkout(h: &Harness, who: &str) -> Response {
  let uri = format!("/api/events/{}/reservations", h.event.event_id);
  send(h, "POST", &uri, Caller::Attendee(who), None).await
}

/// Check out and return the new reservation id.
async fn reserved(h: &Harness, who: &str) -> String {
  let resp = checkout(h, who).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  json_body(resp).await["reservation"]["reservation_id"]
    .as_str()
    .unwrap()
    .to_string()
}

fn claim_json(ticket_id: &str, title: &str) -> Value {
  json!({
    "claim": {
      "ticketId": ticket_id,
      "eventTitle": title,
      "userName": "Ada Lovelace",
      "eventDate": "Friday, March 15, 2024 at 07:30 PM",
    }
  })
}

// ─── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_auth() {
  let h = harness().await;
  let resp = send(&h, "GET", "/health", Caller::Anonymous, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(bytes(resp).await, b"ok");
}

// ─── Checkout ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn checkout_reserves_and_emails_a_scannable_ticket() {
  let h = harness().await;
  let resp = checkout(&h, "ext_ada").await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = json_body(resp).await;
  let reservation_id = body["reservation"]["reservation_id"].as_str().unwrap().to_string();
  assert_eq!(body["reservation"]["event"]["title"], "Launch Party");
  assert_eq!(body["ticket"]["ticketId"], reservation_id.as_str());
  assert_eq!(body["ticket"]["userName"], "Ada Lovelace");

  let sent = h.outbox.sent.lock().unwrap().clone();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to, "ada@example.com");
  assert_eq!(sent[0].subject, "Your Ticket for Launch Party");

  let html = &sent[0].html_body;
  let start = html.find("base64,").unwrap() + "base64,".len();
  let end = start + html[start..].find('"').unwrap();
  let png = B64.decode(&html[start..end]).unwrap();
  let frame = image::load_from_memory(&png).unwrap().to_luma8();
  let Some(Detection::Text(text)) = qr::decode(&frame).into_iter().next() else {
    panic!("emailed ticket is not scannable");
  };
  assert_eq!(payload::decode(&text).unwrap().ticket_id, reservation_id);
}

#[tokio::test]
async fn second_checkout_is_a_duplicate() {
  let h = harness().await;
  reserved(&h, "ext_ada").await;

  let resp = checkout(&h, "ext_ada").await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body = json_body(resp).await;
  assert_eq!(body["kind"], "DUPLICATE_RESERVATION");
  assert_eq!(body["error"], "you have already reserved a seat for this event");
  assert_eq!(h.outbox.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_without_identity_is_401() {
  let h = harness().await;
  let uri = format!("/api/events/{}/reservations", h.event.event_id);
  let resp = send(&h, "POST", &uri, Caller::Anonymous, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(resp).await["kind"], "UNAUTHORIZED");
}

#[tokio::test]
async fn checkout_for_unknown_event_is_404() {
  let h = harness().await;
  let uri = format!("/api/events/{}/reservations", Uuid::new_v4());
  let resp = send(&h, "POST", &uri, Caller::Attendee("ext_ada"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["kind"], "EVENT_NOT_FOUND");
  // No local user is created for a checkout that cannot happen.
  assert!(h.store.find_user_by_external_id("ext_ada").await.unwrap().is_none());
}

#[tokio::test]
async fn checkout_for_unknown_identity_is_404() {
  let h = harness().await;
  let resp = checkout(&h, "ext_nobody").await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["kind"], "IDENTITY_NOT_FOUND");
}

#[tokio::test]
async fn failed_dispatch_is_502_but_the_seat_is_held() {
  let h = harness().await;
  h.outbox.down.store(true, Ordering::SeqCst);

  let resp = checkout(&h, "ext_ada").await;
  assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  let body = json_body(resp).await;
  assert_eq!(body["kind"], "DISPATCH_FAILED");
  let reservation_id = body["reservation_id"].as_str().unwrap().to_string();

  let resp = send(&h, "GET", "/api/me/reservations", Caller::Attendee("ext_ada"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let mine = json_body(resp).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
  assert_eq!(mine[0]["reservation_id"], reservation_id.as_str());

  h.outbox.down.store(false, Ordering::SeqCst);
  assert_eq!(checkout(&h, "ext_ada").await.status(), StatusCode::CONFLICT);
}

// ─── Listings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn my_reservations_for_a_new_identity_is_empty() {
  let h = harness().await;
  let resp = send(&h, "GET", "/api/me/reservations", Caller::Attendee("ext_alan"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!([]));
}

#[tokio::test]
async fn organizer_lists_event_reservations_in_order() {
  let h = harness().await;
  let first = reserved(&h, "ext_ada").await;
  let second = reserved(&h, "ext_alan").await;

  let uri = format!("/api/events/{}/reservations", h.event.event_id);
  assert_eq!(
    send(&h, "GET", &uri, Caller::Anonymous, None).await.status(),
    StatusCode::UNAUTHORIZED
  );
  assert_eq!(
    send(&h, "GET", &uri, Caller::Intruder, None).await.status(),
    StatusCode::UNAUTHORIZED
  );

  let resp = send(&h, "GET", &uri, Caller::Organizer, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let list = json_body(resp).await;
  let ids: Vec<_> = list
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v["reservation_id"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn unauthenticated_organizer_route_challenges() {
  let h = harness().await;
  let uri = format!("/api/reservations/{}", Uuid::new_v4());
  let resp = send(&h, "GET", &uri, Caller::Anonymous, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn get_missing_reservation_is_404() {
  let h = harness().await;
  let uri = format!("/api/reservations/{}", Uuid::new_v4());
  let resp = send(&h, "GET", &uri, Caller::Organizer, None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["kind"], "RESERVATION_NOT_FOUND");
}

#[tokio::test]
async fn ticket_png_regenerates_the_qr() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;

  let resp = send(&h, "GET", &format!("/api/reservations/{id}/ticket.png"), Caller::Organizer, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");

  let frame = image::load_from_memory(&bytes(resp).await).unwrap().to_luma8();
  let Some(Detection::Text(text)) = qr::decode(&frame).into_iter().next() else {
    panic!("regenerated ticket is not scannable");
  };
  let claim = payload::decode(&text).unwrap();
  assert_eq!(claim.ticket_id, id);
  assert_eq!(claim.event_date, "Friday, March 15, 2024 at 07:30 PM");
}

// ─── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_frees_the_seat() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;
  let uri = format!("/api/reservations/{id}");

  let resp = send(&h, "DELETE", &uri, Caller::Organizer, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["reservation_id"], id.as_str());

  assert_eq!(send(&h, "GET", &uri, Caller::Organizer, None).await.status(), StatusCode::NOT_FOUND);
  assert_eq!(send(&h, "DELETE", &uri, Caller::Organizer, None).await.status(), StatusCode::NOT_FOUND);

  reserved(&h, "ext_ada").await;
  assert_eq!(h.outbox.sent.lock().unwrap().len(), 2);
}

// ─── Admissions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ticket_admits_once() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;

  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(claim_json(&id, "Launch Party"))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let receipt = json_body(resp).await;
  assert_eq!(receipt["admission"]["reservation_id"], id.as_str());
  assert_eq!(receipt["reservation"]["user"]["email"], "ada@example.com");

  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(claim_json(&id, "Launch Party"))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  assert_eq!(json_body(resp).await["kind"], "ALREADY_ADMITTED");
}

#[tokio::test]
async fn forged_and_mismatched_claims_are_rejected() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;

  let forged = claim_json(&Uuid::new_v4().to_string(), "Launch Party");
  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(forged)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(json_body(resp).await["kind"], "RESERVATION_NOT_FOUND");

  let garbage = claim_json("not-a-uuid", "Launch Party");
  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(garbage)).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let wrong_title = claim_json(&id, "Some Other Party");
  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(wrong_title)).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(json_body(resp).await["kind"], "CLAIM_MISMATCH");

  let mut wrong_door = claim_json(&id, "Launch Party");
  wrong_door["event_id"] = json!(Uuid::new_v4());
  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(wrong_door)).await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

  // None of the rejected attempts used up the ticket.
  let mut right_door = claim_json(&id, "Launch Party");
  right_door["event_id"] = json!(h.event.event_id);
  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(right_door)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn admissions_need_organizer_auth() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;
  let resp = send(&h, "POST", "/api/admissions", Caller::Attendee("ext_ada"), Some(claim_json(&id, "Launch Party"))).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cancelled_ticket_no_longer_admits() {
  let h = harness().await;
  let id = reserved(&h, "ext_ada").await;
  send(&h, "DELETE", &format!("/api/reservations/{id}"), Caller::Organizer, None).await;

  let resp = send(&h, "POST", "/api/admissions", Caller::Organizer, Some(claim_json(&id, "Launch Party"))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(h.store.get_reservation(id.parse().unwrap()).await.unwrap().is_none());
}
