//! JSON HTTP API for the RSVP system.
//!
//! Exposes an axum [`Router`] over the reservation services. Attendees are
//! identified by a header set by the upstream authentication proxy; organizer
//! routes use HTTP Basic auth.
//!
//! | Method | Path | Caller |
//! |--------|------|--------|
//! | `POST` | `/api/events/{id}/reservations` | attendee |
//! | `GET`  | `/api/me/reservations` | attendee |
//! | `GET`  | `/api/events/{id}/reservations` | organizer |
//! | `GET`  | `/api/reservations/{id}` | organizer |
//! | `GET`  | `/api/reservations/{id}/ticket.png` | organizer |
//! | `DELETE` | `/api/reservations/{id}` | organizer |
//! | `POST` | `/api/admissions` | organizer |
//! | `GET`  | `/health` | anyone |

pub mod admissions;
pub mod auth;
pub mod checkout;
pub mod error;
pub mod reservations;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderName,
  routing::{get, post},
};
use rsvp_core::{
  IdentityResolver, ReservationLedger,
  provider::{IdentityProvider, NotificationChannel},
  store::{EventStore, ReservationStore},
};
use rsvp_ticket::{IssuerConfig, TicketIssuer};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Backend ──────────────────────────────────────────────────────────────────

/// The concrete collaborators an application is built from. Handlers are
/// generic over this one parameter.
pub trait Backend: Send + Sync + 'static {
  type Store: ReservationStore + EventStore + 'static;
  type Identity: IdentityProvider + 'static;
  type Mailer: NotificationChannel + 'static;
}

// ─── Application state ────────────────────────────────────────────────────────

/// Settings the router needs besides its collaborators.
#[derive(Clone)]
pub struct ApiConfig {
  pub auth:            AuthConfig,
  /// Header carrying the attendee's external identity.
  pub identity_header: HeaderName,
  pub issuer:          IssuerConfig,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<B: Backend> {
  pub ledger:          ReservationLedger<B::Store, B::Store>,
  pub resolver:        IdentityResolver<B::Store, B::Identity>,
  pub issuer:          TicketIssuer<B::Mailer>,
  pub auth:            Arc<AuthConfig>,
  pub identity_header: HeaderName,
}

impl<B: Backend> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      ledger:          self.ledger.clone(),
      resolver:        self.resolver.clone(),
      issuer:          self.issuer.clone(),
      auth:            Arc::clone(&self.auth),
      identity_header: self.identity_header.clone(),
    }
  }
}

impl<B: Backend> AppState<B> {
  pub fn new(
    store: Arc<B::Store>,
    identity: Arc<B::Identity>,
    mailer: Arc<B::Mailer>,
    config: ApiConfig,
  ) -> Self {
    Self {
      ledger:          ReservationLedger::new(Arc::clone(&store), Arc::clone(&store)),
      resolver:        IdentityResolver::new(store, identity),
      issuer:          TicketIssuer::new(mailer, config.issuer),
      auth:            Arc::new(config.auth),
      identity_header: config.identity_header,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
  let api = Router::new()
    .route(
      "/events/{id}/reservations",
      get(reservations::list_for_event::<B>).post(checkout::checkout::<B>),
    )
    .route("/me/reservations", get(reservations::list_mine::<B>))
    .route(
      "/reservations/{id}",
      get(reservations::get_one::<B>).delete(reservations::cancel::<B>),
    )
    .route("/reservations/{id}/ticket.png", get(reservations::ticket_png::<B>))
    .route("/admissions", post(admissions::admit::<B>));

  Router::new()
    .nest("/api", api)
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests;
