//! JSON REST API for Lectio.
//!
//! Exposes an axum [`Router`] backed by any [`lectio_core::store::ClubStore`].
//! Tokens are issued and checked here; TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lectio_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod admin;
pub mod auth;
pub mod books;
pub mod contact;
pub mod credentials;
pub mod error;
pub mod finance;
pub mod library;
pub mod me;
pub mod notifications;
pub mod register;
pub mod token;
pub mod webhook;


use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, post, put},
};
use chrono::NaiveDate;
use lectio_core::store::ClubStore;

pub use error::ApiError;
use token::TokenKeys;

// ─── State ───────────────────────────────────────────────────────────────────

/// Settings the handlers consult at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Digits in a PIN generated by an admin reset (raised to the admin
  /// minimum when the target is an admin).
  pub reset_pin_length:  usize,
  /// Date from which linked payment methods are charged; echoed at
  /// registration.
  pub billing_starts_on: NaiveDate,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
  pub tokens: Arc<TokenKeys>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
      tokens: Arc::clone(&self.tokens),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full API router.
///
/// Public routes sit at the top level; everything else passes through
/// [`auth::require_auth`], and `/admin/*` additionally through
/// [`auth::require_admin`].
pub fn api_router<S>(state: AppState<S>) -> Router
where
  S: ClubStore + 'static,
{
  let admin = Router::new()
    // Catalog
    .route("/books", get(books::list_all::<S>).post(books::create::<S>))
    .route("/books/{id}", put(books::update::<S>))
    .route("/books/{id}/toggle-publish", post(books::toggle_publish::<S>))
    // Users
    .route("/users", get(admin::list_users::<S>))
    .route("/users/{id}", get(admin::get_user::<S>))
    .route("/users/{id}/status", put(admin::set_status::<S>))
    .route("/users/{id}/reset-pin", post(admin::reset_pin::<S>))
    .route("/stats", get(admin::stats::<S>))
    // Messaging
    .route("/messages", get(admin::list_messages::<S>))
    .route("/messages/{id}/read", put(admin::mark_read::<S>))
    .route(
      "/notifications",
      get(notifications::list::<S>).post(notifications::send::<S>),
    )
    // Finance
    .route("/finance/summary", get(finance::summary::<S>))
    .route(
      "/finance/expenses",
      get(finance::list_expenses::<S>).post(finance::create_expense::<S>),
    )
    .route(
      "/finance/expenses/{id}",
      put(finance::update_expense::<S>).delete(finance::delete_expense::<S>),
    )
    .route_layer(middleware::from_fn(auth::require_admin));

  let member = Router::new()
    .route("/me", get(me::show::<S>))
    .route("/me/change-pin", put(me::change_pin::<S>))
    .route("/me/notifications", put(me::set_notifications::<S>))
    .route("/me/cancel", post(me::cancel::<S>))
    .route("/books", get(books::list_published::<S>))
    .route("/books/{id}", get(books::get_published::<S>))
    .route("/library", get(library::list::<S>))
    .route("/library/{book_id}/start-or-resume", post(library::start_or_resume::<S>))
    .route("/library/{book_id}/progress", post(library::checkpoint::<S>))
    .route("/library/{book_id}/complete", post(library::complete::<S>))
    .nest("/admin", admin)
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_auth::<S>,
    ));

  Router::new()
    .route("/login", post(auth::login::<S>))
    .route("/register", post(register::register::<S>))
    .route("/contact", post(contact::submit::<S>))
    .route("/webhooks/payments", post(webhook::payments::<S>))
    .merge(member)
    .with_state(state)
}
