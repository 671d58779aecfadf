//! Login and the bearer-token middleware.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | Body: `{"email":"…","pin":"…"}`; returns `{success, user, token}` |
//!
//! [`require_auth`] guards every non-public route and inserts an
//! [`Identity`] into the request extensions; [`require_admin`] runs inside it
//! for `/admin/*`.

use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use lectio_core::{
  store::ClubStore,
  user::{Role, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  credentials::{UNKNOWN_USER_PIN_HASH, verify_pin},
  error::{ApiError, Result},
  token::Claims,
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The caller, as decoded from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: Uuid,
  pub email:   String,
  pub role:    Role,
}

impl From<Claims> for Identity {
  fn from(c: Claims) -> Self {
    Self { user_id: c.sub, email: c.email, role: c.role }
  }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Reject requests without a valid `Authorization: Bearer` token.
pub async fn require_auth<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response>
where
  S: ClubStore,
{
  let token = bearer(req.headers()).ok_or(ApiError::Unauthorized)?;
  let claims = state.tokens.verify(token).map_err(|e| {
    tracing::warn!(error = %e, path = %req.uri().path(), "rejected token");
    ApiError::Unauthorized
  })?;
  req.extensions_mut().insert(Identity::from(claims));
  Ok(next.run(req).await)
}

/// Reject authenticated callers whose role is not admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response> {
  match req.extensions().get::<Identity>() {
    None => Err(ApiError::Unauthorized),
    Some(id) if id.role != Role::Admin => Err(ApiError::Forbidden),
    Some(_) => Ok(next.run(req).await),
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email: String,
  pub pin:   String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub success: bool,
  pub user:    User,
  pub token:   String,
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>>
where
  S: ClubStore,
{
  let user = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::from_store)?;

  // Unknown email and wrong PIN must be indistinguishable, in timing too.
  let user = match user {
    Some(u) if verify_pin(&body.pin, &u.pin_hash) => u,
    Some(_) => return Err(ApiError::InvalidCredentials),
    None => {
      verify_pin(&body.pin, UNKNOWN_USER_PIN_HASH);
      return Err(ApiError::InvalidCredentials);
    }
  };

  let user = state
    .store
    .record_login(user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  let token = state.tokens.issue(&user).map_err(ApiError::upstream)?;

  tracing::info!(user_id = %user.user_id, "login");
  Ok(Json(LoginResponse { success: true, user, token }))
}
