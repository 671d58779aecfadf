//! Process host for Lectio: configuration, admin bootstrap and the HTTP
//! application with request tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use axum::Router;
use chrono::{Duration, NaiveDate};
use lectio_api::{ApiConfig, AppState, token::TokenKeys};
use lectio_core::{
  billing::Country,
  pin::{ADMIN_PIN_LEN, USER_PIN_LEN},
  store::ClubStore,
  user::{NewUser, Profile, Role, SubscriptionStatus},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `lectio.toml` and
/// `LECTIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// HMAC key for session tokens.
  pub jwt_secret:        String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours:   i64,
  #[serde(default = "default_reset_pin_length")]
  pub reset_pin_length:  usize,
  pub billing_starts_on: NaiveDate,
  /// With `admin_pin_hash`, creates this admin on first start.
  pub admin_email:       Option<String>,
  /// Argon2 PHC string, as printed by `lectio-server --hash-pin`.
  pub admin_pin_hash:    Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/lectio/lectio.db") }
fn default_token_ttl_hours() -> i64 { 24 * 7 }
fn default_reset_pin_length() -> usize { USER_PIN_LEN }

/// Longest accepted session lifetime: one leap year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

impl ServerConfig {
  /// Layer the optional file at `path` under `LECTIO_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LECTIO"))
      .build()
      .context("failed to read configuration")?;
    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    if self.jwt_secret.trim().is_empty() {
      bail!("jwt_secret must not be empty");
    }
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
      bail!("token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}");
    }
    if !(USER_PIN_LEN..=*ADMIN_PIN_LEN.end()).contains(&self.reset_pin_length) {
      bail!(
        "reset_pin_length must be between {USER_PIN_LEN} and {}",
        ADMIN_PIN_LEN.end()
      );
    }
    if self.admin_email.is_some() != self.admin_pin_hash.is_some() {
      bail!("admin_email and admin_pin_hash must be set together");
    }
    Ok(())
  }

  /// The store path with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Startup ─────────────────────────────────────────────────────────────────

/// Build the handler state around an opened store.
pub fn app_state<S: ClubStore>(store: S, cfg: &ServerConfig) -> AppState<S> {
  AppState {
    store:  Arc::new(store),
    config: Arc::new(ApiConfig {
      reset_pin_length:  cfg.reset_pin_length,
      billing_starts_on: cfg.billing_starts_on,
    }),
    tokens: Arc::new(TokenKeys::new(
      cfg.jwt_secret.as_bytes(),
      Duration::hours(cfg.token_ttl_hours),
    )),
  }
}

/// The API router wrapped in request tracing.
pub fn app<S: ClubStore + 'static>(state: AppState<S>) -> Router {
  lectio_api::api_router(state).layer(TraceLayer::new_for_http())
}

/// Create the configured admin account unless its email is already taken.
/// Returns whether an account was created.
pub async fn bootstrap_admin<S: ClubStore>(store: &S, cfg: &ServerConfig) -> anyhow::Result<bool> {
  let (Some(email), Some(pin_hash)) = (&cfg.admin_email, &cfg.admin_pin_hash) else {
    return Ok(false);
  };
  if store.find_user_by_email(email).await?.is_some() {
    tracing::debug!(%email, "admin account already present");
    return Ok(false);
  }

  let admin = store
    .create_user(NewUser {
      email:                email.clone(),
      pin_hash:             pin_hash.clone(),
      role:                 Role::Admin,
      profile:              Profile {
        first_name: "Admin".to_owned(),
        last_name:  String::new(),
        country:    Country::France,
        birth_date: None,
        sex:        None,
      },
      subscription_status:  SubscriptionStatus::Active,
      payment_method_id:    None,
      payment_method_kind:  None,
      notifications_opt_in: false,
    })
    .await
    .context("failed to create admin account")?;

  tracing::info!(user_id = %admin.user_id, email = %admin.email, "created admin account");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use lectio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  #[test]
  fn minimal_config_uses_defaults() {
    let cfg = parse(
      r#"
        jwt_secret = "s3cret"
        billing_starts_on = "2027-01-01"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.token_ttl_hours, 168);
    assert_eq!(cfg.reset_pin_length, 4);
    assert!(cfg.admin_email.is_none());
  }

  #[test]
  fn half_configured_admin_is_rejected() {
    let err = parse(
      r#"
        jwt_secret = "s3cret"
        billing_starts_on = "2027-01-01"
        admin_email = "admin@example.com"
      "#,
    );
    assert!(err.is_err());
  }

  #[test]
  fn token_ttl_must_stay_within_a_year() {
    let with_ttl = |hours: i64| {
      parse(&format!(
        "jwt_secret = \"s3cret\"\nbilling_starts_on = \"2027-01-01\"\ntoken_ttl_hours = {hours}\n"
      ))
    };
    assert!(with_ttl(MAX_TOKEN_TTL_HOURS).is_ok());
    assert!(with_ttl(MAX_TOKEN_TTL_HOURS + 1).is_err());
    assert!(with_ttl(i64::MAX).is_err());
    assert!(with_ttl(0).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }

  fn admin_config() -> ServerConfig {
    parse(
      r#"
        jwt_secret = "s3cret"
        billing_starts_on = "2027-01-01"
        admin_email = "Admin@Example.com"
        admin_pin_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g"
      "#,
    )
    .unwrap()
  }

  #[tokio::test]
  async fn admin_is_bootstrapped_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let cfg = admin_config();

    assert!(bootstrap_admin(&store, &cfg).await.unwrap());
    assert!(!bootstrap_admin(&store, &cfg).await.unwrap());

    let admin = store.find_user_by_email("admin@example.com").await.unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(store.list_users().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn traced_app_serves_the_api() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = app(app_state(store, &admin_config()));
    let resp = app
      .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
