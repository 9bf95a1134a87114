//! HTTP and WebSocket surface for Frent.
//!
//! Exposes an axum [`Router`] over any [`RentalStore`]. The notification
//! engine in `frent-notify` is wired in through [`AppState`]; handlers only
//! shape requests and responses around it.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use frent_core::store::RentalStore;
use frent_notify::{
  AvailabilityNotifier, ConnectionManager, NotificationDispatcher, RentalLifecycleSweeper,
  SessionRegistry, SigningKey, TokenError, TokenIssuer, TokenValidator,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{auth as login, movies, notifications, rentals, wishlist, ws};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FRENT_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Base64-encoded HMAC key for signing and validating bearer tokens.
  pub jwt_secret:          String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours:     i64,
  #[serde(default = "default_sweep_interval_secs")]
  pub sweep_interval_secs: u64,
  #[serde(default = "default_session_queue_depth")]
  pub session_queue_depth: usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_token_ttl_hours() -> i64 { 24 * 7 }
fn default_sweep_interval_secs() -> u64 { 60 * 60 }
fn default_session_queue_depth() -> usize { frent_notify::connection::DEFAULT_QUEUE_DEPTH }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:        Arc<S>,
  pub config:       Arc<ServerConfig>,
  pub issuer:       Arc<TokenIssuer>,
  pub validator:    Arc<TokenValidator>,
  pub connections:  Arc<ConnectionManager>,
  pub dispatcher:   NotificationDispatcher,
  pub sweeper:      Arc<RentalLifecycleSweeper<S>>,
  pub availability: Arc<AvailabilityNotifier<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:        self.store.clone(),
      config:       self.config.clone(),
      issuer:       self.issuer.clone(),
      validator:    self.validator.clone(),
      connections:  self.connections.clone(),
      dispatcher:   self.dispatcher.clone(),
      sweeper:      self.sweeper.clone(),
      availability: self.availability.clone(),
    }
  }
}

impl<S: RentalStore> AppState<S> {
  /// Wire the notification engine around `store`.
  ///
  /// Fails only if `config.jwt_secret` is not a usable key.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Result<Self, TokenError> {
    let key = SigningKey::from_base64(&config.jwt_secret)?;
    let validator = Arc::new(TokenValidator::new(&key));
    let issuer = Arc::new(TokenIssuer::new(
      &key,
      chrono::Duration::hours(config.token_ttl_hours),
    ));

    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = NotificationDispatcher::new(registry.clone());
    let connections = Arc::new(ConnectionManager::new(
      validator.clone(),
      registry,
      config.session_queue_depth,
    ));

    Ok(Self {
      sweeper: Arc::new(RentalLifecycleSweeper::new(store.clone(), dispatcher.clone())),
      availability: Arc::new(AvailabilityNotifier::new(store.clone(), dispatcher.clone())),
      store,
      config: Arc::new(config),
      issuer,
      validator,
      connections,
      dispatcher,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RentalStore + 'static,
{
  Router::new()
    .route("/health",                             get(health))
    .route("/ws",                                 get(ws::upgrade::<S>))
    // Accounts
    .route("/api/auth/register",                  post(login::register::<S>))
    .route("/api/auth/login",                     post(login::login::<S>))
    // Catalogue
    .route("/api/movies",                         get(movies::list::<S>).post(movies::create::<S>))
    .route("/api/movies/{id}",                    get(movies::get_one::<S>))
    .route("/api/movies/{id}/available",          put(movies::make_available::<S>))
    .route("/api/movies/{id}/unavailable",        put(movies::make_unavailable::<S>))
    .route("/api/movies/{id}/discount/{percent}", put(movies::discount::<S>))
    .route("/api/movies/{id}/revert-price/{price}", put(movies::revert_price::<S>))
    // Wishlist
    .route("/api/wishlist",                       get(wishlist::list::<S>))
    .route("/api/wishlist/{id}",                  put(wishlist::add::<S>).delete(wishlist::remove::<S>))
    // Rentals
    .route("/api/rentals",                        get(rentals::list_all::<S>))
    .route("/api/rentals/mine",                   get(rentals::mine::<S>))
    .route("/api/rentals/mine/total",             get(rentals::total::<S>))
    .route("/api/rentals/sweep",                  post(rentals::sweep::<S>))
    .route("/api/rentals/user/{username}",        get(rentals::for_user::<S>))
    .route("/api/rentals/user/{username}/total",  get(rentals::total_for_user::<S>))
    .route("/api/rentals/{id}",                   post(rentals::rent::<S>))
    .route("/api/rentals/{id}/return",            put(rentals::return_one::<S>))
    // Notifications
    .route("/api/notifications/broadcast",        post(notifications::broadcast::<S>))
    .route("/api/notifications/send-to/{username}", post(notifications::send_to::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }
