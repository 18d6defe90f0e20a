//! HTTP boundary: routes requests onto the store and verification service.
//!
//! Public routes:
//! - `POST /public/licenses/check-license` (and the older `/licenses/check-license`)
//! - `GET /license-check.js`, `GET /core.js`
//!
//! Administrative routes, guarded by a bearer token:
//! - `GET|POST /licenses`
//! - `GET|PUT|DELETE /licenses/{id}`
//!
//! CORS is open on every route; credentials are bearer tokens, never cookies.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::config::{ServerConfig, StorageConfig, DEFAULT_NAMESPACE};
use crate::store::file::FileStore;
use crate::store::memory::MemoryStore;
use crate::store::LicenseStore;
use crate::verify::service::VerificationService;
use crate::LicenseGateError;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Verification over the same store.
    pub service: VerificationService,
    /// Canonical license store.
    pub store: Arc<dyn LicenseStore>,
    /// Bearer token for administrative routes.
    pub admin_token: Arc<str>,
    /// Directory of served scripts.
    pub public_dir: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Build state around `store`.
    pub fn new(store: Arc<dyn LicenseStore>, admin_token: &str, public_dir: Option<PathBuf>) -> Self {
        Self {
            service: VerificationService::new(store.clone()),
            store,
            admin_token: Arc::from(admin_token),
            public_dir: public_dir.map(Arc::new),
        }
    }
}

/// Build the router.
///
/// Every route answers CORS preflights from any origin.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/licenses",
            get(handlers::list_licenses).post(handlers::create_license),
        )
        .route(
            "/licenses/{id}",
            get(handlers::get_license)
                .put(handlers::update_license)
                .delete(handlers::delete_license),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/public/licenses/check-license", post(handlers::check_license))
        .route("/licenses/check-license", post(handlers::check_license))
        .route("/license-check.js", get(handlers::loader_script))
        .route("/core.js", get(handlers::gated_script))
        .merge(admin)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Open the store named by `storage`.
pub fn open_store(storage: &StorageConfig) -> Result<Arc<dyn LicenseStore>, LicenseGateError> {
    let store: Arc<dyn LicenseStore> = match storage {
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
        StorageConfig::File(dir) => Arc::new(FileStore::open(dir.clone())?),
        StorageConfig::DefaultDataDir => Arc::new(FileStore::in_data_dir(DEFAULT_NAMESPACE)?),
    };
    Ok(store)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(
    config: ServerConfig,
    store: Arc<dyn LicenseStore>,
    shutdown: F,
) -> Result<(), LicenseGateError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let state = AppState::new(store, &config.admin_token, config.public_dir.clone());
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| LicenseGateError::ConfigError(format!("Failed to bind {}: {}", config.bind, e)))?;

    info!(addr = %config.bind, "licensegate listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LicenseGateError::ConfigError(format!("Server error: {}", e)))
}
