//! Shared application state handed to every handler through `Extension`.

use crate::config::Config;
use crate::errors::ServiceResult;
use crate::services::catalog_service::CatalogService;
use crate::services::reservation_gate::{HttpReservationGate, ReservationGate};
use crate::utils::jwt::JwtUtils;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub jwt: JwtUtils,
    /// Local catalog; also backs the internal reservation endpoints.
    pub catalog: CatalogService,
    /// Gate used by the order workflow, local or remote.
    pub gate: Arc<dyn ReservationGate>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> ServiceResult<Self> {
        let jwt = JwtUtils::new(&config);
        let catalog = CatalogService::new(pool.clone());

        let gate: Arc<dyn ReservationGate> = match &config.catalog_url {
            Some(url) => {
                info!("Reserving items through remote catalog at {}", url);
                Arc::new(HttpReservationGate::new(
                    url,
                    &config.service_key,
                    config.catalog_timeout_ms,
                )?)
            }
            None => Arc::new(catalog.clone()),
        };

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt,
            catalog,
            gate,
        })
    }
}
