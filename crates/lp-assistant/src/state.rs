//! Shared application state.
//!
//! Supports two modes:
//! - **Database mode**: [`PgStore`] over a `PgPool` (production).
//! - **In-memory mode**: [`MemoryStore`] (tests and development).

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AssistantConfig;
use crate::db::{self, PgStore};
use crate::health::{HealthProbe, SetupHealth};
use crate::orders::OrderBook;
use crate::roster::Roster;
use crate::settings::Settings;
use crate::store::{MemoryStore, OrderStore, SettingsStore, TechnicianStore};

/// Store handles, one per contract.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub technicians: Arc<dyn TechnicianStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub probe: Arc<dyn HealthProbe>,
}

/// Live caches produced by a successful initial load.
pub struct LoadedData {
    pub orders: OrderBook,
    pub roster: Roster,
    pub settings: Settings,
}

impl AppState {
    /// Create state backed by a PostgreSQL pool.
    pub fn with_pool(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            orders: store.clone(),
            technicians: store.clone(),
            settings: store.clone(),
            probe: store,
        }
    }

    /// Create in-memory state (for tests).
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            orders: store.clone(),
            technicians: store.clone(),
            settings: store.clone(),
            probe: store,
        }
    }

    /// Database mode when `database_url` is set, in-memory otherwise.
    pub async fn from_config(config: &AssistantConfig) -> Result<Self, sqlx::Error> {
        match &config.database_url {
            Some(url) => Ok(Self::with_pool(db::connect(url).await?)),
            None => {
                tracing::info!("no database_url configured, using in-memory store");
                Ok(Self::in_memory(Arc::new(MemoryStore::new())))
            }
        }
    }

    /// Fetch technicians, orders and settings.
    ///
    /// On any failure the health probe runs and an unhealthy [`SetupHealth`]
    /// carrying the original error text is returned. A failing probe leaves
    /// the diagnostics absent.
    pub async fn load(&self) -> Result<LoadedData, SetupHealth> {
        let fetched = tokio::try_join!(
            self.technicians.list(),
            self.orders.list(),
            self.settings.all(),
        );

        match fetched {
            Ok((technicians, orders, settings)) => {
                tracing::info!(
                    technicians = technicians.len(),
                    orders = orders.len(),
                    "initial data loaded"
                );
                Ok(LoadedData {
                    orders: OrderBook::with_orders(self.orders.clone(), orders),
                    roster: Roster::with_technicians(self.technicians.clone(), technicians),
                    settings: Settings::with_values(self.settings.clone(), settings),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "initial load failed, running setup diagnostics");
                let diagnostics = match self.probe.diagnose().await {
                    Ok(diagnostics) => Some(diagnostics),
                    Err(probe_err) => {
                        tracing::warn!(error = %probe_err, "setup diagnostics unavailable");
                        None
                    }
                };
                Err(SetupHealth::unhealthy(e.to_string(), diagnostics))
            }
        }
    }
}
