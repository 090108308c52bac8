//! PostgreSQL adapter for the persistence contracts.
//!
//! The schema (tables, enums, RPC functions) is provisioned outside the core;
//! nothing here creates or migrates it. Each sub-module provides typed query
//! functions over a `PgPool`; [`PgStore`] wires them to the store traits.

pub mod orders;
pub mod settings;
pub mod technicians;

use std::collections::HashMap;

use async_trait::async_trait;
use lp_protocol::{NewTechnician, OrderId, OrderPatch, ServiceOrder, Technician, TechnicianPatch};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use crate::error::{StoreError, StoreResult};
use crate::health::{DbDiagnostics, HealthProbe};
use crate::store::{OrderStore, SettingsStore, TechnicianStore};

/// Connect to PostgreSQL.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    tracing::info!("database pool ready");
    Ok(pool)
}

/// Store backed by the hosted schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn expect_rows(affected: u64, what: impl FnOnce() -> String) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::NotFound(what()));
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, order: &ServiceOrder) -> StoreResult<()> {
        let Err(e) = orders::create(&self.pool, order).await else {
            return Ok(());
        };
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
            return Err(StoreError::Duplicate(order.id));
        }
        tracing::error!(order_id = %order.id, error = %e, "create_os_rpc_void failed");
        Err(StoreError::from(e))
    }

    async fn list(&self) -> StoreResult<Vec<ServiceOrder>> {
        orders::list_all(&self.pool)
            .await?
            .into_iter()
            .map(ServiceOrder::try_from)
            .collect()
    }

    async fn update(&self, id: OrderId, patch: &OrderPatch) -> StoreResult<()> {
        let affected = orders::update(&self.pool, id, patch).await?;
        expect_rows(affected, || format!("order #{id}"))
    }

    async fn delete(&self, id: OrderId) -> StoreResult<()> {
        let affected = orders::delete(&self.pool, id).await?;
        expect_rows(affected, || format!("order #{id}"))
    }
}

#[async_trait]
impl TechnicianStore for PgStore {
    async fn list(&self) -> StoreResult<Vec<Technician>> {
        let rows = technicians::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(Technician::from).collect())
    }

    async fn create(&self, technician: &NewTechnician) -> StoreResult<Technician> {
        let row = technicians::insert(&self.pool, technician).await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, patch: &TechnicianPatch) -> StoreResult<()> {
        let affected = technicians::update(&self.pool, id, patch).await?;
        expect_rows(affected, || format!("technician {id}"))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let affected = technicians::delete(&self.pool, id).await?;
        expect_rows(affected, || format!("technician {id}"))
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn all(&self) -> StoreResult<HashMap<String, String>> {
        Ok(settings::all(&self.pool).await?)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(settings::get(&self.pool, key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Ok(settings::upsert(&self.pool, key, value).await?)
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn diagnose(&self) -> StoreResult<DbDiagnostics> {
        let Json(diagnostics) =
            sqlx::query_scalar::<_, Json<DbDiagnostics>>("SELECT diagnose_database_setup()")
                .fetch_one(&self.pool)
                .await?;
        Ok(diagnostics)
    }
}
