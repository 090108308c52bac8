//! Persistence contracts consumed by the core.
//!
//! The hosted backend owns order, technician and settings records; the core
//! only asks for reads and writes through these traits. Two adapters exist:
//! [`MemoryStore`] (tests and development) and [`crate::db::PgStore`].

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use lp_protocol::{NewTechnician, OrderId, OrderPatch, ServiceOrder, Technician, TechnicianPatch};

use crate::error::StoreResult;

pub use memory::MemoryStore;

/// Service order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails with `Duplicate` on an id collision and
    /// never applies partially.
    async fn create(&self, order: &ServiceOrder) -> StoreResult<()>;

    /// All orders, newest first.
    async fn list(&self) -> StoreResult<Vec<ServiceOrder>>;

    /// Overwrite the fields set in `patch`.
    async fn update(&self, id: OrderId, patch: &OrderPatch) -> StoreResult<()>;

    async fn delete(&self, id: OrderId) -> StoreResult<()>;
}

/// Technician persistence.
#[async_trait]
pub trait TechnicianStore: Send + Sync {
    /// All technicians ordered by name.
    async fn list(&self) -> StoreResult<Vec<Technician>>;

    /// Insert and return the stored record with its backend-assigned id.
    async fn create(&self, technician: &NewTechnician) -> StoreResult<Technician>;

    async fn update(&self, id: &str, patch: &TechnicianPatch) -> StoreResult<()>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Key-value application settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn all(&self) -> StoreResult<HashMap<String, String>>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or replace.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}
