//! In-memory implementation of every persistence contract.
//!
//! Backs tests and development runs without a database. Records how many
//! order creates were attempted and can be switched into failure modes to
//! exercise rejection paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lp_protocol::{NewTechnician, OrderId, OrderPatch, ServiceOrder, Technician, TechnicianPatch};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, SettingsStore, TechnicianStore};
use crate::error::{StoreError, StoreResult};
use crate::health::{DbDiagnostics, HealthProbe};

pub struct MemoryStore {
    orders: RwLock<Vec<ServiceOrder>>,
    technicians: RwLock<Vec<Technician>>,
    settings: RwLock<HashMap<String, String>>,
    diagnostics: RwLock<Option<DbDiagnostics>>,
    create_calls: AtomicUsize,
    reject_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_technicians(Vec::new())
    }

    /// Store pre-populated with technicians (and nothing else).
    pub fn with_technicians(technicians: Vec<Technician>) -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
            technicians: RwLock::new(technicians),
            settings: RwLock::new(HashMap::new()),
            diagnostics: RwLock::new(Some(DbDiagnostics::all_present())),
            create_calls: AtomicUsize::new(0),
            reject_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Seed a setting directly, bypassing failure modes.
    pub async fn seed_setting(&self, key: &str, value: &str) {
        self.settings
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Seed an order directly, bypassing failure modes and the create counter.
    pub async fn seed_order(&self, order: ServiceOrder) {
        self.orders.write().await.push(order);
    }

    /// Number of `OrderStore::create` calls, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with `Rejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Make every subsequent list/read fail with `Backend`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Diagnostics returned by the probe; `None` makes the probe itself fail.
    pub async fn set_diagnostics(&self, diagnostics: Option<DbDiagnostics>) {
        *self.diagnostics.write().await = diagnostics;
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("writes disabled".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "relation \"ordens_servico\" does not exist".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, order: &ServiceOrder) -> StoreResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::Duplicate(order.id));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<ServiceOrder>> {
        self.check_read()?;
        let mut orders = self.orders.read().await.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update(&self, id: OrderId, patch: &OrderPatch) -> StoreResult<()> {
        self.check_write()?;
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order #{id}")))?;
        order.apply(patch);
        order.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> StoreResult<()> {
        self.check_write()?;
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Err(StoreError::NotFound(format!("order #{id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TechnicianStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Technician>> {
        self.check_read()?;
        let mut technicians = self.technicians.read().await.clone();
        technicians.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(technicians)
    }

    async fn create(&self, technician: &NewTechnician) -> StoreResult<Technician> {
        self.check_write()?;
        let stored = Technician {
            id: Uuid::now_v7().to_string(),
            name: technician.name.clone(),
            specialty: technician.specialty.clone(),
            commission_rate: technician.commission_rate,
            active: technician.active,
        };
        self.technicians.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: &TechnicianPatch) -> StoreResult<()> {
        self.check_write()?;
        let mut technicians = self.technicians.write().await;
        let technician = technicians
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("technician {id}")))?;
        technician.apply(patch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.check_write()?;
        let mut technicians = self.technicians.write().await;
        let before = technicians.len();
        technicians.retain(|t| t.id != id);
        if technicians.len() == before {
            return Err(StoreError::NotFound(format!("technician {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn all(&self) -> StoreResult<HashMap<String, String>> {
        self.check_read()?;
        Ok(self.settings.read().await.clone())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_read()?;
        Ok(self.settings.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_write()?;
        self.settings
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn diagnose(&self) -> StoreResult<DbDiagnostics> {
        (*self.diagnostics.read().await)
            .ok_or_else(|| StoreError::Backend("function diagnose_database_setup() does not exist".into()))
    }
}
