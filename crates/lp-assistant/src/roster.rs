//! Live technician list with store-first mutations.

use std::sync::Arc;

use lp_protocol::{NewTechnician, Technician, TechnicianPatch};
use tokio::sync::RwLock;

use crate::directory::{TechnicianDirectory, fallback_technician};
use crate::error::StoreResult;
use crate::store::TechnicianStore;

pub struct Roster {
    store: Arc<dyn TechnicianStore>,
    technicians: RwLock<Vec<Technician>>,
}

impl Roster {
    pub fn new(store: Arc<dyn TechnicianStore>) -> Self {
        Self::with_technicians(store, Vec::new())
    }

    pub fn with_technicians(store: Arc<dyn TechnicianStore>, mut technicians: Vec<Technician>) -> Self {
        sort_by_name(&mut technicians);
        Self {
            store,
            technicians: RwLock::new(technicians),
        }
    }

    /// Immutable copy for one reconciliation or interpretation call.
    pub async fn snapshot(&self) -> TechnicianDirectory {
        TechnicianDirectory::new(self.technicians.read().await.clone())
    }

    /// Technician by id, or the removed-technician placeholder.
    pub async fn lookup(&self, id: &str) -> Technician {
        self.technicians
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or_else(fallback_technician)
    }

    pub async fn refresh(&self) -> StoreResult<()> {
        let mut fresh = self.store.list().await?;
        sort_by_name(&mut fresh);
        *self.technicians.write().await = fresh;
        Ok(())
    }

    pub async fn add(&self, technician: NewTechnician) -> StoreResult<Technician> {
        let stored = self.store.create(&technician).await.inspect_err(|e| {
            tracing::warn!(name = %technician.name, error = %e, "technician create failed");
        })?;
        let mut technicians = self.technicians.write().await;
        technicians.push(stored.clone());
        sort_by_name(&mut technicians);
        Ok(stored)
    }

    pub async fn update(&self, id: &str, patch: TechnicianPatch) -> StoreResult<()> {
        self.store.update(id, &patch).await.inspect_err(|e| {
            tracing::warn!(technician_id = id, error = %e, "technician update failed");
        })?;
        let mut technicians = self.technicians.write().await;
        if let Some(technician) = technicians.iter_mut().find(|t| t.id == id) {
            technician.apply(&patch);
        }
        sort_by_name(&mut technicians);
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        self.store.delete(id).await.inspect_err(|e| {
            tracing::warn!(technician_id = id, error = %e, "technician delete failed");
        })?;
        self.technicians.write().await.retain(|t| t.id != id);
        Ok(())
    }
}

fn sort_by_name(technicians: &mut [Technician]) {
    technicians.sort_by(|a, b| a.name.cmp(&b.name));
}
