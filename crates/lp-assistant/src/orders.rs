//! Application-side order list.
//!
//! Every mutation goes to the store first; the local list changes only once
//! the store confirms, so the list never shows an order the backend refused.

use std::sync::Arc;

use chrono::Utc;
use lp_protocol::{ChecklistItem, OrderId, OrderPatch, OrderStatus, ServiceOrder};
use tokio::sync::RwLock;

use crate::directory::TechnicianDirectory;
use crate::error::{StoreError, StoreResult};
use crate::reconcile::{OrderDraft, Rejection, reconcile};
use crate::store::OrderStore;

/// Message shown when the store refuses a new order.
pub const CREATE_FAILED_MESSAGE: &str = "Erro ao criar OS. Verifique se o Nº da OS já existe.";

/// Result of the reconcile-then-persist pipeline.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(ServiceOrder),
    /// Reconciliation refused the draft; the store was not called.
    Rejected(Rejection),
    /// The store refused the order.
    Failed(StoreError),
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Follow-up text for the chat history.
    pub fn user_message(&self) -> String {
        match self {
            Self::Created(order) => format!("OS #{} criada com sucesso.", order.id),
            Self::Rejected(rejection) => rejection.user_message(),
            Self::Failed(_) => CREATE_FAILED_MESSAGE.to_string(),
        }
    }
}

pub struct OrderBook {
    store: Arc<dyn OrderStore>,
    orders: RwLock<Vec<ServiceOrder>>,
}

impl OrderBook {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self::with_orders(store, Vec::new())
    }

    /// Book pre-filled with already-loaded orders.
    pub fn with_orders(store: Arc<dyn OrderStore>, mut orders: Vec<ServiceOrder>) -> Self {
        sort_newest_first(&mut orders);
        Self {
            store,
            orders: RwLock::new(orders),
        }
    }

    /// Orders, newest first.
    pub async fn snapshot(&self) -> Vec<ServiceOrder> {
        self.orders.read().await.clone()
    }

    pub async fn get(&self, id: OrderId) -> Option<ServiceOrder> {
        self.orders.read().await.iter().find(|o| o.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Replace the local list with the store's.
    pub async fn refresh(&self) -> StoreResult<()> {
        let mut fresh = self.store.list().await?;
        sort_newest_first(&mut fresh);
        *self.orders.write().await = fresh;
        Ok(())
    }

    /// Persist an already-reconciled order.
    pub async fn create(&self, order: ServiceOrder) -> StoreResult<ServiceOrder> {
        if let Err(e) = self.store.create(&order).await {
            tracing::warn!(order_id = %order.id, error = %e, "order create rejected by store");
            return Err(e);
        }

        let mut orders = self.orders.write().await;
        orders.push(order.clone());
        sort_newest_first(&mut orders);
        tracing::info!(order_id = %order.id, status = order.status.as_str(), "order created");
        Ok(order)
    }

    /// Reconcile `draft` against `directory` and persist the result.
    ///
    /// A rejection makes no store call at all.
    pub async fn create_from_draft(
        &self,
        draft: &OrderDraft,
        directory: &TechnicianDirectory,
    ) -> CreateOutcome {
        let order = match reconcile(draft, directory, Utc::now()) {
            Ok(order) => order,
            Err(rejection) => {
                tracing::info!(order_id = ?draft.id.map(|id| id.0), reason = %rejection, "order draft rejected");
                return CreateOutcome::Rejected(rejection);
            }
        };

        match self.create(order).await {
            Ok(order) => CreateOutcome::Created(order),
            Err(e) => CreateOutcome::Failed(e),
        }
    }

    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        self.update_fields(id, OrderPatch::status(status)).await
    }

    pub async fn update_checklist(&self, id: OrderId, checklist: Vec<ChecklistItem>) -> StoreResult<()> {
        self.update_fields(id, OrderPatch::checklist(checklist)).await
    }

    /// Apply `patch` in the store, then locally.
    pub async fn update_fields(&self, id: OrderId, patch: OrderPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.store.update(id, &patch).await {
            tracing::warn!(order_id = %id, error = %e, "order update failed");
            return Err(e);
        }

        let mut orders = self.orders.write().await;
        if let Some(order) = orders.iter_mut().find(|o| o.id == id) {
            order.apply(&patch);
            order.updated_at = Utc::now();
        }
        Ok(())
    }

    pub async fn delete(&self, id: OrderId) -> StoreResult<()> {
        if let Err(e) = self.store.delete(id).await {
            tracing::warn!(order_id = %id, error = %e, "order delete failed");
            return Err(e);
        }
        self.orders.write().await.retain(|o| o.id != id);
        Ok(())
    }
}

fn sort_newest_first(orders: &mut [ServiceOrder]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
