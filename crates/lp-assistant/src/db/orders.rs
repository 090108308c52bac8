//! Service order queries against `ordens_servico`.

use chrono::{DateTime, Utc};
use lp_protocol::{
    ChecklistItem, OrderId, OrderPatch, OrderStatus, PartUsed, Priority, ServiceOrder, ServiceType,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::StoreError;

/// Order row with enum and numeric columns cast to plain types.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub tecnico_id: Option<String>,
    pub modelo: String,
    pub defeito_reclamado: String,
    pub laudo_tecnico: Option<String>,
    pub pecas_usadas: Json<Vec<PartUsed>>,
    pub checklist: Json<Vec<ChecklistItem>>,
    pub valor_cobrado: f64,
    pub custo_pecas: f64,
    pub custo_outros: f64,
    pub status: String,
    pub prioridade: String,
    pub tipo_servico: String,
    pub parent_os_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT_ORDERS: &str = "SELECT id, tecnico_id::text AS tecnico_id, modelo, defeito_reclamado, laudo_tecnico,
        pecas_usadas, checklist,
        valor_cobrado::float8 AS valor_cobrado, custo_pecas::float8 AS custo_pecas, custo_outros::float8 AS custo_outros,
        status::text AS status, prioridade::text AS prioridade, tipo_servico::text AS tipo_servico,
        parent_os_id, created_at, updated_at
     FROM ordens_servico";

impl TryFrom<OrderRow> for ServiceOrder {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let unknown = |column: &str, value: &str| {
            StoreError::Backend(format!("unknown {column} value '{value}' on order #{}", row.id))
        };
        Ok(ServiceOrder {
            id: OrderId(row.id),
            technician_id: row.tecnico_id.clone(),
            status: OrderStatus::parse(&row.status).ok_or_else(|| unknown("status", &row.status))?,
            priority: Priority::parse(&row.prioridade)
                .ok_or_else(|| unknown("prioridade", &row.prioridade))?,
            service_type: ServiceType::parse(&row.tipo_servico)
                .ok_or_else(|| unknown("tipo_servico", &row.tipo_servico))?,
            model: row.modelo.clone(),
            defect: row.defeito_reclamado.clone(),
            technical_report: row.laudo_tecnico.clone().unwrap_or_default(),
            parts_used: row.pecas_usadas.0.clone(),
            checklist: row.checklist.0.clone(),
            charged: row.valor_cobrado,
            parts_cost: row.custo_pecas,
            other_costs: row.custo_outros,
            parent_id: row.parent_os_id.map(OrderId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// All orders, newest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<OrderRow>, sqlx::Error> {
    let sql = format!("{SELECT_ORDERS} ORDER BY created_at DESC");
    sqlx::query_as::<_, OrderRow>(&sql).fetch_all(pool).await
}

/// Insert through the `create_os_rpc_void` function.
pub async fn create(pool: &PgPool, order: &ServiceOrder) -> Result<(), sqlx::Error> {
    sqlx::query(
        "SELECT create_os_rpc_void(
            p_id => $1, p_checklist => $2, p_custo_outros => $3::numeric, p_custo_pecas => $4::numeric,
            p_defeito_reclamado => $5, p_modelo => $6, p_parent_os_id => $7, p_pecas_usadas => $8,
            p_prioridade => $9, p_status => $10, p_tecnico_id => $11::uuid, p_tipo_servico => $12,
            p_valor_cobrado => $13::numeric)",
    )
    .bind(order.id.0)
    .bind(Json(&order.checklist))
    .bind(order.other_costs)
    .bind(order.parts_cost)
    .bind(&order.defect)
    .bind(&order.model)
    .bind(order.parent_id.map(|p| p.0))
    .bind(Json(&order.parts_used))
    .bind(order.priority.as_str())
    .bind(order.status.as_str())
    .bind(order.technician_id.as_deref())
    .bind(order.service_type.as_str())
    .bind(order.charged)
    .execute(pool)
    .await?;
    Ok(())
}

/// Apply the set fields of `patch`. Returns the number of rows touched.
pub async fn update(pool: &PgPool, id: OrderId, patch: &OrderPatch) -> Result<u64, sqlx::Error> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE ordens_servico SET updated_at = now()");

    if let Some(status) = patch.status {
        query.push(", status = ").push_bind(status.as_str()).push("::os_status");
    }
    if let Some(priority) = patch.priority {
        query.push(", prioridade = ").push_bind(priority.as_str()).push("::os_prioridade");
    }
    if let Some(service_type) = patch.service_type {
        query.push(", tipo_servico = ").push_bind(service_type.as_str()).push("::os_tipo");
    }
    if let Some(technician_id) = &patch.technician_id {
        query.push(", tecnico_id = ").push_bind(technician_id.clone()).push("::uuid");
    }
    if let Some(model) = &patch.model {
        query.push(", modelo = ").push_bind(model.clone());
    }
    if let Some(defect) = &patch.defect {
        query.push(", defeito_reclamado = ").push_bind(defect.clone());
    }
    if let Some(report) = &patch.technical_report {
        query.push(", laudo_tecnico = ").push_bind(report.clone());
    }
    if let Some(parts) = &patch.parts_used {
        query.push(", pecas_usadas = ").push_bind(Json(parts.clone()));
    }
    if let Some(checklist) = &patch.checklist {
        query.push(", checklist = ").push_bind(Json(checklist.clone()));
    }
    if let Some(charged) = patch.charged {
        query.push(", valor_cobrado = ").push_bind(charged);
    }
    if let Some(parts_cost) = patch.parts_cost {
        query.push(", custo_pecas = ").push_bind(parts_cost);
    }
    if let Some(other_costs) = patch.other_costs {
        query.push(", custo_outros = ").push_bind(other_costs);
    }

    query.push(" WHERE id = ").push_bind(id.0);
    let result = query.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: OrderId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ordens_servico WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
