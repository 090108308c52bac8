//! Technician queries against `tecnicos`.

use lp_protocol::{NewTechnician, Technician, TechnicianPatch};
use sqlx::{PgPool, Postgres, QueryBuilder};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TechnicianRow {
    pub id: String,
    pub nome: String,
    pub especialidade: String,
    pub comissao_percentual: f64,
    pub active: bool,
}

const COLUMNS: &str = "id::text AS id, nome, COALESCE(especialidade, '') AS especialidade,
    comissao_percentual::float8 AS comissao_percentual, active";

impl From<TechnicianRow> for Technician {
    fn from(row: TechnicianRow) -> Self {
        Technician {
            id: row.id,
            name: row.nome,
            specialty: row.especialidade,
            commission_rate: row.comissao_percentual,
            active: row.active,
        }
    }
}

/// All technicians ordered by name.
pub async fn list_all(pool: &PgPool) -> Result<Vec<TechnicianRow>, sqlx::Error> {
    let sql = format!("SELECT {COLUMNS} FROM tecnicos ORDER BY nome");
    sqlx::query_as::<_, TechnicianRow>(&sql).fetch_all(pool).await
}

/// Insert and return the stored row with its generated id.
pub async fn insert(pool: &PgPool, technician: &NewTechnician) -> Result<TechnicianRow, sqlx::Error> {
    let sql = format!(
        "INSERT INTO tecnicos (nome, especialidade, comissao_percentual, active)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, TechnicianRow>(&sql)
        .bind(&technician.name)
        .bind(&technician.specialty)
        .bind(technician.commission_rate)
        .bind(technician.active)
        .fetch_one(pool)
        .await
}

/// Apply the set fields of `patch`. Returns the number of rows touched.
pub async fn update(pool: &PgPool, id: &str, patch: &TechnicianPatch) -> Result<u64, sqlx::Error> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE tecnicos SET ");
    let mut fields = query.separated(", ");
    if let Some(name) = &patch.name {
        fields.push("nome = ").push_bind_unseparated(name.clone());
    }
    if let Some(specialty) = &patch.specialty {
        fields.push("especialidade = ").push_bind_unseparated(specialty.clone());
    }
    if let Some(rate) = patch.commission_rate {
        fields.push("comissao_percentual = ").push_bind_unseparated(rate);
    }
    if let Some(active) = patch.active {
        fields.push("active = ").push_bind_unseparated(active);
    }
    if patch == &TechnicianPatch::default() {
        // Empty patch: no-op assignment so a missing id still reports zero rows.
        fields.push("nome = nome");
    }

    query.push(" WHERE id::text = ").push_bind(id.to_string());
    let result = query.build().execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tecnicos WHERE id::text = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
