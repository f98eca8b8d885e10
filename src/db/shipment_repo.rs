// src/db/shipment_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::shipment::{Shipment, ShipmentRow};

#[derive(Clone)]
pub struct ShipmentRepository {
    pool: PgPool,
}

impl ShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// O maior id existente na sequência `SHIP-{tenant}-...` deste tenant.
    /// Ordena por comprimento ANTES da ordem lexicográfica: depois que o
    /// contador estoura o zero-padding de 4 dígitos, `SHIP-1-10000` tem que
    /// vencer `SHIP-1-9999` (lexicograficamente perderia).
    pub async fn greatest_id(&self, tenant_id: i64, prefix: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM shipments
            WHERE tenant_id = $1 AND id LIKE $2
            ORDER BY length(id) DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(format!("{prefix}%"))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Insere a remessa. Uma violação de unicidade no id (corrida na
    /// sequência) volta como erro para o serviço decidir o retry.
    pub async fn insert<'e, E>(&self, executor: E, shipment: &Shipment) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO shipments
                (id, supplier, warehouse, route_type, shipment_type, fulfillment,
                 ship_date, current_status, bags, total_bags, total_pieces, tenant_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&shipment.id)
        .bind(&shipment.supplier)
        .bind(&shipment.warehouse)
        .bind(shipment.route_type.as_str())
        .bind(&shipment.shipment_type)
        .bind(&shipment.fulfillment)
        .bind(shipment.ship_date)
        .bind(shipment.current_status.as_str())
        .bind(serde_json::to_value(&shipment.bags).map_err(anyhow::Error::from)?)
        .bind(shipment.total_bags)
        .bind(shipment.total_pieces)
        .bind(shipment.tenant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Busca filtrando por id E tenant NUMA ÚNICA CONSULTA (quando há
    /// tenant). Nunca buscar por id e conferir o tenant depois — a forma
    /// e o tempo da resposta não podem denunciar remessas alheias.
    pub async fn find(
        &self,
        shipment_id: &str,
        tenant_id: Option<i64>,
    ) -> Result<Option<ShipmentRow>, AppError> {
        let row = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT * FROM shipments
            WHERE id = $1 AND ($2::bigint IS NULL OR tenant_id = $2)
            "#,
        )
        .bind(shipment_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Mesma busca, mas com trava de linha (`FOR UPDATE`) dentro da
    /// transação de transição de status. Serializa transições concorrentes
    /// sobre a mesma remessa.
    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        shipment_id: &str,
        tenant_id: Option<i64>,
    ) -> Result<Option<ShipmentRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT * FROM shipments
            WHERE id = $1 AND ($2::bigint IS NULL OR tenant_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(shipment_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        tenant_id: Option<i64>,
        fulfillment: Option<&str>,
        status: Option<&str>,
        supplier: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShipmentRow>, AppError> {
        let rows = sqlx::query_as::<_, ShipmentRow>(
            r#"
            SELECT * FROM shipments
            WHERE ($1::bigint IS NULL OR tenant_id = $1)
              AND ($2::text IS NULL OR fulfillment = $2)
              AND ($3::text IS NULL OR current_status = $3)
              AND ($4::text IS NULL OR supplier = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant_id)
        .bind(fulfillment)
        .bind(status)
        .bind(supplier)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        shipment_id: &str,
        status: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE shipments SET current_status = $2, updated_at = now() WHERE id = $1")
            .bind(shipment_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Regrava os campos editáveis a partir do agregado já mutado em
    /// memória (os totais já vêm recomputados pelo serviço).
    pub async fn apply_update<'e, E>(&self, executor: E, shipment: &Shipment) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE shipments
            SET supplier = $2, warehouse = $3, route_type = $4, shipment_type = $5,
                fulfillment = $6, ship_date = $7, bags = $8,
                total_bags = $9, total_pieces = $10, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(&shipment.id)
        .bind(&shipment.supplier)
        .bind(&shipment.warehouse)
        .bind(shipment.route_type.as_str())
        .bind(&shipment.shipment_type)
        .bind(&shipment.fulfillment)
        .bind(shipment.ship_date)
        .bind(serde_json::to_value(&shipment.bags).map_err(anyhow::Error::from)?)
        .bind(shipment.total_bags)
        .bind(shipment.total_pieces)
        .execute(executor)
        .await?;
        Ok(())
    }
}
