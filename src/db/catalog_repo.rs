// src/db/catalog_repo.rs
//
// Cadastros por tenant (fornecedores, armazéns, fulfillments).
// As três tabelas têm a mesma forma; as consultas só trocam o nome.

use sqlx::PgPool;

use crate::common::error::AppError;
use crate::models::catalog::{Fulfillment, Supplier, Warehouse};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_suppliers(&self, tenant_id: i64) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, tenant_id, created_at FROM suppliers WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_supplier(&self, tenant_id: i64, name: &str) -> Result<Supplier, AppError> {
        let row = sqlx::query_as::<_, Supplier>(
            "INSERT INTO suppliers (name, tenant_id) VALUES ($1, $2) RETURNING id, name, tenant_id, created_at",
        )
        .bind(name)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_warehouses(&self, tenant_id: i64) -> Result<Vec<Warehouse>, AppError> {
        let rows = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, tenant_id, created_at FROM warehouses WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_warehouse(&self, tenant_id: i64, name: &str) -> Result<Warehouse, AppError> {
        let row = sqlx::query_as::<_, Warehouse>(
            "INSERT INTO warehouses (name, tenant_id) VALUES ($1, $2) RETURNING id, name, tenant_id, created_at",
        )
        .bind(name)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_fulfillments(&self, tenant_id: i64) -> Result<Vec<Fulfillment>, AppError> {
        let rows = sqlx::query_as::<_, Fulfillment>(
            "SELECT id, name, tenant_id, created_at FROM fulfillments WHERE tenant_id = $1 ORDER BY name",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_fulfillment(&self, tenant_id: i64, name: &str) -> Result<Fulfillment, AppError> {
        let row = sqlx::query_as::<_, Fulfillment>(
            "INSERT INTO fulfillments (name, tenant_id) VALUES ($1, $2) RETURNING id, name, tenant_id, created_at",
        )
        .bind(name)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_fulfillment(&self, id: i64) -> Result<Option<Fulfillment>, AppError> {
        let row = sqlx::query_as::<_, Fulfillment>(
            "SELECT id, name, tenant_id, created_at FROM fulfillments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
