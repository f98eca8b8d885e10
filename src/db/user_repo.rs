// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::auth::UserRow;

// Seleção padrão: sempre resolve os nomes do tenant e do fulfillment via
// LEFT JOIN, para o guardião de tenant e o escopo do `ff` não precisarem
// de uma segunda consulta.
const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.password_hash, u.role,
           u.tenant_id, u.fulfillment_id,
           t.name AS tenant_name, f.name AS fulfillment_name,
           u.created_at, u.updated_at
    FROM users u
    LEFT JOIN tenants t ON t.id = u.tenant_id
    LEFT JOIN fulfillments f ON f.id = u.fulfillment_id
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRow>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Lista usuários; `tenant_id` restringe ao tenant e `exclude_admins`
    /// esconde contas de plataforma (visão do owner).
    pub async fn list(
        &self,
        tenant_id: Option<i64>,
        exclude_admins: bool,
    ) -> Result<Vec<UserRow>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"{SELECT_USER}
            WHERE ($1::bigint IS NULL OR u.tenant_id = $1)
              AND (NOT $2 OR u.role <> 'admin')
            ORDER BY u.username"#
        ))
        .bind(tenant_id)
        .bind(exclude_admins)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        password_hash: &str,
        role: &str,
        tenant_id: i64,
        fulfillment_id: Option<i64>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, role, tenant_id, fulfillment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(tenant_id)
        .bind(fulfillment_id)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    /// Troca (ou anula) a referência de tenant de um usuário.
    /// É a operação de "soft-detach"/"attach" do ciclo de membresia.
    pub async fn set_tenant<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        tenant_id: Option<i64>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET tenant_id = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Remoção definitiva (só o admin de plataforma chega aqui).
    pub async fn delete<'e, E>(&self, executor: E, user_id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
