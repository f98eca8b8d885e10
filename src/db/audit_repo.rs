// src/db/audit_repo.rs
//
// Três trilhas de auditoria, todas append-only:
//   - shipment_status_history: quem confirmou cada etapa da remessa;
//   - shipment_change_log: quem editou cada campo de metadado;
//   - user_logs: ações gerais do usuário (login, criação, download...).
// Nenhuma delas é jamais atualizada ou podada por este código.

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;
use crate::models::audit::{ChangeLogItem, FieldChange, StatusEvent};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Histórico de status da remessa, mais recente primeiro, com o
    /// username do autor resolvido (pode ser nulo se o autor foi removido).
    pub async fn status_history(&self, shipment_id: &str) -> Result<Vec<StatusEvent>, AppError> {
        let rows = sqlx::query_as::<_, StatusEvent>(
            r#"
            SELECT h.id, h.status, u.username AS changed_by, h.changed_at, h.notes
            FROM shipment_status_history h
            LEFT JOIN users u ON u.id = h.changed_by
            WHERE h.shipment_id = $1
            ORDER BY h.changed_at DESC, h.id DESC
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Procura uma entrada de histórico pela chave de idempotência.
    /// Roda dentro da transação de transição, depois da trava da remessa.
    pub async fn find_by_idempotency_key<'e, E>(
        &self,
        executor: E,
        key: &str,
    ) -> Result<Option<i64>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM shipment_status_history WHERE idempotency_key = $1")
                .bind(key)
                .fetch_optional(executor)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Insere a entrada de histórico. A constraint UNIQUE da chave de
    /// idempotência é o backstop final contra duas requisições em corrida
    /// com a mesma chave: a segunda falha, nunca duplica.
    pub async fn insert_status_history<'e, E>(
        &self,
        executor: E,
        shipment_id: &str,
        status: &str,
        changed_by: i64,
        notes: Option<&str>,
        idempotency_key: &str,
        tenant_id: Option<i64>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO shipment_status_history
                (shipment_id, status, changed_by, notes, idempotency_key, tenant_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(shipment_id)
        .bind(status)
        .bind(changed_by)
        .bind(notes)
        .bind(idempotency_key)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Grava UMA entrada de change log por campo alterado.
    pub async fn insert_change_log<'e, E>(
        &self,
        executor: E,
        shipment_id: &str,
        changed_by: i64,
        change: &FieldChange,
        notes: Option<&str>,
        tenant_id: Option<i64>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO shipment_change_log
                (shipment_id, changed_by, change_type, old_value, new_value, notes, tenant_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(shipment_id)
        .bind(changed_by)
        .bind(change.change_type.as_str())
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(notes)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn change_log(&self, shipment_id: &str) -> Result<Vec<ChangeLogItem>, AppError> {
        let rows = sqlx::query_as::<_, ChangeLogItem>(
            r#"
            SELECT c.id, c.change_type, c.old_value, c.new_value,
                   u.username AS changed_by, c.changed_at, c.notes
            FROM shipment_change_log c
            LEFT JOIN users u ON u.id = c.changed_by
            WHERE c.shipment_id = $1
            ORDER BY c.changed_at DESC, c.id DESC
            "#,
        )
        .bind(shipment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Log de ação do usuário. Os handlers chamam isto de forma tolerante
    /// a falha: um erro aqui nunca derruba a operação principal.
    pub async fn log_action(
        &self,
        user_id: i64,
        action: &str,
        shipment_id: Option<&str>,
        details: serde_json::Value,
        tenant_id: Option<i64>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_logs (user_id, action, shipment_id, details, tenant_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(shipment_id)
        .bind(details)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
