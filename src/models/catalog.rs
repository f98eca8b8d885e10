// src/models/catalog.rs
//
// Cadastros simples por tenant: fornecedores, armazéns e centros de
// fulfillment. Os nomes daqui alimentam os campos textuais da remessa
// e o vínculo dos usuários `ff` a um centro de fulfillment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    pub id: i64,
    pub name: String,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNamedPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}
