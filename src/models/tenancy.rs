// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::auth::Role;

/// Um tenant (organização): a unidade de isolamento de dados.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome do tenant é obrigatório."))]
    pub name: String,
}

// ---
// Gestão de usuários (ciclo de vida de membresia)
// ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub tenant_name: Option<String>,
    pub fulfillment_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "O nome de usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role: Role,
    pub tenant_id: i64,
    pub fulfillment_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddExistingUserPayload {
    pub user_id: i64,
}
