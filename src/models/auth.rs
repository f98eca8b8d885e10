// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::error::AppError;

/// Papéis do sistema, como enumeração fechada.
///
/// `Admin` é global (não limitado por tenant); todos os outros papéis
/// operam estritamente dentro do próprio tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
    Supplier,
    Ff,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Supplier => "supplier",
            Role::Ff => "ff",
            Role::Driver => "driver",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            "supplier" => Some(Role::Supplier),
            "ff" => Some(Role::Ff),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }

    pub const ALL: [Role; 5] = [Role::Admin, Role::Owner, Role::Supplier, Role::Ff, Role::Driver];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Linha crua do banco: o papel vem como texto e os nomes de tenant e de
// fulfillment chegam via LEFT JOIN (podem ser nulos).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub tenant_id: Option<i64>,
    pub fulfillment_id: Option<i64>,
    pub tenant_name: Option<String>,
    pub fulfillment_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Converte a linha crua no modelo de domínio, validando o papel.
    pub fn into_user(self) -> Result<User, AppError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| anyhow::anyhow!("Papel desconhecido no banco: '{}'", self.role))?;
        Ok(User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            role,
            tenant_id: self.tenant_id,
            tenant_name: self.tenant_name,
            fulfillment_id: self.fulfillment_id,
            fulfillment_name: self.fulfillment_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Usuário autenticado, com papel e tenant já resolvidos.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub role: Role,
    pub tenant_id: Option<i64>,
    pub tenant_name: Option<String>,
    pub fulfillment_id: Option<i64>,
    pub fulfillment_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O nome de usuário é obrigatório."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token e os dados básicos do usuário
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub tenant_id: Option<i64>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            tenant_id: user.tenant_id,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT.
// O tenant_id é gravado no login e revalidado contra o estado atual do
// usuário a cada requisição (ver AuthService::validate_token).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,                // ID do usuário
    pub username: String,
    pub role: Role,
    pub tenant_id: Option<i64>,  // Tenant no momento do login
    pub exp: usize,              // Expiration time
    pub iat: usize,              // Issued At
}
